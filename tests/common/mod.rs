#![allow(dead_code)]

use async_trait::async_trait;
use rand::Rng;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use txguard::config::WorkflowConfig;
use txguard::domain::lock::{LockHandle, LockKeyPolicy};
use txguard::domain::money::{Amount, Currency};
use txguard::domain::ports::{LockCoordinator, TransactionStore};
use txguard::domain::transaction::{
    CallbackRequest, TransactionId, TransactionRecord, TransactionRequest,
};
use txguard::error::{Result, WorkflowError};
use txguard::infrastructure::in_memory::{InMemoryLockCoordinator, InMemoryTransactionStore};

pub fn id(value: &str) -> TransactionId {
    TransactionId::new(value).unwrap()
}

pub fn transaction(value: &str, amount: Decimal, currency: &str) -> TransactionRequest {
    let user = rand::thread_rng().gen_range(1..10_000);
    TransactionRequest {
        id: id(value),
        user_id: format!("user-{}", user),
        amount: Amount::new(amount).unwrap(),
        currency: Currency::new(currency).unwrap(),
        description: format!("payment {}", value),
        status: None,
    }
}

pub fn callback(value: &str, status: &str) -> CallbackRequest {
    CallbackRequest::new(id(value), status).unwrap()
}

pub fn config(policy: LockKeyPolicy, processing_delay_ms: u64) -> WorkflowConfig {
    let mut config = WorkflowConfig {
        processing_delay_ms,
        ..WorkflowConfig::default()
    };
    config.lock.policy = policy;
    config
}

#[derive(Default)]
pub struct LockStats {
    acquired: AtomicUsize,
    rejected: AtomicUsize,
    released: AtomicUsize,
    active: AtomicUsize,
    max_active: AtomicUsize,
}

impl LockStats {
    pub fn acquired(&self) -> usize {
        self.acquired.load(Ordering::SeqCst)
    }

    pub fn rejected(&self) -> usize {
        self.rejected.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    /// Highest number of operations that held a lock at the same time.
    pub fn max_active(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }
}

/// Wraps the in-memory coordinator and records what the engine did with it.
#[derive(Clone, Default)]
pub struct SpyCoordinator {
    pub inner: InMemoryLockCoordinator,
    pub stats: Arc<LockStats>,
}

impl SpyCoordinator {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LockCoordinator for SpyCoordinator {
    async fn try_acquire(&self, handle: &LockHandle) -> Result<bool> {
        let acquired = self.inner.try_acquire(handle).await?;
        if acquired {
            self.stats.acquired.fetch_add(1, Ordering::SeqCst);
            let active = self.stats.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.stats.max_active.fetch_max(active, Ordering::SeqCst);
        } else {
            self.stats.rejected.fetch_add(1, Ordering::SeqCst);
        }
        Ok(acquired)
    }

    async fn release(&self, handle: &LockHandle) -> Result<()> {
        // counted before the key is freed so max_active never overstates overlap
        self.stats.released.fetch_add(1, Ordering::SeqCst);
        self.stats.active.fetch_sub(1, Ordering::SeqCst);
        self.inner.release(handle).await
    }
}

/// A lock service that cannot be reached.
pub struct UnreachableCoordinator;

#[async_trait]
impl LockCoordinator for UnreachableCoordinator {
    async fn try_acquire(&self, _handle: &LockHandle) -> Result<bool> {
        Err(WorkflowError::LockServiceUnavailable(
            "connection refused".to_string(),
        ))
    }

    async fn release(&self, _handle: &LockHandle) -> Result<()> {
        panic!("release called although nothing was acquired");
    }
}

#[derive(Clone, Copy, Default, PartialEq)]
pub enum StoreFault {
    #[default]
    None,
    FailWrites,
    PanicOnWrite,
}

/// Wraps the in-memory store, counting calls and optionally misbehaving.
#[derive(Clone, Default)]
pub struct SpyStore {
    pub inner: InMemoryTransactionStore,
    saves: Arc<AtomicUsize>,
    lookups: Arc<AtomicUsize>,
    fault: StoreFault,
}

impl SpyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fault(fault: StoreFault) -> Self {
        Self {
            fault,
            ..Self::default()
        }
    }

    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.saves() + self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TransactionStore for SpyStore {
    async fn save(&self, record: TransactionRecord) -> Result<TransactionRecord> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        match self.fault {
            StoreFault::None => self.inner.save(record).await,
            StoreFault::FailWrites => Err(WorkflowError::StoreWriteFailed("disk full".to_string())),
            StoreFault::PanicOnWrite => panic!("storage driver crashed"),
        }
    }

    async fn find_by_id(&self, id: &TransactionId) -> Result<Option<TransactionRecord>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.inner.find_by_id(id).await
    }
}
