use crate::domain::lock::LockHandle;
use crate::domain::ports::{LockCoordinator, TransactionStore};
use crate::domain::transaction::{TransactionId, TransactionRecord};
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, Notify, RwLock};
use tokio::time::Instant;
use tracing::debug;
use uuid::Uuid;

/// A thread-safe in-memory store for transaction records.
///
/// Clones share the same map, so a test can keep a handle on the store it
/// gave to the engine.
#[derive(Default, Clone)]
pub struct InMemoryTransactionStore {
    records: Arc<RwLock<HashMap<TransactionId, TransactionRecord>>>,
}

impl InMemoryTransactionStore {
    /// Creates a new, empty in-memory transaction store.
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl TransactionStore for InMemoryTransactionStore {
    async fn save(&self, record: TransactionRecord) -> Result<TransactionRecord> {
        let mut records = self.records.write().await;
        records.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    async fn find_by_id(&self, id: &TransactionId) -> Result<Option<TransactionRecord>> {
        let records = self.records.read().await;
        Ok(records.get(id).cloned())
    }
}

#[derive(Debug)]
struct Lease {
    owner: Uuid,
    holds: u32,
    expires_at: Instant,
}

/// In-process lock service with lease expiry and per-owner reentrancy.
///
/// Waiters park on a [`Notify`] and wake either when a key is released or
/// when the current lease runs out, whichever comes first.
#[derive(Default, Clone)]
pub struct InMemoryLockCoordinator {
    leases: Arc<Mutex<HashMap<String, Lease>>>,
    released: Arc<Notify>,
}

impl InMemoryLockCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether some owner currently holds an unexpired lease on `key`.
    pub async fn is_held(&self, key: &str) -> bool {
        let leases = self.leases.lock().await;
        leases
            .get(key)
            .is_some_and(|lease| lease.expires_at > Instant::now())
    }

    /// Takes the key if free, expired, or already ours; otherwise returns
    /// when the current lease ends.
    async fn attempt(&self, handle: &LockHandle) -> std::result::Result<(), Instant> {
        let mut leases = self.leases.lock().await;
        let now = Instant::now();
        let expires_at = now + handle.lease_budget();

        match leases.get_mut(handle.key()) {
            Some(lease) if lease.expires_at > now && lease.owner != handle.owner() => {
                Err(lease.expires_at)
            }
            Some(lease) if lease.expires_at > now => {
                lease.holds += 1;
                lease.expires_at = expires_at;
                Ok(())
            }
            _ => {
                leases.insert(
                    handle.key().to_string(),
                    Lease {
                        owner: handle.owner(),
                        holds: 1,
                        expires_at,
                    },
                );
                Ok(())
            }
        }
    }
}

#[async_trait]
impl LockCoordinator for InMemoryLockCoordinator {
    async fn try_acquire(&self, handle: &LockHandle) -> Result<bool> {
        let deadline = Instant::now() + handle.wait_budget();
        loop {
            // Register interest before looking, so a release between the
            // check and the wait is not missed.
            let released = self.released.notified();
            tokio::pin!(released);
            released.as_mut().enable();

            let lease_ends = match self.attempt(handle).await {
                Ok(()) => return Ok(true),
                Err(lease_ends) => lease_ends,
            };

            if Instant::now() >= deadline {
                return Ok(false);
            }

            tokio::select! {
                _ = released => {}
                _ = tokio::time::sleep_until(lease_ends.min(deadline)) => {}
            }
        }
    }

    async fn release(&self, handle: &LockHandle) -> Result<()> {
        let mut leases = self.leases.lock().await;
        let now = Instant::now();

        let Some(lease) = leases.get_mut(handle.key()) else {
            debug!(lock.key = handle.key(), "release of a key nobody holds");
            return Ok(());
        };
        if lease.owner != handle.owner() || lease.expires_at <= now {
            debug!(lock.key = handle.key(), "release by a non-owner ignored");
            return Ok(());
        }

        lease.holds -= 1;
        if lease.holds == 0 {
            leases.remove(handle.key());
            drop(leases);
            self.released.notify_waiters();
        }
        Ok(())
    }
}
