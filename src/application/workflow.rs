use crate::config::WorkflowConfig;
use crate::domain::lock::{LockHandle, OperationKind};
use crate::domain::ports::{LockCoordinatorBox, TransactionStoreBox};
use crate::domain::transaction::{
    CallbackRequest, TransactionId, TransactionRecord, TransactionRequest,
};
use crate::error::{ErrorKind, Result, WorkflowError};
use futures::FutureExt;
use serde::Serialize;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{error, info, instrument, warn};

pub const TRANSACTION_SUCCESS: &str = "Transaction processed successfully";
pub const TRANSACTION_FAILURE: &str = "Transaction failed due to an unexpected error";
pub const CALLBACK_SUCCESS: &str = "Callback processed successfully";
pub const CALLBACK_FAILURE: &str = "Callback processing failed due to an unexpected error";

/// Result of a guarded operation that got past lock acquisition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Outcome {
    pub message: String,
    /// `None` on success.
    pub error: Option<ErrorKind>,
}

impl Outcome {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            error: None,
        }
    }

    pub fn failure(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            error: Some(kind),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Runs transaction creations and callbacks under a lock keyed by
/// transaction identity.
///
/// Every operation goes `acquire -> business step -> release`. Acquisition
/// faults are returned as `Err` before the store is touched; anything that
/// fails after acquisition becomes a failure [`Outcome`], and the lock is
/// released exactly once on every path past a successful acquisition.
pub struct TransactionWorkflow {
    coordinator: LockCoordinatorBox,
    store: TransactionStoreBox,
    config: WorkflowConfig,
}

impl TransactionWorkflow {
    pub fn new(
        coordinator: LockCoordinatorBox,
        store: TransactionStoreBox,
        config: WorkflowConfig,
    ) -> Self {
        for warning in config.lease_warnings() {
            warn!("{}", warning);
        }
        Self {
            coordinator,
            store,
            config,
        }
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    /// Saves a new transaction, then simulates its external processing.
    #[instrument(skip_all, fields(transaction.id = %request.id, operation = "transaction"))]
    pub async fn submit_transaction(&self, request: TransactionRequest) -> Result<Outcome> {
        let handle = self.lock_handle(OperationKind::Transaction, &request.id);
        self.acquire(&handle, OperationKind::Transaction).await?;

        let result = self
            .run_locked(&handle, OperationKind::Transaction, self.process_transaction(request))
            .await;

        Ok(match result {
            Ok(()) => Outcome::success(TRANSACTION_SUCCESS),
            Err(e) => {
                error!(error = %e, "Transaction processing failed");
                Outcome::failure(e.kind(), TRANSACTION_FAILURE)
            }
        })
    }

    /// Applies a callback's status to an existing transaction.
    #[instrument(skip_all, fields(transaction.id = %request.id, operation = "callback"))]
    pub async fn submit_callback(&self, request: CallbackRequest) -> Result<Outcome> {
        let handle = self.lock_handle(OperationKind::Callback, &request.id);
        self.acquire(&handle, OperationKind::Callback).await?;

        let result = self
            .run_locked(&handle, OperationKind::Callback, self.process_callback(request))
            .await;

        Ok(match result {
            Ok(()) => Outcome::success(CALLBACK_SUCCESS),
            Err(e @ WorkflowError::TransactionNotFound(_)) => {
                warn!(error = %e, "Callback rejected");
                Outcome::failure(e.kind(), e.to_string())
            }
            Err(e) => {
                error!(error = %e, "Callback processing failed");
                Outcome::failure(e.kind(), CALLBACK_FAILURE)
            }
        })
    }

    fn lock_handle(&self, kind: OperationKind, id: &TransactionId) -> LockHandle {
        let key = self
            .config
            .lock
            .policy
            .key_for(&self.config.lock.key_prefix, id);
        let budgets = self.config.budgets(kind);
        LockHandle::new(key, budgets.wait(), budgets.lease())
    }

    async fn acquire(&self, handle: &LockHandle, kind: OperationKind) -> Result<()> {
        match self.coordinator.try_acquire(handle).await {
            Ok(true) => {
                info!(lock.key = handle.key(), "Lock acquired successfully for operation: {}", kind);
                Ok(())
            }
            Ok(false) => {
                warn!(
                    lock.key = handle.key(),
                    wait = ?handle.wait_budget(),
                    "Failed to acquire lock for operation: {}",
                    kind
                );
                Err(WorkflowError::LockAcquisitionFailed(kind))
            }
            Err(e) => {
                error!(lock.key = handle.key(), error = %e, "Lock service error for operation: {}", kind);
                Err(match e {
                    WorkflowError::LockServiceUnavailable(_) => e,
                    other => WorkflowError::LockServiceUnavailable(other.to_string()),
                })
            }
        }
    }

    /// Runs `step` while the lock is held, then releases it whatever the
    /// step did, including panicking.
    async fn run_locked<T, F>(&self, handle: &LockHandle, kind: OperationKind, step: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let started = Instant::now();
        let result = match AssertUnwindSafe(step).catch_unwind().await {
            Ok(result) => result,
            Err(panic) => Err(WorkflowError::UnexpectedFault(panic_message(panic))),
        };
        self.check_lease(handle, started.elapsed());
        self.release(handle, kind).await;
        result
    }

    async fn release(&self, handle: &LockHandle, kind: OperationKind) {
        match self.coordinator.release(handle).await {
            Ok(()) => {
                info!(lock.key = handle.key(), "Lock released successfully for operation: {}", kind)
            }
            // the lease still bounds how long the key stays taken
            Err(e) => warn!(lock.key = handle.key(), error = %e, "Lock release failed for operation: {}", kind),
        }
    }

    fn check_lease(&self, handle: &LockHandle, elapsed: Duration) {
        let lease = handle.lease_budget();
        if elapsed >= lease {
            error!(
                lock.key = handle.key(),
                ?elapsed,
                ?lease,
                "Business step outlived the lock lease; exclusion may have lapsed"
            );
        } else if elapsed * 5 >= lease * 4 {
            warn!(
                lock.key = handle.key(),
                ?elapsed,
                ?lease,
                "Business step used over 80% of the lock lease"
            );
        }
    }

    async fn process_transaction(&self, request: TransactionRequest) -> Result<()> {
        let saved = self.store.save(TransactionRecord::from(request)).await?;
        info!("Transaction entity saved: {}", saved.id);

        tokio::time::sleep(self.config.processing_delay()).await;
        info!("Transaction processed with id: {}", saved.id);
        Ok(())
    }

    async fn process_callback(&self, request: CallbackRequest) -> Result<()> {
        let mut record = self
            .store
            .find_by_id(&request.id)
            .await?
            .ok_or_else(|| WorkflowError::TransactionNotFound(request.id.clone()))?;

        info!(
            "Processing callback for transaction {} with current status {}",
            record.id, record.status
        );
        record.status = request.status;

        let updated = self.store.save(record).await?;
        info!(
            "Transaction status updated to: {} for transaction {}",
            updated.status, updated.id
        );
        Ok(())
    }
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "business step panicked".to_string()
    }
}
