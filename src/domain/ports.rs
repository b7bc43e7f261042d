use super::lock::LockHandle;
use super::transaction::{TransactionId, TransactionRecord};
use crate::error::Result;
use async_trait::async_trait;

/// Client of the mutual-exclusion service.
#[async_trait]
pub trait LockCoordinator: Send + Sync {
    /// Waits up to the handle's wait budget for exclusive ownership of its key.
    ///
    /// Returns `Ok(false)` when the budget elapses without acquisition. Once
    /// acquired, the lock expires after the lease budget unless released.
    /// Failing to reach the service is an error, never `Ok(false)`.
    async fn try_acquire(&self, handle: &LockHandle) -> Result<bool>;

    /// Releases the key if the handle's owner still holds it; otherwise a no-op.
    async fn release(&self, handle: &LockHandle) -> Result<()>;
}

#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Inserts or replaces the record, returning the persisted form.
    async fn save(&self, record: TransactionRecord) -> Result<TransactionRecord>;
    async fn find_by_id(&self, id: &TransactionId) -> Result<Option<TransactionRecord>>;
}

pub type LockCoordinatorBox = Box<dyn LockCoordinator>;
pub type TransactionStoreBox = Box<dyn TransactionStore>;
