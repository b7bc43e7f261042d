use crate::domain::ports::TransactionStore;
use crate::domain::transaction::{TransactionId, TransactionRecord};
use crate::error::{Result, WorkflowError};
use async_trait::async_trait;
use rocksdb::{ColumnFamilyDescriptor, DB, Options};
use std::path::Path;
use std::sync::Arc;

/// Column Family for storing transaction records.
pub const CF_TRANSACTIONS: &str = "transactions";

/// A persistent store implementation using RocksDB.
///
/// Records live in their own column family, keyed by the identifier bytes and
/// stored as JSON.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDbTransactionStore {
    db: Arc<DB>,
}

impl RocksDbTransactionStore {
    /// Opens or creates a RocksDB instance at the specified path.
    ///
    /// # Arguments
    ///
    /// * `path` - The filesystem path where the database will be stored.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_transactions = ColumnFamilyDescriptor::new(CF_TRANSACTIONS, Options::default());

        let db = DB::open_cf_descriptors(&opts, path, vec![cf_transactions]).map_err(|e| {
            WorkflowError::IoError(std::io::Error::other(format!(
                "Failed to open RocksDB: {}",
                e
            )))
        })?;

        Ok(Self { db: Arc::new(db) })
    }
}

#[async_trait]
impl TransactionStore for RocksDbTransactionStore {
    async fn save(&self, record: TransactionRecord) -> Result<TransactionRecord> {
        let cf = self.db.cf_handle(CF_TRANSACTIONS).ok_or_else(|| {
            WorkflowError::StoreWriteFailed("Transactions column family not found".to_string())
        })?;

        let value = serde_json::to_vec(&record)
            .map_err(|e| WorkflowError::StoreWriteFailed(format!("Serialization error: {}", e)))?;

        self.db
            .put_cf(&cf, record.id.as_str().as_bytes(), value)
            .map_err(|e| WorkflowError::StoreWriteFailed(e.to_string()))?;

        Ok(record)
    }

    async fn find_by_id(&self, id: &TransactionId) -> Result<Option<TransactionRecord>> {
        let cf = self.db.cf_handle(CF_TRANSACTIONS).ok_or_else(|| {
            WorkflowError::StoreReadFailed("Transactions column family not found".to_string())
        })?;

        let result = self
            .db
            .get_cf(&cf, id.as_str().as_bytes())
            .map_err(|e| WorkflowError::StoreReadFailed(e.to_string()))?;

        if let Some(bytes) = result {
            let record = serde_json::from_slice(&bytes).map_err(|e| {
                WorkflowError::StoreReadFailed(format!("Deserialization error: {}", e))
            })?;
            Ok(Some(record))
        } else {
            Ok(None)
        }
    }
}
