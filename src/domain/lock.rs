use super::transaction::TransactionId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

/// The two operations the workflow guards with a lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Transaction,
    Callback,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationKind::Transaction => f.write_str("transaction"),
            OperationKind::Callback => f.write_str("callback"),
        }
    }
}

/// How a lock key is derived from a transaction identifier.
///
/// `Global` serializes every guarded operation in the system behind one key.
/// `PerTransaction` only serializes operations on the same identifier, so a
/// callback still waits for its own transaction but unrelated identifiers run
/// in parallel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LockKeyPolicy {
    Global,
    #[default]
    PerTransaction,
}

impl LockKeyPolicy {
    pub fn key_for(&self, prefix: &str, id: &TransactionId) -> String {
        match self {
            LockKeyPolicy::Global => prefix.to_string(),
            LockKeyPolicy::PerTransaction => format!("{}:{}", prefix, id),
        }
    }
}

/// One acquisition attempt on a lock key.
///
/// The owner token identifies the operation holding the lock; a coordinator
/// only releases or re-enters a key for the token that acquired it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockHandle {
    key: String,
    owner: Uuid,
    wait_budget: Duration,
    lease_budget: Duration,
}

impl LockHandle {
    pub fn new(key: impl Into<String>, wait_budget: Duration, lease_budget: Duration) -> Self {
        Self {
            key: key.into(),
            owner: Uuid::new_v4(),
            wait_budget,
            lease_budget,
        }
    }

    /// Same key and owner with different budgets, for reentrant acquisition.
    pub fn reenter(&self, wait_budget: Duration, lease_budget: Duration) -> Self {
        Self {
            key: self.key.clone(),
            owner: self.owner,
            wait_budget,
            lease_budget,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn owner(&self) -> Uuid {
        self.owner
    }

    pub fn wait_budget(&self) -> Duration {
        self.wait_budget
    }

    pub fn lease_budget(&self) -> Duration {
        self.lease_budget
    }
}
