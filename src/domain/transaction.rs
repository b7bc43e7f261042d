use super::money::{Amount, Currency};
use crate::error::WorkflowError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Status given to a record whose request carried none.
pub const INITIAL_STATUS: &str = "pending";

/// Opaque transaction identifier; the lock key and the store key derive from it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TransactionId(String);

impl TransactionId {
    pub fn new(id: impl Into<String>) -> Result<Self, WorkflowError> {
        let id = id.into();
        let trimmed = id.trim();
        if trimmed.is_empty() {
            return Err(WorkflowError::ValidationError(
                "Transaction id must not be empty".to_string(),
            ));
        }
        if trimmed.len() == id.len() {
            Ok(Self(id))
        } else {
            Ok(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for TransactionId {
    type Error = WorkflowError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TransactionId> for String {
    fn from(id: TransactionId) -> Self {
        id.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A persisted transaction.
///
/// Only `status` changes after creation, and only through a callback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub id: TransactionId,
    pub status: String,
    pub user_id: String,
    pub amount: Amount,
    pub currency: Currency,
    pub description: String,
}

/// Inbound request creating a transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionRequest {
    pub id: TransactionId,
    pub user_id: String,
    pub amount: Amount,
    pub currency: Currency,
    pub description: String,
    pub status: Option<String>,
}

impl From<TransactionRequest> for TransactionRecord {
    fn from(request: TransactionRequest) -> Self {
        let status = request
            .status
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| INITIAL_STATUS.to_string());
        Self {
            id: request.id,
            status,
            user_id: request.user_id,
            amount: request.amount,
            currency: request.currency,
            description: request.description,
        }
    }
}

/// Inbound status notification for an existing transaction. Consumed once,
/// never stored as such.
#[derive(Debug, Clone, PartialEq)]
pub struct CallbackRequest {
    pub id: TransactionId,
    pub status: String,
}

impl CallbackRequest {
    pub fn new(id: TransactionId, status: impl Into<String>) -> Result<Self, WorkflowError> {
        let status = status.into();
        if status.trim().is_empty() {
            return Err(WorkflowError::ValidationError(
                "Callback status must not be empty".to_string(),
            ));
        }
        Ok(Self { id, status })
    }
}
