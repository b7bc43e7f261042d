use crate::domain::lock::OperationKind;
use crate::domain::transaction::TransactionId;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error("Failed to acquire lock for {0}")]
    LockAcquisitionFailed(OperationKind),
    #[error("Lock service unavailable: {0}")]
    LockServiceUnavailable(String),
    #[error("Transaction not found for ID: {0}")]
    TransactionNotFound(TransactionId),
    #[error("Failed to save transaction: {0}")]
    StoreWriteFailed(String),
    #[error("Failed to read transaction: {0}")]
    StoreReadFailed(String),
    #[error("Unexpected fault: {0}")]
    UnexpectedFault(String),
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Configuration error: {0}")]
    ConfigError(#[from] config::ConfigError),
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, WorkflowError>;

/// Discriminant of a [`WorkflowError`], small enough to travel inside an
/// outcome or a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    LockAcquisitionFailed,
    LockServiceUnavailable,
    TransactionNotFound,
    StoreWriteFailed,
    StoreReadFailed,
    UnexpectedFault,
    ValidationError,
}

impl ErrorKind {
    /// HTTP-style status code a transport layer would answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            ErrorKind::TransactionNotFound => 404,
            ErrorKind::LockAcquisitionFailed => 409,
            ErrorKind::LockServiceUnavailable => 503,
            ErrorKind::ValidationError => 400,
            ErrorKind::StoreWriteFailed | ErrorKind::StoreReadFailed | ErrorKind::UnexpectedFault => {
                500
            }
        }
    }
}

impl WorkflowError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            WorkflowError::LockAcquisitionFailed(_) => ErrorKind::LockAcquisitionFailed,
            WorkflowError::LockServiceUnavailable(_) => ErrorKind::LockServiceUnavailable,
            WorkflowError::TransactionNotFound(_) => ErrorKind::TransactionNotFound,
            WorkflowError::StoreWriteFailed(_) => ErrorKind::StoreWriteFailed,
            WorkflowError::StoreReadFailed(_) => ErrorKind::StoreReadFailed,
            WorkflowError::ValidationError(_)
            | WorkflowError::ConfigError(_)
            | WorkflowError::CsvError(_) => ErrorKind::ValidationError,
            WorkflowError::UnexpectedFault(_) | WorkflowError::IoError(_) => {
                ErrorKind::UnexpectedFault
            }
        }
    }
}
