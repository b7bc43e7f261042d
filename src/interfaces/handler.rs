use crate::application::workflow::{Outcome, TransactionWorkflow};
use crate::domain::lock::OperationKind;
use crate::domain::transaction::{CallbackRequest, TransactionId, TransactionRequest};
use crate::error::{ErrorKind, WorkflowError};
use serde::Serialize;
use tracing::info;

/// One inbound request, as the transport layer hands it over.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    Transaction(TransactionRequest),
    Callback(CallbackRequest),
}

impl Request {
    pub fn id(&self) -> &TransactionId {
        match self {
            Request::Transaction(request) => &request.id,
            Request::Callback(request) => &request.id,
        }
    }

    pub fn operation(&self) -> OperationKind {
        match self {
            Request::Transaction(_) => OperationKind::Transaction,
            Request::Callback(_) => OperationKind::Callback,
        }
    }
}

/// What goes back to the caller for every request, success or not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Response {
    pub message: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorKind>,
}

impl Response {
    /// HTTP-style status code for this response.
    pub fn status_code(&self) -> u16 {
        self.error.map_or(200, |kind| kind.status_code())
    }
}

impl From<Outcome> for Response {
    fn from(outcome: Outcome) -> Self {
        Self {
            success: outcome.is_success(),
            message: outcome.message,
            error: outcome.error,
        }
    }
}

impl From<WorkflowError> for Response {
    fn from(error: WorkflowError) -> Self {
        Self {
            message: error.to_string(),
            success: false,
            error: Some(error.kind()),
        }
    }
}

/// Translates requests into workflow calls and every result into a [`Response`].
pub struct TransactionHandler {
    workflow: TransactionWorkflow,
}

impl TransactionHandler {
    pub fn new(workflow: TransactionWorkflow) -> Self {
        Self { workflow }
    }

    pub async fn transactions(&self, request: TransactionRequest) -> Response {
        info!("Transaction request received");
        self.workflow
            .submit_transaction(request)
            .await
            .map_or_else(Response::from, Response::from)
    }

    pub async fn callback(&self, request: CallbackRequest) -> Response {
        info!("Callback request received");
        self.workflow
            .submit_callback(request)
            .await
            .map_or_else(Response::from, Response::from)
    }

    pub async fn handle(&self, request: Request) -> Response {
        match request {
            Request::Transaction(request) => self.transactions(request).await,
            Request::Callback(request) => self.callback(request).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WorkflowConfig;
    use crate::domain::lock::LockHandle;
    use crate::domain::money::{Amount, Currency};
    use crate::domain::ports::LockCoordinator;
    use crate::infrastructure::in_memory::{InMemoryLockCoordinator, InMemoryTransactionStore};
    use rust_decimal_macros::dec;
    use std::time::Duration;

    fn handler(coordinator: InMemoryLockCoordinator, wait_ms: u64) -> TransactionHandler {
        let mut config = WorkflowConfig {
            processing_delay_ms: 0,
            ..WorkflowConfig::default()
        };
        config.callback.wait_ms = wait_ms;
        TransactionHandler::new(TransactionWorkflow::new(
            Box::new(coordinator),
            Box::new(InMemoryTransactionStore::new()),
            config,
        ))
    }

    fn transaction(id: &str) -> TransactionRequest {
        TransactionRequest {
            id: TransactionId::new(id).unwrap(),
            user_id: "user-1".to_string(),
            amount: Amount::new(dec!(1.00)).unwrap(),
            currency: Currency::new("UAH").unwrap(),
            description: "top up".to_string(),
            status: None,
        }
    }

    #[tokio::test]
    async fn test_success_response() {
        let handler = handler(InMemoryLockCoordinator::new(), 1_000);
        let response = handler
            .handle(Request::Transaction(transaction("T1")))
            .await;
        assert!(response.success);
        assert_eq!(response.message, "Transaction processed successfully");
        assert_eq!(response.status_code(), 200);
    }

    #[tokio::test]
    async fn test_not_found_response() {
        let handler = handler(InMemoryLockCoordinator::new(), 1_000);
        let callback = CallbackRequest::new(TransactionId::new("T9").unwrap(), "success").unwrap();
        let response = handler.callback(callback).await;
        assert!(!response.success);
        assert_eq!(response.error, Some(ErrorKind::TransactionNotFound));
        assert_eq!(response.status_code(), 404);
    }

    #[tokio::test]
    async fn test_lock_contention_becomes_response() {
        let coordinator = InMemoryLockCoordinator::new();
        let holder = LockHandle::new(
            "transaction_lock:T1",
            Duration::ZERO,
            Duration::from_secs(60),
        );
        assert!(coordinator.try_acquire(&holder).await.unwrap());

        let handler = handler(coordinator, 0);
        let callback = CallbackRequest::new(TransactionId::new("T1").unwrap(), "success").unwrap();
        let response = handler.handle(Request::Callback(callback)).await;

        assert!(!response.success);
        assert_eq!(response.message, "Failed to acquire lock for callback");
        assert_eq!(response.status_code(), 409);
    }

    #[test]
    fn test_response_json() {
        let response = Response::from(Outcome::success("ok"));
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json, serde_json::json!({"message": "ok", "success": true}));

        let response = Response::from(Outcome::failure(ErrorKind::StoreWriteFailed, "nope"));
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["error"], "store_write_failed");
    }
}
