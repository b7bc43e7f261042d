use crate::domain::lock::OperationKind;
use crate::domain::money::{Amount, Currency};
use crate::domain::transaction::{CallbackRequest, TransactionId, TransactionRequest};
use crate::error::{Result, WorkflowError};
use crate::interfaces::handler::Request;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Read;

/// Raw CSV row; which columns are required depends on `type`.
#[derive(Debug, Deserialize)]
struct RequestRow {
    r#type: OperationKind,
    id: String,
    #[serde(default)]
    user_id: Option<String>,
    #[serde(default)]
    amount: Option<Decimal>,
    #[serde(default)]
    currency: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

fn required(value: Option<String>, column: &str) -> Result<String> {
    value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| WorkflowError::ValidationError(format!("Missing '{}' column", column)))
}

impl TryFrom<RequestRow> for Request {
    type Error = WorkflowError;

    fn try_from(row: RequestRow) -> Result<Self> {
        let id = TransactionId::new(row.id)?;
        match row.r#type {
            OperationKind::Transaction => {
                let amount = row.amount.ok_or_else(|| {
                    WorkflowError::ValidationError("Transaction missing amount".to_string())
                })?;
                Ok(Request::Transaction(TransactionRequest {
                    id,
                    user_id: required(row.user_id, "user_id")?,
                    amount: Amount::new(amount)?,
                    currency: Currency::new(&required(row.currency, "currency")?)?,
                    description: row.description.unwrap_or_default(),
                    status: row.status.filter(|s| !s.is_empty()),
                }))
            }
            OperationKind::Callback => Ok(Request::Callback(CallbackRequest::new(
                id,
                required(row.status, "status")?,
            )?)),
        }
    }
}

/// Reads requests from a CSV source.
///
/// Header `type,id,user_id,amount,currency,description,status`; whitespace is
/// trimmed and short rows are accepted, so a callback row may stop after
/// `status` is reached with empty columns in between.
pub struct RequestReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> RequestReader<R> {
    /// Creates a new `RequestReader` from any `Read` source (e.g., File, Stdin).
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Lazily reads and validates requests, one `Result` per row.
    pub fn requests(self) -> impl Iterator<Item = Result<Request>> {
        self.reader
            .into_deserialize::<RequestRow>()
            .map(|row| row.map_err(WorkflowError::from).and_then(Request::try_from))
    }
}
