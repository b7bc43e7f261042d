use crate::domain::lock::OperationKind;
use crate::error::Result;
use crate::interfaces::handler::Response;
use serde::Serialize;
use std::io::Write;

#[derive(Serialize)]
struct ResponseRow<'a> {
    id: &'a str,
    operation: OperationKind,
    success: bool,
    message: &'a str,
}

/// Writes one CSV line per handled request.
pub struct ResponseWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> ResponseWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write_response(
        &mut self,
        id: &str,
        operation: OperationKind,
        response: &Response,
    ) -> Result<()> {
        self.writer.serialize(ResponseRow {
            id,
            operation,
            success: response.success,
            message: &response.message,
        })?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::workflow::Outcome;
    use crate::error::ErrorKind;

    #[test]
    fn test_writes_header_and_rows() {
        let mut buffer = Vec::new();
        {
            let mut writer = ResponseWriter::new(&mut buffer);
            writer
                .write_response(
                    "T1",
                    OperationKind::Transaction,
                    &Response::from(Outcome::success("Transaction processed successfully")),
                )
                .unwrap();
            writer
                .write_response(
                    "T9",
                    OperationKind::Callback,
                    &Response::from(Outcome::failure(
                        ErrorKind::TransactionNotFound,
                        "Transaction not found for ID: T9",
                    )),
                )
                .unwrap();
            writer.flush().unwrap();
        }

        let output = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines[0], "id,operation,success,message");
        assert_eq!(lines[1], "T1,transaction,true,Transaction processed successfully");
        assert_eq!(lines[2], "T9,callback,false,Transaction not found for ID: T9");
    }
}
