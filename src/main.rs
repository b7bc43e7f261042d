use clap::Parser;
use futures::future::join_all;
use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::io;
use std::path::PathBuf;
use txguard::application::workflow::TransactionWorkflow;
use txguard::config::WorkflowConfig;
use txguard::domain::ports::{LockCoordinatorBox, TransactionStoreBox};
use txguard::infrastructure::in_memory::{InMemoryLockCoordinator, InMemoryTransactionStore};
use txguard::interfaces::csv::request_reader::RequestReader;
use txguard::interfaces::csv::response_writer::ResponseWriter;
use txguard::interfaces::handler::{Request, TransactionHandler};
use txguard::telemetry;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input requests CSV file
    input: PathBuf,

    /// Configuration file (TOML or JSON); TXGUARD__* variables override it.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Submit all requests at once instead of one after another.
    #[arg(long)]
    concurrent: bool,

    /// Emit logs as JSON.
    #[arg(long)]
    json_logs: bool,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Redis server for the lock service (optional), e.g. redis://127.0.0.1:6379
    #[arg(long)]
    redis_url: Option<String>,
}

fn transaction_store(db_path: Option<PathBuf>) -> Result<TransactionStoreBox> {
    #[cfg(feature = "storage-rocksdb")]
    if let Some(db_path) = db_path {
        let store = txguard::infrastructure::rocksdb::RocksDbTransactionStore::open(db_path)
            .into_diagnostic()?;
        return Ok(Box::new(store));
    }

    #[cfg(not(feature = "storage-rocksdb"))]
    if db_path.is_some() {
        eprintln!(
            "WARNING: Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to In-Memory storage."
        );
    }

    Ok(Box::new(InMemoryTransactionStore::new()))
}

async fn lock_coordinator(redis_url: Option<String>) -> Result<LockCoordinatorBox> {
    #[cfg(feature = "lock-redis")]
    if let Some(redis_url) = redis_url {
        use txguard::infrastructure::redis::RedisLockCoordinator;
        let coordinator =
            RedisLockCoordinator::connect(&redis_url, RedisLockCoordinator::DEFAULT_RETRY_DELAY)
                .await
                .into_diagnostic()?;
        return Ok(Box::new(coordinator));
    }

    #[cfg(not(feature = "lock-redis"))]
    if redis_url.is_some() {
        eprintln!(
            "WARNING: Redis lock service requested via --redis-url, but 'lock-redis' feature is not enabled. Falling back to the in-process lock coordinator."
        );
    }

    Ok(Box::new(InMemoryLockCoordinator::new()))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    telemetry::init_tracing(cli.json_logs);

    let config = WorkflowConfig::load(cli.config.as_deref()).into_diagnostic()?;
    let store = transaction_store(cli.db_path)?;
    let coordinator = lock_coordinator(cli.redis_url).await?;
    let handler = TransactionHandler::new(TransactionWorkflow::new(coordinator, store, config));

    let file = File::open(cli.input).into_diagnostic()?;
    let reader = RequestReader::new(file);
    let mut requests: Vec<Request> = Vec::new();
    for request in reader.requests() {
        match request {
            Ok(request) => requests.push(request),
            Err(e) => eprintln!("Error reading request: {}", e),
        }
    }

    let responses = if cli.concurrent {
        join_all(requests.iter().cloned().map(|request| handler.handle(request))).await
    } else {
        let mut responses = Vec::with_capacity(requests.len());
        for request in requests.iter().cloned() {
            responses.push(handler.handle(request).await);
        }
        responses
    };

    let stdout = io::stdout();
    let mut writer = ResponseWriter::new(stdout.lock());
    for (request, response) in requests.iter().zip(&responses) {
        writer
            .write_response(request.id().as_str(), request.operation(), response)
            .into_diagnostic()?;
    }
    writer.flush().into_diagnostic()?;

    Ok(())
}
