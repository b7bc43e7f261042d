use crate::domain::lock::{LockKeyPolicy, OperationKind};
use crate::error::{Result, WorkflowError};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Environment variable prefix, e.g. `TXGUARD__LOCK__POLICY=global`.
pub const ENV_PREFIX: &str = "TXGUARD";

/// Settings handed to the workflow engine at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowConfig {
    pub lock: LockConfig,
    /// Budgets for creating a transaction.
    pub transaction: BudgetConfig,
    /// Budgets for applying a callback.
    pub callback: BudgetConfig,
    /// Simulated external processing after a transaction is saved.
    pub processing_delay_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LockConfig {
    /// Namespace every lock key starts with.
    pub key_prefix: String,
    pub policy: LockKeyPolicy,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BudgetConfig {
    /// How long to wait for the lock before giving up.
    pub wait_ms: u64,
    /// How long the lock is held before it expires on its own.
    pub lease_ms: u64,
}

impl BudgetConfig {
    pub fn wait(&self) -> Duration {
        Duration::from_millis(self.wait_ms)
    }

    pub fn lease(&self) -> Duration {
        Duration::from_millis(self.lease_ms)
    }
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            wait_ms: 30_000,
            lease_ms: 10_000,
        }
    }
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            key_prefix: "transaction_lock".to_string(),
            policy: LockKeyPolicy::default(),
        }
    }
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            lock: LockConfig::default(),
            transaction: BudgetConfig::default(),
            callback: BudgetConfig::default(),
            processing_delay_ms: 5_000,
        }
    }
}

impl WorkflowConfig {
    /// Loads defaults, then the optional file, then `TXGUARD__*` variables.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        if let Some(path) = path {
            if !path.exists() {
                return Err(WorkflowError::ValidationError(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            builder = builder.add_source(File::from(path));
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config: WorkflowConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.lock.key_prefix.trim().is_empty() {
            return Err(WorkflowError::ValidationError(
                "lock.key_prefix must not be empty".to_string(),
            ));
        }
        for kind in [OperationKind::Transaction, OperationKind::Callback] {
            if self.budgets(kind).lease_ms == 0 {
                return Err(WorkflowError::ValidationError(format!(
                    "{}.lease_ms must be greater than zero",
                    kind
                )));
            }
        }
        Ok(())
    }

    pub fn budgets(&self, kind: OperationKind) -> BudgetConfig {
        match kind {
            OperationKind::Transaction => self.transaction,
            OperationKind::Callback => self.callback,
        }
    }

    pub fn processing_delay(&self) -> Duration {
        Duration::from_millis(self.processing_delay_ms)
    }

    /// Problems with the configured durations that do not stop the engine
    /// but risk the lease lapsing while the business step still runs.
    pub fn lease_warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        let lease = self.transaction.lease();
        let delay = self.processing_delay();
        if delay >= lease {
            warnings.push(format!(
                "processing delay {:?} is not shorter than the transaction lease {:?}",
                delay, lease
            ));
        } else if delay * 5 >= lease * 4 {
            warnings.push(format!(
                "processing delay {:?} uses over 80% of the transaction lease {:?}",
                delay, lease
            ));
        }
        warnings
    }
}
