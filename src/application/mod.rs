//! Application layer containing the lock-guarded workflow.
//!
//! `TransactionWorkflow` is the entry point for both operations. Each call runs
//! as one cooperative task: acquire the lock, run the business step, release.

pub mod workflow;
