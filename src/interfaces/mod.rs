//! Boundary between external requests and the workflow.

pub mod csv;
pub mod handler;
