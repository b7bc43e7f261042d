//! Domain types and the ports the workflow talks through.

pub mod lock;
pub mod money;
pub mod ports;
pub mod transaction;
