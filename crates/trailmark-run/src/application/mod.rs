//! Application layer for the Run context.

pub mod coordinator;
pub mod query_handlers;
