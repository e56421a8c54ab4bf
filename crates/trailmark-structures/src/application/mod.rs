//! Application layer for the Structures context.

pub mod query_handlers;
