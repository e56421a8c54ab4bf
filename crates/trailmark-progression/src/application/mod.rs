//! Application layer for the Progression context.

pub mod query_handlers;
