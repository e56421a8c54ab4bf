//! Domain layer for the Run context.

pub mod config;
pub mod events;
pub mod holdings;
pub mod ledger;
pub mod observations;
