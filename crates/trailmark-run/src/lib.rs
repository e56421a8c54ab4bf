//! Trailmark — Run coordination.
//!
//! Owns every piece of mutable run state (progression, structure registry,
//! contribution ledger and inventory holdings) behind a single critical
//! section, and serializes periodic ticks against asynchronous
//! observations, resets and reloads.

pub mod application;
pub mod domain;
