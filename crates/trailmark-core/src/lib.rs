//! Trailmark Core — shared domain abstractions.
//!
//! This crate defines the traits and value types that every bounded context
//! depends on: aggregates, domain events, the clock seam, the error taxonomy
//! and the world coordinate types. It contains no run state of its own.

pub mod aggregate;
pub mod clock;
pub mod error;
pub mod event;
pub mod world;
