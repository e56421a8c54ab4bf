//! Trailmark replay driver.
//!
//! Loads stage definitions and a scripted sequence of observations and
//! control steps, then plays them through a [`TickCoordinator`] on a
//! fixed-rate tick, logging every emitted event.
//!
//! [`TickCoordinator`]: trailmark_run::application::coordinator::TickCoordinator

pub mod config;
pub mod error;
pub mod runner;
pub mod script;
