//! Trailmark — Structures bounded context.
//!
//! Responsible for landmark discovery state, the two-sided nether portal
//! pair, the village search timer, and bearing triangulation.

pub mod application;
pub mod domain;
