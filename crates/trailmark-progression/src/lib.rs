//! Trailmark — Progression bounded context.
//!
//! Responsible for the ordered stages of a run, their item and structure
//! tasks, participant-count scaling, and stage advancement.

pub mod application;
pub mod domain;
