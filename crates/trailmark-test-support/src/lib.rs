//! Shared test clocks and fixtures for the Trailmark workspace.

mod clock;
mod fixtures;

pub use clock::{FixedClock, ManualClock};
pub use fixtures::{SPEEDRUN_STAGES_YAML, fixed_now};
