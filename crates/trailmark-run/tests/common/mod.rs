//! Shared helpers for run integration tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use trailmark_core::event::DomainEvent;
use trailmark_core::world::{Location, WorldSpace};
use trailmark_progression::domain::definitions::StageDefinition;
use trailmark_run::application::coordinator::TickCoordinator;
use trailmark_run::domain::config::RunConfig;
use trailmark_run::domain::events::RunEvent;
use trailmark_test_support::{FixedClock, ManualClock, SPEEDRUN_STAGES_YAML, fixed_now};

/// The five-stage speedrun route.
pub fn speedrun() -> Vec<StageDefinition> {
    serde_yaml::from_str(SPEEDRUN_STAGES_YAML).unwrap()
}

/// Parses inline stage YAML.
pub fn stages(yaml: &str) -> Vec<StageDefinition> {
    serde_yaml::from_str(yaml).unwrap()
}

/// A coordinator on a fixed clock, with the run-start events drained.
pub fn started(definitions: Vec<StageDefinition>, config: RunConfig) -> TickCoordinator {
    let coordinator =
        TickCoordinator::new(definitions, config, Arc::new(FixedClock(fixed_now()))).unwrap();
    coordinator.take_pending_events();
    coordinator
}

/// A coordinator on a manual clock the test can advance, with the
/// run-start events drained.
pub fn started_with_clock(
    definitions: Vec<StageDefinition>,
    config: RunConfig,
) -> (TickCoordinator, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(fixed_now()));
    let coordinator = TickCoordinator::new(definitions, config, clock.clone()).unwrap();
    coordinator.take_pending_events();
    (coordinator, clock)
}

/// Event types in order.
pub fn types(events: &[RunEvent]) -> Vec<&'static str> {
    events.iter().map(DomainEvent::event_type).collect()
}

/// Builds an inventory map.
pub fn items(entries: &[(&str, u64)]) -> HashMap<String, u64> {
    entries
        .iter()
        .map(|(material, count)| ((*material).to_owned(), *count))
        .collect()
}

pub fn overworld(x: f64, z: f64) -> Location {
    Location::new(WorldSpace::Overworld, x, 64.0, z)
}

pub fn nether(x: f64, z: f64) -> Location {
    Location::new(WorldSpace::Nether, x, 64.0, z)
}
