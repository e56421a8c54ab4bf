//! Query handlers for the Run context.

use std::collections::BTreeMap;

use serde::Serialize;
use trailmark_core::clock::Clock;
use trailmark_core::world::ParticipantId;
use trailmark_progression::application::query_handlers::{ProgressionView, get_progression_view};
use trailmark_structures::application::query_handlers::{RegistryView, get_registry_view};
use uuid::Uuid;

use crate::application::coordinator::RunState;
use crate::domain::config::TrackingMode;

/// A consistent, owned copy of a whole run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSnapshot {
    /// The run identifier.
    pub run_id: Uuid,
    /// How item progress is measured.
    pub tracking_mode: TrackingMode,
    /// Participant count requirements are currently scaled for.
    pub participant_count: Option<u32>,
    /// Seconds since the run started.
    pub elapsed_secs: u64,
    /// Ticks evaluated in this run.
    pub ticks: u64,
    /// Stage and task progress.
    pub progression: ProgressionView,
    /// Landmarks, portal pair and village search.
    pub structures: RegistryView,
    /// All-time contributions per participant and material.
    pub contributions: BTreeMap<ParticipantId, BTreeMap<String, u64>>,
}

pub(crate) fn get_run_snapshot(
    state: &RunState,
    tracking_mode: TrackingMode,
    clock: &dyn Clock,
) -> RunSnapshot {
    RunSnapshot {
        run_id: state.run_id,
        tracking_mode,
        participant_count: state.scaled_for,
        elapsed_secs: clock.elapsed_since(state.started_at).as_secs(),
        ticks: state.ticks,
        progression: get_progression_view(&state.engine),
        structures: get_registry_view(&state.registry),
        contributions: state.ledger.contributions().clone(),
    }
}
