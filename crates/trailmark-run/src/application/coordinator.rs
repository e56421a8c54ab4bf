//! The tick coordinator.
//!
//! [`TickCoordinator`] is the single owner of mutable run state. Every
//! operation (observation, tick, skip, reset, reload, snapshot) runs inside
//! one critical section over the whole [`RunState`], so observations are
//! applied in a serialized order and no caller ever sees a half-applied tick
//! or a mix of two runs.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use trailmark_core::aggregate::AggregateRoot;
use trailmark_core::clock::Clock;
use trailmark_core::error::DomainError;
use trailmark_core::event::EventMetadata;
use trailmark_core::world::Location;
use trailmark_progression::domain::definitions::{StageDefinition, load_stages};
use trailmark_progression::domain::engine::{ItemProgressSource, ProgressionEngine};
use trailmark_progression::domain::model::{ProgressionState, TaskKind};
use trailmark_structures::domain::events::{StructureEvent, StructureEventKind};
use trailmark_structures::domain::portal::NETHER_PORTAL;
use trailmark_structures::domain::registry::{StructureRecord, StructureRegistry};
use trailmark_structures::domain::triangulation::{Bearing, predict_location};
use trailmark_structures::domain::village::VILLAGE;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::application::query_handlers::{RunSnapshot, get_run_snapshot};
use crate::domain::config::{RunConfig, TrackingMode};
use crate::domain::events::{
    CONFIG_REJECTED_EVENT_TYPE, ConfigRejected, RUN_STARTED_EVENT_TYPE, RunEvent,
    RunLifecycleEvent, RunLifecycleEventKind, RunStarted, StartReason,
};
use crate::domain::holdings::InventoryHoldings;
use crate::domain::ledger::ContributionLedger;
use crate::domain::observations::Observation;

/// Everything a run owns. Only ever touched under the coordinator's lock.
#[derive(Debug)]
pub(crate) struct RunState {
    pub(crate) run_id: Uuid,
    pub(crate) definitions: Vec<StageDefinition>,
    pub(crate) engine: ProgressionEngine,
    pub(crate) registry: StructureRegistry,
    pub(crate) ledger: ContributionLedger,
    pub(crate) holdings: InventoryHoldings,
    /// Participant count the requirements were last scaled for.
    pub(crate) scaled_for: Option<u32>,
    pub(crate) started_at: DateTime<Utc>,
    /// When the current village search began; timeouts count from here.
    village_search_from: DateTime<Utc>,
    pub(crate) ticks: u64,
    lifecycle_version: i64,
    pending: Vec<RunEvent>,
}

impl RunState {
    /// Builds a fresh run from `definitions`. Rejected stages are queued as
    /// `ConfigRejected` events behind a `RunStarted`.
    fn start(
        definitions: Vec<StageDefinition>,
        config: &RunConfig,
        reason: StartReason,
        clock: &dyn Clock,
    ) -> Self {
        let run_id = Uuid::new_v4();
        let report = load_stages(&definitions);
        let registry = StructureRegistry::new(
            run_id,
            tracked_structures(&report.state),
            config.portal_reassignment,
        );
        let mut state = Self {
            run_id,
            definitions,
            engine: ProgressionEngine::new(run_id, report.state),
            registry,
            ledger: ContributionLedger::default(),
            holdings: InventoryHoldings::default(),
            scaled_for: None,
            started_at: clock.now(),
            village_search_from: clock.now(),
            ticks: 0,
            lifecycle_version: 0,
            pending: Vec::new(),
        };
        state.announce(reason, &report.errors, clock);
        state
    }

    fn announce(&mut self, reason: StartReason, errors: &[DomainError], clock: &dyn Clock) {
        let stage_count = self.engine.state().stage_count();
        info!(run_id = %self.run_id, ?reason, stage_count, "run started");
        self.push_lifecycle(
            RUN_STARTED_EVENT_TYPE,
            RunLifecycleEventKind::RunStarted(RunStarted {
                reason,
                stage_count,
            }),
            clock,
        );
        for error in errors {
            warn!(run_id = %self.run_id, %error, "stage definition rejected");
            self.push_lifecycle(
                CONFIG_REJECTED_EVENT_TYPE,
                RunLifecycleEventKind::ConfigRejected(ConfigRejected::from(error)),
                clock,
            );
        }
    }

    fn push_lifecycle(&mut self, event_type: &str, kind: RunLifecycleEventKind, clock: &dyn Clock) {
        self.lifecycle_version += 1;
        let metadata = EventMetadata::new(event_type, self.run_id, self.lifecycle_version, clock);
        self.pending
            .push(RunEvent::Lifecycle(RunLifecycleEvent { metadata, kind }));
    }

    fn drain_progression(&mut self, out: &mut Vec<RunEvent>) {
        out.extend(
            self.engine
                .take_uncommitted_events()
                .into_iter()
                .map(RunEvent::from),
        );
    }

    /// Drains registry events, crediting each discovery to the progression
    /// before forwarding it. The resulting task completions follow the
    /// discovery that caused them.
    fn drain_structures(&mut self, out: &mut Vec<RunEvent>, clock: &dyn Clock) {
        for event in self.registry.take_uncommitted_events() {
            self.credit_discovery(&event, clock);
            out.push(RunEvent::from(event));
            self.drain_progression(out);
        }
    }

    fn credit_discovery(&mut self, event: &StructureEvent, clock: &dyn Clock) {
        match &event.kind {
            StructureEventKind::StructureFound(found) => {
                self.engine.complete_structure_task(
                    &found.key,
                    found.location.space,
                    found.participant,
                    clock,
                );
            }
            StructureEventKind::PortalPairUpdated(update) => {
                self.engine.complete_structure_task(
                    NETHER_PORTAL,
                    update.location.space,
                    update.participant,
                    clock,
                );
            }
            StructureEventKind::VillageSearchFailed(_) => {}
        }
    }

    /// Credits landmarks already known to the registry to a freshly loaded
    /// progression.
    fn recredit_discoveries(&mut self, clock: &dyn Clock) {
        let found: Vec<StructureRecord> = self
            .registry
            .records()
            .filter(|record| record.is_found())
            .cloned()
            .collect();
        for record in found {
            if let Some(location) = record.location {
                self.engine.complete_structure_task(
                    &record.key,
                    location.space,
                    record.found_by,
                    clock,
                );
            }
        }
        let portal = *self.registry.portal();
        for side in [portal.overworld(), portal.nether()].into_iter().flatten() {
            self.engine
                .complete_structure_task(NETHER_PORTAL, side.space, None, clock);
        }
    }

    fn take_pending(&mut self) -> Vec<RunEvent> {
        std::mem::take(&mut self.pending)
    }
}

/// Landmarks targeted by the structure tasks of `state`, named after the
/// first task targeting each.
fn tracked_structures(state: &ProgressionState) -> Vec<StructureRecord> {
    let mut records: BTreeMap<&str, StructureRecord> = BTreeMap::new();
    for task in state.tasks() {
        if let TaskKind::Structure { structure } = &task.kind {
            records
                .entry(structure.as_str())
                .or_insert_with(|| StructureRecord::new(structure.clone(), task.display_name.clone()));
        }
    }
    records.into_values().collect()
}

/// Single authority over the mutable state of a run.
///
/// Share it behind an `Arc`; every method takes `&self` and serializes on
/// an internal lock.
pub struct TickCoordinator {
    config: RunConfig,
    clock: Arc<dyn Clock>,
    state: Mutex<RunState>,
}

impl std::fmt::Debug for TickCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TickCoordinator")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl TickCoordinator {
    /// Starts a run over `definitions`.
    ///
    /// Malformed stages do not fail construction; they surface as
    /// `ConfigRejected` events on the first drain (the first observation,
    /// tick or control call).
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if `config` fails
    /// [`RunConfig::validate`].
    pub fn new(
        definitions: Vec<StageDefinition>,
        config: RunConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, DomainError> {
        config.validate()?;
        let state = RunState::start(definitions, &config, StartReason::Initial, clock.as_ref());
        Ok(Self {
            config,
            clock,
            state: Mutex::new(state),
        })
    }

    /// The run policy.
    #[must_use]
    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Identifier of the current run.
    #[must_use]
    pub fn run_id(&self) -> Uuid {
        self.lock().run_id
    }

    fn lock(&self) -> MutexGuard<'_, RunState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns run-start and rejected-configuration events not yet
    /// delivered by another call.
    pub fn take_pending_events(&self) -> Vec<RunEvent> {
        self.lock().take_pending()
    }

    /// Applies one observation immediately.
    ///
    /// Discoveries complete matching structure tasks right away; stages only
    /// advance on the next [`tick`](Self::tick).
    ///
    /// # Errors
    ///
    /// Returns `DomainError::UnknownStructure` for an untracked landmark,
    /// `DomainError::ReassignmentDisabled` for a relight of a linked portal
    /// pair when reassignment is off, and `DomainError::Validation` for a
    /// portal lit where no portal side exists, a landmark report naming
    /// the portal, or a landmark reported in a world no task looks for it
    /// in. A rejected observation changes nothing.
    pub fn on_observation(&self, observation: Observation) -> Result<Vec<RunEvent>, DomainError> {
        let clock = self.clock.as_ref();
        let mut guard = self.lock();
        let state = &mut *guard;
        let name = observation.name();

        let applied = match observation {
            Observation::InventorySnapshot { participant, items } => {
                state.holdings.replace(participant, items);
                Ok(())
            }
            Observation::ItemDelta {
                participant,
                material,
                amount,
            } => {
                state.ledger.record(participant, &material, amount);
                Ok(())
            }
            Observation::ParticipantLeft { participant } => {
                if state.holdings.remove(participant) {
                    debug!(run_id = %state.run_id, %participant, "participant holdings dropped");
                }
                Ok(())
            }
            Observation::StructureFound {
                key,
                location,
                participant,
            } => {
                if state.registry.is_tracked(&key)
                    && !state
                        .engine
                        .state()
                        .targets_structure_in(&key, location.space)
                {
                    Err(DomainError::Validation(format!(
                        "no task looks for {key} in the {}",
                        location.space
                    )))
                } else {
                    state.registry.record_found(&key, location, participant, clock)
                }
            }
            Observation::PortalLit {
                location,
                participant,
            } => state.registry.record_portal_lit(location, participant, clock),
            Observation::PortalExit { location } => {
                state.registry.record_portal_exit(location, clock);
                Ok(())
            }
        };

        if let Err(error) = applied {
            warn!(run_id = %state.run_id, observation = name, %error, "observation rejected");
            return Err(error);
        }

        let mut events = state.take_pending();
        state.drain_structures(&mut events, clock);
        Ok(events)
    }

    /// Runs one tick for `participant_count` online participants.
    ///
    /// In order: rescales requirements if the count changed, recomputes item
    /// progress, evaluates completion until no stage advances, then
    /// evaluates the village search timeout. Returns the tick's events in
    /// emission order.
    pub fn tick(&self, participant_count: u32) -> Vec<RunEvent> {
        let clock = self.clock.as_ref();
        let mut guard = self.lock();
        let state = &mut *guard;
        state.ticks += 1;

        if state.scaled_for != Some(participant_count) {
            state
                .engine
                .apply_scaling(participant_count, &self.config.scaling);
            state.scaled_for = Some(participant_count);
            debug!(run_id = %state.run_id, participant_count, "requirements rescaled");
        }

        let source = match self.config.tracking_mode {
            TrackingMode::Inventory => ItemProgressSource::Holdings(&state.holdings),
            TrackingMode::Cumulative => ItemProgressSource::Cumulative(&state.ledger),
        };
        state.engine.recompute_item_progress(source);
        state.engine.evaluate_until_settled(clock);

        if let Some(timeout_secs) = self.config.village_search_timeout_secs {
            let elapsed = clock.elapsed_since(state.village_search_from);
            state
                .registry
                .evaluate_village_timeout(elapsed, Duration::from_secs(timeout_secs), clock);
        }

        let mut events = state.take_pending();
        state.drain_progression(&mut events);
        state.drain_structures(&mut events, clock);
        debug!(run_id = %state.run_id, tick = state.ticks, events = events.len(), "tick evaluated");
        events
    }

    /// Force-completes the current stage and propagates every stage advance
    /// that follows from it.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if no stage is left to skip.
    pub fn skip_stage(&self) -> Result<Vec<RunEvent>, DomainError> {
        let clock = self.clock.as_ref();
        let mut guard = self.lock();
        let state = &mut *guard;
        state.engine.skip_stage(clock)?;
        let mut events = state.take_pending();
        state.drain_progression(&mut events);
        Ok(events)
    }

    /// Discards all run state and starts over with the same definitions
    /// under a new run id.
    ///
    /// The new state is swapped in within the critical section, so a
    /// concurrent tick or observation lands entirely in the old run or
    /// entirely in the new one. Undelivered events of the old run are
    /// dropped.
    pub fn reset(&self) -> Vec<RunEvent> {
        let clock = self.clock.as_ref();
        let mut guard = self.lock();
        let definitions = guard.definitions.clone();
        let previous = guard.run_id;
        *guard = RunState::start(definitions, &self.config, StartReason::Reset, clock);
        info!(previous_run_id = %previous, run_id = %guard.run_id, "run reset");
        guard.take_pending()
    }

    /// Replaces the stage definitions.
    ///
    /// The progression restarts at the first stage with every task reset,
    /// while landmark discoveries, portal sides, contributions and holdings
    /// are kept; structure tasks of already found landmarks are credited
    /// again. A new run id comes into force. A village search that starts
    /// with the reload is timed from the reload.
    pub fn reload(&self, definitions: Vec<StageDefinition>) -> Vec<RunEvent> {
        let clock = self.clock.as_ref();
        let mut guard = self.lock();
        let state = &mut *guard;

        let run_id = Uuid::new_v4();
        let report = load_stages(&definitions);
        for record in tracked_structures(&report.state) {
            let village = record.key == VILLAGE;
            if state.registry.track(record) && village {
                state.village_search_from = clock.now();
            }
        }
        state.registry.id = run_id;
        state.engine = ProgressionEngine::new(run_id, report.state);
        state.run_id = run_id;
        state.definitions = definitions;
        state.scaled_for = None;
        state.lifecycle_version = 0;
        state.pending.clear();
        state.announce(StartReason::Reload, &report.errors, clock);
        state.recredit_discoveries(clock);

        let mut events = state.take_pending();
        state.drain_progression(&mut events);
        events
    }

    /// A consistent copy of the run for presentation.
    #[must_use]
    pub fn snapshot(&self) -> RunSnapshot {
        let guard = self.lock();
        get_run_snapshot(&guard, self.config.tracking_mode, self.clock.as_ref())
    }

    /// Predicts an undiscovered landmark from two bearings. Reads no run
    /// state.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the bearings were taken in
    /// different coordinate spaces.
    pub fn predict_landmark(
        first: &Bearing,
        second: &Bearing,
        placeholder_y: f64,
    ) -> Result<Option<Location>, DomainError> {
        predict_location(first, second, placeholder_y)
    }
}
