//! The progression aggregate.

use trailmark_core::aggregate::AggregateRoot;
use trailmark_core::clock::Clock;
use trailmark_core::error::DomainError;
use trailmark_core::event::EventMetadata;
use trailmark_core::world::{ParticipantId, WorldSpace};
use tracing::{debug, info};
use uuid::Uuid;

use super::events::{
    ProgressionEvent, ProgressionEventKind, RUN_COMPLETED_EVENT_TYPE, RunCompleted,
    STAGE_ADVANCED_EVENT_TYPE, StageAdvanced, TASK_COMPLETED_EVENT_TYPE, TaskCompleted,
};
use super::materials::MaterialTally;
use super::model::{ProgressionState, Task, TaskKind};
use super::scaling::ScalingPolicy;

/// Where item progress is read from on a recompute.
#[derive(Clone, Copy)]
pub enum ItemProgressSource<'a> {
    /// Current holdings of the online participants. Progress is replaced by
    /// the fresh total on every recompute.
    Holdings(&'a dyn MaterialTally),
    /// All-time contributions. Progress only ever rises.
    Cumulative(&'a dyn MaterialTally),
}

/// The aggregate root for a run's progression.
#[derive(Debug)]
pub struct ProgressionEngine {
    /// Run identifier.
    pub id: Uuid,
    version: i64,
    state: ProgressionState,
    uncommitted_events: Vec<ProgressionEvent>,
}

impl ProgressionEngine {
    /// Wraps a freshly loaded progression.
    #[must_use]
    pub fn new(id: Uuid, state: ProgressionState) -> Self {
        Self {
            id,
            version: 0,
            state,
            uncommitted_events: Vec::new(),
        }
    }

    /// Read access to the progression.
    #[must_use]
    pub fn state(&self) -> &ProgressionState {
        &self.state
    }

    #[allow(clippy::cast_possible_wrap)]
    fn next_sequence_number(&self) -> i64 {
        self.version + self.uncommitted_events.len() as i64 + 1
    }

    fn record(&mut self, event_type: &str, kind: ProgressionEventKind, clock: &dyn Clock) {
        let metadata = EventMetadata::new(event_type, self.id, self.next_sequence_number(), clock);
        self.uncommitted_events
            .push(ProgressionEvent { metadata, kind });
    }

    fn record_task_completions(&mut self, completed: Vec<TaskCompleted>, clock: &dyn Clock) {
        for payload in completed {
            debug!(run_id = %self.id, task = %payload.task_key, "task completed");
            self.record(
                TASK_COMPLETED_EVENT_TYPE,
                ProgressionEventKind::TaskCompleted(payload),
                clock,
            );
        }
    }

    /// Recomputes the requirement of every task for `participant_count`
    /// participants. Only scaling-eligible item tasks are scaled; every other
    /// task requires its base amount. Completed tasks keep the requirement
    /// they were completed at. Idempotent.
    ///
    /// Progress is left alone, so a task may become satisfied (or stop being
    /// satisfied) until the next [`evaluate_completion`](Self::evaluate_completion).
    pub fn apply_scaling(&mut self, participant_count: u32, policy: &ScalingPolicy) {
        for (_, task) in self.state.tasks_mut() {
            let base = task.base_required_amount();
            let required = if task.scaling_eligible && task.is_item() {
                policy.required_for(base, participant_count)
            } else {
                base
            };
            task.set_required_amount(required);
        }
    }

    /// Refreshes progress of every incomplete item task from `source`.
    pub fn recompute_item_progress(&mut self, source: ItemProgressSource<'_>) {
        for (_, task) in self.state.tasks_mut() {
            if task.is_completed() {
                continue;
            }
            let target = match &task.kind {
                TaskKind::Item { material } => material,
                TaskKind::Structure { .. } => continue,
            };
            match source {
                ItemProgressSource::Holdings(tally) => {
                    let total = saturate(tally.total_matching(target));
                    task.set_progress(total);
                }
                ItemProgressSource::Cumulative(tally) => {
                    let total = saturate(tally.total_matching(target));
                    task.raise_progress(total);
                }
            }
        }
    }

    /// Credits the discovery of `structure` in `space` to every matching
    /// structure task, completing it. Tasks already completed are left alone.
    ///
    /// Returns `true` if at least one task was completed by this call.
    pub fn complete_structure_task(
        &mut self,
        structure: &str,
        space: WorldSpace,
        participant: Option<ParticipantId>,
        clock: &dyn Clock,
    ) -> bool {
        let completed: Vec<TaskCompleted> = self
            .state
            .tasks_mut()
            .filter(|(_, task)| {
                task.world == space
                    && matches!(&task.kind, TaskKind::Structure { structure: s } if s == structure)
            })
            .filter_map(|(stage_key, task)| {
                task.set_progress(task.required_amount());
                task.mark_completed()
                    .then(|| completion_payload(stage_key, task, participant))
            })
            .collect();

        let credited = !completed.is_empty();
        self.record_task_completions(completed, clock);
        credited
    }

    /// Completes every satisfied task, then advances at most one stage if
    /// the current stage is fully completed.
    ///
    /// Emits `TaskCompleted` for each newly completed task, `StageAdvanced`
    /// on advance and `RunCompleted` after the last stage. Returns whether
    /// the stage advanced.
    pub fn evaluate_completion(&mut self, clock: &dyn Clock) -> bool {
        let completed: Vec<TaskCompleted> = self
            .state
            .tasks_mut()
            .filter(|(_, task)| task.is_satisfied())
            .filter_map(|(stage_key, task)| {
                task.mark_completed()
                    .then(|| completion_payload(stage_key, task, None))
            })
            .collect();
        self.record_task_completions(completed, clock);

        let completed_stage_key = match self.state.current_stage() {
            Some(stage) if stage.is_complete() => stage.key.clone(),
            _ => return false,
        };
        let stage_index = self.state.advance();
        let stage_key = self.state.current_stage().map(|stage| stage.key.clone());
        info!(
            run_id = %self.id,
            stage = %completed_stage_key,
            next = ?stage_key,
            "stage completed"
        );
        self.record(
            STAGE_ADVANCED_EVENT_TYPE,
            ProgressionEventKind::StageAdvanced(StageAdvanced {
                completed_stage_key,
                stage_index,
                stage_key,
            }),
            clock,
        );

        if self.state.is_complete() {
            info!(run_id = %self.id, "run completed");
            let stage_count = self.state.stage_count();
            self.record(
                RUN_COMPLETED_EVENT_TYPE,
                ProgressionEventKind::RunCompleted(RunCompleted { stage_count }),
                clock,
            );
        }
        true
    }

    /// Re-runs [`evaluate_completion`](Self::evaluate_completion) until no
    /// stage advances. Returns the number of stages advanced.
    pub fn evaluate_until_settled(&mut self, clock: &dyn Clock) -> usize {
        let mut advanced = 0;
        while self.evaluate_completion(clock) {
            advanced += 1;
        }
        advanced
    }

    /// Force-completes every task of the current stage and propagates the
    /// resulting stage advances.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if there is no current stage (the
    /// run is complete or has no stages).
    pub fn skip_stage(&mut self, clock: &dyn Clock) -> Result<(), DomainError> {
        let Some(stage) = self.state.current_stage_mut() else {
            return Err(DomainError::Validation(
                "no stage left to skip".to_owned(),
            ));
        };
        let stage_key = stage.key.clone();
        info!(run_id = %self.id, stage = %stage_key, "skipping stage");
        let forced: Vec<TaskCompleted> = stage
            .tasks
            .iter_mut()
            .filter_map(|task| {
                task.mark_completed()
                    .then(|| completion_payload(&stage_key, task, None))
            })
            .collect();
        self.record_task_completions(forced, clock);
        self.evaluate_until_settled(clock);
        Ok(())
    }
}

impl AggregateRoot for ProgressionEngine {
    type Event = ProgressionEvent;

    fn aggregate_id(&self) -> Uuid {
        self.id
    }

    fn version(&self) -> i64 {
        self.version
    }

    fn uncommitted_events(&self) -> &[Self::Event] {
        &self.uncommitted_events
    }

    #[allow(clippy::cast_possible_wrap)]
    fn take_uncommitted_events(&mut self) -> Vec<Self::Event> {
        let events = std::mem::take(&mut self.uncommitted_events);
        self.version += events.len() as i64;
        events
    }
}

fn completion_payload(
    stage_key: &str,
    task: &Task,
    participant: Option<ParticipantId>,
) -> TaskCompleted {
    TaskCompleted {
        task_key: task.key.clone(),
        display_name: task.display_name.clone(),
        stage_key: stage_key.to_owned(),
        required_amount: task.required_amount(),
        participant,
    }
}

fn saturate(total: u64) -> u32 {
    u32::try_from(total).unwrap_or(u32::MAX)
}
