//! Stage and task bookkeeping.
//!
//! Plain data with completion rules and no event emission; the
//! [`ProgressionEngine`](super::engine::ProgressionEngine) owns a
//! [`ProgressionState`] and turns its transitions into domain events.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use trailmark_core::world::WorldSpace;

/// What a task counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TaskKind {
    /// Quantity of a material (or material group) held or collected.
    Item {
        /// Concrete material or canonical group name.
        material: String,
    },
    /// Discovery of a landmark.
    Structure {
        /// Landmark key, e.g. `VILLAGE`.
        structure: String,
    },
}

/// One objective of a stage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Task {
    /// Identifier, unique within the run.
    pub key: String,
    /// What the task counts.
    pub kind: TaskKind,
    /// Human-readable name.
    pub display_name: String,
    /// Coordinate space the task applies to.
    pub world: WorldSpace,
    /// Whether participant scaling applies.
    pub scaling_eligible: bool,
    base_required_amount: u32,
    required_amount: u32,
    progress: u32,
    completed: bool,
}

impl Task {
    /// Creates an item task requiring `amount` of `material`.
    #[must_use]
    pub fn item(
        key: impl Into<String>,
        material: impl Into<String>,
        amount: u32,
        display_name: impl Into<String>,
        world: WorldSpace,
        scaling_eligible: bool,
    ) -> Self {
        Self {
            key: key.into(),
            kind: TaskKind::Item {
                material: material.into(),
            },
            display_name: display_name.into(),
            world,
            scaling_eligible,
            base_required_amount: amount,
            required_amount: amount,
            progress: 0,
            completed: false,
        }
    }

    /// Creates a structure task. Structure tasks always require exactly one
    /// discovery and are never scaled.
    #[must_use]
    pub fn structure(
        key: impl Into<String>,
        structure: impl Into<String>,
        display_name: impl Into<String>,
        world: WorldSpace,
    ) -> Self {
        Self {
            key: key.into(),
            kind: TaskKind::Structure {
                structure: structure.into(),
            },
            display_name: display_name.into(),
            world,
            scaling_eligible: false,
            base_required_amount: 1,
            required_amount: 1,
            progress: 0,
            completed: false,
        }
    }

    /// Requirement before scaling.
    #[must_use]
    pub fn base_required_amount(&self) -> u32 {
        self.base_required_amount
    }

    /// Current (possibly scaled) requirement.
    #[must_use]
    pub fn required_amount(&self) -> u32 {
        self.required_amount
    }

    /// Current progress toward the requirement.
    #[must_use]
    pub fn progress(&self) -> u32 {
        self.progress
    }

    /// Whether the task has been completed. Never reverts within a run.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.completed
    }

    /// Whether progress meets the current requirement.
    #[must_use]
    pub fn is_satisfied(&self) -> bool {
        self.progress >= self.required_amount
    }

    /// Whether this is an item task.
    #[must_use]
    pub fn is_item(&self) -> bool {
        matches!(self.kind, TaskKind::Item { .. })
    }

    /// Replaces progress. Ignored once completed.
    pub(crate) fn set_progress(&mut self, value: u32) {
        if !self.completed {
            self.progress = value;
        }
    }

    /// Raises progress to `value` if higher. Ignored once completed.
    pub(crate) fn raise_progress(&mut self, value: u32) {
        if !self.completed {
            self.progress = self.progress.max(value);
        }
    }

    /// Marks the task completed, clamping progress to the requirement.
    /// Returns `false` if it was already completed.
    pub(crate) fn mark_completed(&mut self) -> bool {
        if self.completed {
            return false;
        }
        self.completed = true;
        self.progress = self.required_amount;
        true
    }

    /// Sets a new requirement. Ignored once completed, so a completed
    /// task's progress never moves again.
    pub(crate) fn set_required_amount(&mut self, required: u32) {
        if !self.completed {
            self.required_amount = required;
        }
    }
}

/// A named, ordered group of tasks.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stage {
    /// Stage identifier.
    pub key: String,
    /// Coordinate space the stage is played in.
    pub world: WorldSpace,
    /// Tasks gating the next stage.
    pub tasks: Vec<Task>,
}

impl Stage {
    /// Whether every task in the stage is completed.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.tasks.iter().all(Task::is_completed)
    }
}

/// The whole progression of a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProgressionState {
    stages: Vec<Stage>,
    current_stage_index: usize,
}

impl ProgressionState {
    /// Starts a progression at the first stage.
    #[must_use]
    pub fn new(stages: Vec<Stage>) -> Self {
        Self {
            stages,
            current_stage_index: 0,
        }
    }

    /// Index of the stage currently being played; equals
    /// [`stage_count`](Self::stage_count) once everything is complete.
    #[must_use]
    pub fn current_stage_index(&self) -> usize {
        self.current_stage_index
    }

    /// Number of stages.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// All stages, in order.
    #[must_use]
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Stage keys, in order.
    #[must_use]
    pub fn ordered_stage_keys(&self) -> Vec<&str> {
        self.stages.iter().map(|stage| stage.key.as_str()).collect()
    }

    /// The stage currently being played, if any remain.
    #[must_use]
    pub fn current_stage(&self) -> Option<&Stage> {
        self.stages.get(self.current_stage_index)
    }

    /// Whether every stage has been completed. A progression without stages
    /// is never complete.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.stages.is_empty() && self.current_stage_index >= self.stages.len()
    }

    /// Every task, in stage order.
    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.stages.iter().flat_map(|stage| stage.tasks.iter())
    }

    /// Looks up a task by key.
    #[must_use]
    pub fn task(&self, key: &str) -> Option<&Task> {
        self.tasks().find(|task| task.key == key)
    }

    /// Landmark keys targeted by any structure task.
    #[must_use]
    pub fn structure_targets(&self) -> BTreeSet<String> {
        self.tasks()
            .filter_map(|task| match &task.kind {
                TaskKind::Structure { structure } => Some(structure.clone()),
                TaskKind::Item { .. } => None,
            })
            .collect()
    }

    /// Whether any structure task targets `structure` in `space`.
    #[must_use]
    pub fn targets_structure_in(&self, structure: &str, space: WorldSpace) -> bool {
        self.tasks().any(|task| {
            task.world == space
                && matches!(&task.kind, TaskKind::Structure { structure: s } if s == structure)
        })
    }

    pub(crate) fn tasks_mut(&mut self) -> impl Iterator<Item = (&str, &mut Task)> {
        self.stages.iter_mut().flat_map(|stage| {
            let Stage { key, tasks, .. } = stage;
            let key: &str = key;
            tasks.iter_mut().map(move |task| (key, task))
        })
    }

    pub(crate) fn current_stage_mut(&mut self) -> Option<&mut Stage> {
        self.stages.get_mut(self.current_stage_index)
    }

    /// Moves to the next stage and returns the new index.
    pub(crate) fn advance(&mut self) -> usize {
        if self.current_stage_index < self.stages.len() {
            self.current_stage_index += 1;
        }
        self.current_stage_index
    }
}
