//! Query handlers for the Progression context.
//!
//! Read-only, serializable views for presentation collaborators
//! (scoreboards, chat summaries). Views are plain copies and never borrow
//! the engine.

use serde::Serialize;
use trailmark_core::aggregate::AggregateRoot;
use trailmark_core::world::WorldSpace;
use uuid::Uuid;

use crate::domain::engine::ProgressionEngine;
use crate::domain::model::{Stage, Task, TaskKind};

/// Read-only view of one task.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskView {
    /// Task identifier.
    pub key: String,
    /// Human-readable name.
    pub display_name: String,
    /// `item` or `structure`.
    pub kind: &'static str,
    /// Material or landmark key.
    pub target: String,
    /// Current progress.
    pub progress: u32,
    /// Current requirement.
    pub required_amount: u32,
    /// Whether the task is completed.
    pub completed: bool,
}

/// Read-only view of one stage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageView {
    /// Stage identifier.
    pub key: String,
    /// Coordinate space of the stage.
    pub world: WorldSpace,
    /// Whether every task is completed.
    pub completed: bool,
    /// Whether this is the stage currently being played.
    pub current: bool,
    /// Tasks in display order.
    pub tasks: Vec<TaskView>,
}

/// Read-only view of a whole progression.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressionView {
    /// The run identifier.
    pub run_id: Uuid,
    /// Index of the current stage.
    pub current_stage_index: usize,
    /// Key of the current stage, if any remain.
    pub current_stage_key: Option<String>,
    /// Number of stages.
    pub stage_count: usize,
    /// Whether every stage has been completed.
    pub run_completed: bool,
    /// Stages in order.
    pub stages: Vec<StageView>,
    /// Events committed so far.
    pub version: i64,
}

/// Builds a [`ProgressionView`] of `engine`.
#[must_use]
pub fn get_progression_view(engine: &ProgressionEngine) -> ProgressionView {
    let state = engine.state();
    let current = state.current_stage_index();
    ProgressionView {
        run_id: engine.id,
        current_stage_index: current,
        current_stage_key: state.current_stage().map(|stage| stage.key.clone()),
        stage_count: state.stage_count(),
        run_completed: state.is_complete(),
        stages: state
            .stages()
            .iter()
            .enumerate()
            .map(|(index, stage)| stage_view(stage, index == current))
            .collect(),
        version: engine.version(),
    }
}

fn stage_view(stage: &Stage, current: bool) -> StageView {
    StageView {
        key: stage.key.clone(),
        world: stage.world,
        completed: stage.is_complete(),
        current,
        tasks: stage.tasks.iter().map(task_view).collect(),
    }
}

fn task_view(task: &Task) -> TaskView {
    let (kind, target) = match &task.kind {
        TaskKind::Item { material } => ("item", material.clone()),
        TaskKind::Structure { structure } => ("structure", structure.clone()),
    };
    TaskView {
        key: task.key.clone(),
        display_name: task.display_name.clone(),
        kind,
        target,
        progress: task.progress(),
        required_amount: task.required_amount(),
        completed: task.is_completed(),
    }
}
