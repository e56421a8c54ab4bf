//! Domain events for the Progression context.

use serde::{Deserialize, Serialize};
use trailmark_core::event::{DomainEvent, EventMetadata};
use trailmark_core::world::ParticipantId;

/// Event type for [`TaskCompleted`].
pub const TASK_COMPLETED_EVENT_TYPE: &str = "progression.task_completed";
/// Event type for [`StageAdvanced`].
pub const STAGE_ADVANCED_EVENT_TYPE: &str = "progression.stage_advanced";
/// Event type for [`RunCompleted`].
pub const RUN_COMPLETED_EVENT_TYPE: &str = "progression.run_completed";

/// Emitted when a task reaches its requirement (or is force-completed).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskCompleted {
    /// The completed task.
    pub task_key: String,
    /// Its display name.
    pub display_name: String,
    /// The stage the task belongs to.
    pub stage_key: String,
    /// Requirement at the moment of completion.
    pub required_amount: u32,
    /// Participant credited with the completion, for structure discoveries.
    pub participant: Option<ParticipantId>,
}

/// Emitted when the current stage index moves forward by one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageAdvanced {
    /// The stage that was just completed.
    pub completed_stage_key: String,
    /// The new current stage index.
    pub stage_index: usize,
    /// Key of the new current stage, `None` after the last one.
    pub stage_key: Option<String>,
}

/// Emitted once, when the last stage completes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunCompleted {
    /// Number of stages completed.
    pub stage_count: usize,
}

/// Event payload variants for the Progression context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ProgressionEventKind {
    /// A task has been completed.
    TaskCompleted(TaskCompleted),
    /// The run moved to the next stage.
    StageAdvanced(StageAdvanced),
    /// Every stage has been completed.
    RunCompleted(RunCompleted),
}

/// Domain event envelope for the Progression context.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressionEvent {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// Event-specific payload.
    pub kind: ProgressionEventKind,
}

impl DomainEvent for ProgressionEvent {
    fn event_type(&self) -> &'static str {
        match &self.kind {
            ProgressionEventKind::TaskCompleted(_) => TASK_COMPLETED_EVENT_TYPE,
            ProgressionEventKind::StageAdvanced(_) => STAGE_ADVANCED_EVENT_TYPE,
            ProgressionEventKind::RunCompleted(_) => RUN_COMPLETED_EVENT_TYPE,
        }
    }

    fn to_payload(&self) -> serde_json::Value {
        // Serialization of derived Serialize types to Value is infallible.
        serde_json::to_value(&self.kind).expect("ProgressionEventKind serialization is infallible")
    }

    fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }
}
