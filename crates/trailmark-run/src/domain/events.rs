//! Events delivered to run collaborators.

use serde::{Deserialize, Serialize};
use trailmark_core::error::DomainError;
use trailmark_core::event::{DomainEvent, EventMetadata};
use trailmark_progression::domain::events::ProgressionEvent;
use trailmark_structures::domain::events::StructureEvent;

/// Event type for [`RunStarted`].
pub const RUN_STARTED_EVENT_TYPE: &str = "run.started";
/// Event type for [`ConfigRejected`].
pub const CONFIG_REJECTED_EVENT_TYPE: &str = "run.config_rejected";

/// Why a run (re)started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StartReason {
    /// First start of the coordinator.
    Initial,
    /// All state was discarded.
    Reset,
    /// Stages were replaced; discoveries were kept.
    Reload,
}

/// Emitted whenever a new run id comes into force.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunStarted {
    /// Why the run started.
    pub reason: StartReason,
    /// Number of stages loaded.
    pub stage_count: usize,
}

/// Emitted per stage definition that failed to load. Warning level: the
/// rest of the stages still loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigRejected {
    /// Offending stage key, empty when the problem is not tied to a stage.
    pub stage: String,
    /// What was wrong.
    pub reason: String,
}

impl From<&DomainError> for ConfigRejected {
    fn from(error: &DomainError) -> Self {
        match error {
            DomainError::Config { stage, reason } => Self {
                stage: stage.clone(),
                reason: reason.clone(),
            },
            other => Self {
                stage: String::new(),
                reason: other.to_string(),
            },
        }
    }
}

/// Event payload variants for the run lifecycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RunLifecycleEventKind {
    /// A run started.
    RunStarted(RunStarted),
    /// A stage definition was skipped.
    ConfigRejected(ConfigRejected),
}

/// Domain event envelope for the run lifecycle.
#[derive(Debug, Clone, PartialEq)]
pub struct RunLifecycleEvent {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// Event-specific payload.
    pub kind: RunLifecycleEventKind,
}

impl DomainEvent for RunLifecycleEvent {
    fn event_type(&self) -> &'static str {
        match &self.kind {
            RunLifecycleEventKind::RunStarted(_) => RUN_STARTED_EVENT_TYPE,
            RunLifecycleEventKind::ConfigRejected(_) => CONFIG_REJECTED_EVENT_TYPE,
        }
    }

    fn to_payload(&self) -> serde_json::Value {
        // Serialization of derived Serialize types to Value is infallible.
        serde_json::to_value(&self.kind).expect("RunLifecycleEventKind serialization is infallible")
    }

    fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }
}

/// Every event a run hands to its collaborators, in emission order.
#[derive(Debug, Clone, PartialEq)]
pub enum RunEvent {
    /// Run start or rejected configuration.
    Lifecycle(RunLifecycleEvent),
    /// Task and stage progress.
    Progression(ProgressionEvent),
    /// Landmark discovery, portal pairing and village search.
    Structure(StructureEvent),
}

impl RunEvent {
    fn inner(&self) -> &dyn DomainEvent {
        match self {
            Self::Lifecycle(event) => event,
            Self::Progression(event) => event,
            Self::Structure(event) => event,
        }
    }
}

impl DomainEvent for RunEvent {
    fn event_type(&self) -> &'static str {
        self.inner().event_type()
    }

    fn to_payload(&self) -> serde_json::Value {
        self.inner().to_payload()
    }

    fn metadata(&self) -> &EventMetadata {
        self.inner().metadata()
    }
}

impl From<RunLifecycleEvent> for RunEvent {
    fn from(event: RunLifecycleEvent) -> Self {
        Self::Lifecycle(event)
    }
}

impl From<ProgressionEvent> for RunEvent {
    fn from(event: ProgressionEvent) -> Self {
        Self::Progression(event)
    }
}

impl From<StructureEvent> for RunEvent {
    fn from(event: StructureEvent) -> Self {
        Self::Structure(event)
    }
}
