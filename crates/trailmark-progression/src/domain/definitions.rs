//! Stage definitions and the stage loader.
//!
//! Definitions are the serde shape collaborators hand over at run start or
//! on reload. Loading validates each stage independently: a malformed stage
//! is reported and skipped while the remaining stages still load.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use trailmark_core::error::DomainError;
use trailmark_core::world::WorldSpace;

use super::model::{ProgressionState, Stage, Task};

const ITEM_PREFIX: &str = "ITEM_";
const STRUCTURE_PREFIX: &str = "STRUCTURE_";

/// Definition of one stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageDefinition {
    /// Stage identifier.
    pub key: String,
    /// Coordinate space the stage is played in.
    pub world: WorldSpace,
    /// Tasks of the stage, in display order.
    #[serde(default)]
    pub tasks: Vec<TaskDefinition>,
}

/// Task kind as written in a definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKindDefinition {
    /// Count a material.
    Item,
    /// Discover a landmark.
    Structure,
}

/// Definition of one task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskDefinition {
    /// Task identifier, unique within the run.
    pub key: String,
    /// Item or structure.
    pub kind: TaskKindDefinition,
    /// Material or landmark key. Defaults to `key` without its `ITEM_` /
    /// `STRUCTURE_` prefix.
    #[serde(default)]
    pub target: Option<String>,
    /// Base required amount. Mandatory for item tasks; structure tasks
    /// always require 1.
    #[serde(default)]
    pub amount: Option<u32>,
    /// Human-readable name. Defaults to the target in title case.
    #[serde(default)]
    pub display_name: Option<String>,
    /// Whether participant scaling applies (item tasks only).
    #[serde(default = "default_scaling_eligible")]
    pub scaling_eligible: bool,
}

fn default_scaling_eligible() -> bool {
    true
}

impl TaskDefinition {
    /// Shorthand for an item task with derived target and name.
    #[must_use]
    pub fn item(key: impl Into<String>, amount: u32) -> Self {
        Self {
            key: key.into(),
            kind: TaskKindDefinition::Item,
            target: None,
            amount: Some(amount),
            display_name: None,
            scaling_eligible: true,
        }
    }

    /// Shorthand for a structure task with derived target and name.
    #[must_use]
    pub fn structure(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            kind: TaskKindDefinition::Structure,
            target: None,
            amount: None,
            display_name: None,
            scaling_eligible: false,
        }
    }

    fn resolved_target(&self) -> &str {
        if let Some(target) = &self.target {
            return target;
        }
        let prefix = match self.kind {
            TaskKindDefinition::Item => ITEM_PREFIX,
            TaskKindDefinition::Structure => STRUCTURE_PREFIX,
        };
        self.key.strip_prefix(prefix).unwrap_or(&self.key)
    }
}

/// Outcome of [`load_stages`].
#[derive(Debug, Clone)]
pub struct StageLoadReport {
    /// Progression built from every valid stage.
    pub state: ProgressionState,
    /// One [`DomainError::Config`] per rejected stage, plus one when no
    /// stage could be loaded at all.
    pub errors: Vec<DomainError>,
}

/// Builds a fresh [`ProgressionState`] from `definitions`.
///
/// Stages keep their relative order. Invalid stages are skipped and
/// reported in [`StageLoadReport::errors`]; an empty result is reported but
/// is not an error for the caller.
#[must_use]
pub fn load_stages(definitions: &[StageDefinition]) -> StageLoadReport {
    let mut stages = Vec::with_capacity(definitions.len());
    let mut errors = Vec::new();
    let mut stage_keys = HashSet::new();
    let mut task_keys = HashSet::new();

    for definition in definitions {
        match build_stage(definition, &stage_keys, &task_keys) {
            Ok(stage) => {
                stage_keys.insert(stage.key.clone());
                task_keys.extend(stage.tasks.iter().map(|task| task.key.clone()));
                stages.push(stage);
            }
            Err(err) => {
                tracing::warn!(stage = %definition.key, error = %err, "skipping stage definition");
                errors.push(err);
            }
        }
    }

    if stages.is_empty() {
        tracing::warn!("no stages loaded; progression will not advance");
        errors.push(DomainError::config("", "no stages defined"));
    }

    StageLoadReport {
        state: ProgressionState::new(stages),
        errors,
    }
}

fn build_stage(
    definition: &StageDefinition,
    stage_keys: &HashSet<String>,
    task_keys: &HashSet<String>,
) -> Result<Stage, DomainError> {
    let stage_key = definition.key.trim();
    if stage_key.is_empty() {
        return Err(DomainError::config("", "missing stage key"));
    }
    if stage_keys.contains(stage_key) {
        return Err(DomainError::config(stage_key, "duplicate stage key"));
    }
    if definition.tasks.is_empty() {
        return Err(DomainError::config(stage_key, "stage has no tasks"));
    }

    let mut seen = HashSet::new();
    let mut tasks = Vec::with_capacity(definition.tasks.len());
    for task in &definition.tasks {
        let task_key = task.key.trim();
        if task_key.is_empty() {
            return Err(DomainError::config(stage_key, "task with empty key"));
        }
        if task_keys.contains(task_key) || !seen.insert(task_key) {
            return Err(DomainError::config(
                stage_key,
                format!("duplicate task key {task_key}"),
            ));
        }
        tasks.push(build_task(stage_key, task_key, task, definition.world)?);
    }

    Ok(Stage {
        key: stage_key.to_owned(),
        world: definition.world,
        tasks,
    })
}

fn build_task(
    stage_key: &str,
    task_key: &str,
    definition: &TaskDefinition,
    world: WorldSpace,
) -> Result<Task, DomainError> {
    let target = definition.resolved_target().trim();
    if target.is_empty() {
        return Err(DomainError::config(
            stage_key,
            format!("task {task_key} has no target"),
        ));
    }
    let display_name = definition
        .display_name
        .clone()
        .unwrap_or_else(|| title_case(target));

    match definition.kind {
        TaskKindDefinition::Item => {
            let amount = definition.amount.ok_or_else(|| {
                DomainError::config(stage_key, format!("item task {task_key} has no amount"))
            })?;
            Ok(Task::item(
                task_key,
                target,
                amount,
                display_name,
                world,
                definition.scaling_eligible,
            ))
        }
        TaskKindDefinition::Structure => match definition.amount {
            None | Some(1) => Ok(Task::structure(task_key, target, display_name, world)),
            Some(other) => Err(DomainError::config(
                stage_key,
                format!("structure task {task_key} must require 1, got {other}"),
            )),
        },
    }
}

/// `NETHER_FORTRESS` -> `Nether Fortress`.
fn title_case(target: &str) -> String {
    target
        .split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let lower = word.to_lowercase();
            let mut chars = lower.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
