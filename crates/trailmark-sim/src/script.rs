//! Stage files and replay scripts.
//!
//! A script is JSON lines, one [`ScriptStep`] per line. Blank lines and
//! lines starting with `#` are skipped.

use std::path::Path;

use serde::Deserialize;
use trailmark_progression::domain::definitions::StageDefinition;
use trailmark_run::domain::observations::Observation;
use trailmark_structures::domain::triangulation::Bearing;

use crate::error::AppError;

/// Height given to predicted landmarks when a step names none.
pub const DEFAULT_PREDICTION_HEIGHT: f64 = 64.0;

fn default_prediction_height() -> f64 {
    DEFAULT_PREDICTION_HEIGHT
}

/// One scripted step.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum ScriptStep {
    /// Push an observation immediately.
    Observe {
        /// The observation.
        observation: Observation,
    },
    /// Wait for the next tick, then evaluate it.
    Tick {
        /// Online participants during the tick.
        participants: u32,
    },
    /// Force-complete the current stage.
    SkipStage,
    /// Discard the run and start over.
    Reset,
    /// Replace the stage definitions.
    Reload {
        /// New definitions.
        stages: Vec<StageDefinition>,
    },
    /// Predict a landmark from two bearings.
    Predict {
        /// Landmark being searched for, for the log.
        key: String,
        /// First bearing.
        first: Bearing,
        /// Second bearing.
        second: Bearing,
        /// Height of the predicted point.
        #[serde(default = "default_prediction_height")]
        placeholder_y: f64,
    },
}

/// Parses a JSON-lines script.
///
/// # Errors
///
/// Returns `AppError::Script` naming the first line that is not a valid
/// step.
pub fn parse_script(text: &str) -> Result<Vec<ScriptStep>, AppError> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| {
            let line = line.trim();
            !line.is_empty() && !line.starts_with('#')
        })
        .map(|(index, line)| {
            serde_json::from_str(line).map_err(|source| AppError::Script {
                line: index + 1,
                source,
            })
        })
        .collect()
}

/// Parses stage definitions from YAML.
///
/// # Errors
///
/// Returns `AppError::Stages` if the text is not a list of stage
/// definitions.
pub fn parse_stages(text: &str) -> Result<Vec<StageDefinition>, AppError> {
    Ok(serde_yaml::from_str(text)?)
}

/// Reads and parses a script file.
///
/// # Errors
///
/// Returns `AppError::Io` if the file cannot be read and `AppError::Script`
/// if a line is malformed.
pub async fn load_script(path: &Path) -> Result<Vec<ScriptStep>, AppError> {
    let text = tokio::fs::read_to_string(path).await?;
    parse_script(&text)
}

/// Reads and parses a stage file.
///
/// # Errors
///
/// Returns `AppError::Io` if the file cannot be read and `AppError::Stages`
/// if it is malformed.
pub async fn load_stages(path: &Path) -> Result<Vec<StageDefinition>, AppError> {
    let text = tokio::fs::read_to_string(path).await?;
    parse_stages(&text)
}
