//! Replay configuration read from the environment.

use std::path::PathBuf;
use std::time::Duration;

use trailmark_progression::domain::scaling::ScalingPolicy;
use trailmark_run::domain::config::{RunConfig, TrackingMode};

use crate::error::AppError;

/// Default tick period.
pub const DEFAULT_TICK_MILLIS: u64 = 1000;

/// Everything the replay needs to start.
#[derive(Debug, Clone, PartialEq)]
pub struct SimConfig {
    /// YAML file with the stage definitions.
    pub stages_path: PathBuf,
    /// JSON-lines file with the script.
    pub script_path: PathBuf,
    /// Period of the fixed-rate tick.
    pub tick_period: Duration,
    /// Run policy.
    pub run: RunConfig,
}

impl SimConfig {
    /// Reads the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a required variable is missing or any
    /// variable is malformed.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a required variable is missing or any
    /// variable is malformed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let stages_path = lookup("TRAILMARK_STAGES")
            .ok_or_else(|| AppError::Config("TRAILMARK_STAGES environment variable must be set".into()))?;
        let script_path = lookup("TRAILMARK_SCRIPT")
            .ok_or_else(|| AppError::Config("TRAILMARK_SCRIPT environment variable must be set".into()))?;

        let tick_millis = match lookup("TRAILMARK_TICK_MILLIS") {
            Some(value) => parse::<u64>("TRAILMARK_TICK_MILLIS", &value)?,
            None => DEFAULT_TICK_MILLIS,
        };
        if tick_millis == 0 {
            return Err(AppError::Config(
                "TRAILMARK_TICK_MILLIS must be greater than zero".into(),
            ));
        }

        let mut run = RunConfig::default();
        if let Some(value) = lookup("TRAILMARK_TRACKING_MODE") {
            run.tracking_mode = value
                .parse::<TrackingMode>()
                .map_err(|e| AppError::Config(format!("TRAILMARK_TRACKING_MODE: {e}")))?;
        }
        if let Some(value) = lookup("TRAILMARK_SCALING_MULTIPLIER") {
            run.scaling = ScalingPolicy {
                enabled: true,
                multiplier: parse("TRAILMARK_SCALING_MULTIPLIER", &value)?,
            };
        }
        if let Some(value) = lookup("TRAILMARK_VILLAGE_TIMEOUT_SECS") {
            run.village_search_timeout_secs = Some(parse("TRAILMARK_VILLAGE_TIMEOUT_SECS", &value)?);
        }
        if let Some(value) = lookup("TRAILMARK_PORTAL_REASSIGNMENT") {
            run.portal_reassignment = parse("TRAILMARK_PORTAL_REASSIGNMENT", &value)?;
        }
        run.validate()
            .map_err(|e| AppError::Config(e.to_string()))?;

        Ok(Self {
            stages_path: PathBuf::from(stages_path),
            script_path: PathBuf::from(script_path),
            tick_period: Duration::from_millis(tick_millis),
            run,
        })
    }
}

fn parse<T>(key: &str, value: &str) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| AppError::Config(format!("{key} is invalid: {e}")))
}
