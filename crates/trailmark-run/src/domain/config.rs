//! Run configuration.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use trailmark_core::error::DomainError;
use trailmark_progression::domain::scaling::ScalingPolicy;

/// How item progress is measured.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackingMode {
    /// Progress is what online participants currently hold, rescanned every
    /// tick.
    #[default]
    Inventory,
    /// Progress is the all-time total of recorded pickups and crafts.
    Cumulative,
}

impl TrackingMode {
    /// The configuration spelling of this mode.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Inventory => "inventory",
            Self::Cumulative => "cumulative",
        }
    }
}

impl fmt::Display for TrackingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TrackingMode {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "inventory" => Ok(Self::Inventory),
            "cumulative" => Ok(Self::Cumulative),
            other => Err(DomainError::Validation(format!(
                "unknown tracking mode: {other}"
            ))),
        }
    }
}

/// Policy knobs for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// How item progress is measured.
    pub tracking_mode: TrackingMode,
    /// Participant-count scaling of item requirements.
    pub scaling: ScalingPolicy,
    /// Seconds after run start at which an unfound village fails its
    /// search. `None` disables the timeout.
    pub village_search_timeout_secs: Option<u64>,
    /// Whether a fully linked portal pair may be replaced by a relight.
    pub portal_reassignment: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            tracking_mode: TrackingMode::default(),
            scaling: ScalingPolicy::default(),
            village_search_timeout_secs: None,
            portal_reassignment: true,
        }
    }
}

impl RunConfig {
    /// Checks the values a run cannot start with.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the scaling multiplier is
    /// negative, NaN or infinite.
    pub fn validate(&self) -> Result<(), DomainError> {
        let multiplier = self.scaling.multiplier;
        if !multiplier.is_finite() || multiplier < 0.0 {
            return Err(DomainError::Validation(format!(
                "scaling multiplier must be a finite non-negative number, got {multiplier}"
            )));
        }
        Ok(())
    }
}
