//! Participant-count scaling of task requirements.

use serde::{Deserialize, Serialize};

/// Scaling parameters for a run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScalingPolicy {
    /// Whether requirements grow with the number of participants.
    pub enabled: bool,
    /// Extra fraction of the base requirement added per participant beyond
    /// the first.
    pub multiplier: f64,
}

impl Default for ScalingPolicy {
    fn default() -> Self {
        Self {
            enabled: false,
            multiplier: 0.5,
        }
    }
}

impl ScalingPolicy {
    /// Required amount for a scaling-eligible task with `base_amount`.
    #[must_use]
    pub fn required_for(&self, base_amount: u32, participant_count: u32) -> u32 {
        if self.enabled {
            scale(base_amount, participant_count, self.multiplier)
        } else {
            base_amount
        }
    }
}

/// Scales `base_amount` for `participant_count` participants:
/// `ceil(base * (1 + (n - 1) * multiplier))`, and exactly `base_amount` for a
/// solo (or empty) run.
///
/// The result saturates to `0..=u32::MAX`.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn scale(base_amount: u32, participant_count: u32, multiplier: f64) -> u32 {
    if participant_count <= 1 {
        return base_amount;
    }
    let factor = 1.0 + f64::from(participant_count - 1) * multiplier;
    let scaled = (f64::from(base_amount) * factor).ceil();
    if scaled.is_nan() || scaled <= 0.0 {
        0
    } else if scaled >= f64::from(u32::MAX) {
        u32::MAX
    } else {
        scaled as u32
    }
}
