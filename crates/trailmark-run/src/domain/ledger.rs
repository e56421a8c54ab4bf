//! All-time contributions per participant.

use std::collections::BTreeMap;

use serde::Serialize;
use trailmark_core::world::ParticipantId;
use trailmark_progression::domain::materials::{MaterialTally, matches};

/// Per-participant, per-material running totals of pickups and crafts.
///
/// Append-only for the life of a run; only a reset clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ContributionLedger {
    contributions: BTreeMap<ParticipantId, BTreeMap<String, u64>>,
}

impl ContributionLedger {
    /// Adds `amount` of `material` to `participant`'s total.
    pub fn record(&mut self, participant: ParticipantId, material: &str, amount: u64) {
        let total = self
            .contributions
            .entry(participant)
            .or_default()
            .entry(material.to_owned())
            .or_default();
        *total = total.saturating_add(amount);
    }

    /// `participant`'s total for every material matching `target`.
    #[must_use]
    pub fn contributed_by(&self, participant: ParticipantId, target: &str) -> u64 {
        self.contributions
            .get(&participant)
            .map_or(0, |materials| sum_matching(materials, target))
    }

    /// Raw totals, ordered by participant then material.
    #[must_use]
    pub fn contributions(&self) -> &BTreeMap<ParticipantId, BTreeMap<String, u64>> {
        &self.contributions
    }

    /// Whether nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.contributions.is_empty()
    }
}

impl MaterialTally for ContributionLedger {
    fn total_matching(&self, target: &str) -> u64 {
        self.contributions
            .values()
            .map(|materials| sum_matching(materials, target))
            .fold(0, u64::saturating_add)
    }
}

fn sum_matching(materials: &BTreeMap<String, u64>, target: &str) -> u64 {
    materials
        .iter()
        .filter(|(material, _)| matches(target, material))
        .map(|(_, count)| *count)
        .fold(0, u64::saturating_add)
}
