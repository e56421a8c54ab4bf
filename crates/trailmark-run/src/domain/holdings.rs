//! Current inventories of online participants.

use std::collections::HashMap;

use trailmark_core::world::ParticipantId;
use trailmark_progression::domain::materials::MaterialTally;

/// Latest inventory snapshot per online participant.
///
/// Used in inventory tracking mode, where progress is a fresh sum of what
/// everyone currently holds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InventoryHoldings {
    by_participant: HashMap<ParticipantId, HashMap<String, u64>>,
}

impl InventoryHoldings {
    /// Replaces the holdings of `participant`.
    pub fn replace(&mut self, participant: ParticipantId, items: HashMap<String, u64>) {
        self.by_participant.insert(participant, items);
    }

    /// Forgets `participant`. Returns whether they had a snapshot.
    pub fn remove(&mut self, participant: ParticipantId) -> bool {
        self.by_participant.remove(&participant).is_some()
    }

    /// Participants with a snapshot.
    #[must_use]
    pub fn participant_count(&self) -> usize {
        self.by_participant.len()
    }
}

impl MaterialTally for InventoryHoldings {
    fn total_matching(&self, target: &str) -> u64 {
        self.by_participant
            .values()
            .map(|items| items.total_matching(target))
            .fold(0, u64::saturating_add)
    }
}
