//! Observations pushed into a run by the host world.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use trailmark_core::world::{Location, ParticipantId};

/// Something that happened in the world, reported asynchronously.
///
/// Portal notifications carry the coordinate space in their location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Observation {
    /// The full current holdings of one participant, replacing the last
    /// snapshot for that participant.
    InventorySnapshot {
        /// Whose inventory.
        participant: ParticipantId,
        /// Material name to count.
        items: HashMap<String, u64>,
    },
    /// A pickup or craft credited to one participant.
    ItemDelta {
        /// Who picked up or crafted.
        participant: ParticipantId,
        /// Material name.
        material: String,
        /// How many.
        amount: u64,
    },
    /// A participant went offline; their holdings stop counting.
    ParticipantLeft {
        /// Who left.
        participant: ParticipantId,
    },
    /// A landmark was found.
    StructureFound {
        /// Landmark key.
        key: String,
        /// Where.
        location: Location,
        /// Who found it, if known.
        #[serde(default)]
        participant: Option<ParticipantId>,
    },
    /// A portal was lit.
    PortalLit {
        /// Where.
        location: Location,
        /// Who lit it, if known.
        #[serde(default)]
        participant: Option<ParticipantId>,
    },
    /// A participant arrived through a portal.
    PortalExit {
        /// Where the participant arrived.
        location: Location,
    },
}

impl Observation {
    /// Short name used in logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::InventorySnapshot { .. } => "inventory_snapshot",
            Self::ItemDelta { .. } => "item_delta",
            Self::ParticipantLeft { .. } => "participant_left",
            Self::StructureFound { .. } => "structure_found",
            Self::PortalLit { .. } => "portal_lit",
            Self::PortalExit { .. } => "portal_exit",
        }
    }
}
