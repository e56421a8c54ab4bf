//! Domain events for the Structures context.

use serde::{Deserialize, Serialize};
use trailmark_core::event::{DomainEvent, EventMetadata};
use trailmark_core::world::{Location, ParticipantId};

/// Event type for [`StructureFound`].
pub const STRUCTURE_FOUND_EVENT_TYPE: &str = "structures.structure_found";
/// Event type for [`PortalPairUpdated`].
pub const PORTAL_PAIR_UPDATED_EVENT_TYPE: &str = "structures.portal_pair_updated";
/// Event type for [`VillageSearchFailed`].
pub const VILLAGE_SEARCH_FAILED_EVENT_TYPE: &str = "structures.village_search_failed";

/// Emitted the first time a landmark is found.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructureFound {
    /// Landmark key.
    pub key: String,
    /// Human-readable name.
    pub display_name: String,
    /// Where it was found.
    pub location: Location,
    /// Who found it, if known.
    pub participant: Option<ParticipantId>,
}

/// Emitted whenever a side of the portal pair is (re)assigned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortalPairUpdated {
    /// The location that was just assigned.
    pub location: Location,
    /// Overworld side after the update.
    pub overworld: Option<Location>,
    /// Nether side after the update.
    pub nether: Option<Location>,
    /// Whether previously known sides were discarded by a relight.
    pub relit: bool,
    /// Who lit or used the portal, if known.
    pub participant: Option<ParticipantId>,
}

/// Emitted once per run when the village search times out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VillageSearchFailed {
    /// Elapsed run time, in seconds.
    pub elapsed_secs: u64,
    /// The timeout that was exceeded, in seconds.
    pub timeout_secs: u64,
}

/// Event payload variants for the Structures context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StructureEventKind {
    /// A landmark has been found.
    StructureFound(StructureFound),
    /// The portal pair changed.
    PortalPairUpdated(PortalPairUpdated),
    /// The village search timed out.
    VillageSearchFailed(VillageSearchFailed),
}

/// Domain event envelope for the Structures context.
#[derive(Debug, Clone, PartialEq)]
pub struct StructureEvent {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// Event-specific payload.
    pub kind: StructureEventKind,
}

impl DomainEvent for StructureEvent {
    fn event_type(&self) -> &'static str {
        match &self.kind {
            StructureEventKind::StructureFound(_) => STRUCTURE_FOUND_EVENT_TYPE,
            StructureEventKind::PortalPairUpdated(_) => PORTAL_PAIR_UPDATED_EVENT_TYPE,
            StructureEventKind::VillageSearchFailed(_) => VILLAGE_SEARCH_FAILED_EVENT_TYPE,
        }
    }

    fn to_payload(&self) -> serde_json::Value {
        // Serialization of derived Serialize types to Value is infallible.
        serde_json::to_value(&self.kind).expect("StructureEventKind serialization is infallible")
    }

    fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }
}
