//! Query handlers for the Structures context.

use serde::Serialize;
use trailmark_core::aggregate::AggregateRoot;
use trailmark_core::world::{Location, ParticipantId};
use uuid::Uuid;

use crate::domain::registry::{StructureRecord, StructureRegistry};
use crate::domain::village::VILLAGE;

/// Read-only view of one landmark.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StructureView {
    /// Landmark key.
    pub key: String,
    /// Human-readable name.
    pub display_name: String,
    /// Where it was found.
    pub location: Option<Location>,
    /// Who found it.
    pub found_by: Option<ParticipantId>,
    /// Whether the search is still running.
    pub searching: bool,
}

/// Read-only view of the portal pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortalView {
    /// Overworld side.
    pub overworld: Option<Location>,
    /// Nether side.
    pub nether: Option<Location>,
    /// Both sides known.
    pub linked: bool,
}

/// Read-only view of the village search.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VillageSearchView {
    /// Whether the village is tracked at all.
    pub tracked: bool,
    /// Whether the search is still running.
    pub pending: bool,
    /// Whether the search timed out.
    pub failed: bool,
    /// Elapsed seconds at the last evaluation.
    pub elapsed_secs: u64,
    /// Timeout in seconds, once one has been applied.
    pub timeout_secs: Option<u64>,
}

/// Read-only view of a registry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegistryView {
    /// The run identifier.
    pub run_id: Uuid,
    /// Tracked landmarks, ordered by key.
    pub structures: Vec<StructureView>,
    /// The portal pair.
    pub portal: PortalView,
    /// The village search.
    pub village: VillageSearchView,
    /// Events committed so far.
    pub version: i64,
}

/// Builds a [`RegistryView`] of `registry`.
#[must_use]
pub fn get_registry_view(registry: &StructureRegistry) -> RegistryView {
    let portal = registry.portal();
    let village = registry.village();
    RegistryView {
        run_id: registry.id,
        structures: registry
            .records()
            .map(|record| structure_view(registry, record))
            .collect(),
        portal: PortalView {
            overworld: portal.overworld().copied(),
            nether: portal.nether().copied(),
            linked: portal.is_fully_known(),
        },
        village: VillageSearchView {
            tracked: registry.structure(VILLAGE).is_some(),
            pending: village.is_pending(),
            failed: village.is_failed(),
            elapsed_secs: village.elapsed().as_secs(),
            timeout_secs: village.timeout().map(|timeout| timeout.as_secs()),
        },
        version: registry.version(),
    }
}

fn structure_view(registry: &StructureRegistry, record: &StructureRecord) -> StructureView {
    StructureView {
        key: record.key.clone(),
        display_name: record.display_name.clone(),
        location: record.location,
        found_by: record.found_by,
        searching: registry.is_search_active(&record.key),
    }
}
