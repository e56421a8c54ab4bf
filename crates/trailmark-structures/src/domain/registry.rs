//! The structure registry aggregate.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Serialize;
use trailmark_core::aggregate::AggregateRoot;
use trailmark_core::clock::Clock;
use trailmark_core::error::DomainError;
use trailmark_core::event::EventMetadata;
use trailmark_core::world::{Location, ParticipantId};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::events::{
    PORTAL_PAIR_UPDATED_EVENT_TYPE, PortalPairUpdated, STRUCTURE_FOUND_EVENT_TYPE, StructureEvent,
    StructureEventKind, StructureFound, VILLAGE_SEARCH_FAILED_EVENT_TYPE, VillageSearchFailed,
};
use super::portal::{NETHER_PORTAL, PortalPair, PortalSide};
use super::village::{VILLAGE, VillageSearchState};

/// Discovery state of one tracked landmark.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StructureRecord {
    /// Landmark key.
    pub key: String,
    /// Human-readable name.
    pub display_name: String,
    /// Where it was found; absent until then.
    pub location: Option<Location>,
    /// Who found it.
    pub found_by: Option<ParticipantId>,
}

impl StructureRecord {
    /// A not-yet-found landmark.
    #[must_use]
    pub fn new(key: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            display_name: display_name.into(),
            location: None,
            found_by: None,
        }
    }

    /// Whether the landmark has been found.
    #[must_use]
    pub fn is_found(&self) -> bool {
        self.location.is_some()
    }
}

/// The aggregate root for landmark discovery in a run.
#[derive(Debug)]
pub struct StructureRegistry {
    /// Run identifier.
    pub id: Uuid,
    version: i64,
    records: BTreeMap<String, StructureRecord>,
    portal: PortalPair,
    village: VillageSearchState,
    portal_reassignment: bool,
    uncommitted_events: Vec<StructureEvent>,
}

impl StructureRegistry {
    /// Creates a registry tracking `records`.
    ///
    /// The portal pair is always tracked and never stored as a record. The
    /// village search starts pending when a `VILLAGE` record is tracked.
    /// With `portal_reassignment` off, a fully known portal pair can no
    /// longer be relit elsewhere.
    #[must_use]
    pub fn new(
        id: Uuid,
        records: impl IntoIterator<Item = StructureRecord>,
        portal_reassignment: bool,
    ) -> Self {
        let records: BTreeMap<String, StructureRecord> = records
            .into_iter()
            .filter(|record| record.key != NETHER_PORTAL)
            .map(|record| (record.key.clone(), record))
            .collect();
        let village = VillageSearchState::new(records.contains_key(VILLAGE));
        Self {
            id,
            version: 0,
            records,
            portal: PortalPair::default(),
            village,
            portal_reassignment,
            uncommitted_events: Vec::new(),
        }
    }

    /// Starts tracking `record` unless its key is already tracked. Tracking
    /// the village for the first time starts its search.
    ///
    /// Returns whether the record was added.
    pub fn track(&mut self, record: StructureRecord) -> bool {
        if self.is_tracked(&record.key) {
            return false;
        }
        if record.key == VILLAGE {
            self.village = VillageSearchState::new(true);
        }
        debug!(run_id = %self.id, structure = %record.key, "tracking structure");
        self.records.insert(record.key.clone(), record);
        true
    }

    #[allow(clippy::cast_possible_wrap)]
    fn next_sequence_number(&self) -> i64 {
        self.version + self.uncommitted_events.len() as i64 + 1
    }

    fn record(&mut self, event_type: &str, kind: StructureEventKind, clock: &dyn Clock) {
        let metadata = EventMetadata::new(event_type, self.id, self.next_sequence_number(), clock);
        self.uncommitted_events
            .push(StructureEvent { metadata, kind });
    }

    /// Records that landmark `key` was found at `location`.
    ///
    /// Re-finding a landmark is a silent no-op; the first location wins.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::UnknownStructure` if `key` is not tracked, and
    /// `DomainError::Validation` for the portal key, whose sides are only
    /// set by portal notifications.
    pub fn record_found(
        &mut self,
        key: &str,
        location: Location,
        participant: Option<ParticipantId>,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        if key == NETHER_PORTAL {
            return Err(DomainError::Validation(
                "portal sides are set by portal notifications".to_owned(),
            ));
        }
        let Some(record) = self.records.get_mut(key) else {
            return Err(DomainError::UnknownStructure(key.to_owned()));
        };
        if record.is_found() {
            debug!(run_id = %self.id, structure = %key, "structure already found");
            return Ok(());
        }
        record.location = Some(location);
        record.found_by = participant;
        let payload = StructureFound {
            key: record.key.clone(),
            display_name: record.display_name.clone(),
            location,
            participant,
        };
        if key == VILLAGE {
            self.village.resolve();
        }
        info!(run_id = %self.id, structure = %key, space = %location.space, "structure found");
        self.record(
            STRUCTURE_FOUND_EVENT_TYPE,
            StructureEventKind::StructureFound(payload),
            clock,
        );
        Ok(())
    }

    /// Records a newly lit portal at `location`.
    ///
    /// A portal within the dedup radius of a known side is the same portal
    /// and is ignored. Anything else is a relight: both sides are forgotten
    /// and the side for `location`'s space is set.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::ReassignmentDisabled` if both sides are known
    /// and reassignment is off, and `DomainError::Validation` if
    /// `location` is in a space without a portal side.
    pub fn record_portal_lit(
        &mut self,
        location: Location,
        participant: Option<ParticipantId>,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        let Some(side) = PortalSide::for_space(location.space) else {
            return Err(DomainError::Validation(format!(
                "no portal side in {}",
                location.space
            )));
        };
        if self.portal.is_near_known_side(&location) {
            debug!(run_id = %self.id, "portal already registered");
            return Ok(());
        }
        if self.portal.is_fully_known() && !self.portal_reassignment {
            warn!(run_id = %self.id, "portal relight rejected; reassignment disabled");
            return Err(DomainError::ReassignmentDisabled(NETHER_PORTAL.to_owned()));
        }
        let relit = self.portal.is_partially_known();
        self.portal.clear();
        *self.portal.slot_mut(side) = Some(location);
        info!(run_id = %self.id, space = %location.space, relit, "portal lit");
        self.record_portal_update(location, relit, participant, clock);
        Ok(())
    }

    /// Fills the side for `location`'s space from a portal exit, only if it
    /// is still unknown. Never overwrites a side and never fails.
    ///
    /// Returns whether a side was set.
    pub fn record_portal_exit(&mut self, location: Location, clock: &dyn Clock) -> bool {
        let Some(side) = PortalSide::for_space(location.space) else {
            return false;
        };
        let slot = self.portal.slot_mut(side);
        if slot.is_some() {
            return false;
        }
        *slot = Some(location);
        debug!(run_id = %self.id, space = %location.space, "portal side filled by exit");
        self.record_portal_update(location, false, None, clock);
        true
    }

    fn record_portal_update(
        &mut self,
        location: Location,
        relit: bool,
        participant: Option<ParticipantId>,
        clock: &dyn Clock,
    ) {
        let payload = PortalPairUpdated {
            location,
            overworld: self.portal.overworld().copied(),
            nether: self.portal.nether().copied(),
            relit,
            participant,
        };
        self.record(
            PORTAL_PAIR_UPDATED_EVENT_TYPE,
            StructureEventKind::PortalPairUpdated(payload),
            clock,
        );
    }

    /// Fails the village search once `elapsed` reaches `timeout`.
    ///
    /// Emits `VillageSearchFailed` at most once per run; does nothing when
    /// the village is untracked, already found, or already failed.
    pub fn evaluate_village_timeout(
        &mut self,
        elapsed: Duration,
        timeout: Duration,
        clock: &dyn Clock,
    ) {
        if !self.village.is_pending() {
            return;
        }
        self.village.observe(elapsed, timeout);
        if elapsed < timeout {
            return;
        }
        self.village.fail();
        warn!(
            run_id = %self.id,
            elapsed_secs = elapsed.as_secs(),
            timeout_secs = timeout.as_secs(),
            "village search timed out"
        );
        self.record(
            VILLAGE_SEARCH_FAILED_EVENT_TYPE,
            StructureEventKind::VillageSearchFailed(VillageSearchFailed {
                elapsed_secs: elapsed.as_secs(),
                timeout_secs: timeout.as_secs(),
            }),
            clock,
        );
    }

    /// The portal pair.
    #[must_use]
    pub fn portal(&self) -> &PortalPair {
        &self.portal
    }

    /// The village search state.
    #[must_use]
    pub fn village(&self) -> &VillageSearchState {
        &self.village
    }

    /// Whether `key` is tracked (the portal always is).
    #[must_use]
    pub fn is_tracked(&self, key: &str) -> bool {
        key == NETHER_PORTAL || self.records.contains_key(key)
    }

    /// Whether the search for `key` is still running: the landmark is
    /// tracked, not yet found and (for the village) not timed out.
    #[must_use]
    pub fn is_search_active(&self, key: &str) -> bool {
        if key == NETHER_PORTAL {
            return !self.portal.is_fully_known();
        }
        if key == VILLAGE {
            return self.village.is_pending();
        }
        self.records
            .get(key)
            .is_some_and(|record| !record.is_found())
    }

    /// Looks up a tracked landmark.
    #[must_use]
    pub fn structure(&self, key: &str) -> Option<&StructureRecord> {
        self.records.get(key)
    }

    /// Every tracked landmark, ordered by key.
    pub fn records(&self) -> impl Iterator<Item = &StructureRecord> {
        self.records.values()
    }

    /// Found landmarks with their locations, ordered by key.
    pub fn discoveries(&self) -> impl Iterator<Item = (&str, &Location)> {
        self.records.values().filter_map(|record| {
            record
                .location
                .as_ref()
                .map(|location| (record.key.as_str(), location))
        })
    }
}

impl AggregateRoot for StructureRegistry {
    type Event = StructureEvent;

    fn aggregate_id(&self) -> Uuid {
        self.id
    }

    fn version(&self) -> i64 {
        self.version
    }

    fn uncommitted_events(&self) -> &[Self::Event] {
        &self.uncommitted_events
    }

    #[allow(clippy::cast_possible_wrap)]
    fn take_uncommitted_events(&mut self) -> Vec<Self::Event> {
        let events = std::mem::take(&mut self.uncommitted_events);
        self.version += events.len() as i64;
        events
    }
}

#[cfg(test)]
mod tests {
    use trailmark_core::event::DomainEvent;
    use trailmark_core::world::WorldSpace;
    use trailmark_test_support::{FixedClock, fixed_now};

    use super::*;

    fn registry(portal_reassignment: bool) -> StructureRegistry {
        StructureRegistry::new(
            Uuid::new_v4(),
            [
                StructureRecord::new(VILLAGE, "Village"),
                StructureRecord::new("NETHER_FORTRESS", "Nether Fortress"),
                StructureRecord::new(NETHER_PORTAL, "Nether Portal"),
            ],
            portal_reassignment,
        )
    }

    fn overworld(x: f64, z: f64) -> Location {
        Location::new(WorldSpace::Overworld, x, 64.0, z)
    }

    fn nether(x: f64, z: f64) -> Location {
        Location::new(WorldSpace::Nether, x, 64.0, z)
    }

    #[test]
    fn test_record_found_stores_location_and_emits_event() {
        // Arrange
        let clock = FixedClock(fixed_now());
        let mut registry = registry(true);
        let participant = ParticipantId::new_v4();
        let location = overworld(120.0, -40.0);

        // Act
        registry
            .record_found(VILLAGE, location, Some(participant), &clock)
            .unwrap();

        // Assert
        let record = registry.structure(VILLAGE).unwrap();
        assert_eq!(record.location, Some(location));
        assert_eq!(record.found_by, Some(participant));
        assert!(!registry.is_search_active(VILLAGE));

        let events = registry.uncommitted_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type(), STRUCTURE_FOUND_EVENT_TYPE);
        assert_eq!(events[0].metadata.aggregate_id, registry.id);
        match &events[0].kind {
            StructureEventKind::StructureFound(payload) => {
                assert_eq!(payload.key, VILLAGE);
                assert_eq!(payload.location, location);
                assert_eq!(payload.participant, Some(participant));
            }
            other => panic!("expected StructureFound, got {other:?}"),
        }
    }

    #[test]
    fn test_record_found_twice_keeps_first_location() {
        let clock = FixedClock(fixed_now());
        let mut registry = registry(true);
        registry
            .record_found(VILLAGE, overworld(1.0, 1.0), None, &clock)
            .unwrap();

        registry
            .record_found(VILLAGE, overworld(900.0, 900.0), None, &clock)
            .unwrap();

        assert_eq!(registry.uncommitted_events().len(), 1);
        assert_eq!(
            registry.structure(VILLAGE).unwrap().location,
            Some(overworld(1.0, 1.0))
        );
    }

    #[test]
    fn test_record_found_unknown_key_is_rejected() {
        let clock = FixedClock(fixed_now());
        let mut registry = registry(true);

        let result = registry.record_found("WOODLAND_MANSION", overworld(0.0, 0.0), None, &clock);

        assert_eq!(
            result,
            Err(DomainError::UnknownStructure("WOODLAND_MANSION".to_owned()))
        );
        assert!(registry.uncommitted_events().is_empty());
    }

    #[test]
    fn test_record_found_never_sets_portal() {
        let clock = FixedClock(fixed_now());
        let mut registry = registry(true);

        let result = registry.record_found(NETHER_PORTAL, overworld(0.0, 0.0), None, &clock);

        assert!(matches!(result, Err(DomainError::Validation(_))));
        assert!(!registry.portal().is_partially_known());
        assert!(registry.structure(NETHER_PORTAL).is_none());
    }

    #[test]
    fn test_portal_lit_near_known_side_is_a_no_op() {
        let clock = FixedClock(fixed_now());
        let mut registry = registry(true);
        registry
            .record_portal_lit(overworld(100.0, 100.0), None, &clock)
            .unwrap();
        registry.take_uncommitted_events();
        let before = *registry.portal();

        registry
            .record_portal_lit(overworld(102.0, 103.0), None, &clock)
            .unwrap();

        assert!(registry.uncommitted_events().is_empty());
        assert_eq!(*registry.portal(), before);
    }

    #[test]
    fn test_portal_lit_far_away_resets_both_sides_and_sets_one() {
        // Arrange: a fully known pair.
        let clock = FixedClock(fixed_now());
        let mut registry = registry(true);
        registry
            .record_portal_lit(overworld(100.0, 100.0), None, &clock)
            .unwrap();
        registry.record_portal_exit(nether(12.0, 12.0), &clock);
        assert!(registry.portal().is_fully_known());
        registry.take_uncommitted_events();

        // Act
        registry
            .record_portal_lit(overworld(500.0, -300.0), None, &clock)
            .unwrap();

        // Assert
        let portal = registry.portal();
        assert_eq!(portal.overworld(), Some(&overworld(500.0, -300.0)));
        assert!(portal.nether().is_none());
        match &registry.uncommitted_events()[0].kind {
            StructureEventKind::PortalPairUpdated(payload) => {
                assert!(payload.relit);
                assert_eq!(payload.overworld, Some(overworld(500.0, -300.0)));
                assert_eq!(payload.nether, None);
            }
            other => panic!("expected PortalPairUpdated, got {other:?}"),
        }
    }

    #[test]
    fn test_portal_relight_rejected_when_reassignment_disabled() {
        let clock = FixedClock(fixed_now());
        let mut registry = registry(false);
        registry
            .record_portal_lit(overworld(100.0, 100.0), None, &clock)
            .unwrap();
        registry.record_portal_exit(nether(12.0, 12.0), &clock);
        let before = *registry.portal();
        registry.take_uncommitted_events();

        let result = registry.record_portal_lit(overworld(800.0, 0.0), None, &clock);

        assert_eq!(
            result,
            Err(DomainError::ReassignmentDisabled(NETHER_PORTAL.to_owned()))
        );
        assert_eq!(*registry.portal(), before);
        assert!(registry.uncommitted_events().is_empty());
    }

    #[test]
    fn test_portal_lit_in_end_is_rejected() {
        let clock = FixedClock(fixed_now());
        let mut registry = registry(true);

        let result = registry.record_portal_lit(
            Location::new(WorldSpace::End, 0.0, 64.0, 0.0),
            None,
            &clock,
        );

        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[test]
    fn test_portal_exit_never_overwrites() {
        let clock = FixedClock(fixed_now());
        let mut registry = registry(true);

        assert!(registry.record_portal_exit(nether(10.0, 10.0), &clock));
        assert!(!registry.record_portal_exit(nether(400.0, 10.0), &clock));

        assert_eq!(registry.portal().nether(), Some(&nether(10.0, 10.0)));
        assert!(registry.portal().is_partially_known());
        assert!(!registry.portal().is_fully_known());
        assert_eq!(registry.uncommitted_events().len(), 1);
    }

    #[test]
    fn test_village_timeout_fails_exactly_once() {
        let clock = FixedClock(fixed_now());
        let mut registry = registry(true);
        let timeout = Duration::from_secs(600);

        registry.evaluate_village_timeout(Duration::from_secs(599), timeout, &clock);
        assert!(registry.uncommitted_events().is_empty());

        for seconds in [600, 601, 1200] {
            registry.evaluate_village_timeout(Duration::from_secs(seconds), timeout, &clock);
        }

        let events = registry.uncommitted_events();
        assert_eq!(events.len(), 1);
        assert!(matches!(
            &events[0].kind,
            StructureEventKind::VillageSearchFailed(VillageSearchFailed {
                elapsed_secs: 600,
                timeout_secs: 600,
            })
        ));
        assert!(registry.village().is_failed());
        assert!(!registry.is_search_active(VILLAGE));
    }

    #[test]
    fn test_found_village_never_times_out() {
        let clock = FixedClock(fixed_now());
        let mut registry = registry(true);
        registry
            .record_found(VILLAGE, overworld(0.0, 0.0), None, &clock)
            .unwrap();
        registry.take_uncommitted_events();

        registry.evaluate_village_timeout(Duration::from_secs(9_999), Duration::from_secs(1), &clock);

        assert!(registry.uncommitted_events().is_empty());
        assert!(!registry.village().is_failed());
    }

    #[test]
    fn test_untracked_village_has_no_search() {
        let clock = FixedClock(fixed_now());
        let mut registry = StructureRegistry::new(
            Uuid::new_v4(),
            [StructureRecord::new("STRONGHOLD", "Stronghold")],
            true,
        );

        registry.evaluate_village_timeout(Duration::from_secs(10), Duration::from_secs(1), &clock);

        assert!(registry.uncommitted_events().is_empty());
        assert!(!registry.is_search_active(VILLAGE));
        assert!(registry.is_search_active("STRONGHOLD"));
        assert!(registry.is_search_active(NETHER_PORTAL));
    }

    #[test]
    fn test_track_adds_new_landmark_once() {
        let mut registry = StructureRegistry::new(Uuid::new_v4(), Vec::<StructureRecord>::new(), true);
        assert!(!registry.is_search_active(VILLAGE));

        assert!(registry.track(StructureRecord::new(VILLAGE, "Village")));
        assert!(!registry.track(StructureRecord::new(VILLAGE, "Village")));
        assert!(!registry.track(StructureRecord::new(NETHER_PORTAL, "Nether Portal")));

        assert!(registry.is_search_active(VILLAGE));
        assert_eq!(registry.records().count(), 1);
    }

    #[test]
    fn test_discoveries_lists_found_landmarks() {
        let clock = FixedClock(fixed_now());
        let mut registry = registry(true);
        registry
            .record_found("NETHER_FORTRESS", nether(-200.0, 40.0), None, &clock)
            .unwrap();

        let found: Vec<(&str, &Location)> = registry.discoveries().collect();

        assert_eq!(found, vec![("NETHER_FORTRESS", &nether(-200.0, 40.0))]);
        assert_eq!(registry.records().count(), 2);
    }
}
