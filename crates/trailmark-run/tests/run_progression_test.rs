//! End-to-end progression through the tick coordinator.

mod common;

use std::time::Duration;

use trailmark_core::error::DomainError;
use trailmark_core::world::ParticipantId;
use trailmark_progression::domain::events::ProgressionEventKind;
use trailmark_progression::domain::scaling::ScalingPolicy;
use trailmark_run::domain::config::{RunConfig, TrackingMode};
use trailmark_run::domain::events::RunEvent;
use trailmark_run::domain::observations::Observation;
use trailmark_structures::domain::events::StructureEventKind;

const TASK_COMPLETED: &str = "progression.task_completed";
const STAGE_ADVANCED: &str = "progression.stage_advanced";
const RUN_COMPLETED: &str = "progression.run_completed";
const STRUCTURE_FOUND: &str = "structures.structure_found";
const PORTAL_PAIR_UPDATED: &str = "structures.portal_pair_updated";
const VILLAGE_SEARCH_FAILED: &str = "structures.village_search_failed";

fn village_found(participant: Option<ParticipantId>) -> Observation {
    Observation::StructureFound {
        key: "VILLAGE".to_owned(),
        location: common::overworld(120.0, -48.0),
        participant,
    }
}

#[test]
fn test_found_village_completes_task_then_advances_on_tick() {
    // Arrange
    let coordinator = common::started(
        common::stages(
            r"
- key: find_village
  world: overworld
  tasks:
    - key: STRUCTURE_VILLAGE
      kind: structure
- key: stronghold
  world: overworld
  tasks:
    - key: STRUCTURE_STRONGHOLD
      kind: structure
",
        ),
        RunConfig::default(),
    );
    let participant = ParticipantId::new_v4();

    // Act
    let found = coordinator
        .on_observation(village_found(Some(participant)))
        .unwrap();
    let ticked = coordinator.tick(1);

    // Assert
    assert_eq!(common::types(&found), vec![STRUCTURE_FOUND, TASK_COMPLETED]);
    match &found[1] {
        RunEvent::Progression(event) => match &event.kind {
            ProgressionEventKind::TaskCompleted(payload) => {
                assert_eq!(payload.task_key, "STRUCTURE_VILLAGE");
                assert_eq!(payload.participant, Some(participant));
            }
            other => panic!("expected TaskCompleted, got {other:?}"),
        },
        other => panic!("expected a progression event, got {other:?}"),
    }

    assert_eq!(common::types(&ticked), vec![STAGE_ADVANCED]);
    match &ticked[0] {
        RunEvent::Progression(event) => match &event.kind {
            ProgressionEventKind::StageAdvanced(payload) => {
                assert_eq!(payload.stage_index, 1);
                assert_eq!(payload.completed_stage_key, "find_village");
                assert_eq!(payload.stage_key.as_deref(), Some("stronghold"));
            }
            other => panic!("expected StageAdvanced, got {other:?}"),
        },
        other => panic!("expected a progression event, got {other:?}"),
    }
}

#[test]
fn test_inventory_mode_sums_online_holdings() {
    // Arrange
    let coordinator = common::started(
        common::stages(
            r"
- key: pearls
  world: overworld
  tasks:
    - key: ITEM_ENDER_PEARL
      kind: item
      amount: 5
",
        ),
        RunConfig::default(),
    );
    for held in [3, 4] {
        coordinator
            .on_observation(Observation::InventorySnapshot {
                participant: ParticipantId::new_v4(),
                items: common::items(&[("ENDER_PEARL", held)]),
            })
            .unwrap();
    }

    // Act
    let events = coordinator.tick(2);

    // Assert
    let snapshot = coordinator.snapshot();
    let task = &snapshot.progression.stages[0].tasks[0];
    assert_eq!(task.progress, 5);
    assert!(task.completed);
    assert_eq!(
        common::types(&events),
        vec![TASK_COMPLETED, STAGE_ADVANCED, RUN_COMPLETED]
    );
}

#[test]
fn test_inventory_progress_is_replaced_each_tick() {
    let coordinator = common::started(common::speedrun(), RunConfig::default());
    let participant = ParticipantId::new_v4();
    coordinator
        .on_observation(Observation::InventorySnapshot {
            participant,
            items: common::items(&[("OAK_LOG", 10)]),
        })
        .unwrap();
    coordinator.tick(1);

    coordinator
        .on_observation(Observation::InventorySnapshot {
            participant,
            items: common::items(&[("OAK_LOG", 4)]),
        })
        .unwrap();
    coordinator.tick(1);

    let snapshot = coordinator.snapshot();
    assert_eq!(snapshot.progression.stages[0].tasks[0].progress, 4);
}

#[test]
fn test_participant_leaving_drops_their_holdings() {
    let coordinator = common::started(common::speedrun(), RunConfig::default());
    let staying = ParticipantId::new_v4();
    let leaving = ParticipantId::new_v4();
    coordinator
        .on_observation(Observation::InventorySnapshot {
            participant: staying,
            items: common::items(&[("BIRCH_LOG", 5)]),
        })
        .unwrap();
    coordinator
        .on_observation(Observation::InventorySnapshot {
            participant: leaving,
            items: common::items(&[("SPRUCE_LOG", 7)]),
        })
        .unwrap();

    coordinator
        .on_observation(Observation::ParticipantLeft {
            participant: leaving,
        })
        .unwrap();
    coordinator.tick(1);

    let snapshot = coordinator.snapshot();
    assert_eq!(snapshot.progression.stages[0].tasks[0].progress, 5);
}

#[test]
fn test_cumulative_mode_never_loses_progress() {
    // Arrange
    let config = RunConfig {
        tracking_mode: TrackingMode::Cumulative,
        ..RunConfig::default()
    };
    let coordinator = common::started(common::speedrun(), config);
    let participant = ParticipantId::new_v4();
    coordinator
        .on_observation(Observation::ItemDelta {
            participant,
            material: "COOKED_BEEF".to_owned(),
            amount: 5,
        })
        .unwrap();
    coordinator.tick(1);

    // Act: holdings drop to zero, contributions keep growing.
    coordinator
        .on_observation(Observation::InventorySnapshot {
            participant,
            items: common::items(&[]),
        })
        .unwrap();
    coordinator
        .on_observation(Observation::ItemDelta {
            participant,
            material: "BAKED_POTATO".to_owned(),
            amount: 2,
        })
        .unwrap();
    coordinator.tick(1);

    // Assert
    let snapshot = coordinator.snapshot();
    assert_eq!(snapshot.progression.stages[0].tasks[1].progress, 7);
    assert_eq!(snapshot.contributions[&participant]["COOKED_BEEF"], 5);
}

#[test]
fn test_scaling_follows_participant_count() {
    // Arrange
    let config = RunConfig {
        scaling: ScalingPolicy {
            enabled: true,
            multiplier: 0.5,
        },
        ..RunConfig::default()
    };
    let coordinator = common::started(common::speedrun(), config);
    coordinator
        .on_observation(Observation::InventorySnapshot {
            participant: ParticipantId::new_v4(),
            items: common::items(&[("OAK_LOG", 20)]),
        })
        .unwrap();

    // Act: three participants need 32 logs.
    let crowded = coordinator.tick(3);
    let crowded_view = coordinator.snapshot().progression;
    // One participant needs 16 logs again, so 20 completes the task.
    let solo = coordinator.tick(1);

    // Assert
    assert!(crowded.is_empty());
    assert_eq!(crowded_view.stages[0].tasks[0].required_amount, 32);
    assert_eq!(crowded_view.stages[3].tasks[0].required_amount, 6);
    assert_eq!(crowded_view.stages[3].tasks[1].required_amount, 24);
    assert_eq!(crowded_view.stages[1].tasks[0].required_amount, 1);
    assert_eq!(common::types(&solo), vec![TASK_COMPLETED]);

    let snapshot = coordinator.snapshot();
    let logs = &snapshot.progression.stages[0].tasks[0];
    assert_eq!(logs.required_amount, 16);
    assert_eq!(logs.progress, 16);
}

#[test]
fn test_skip_stage_propagates_satisfied_stages_in_one_call() {
    // Arrange: the village is already found, so skipping wood also clears
    // find_village.
    let coordinator = common::started(common::speedrun(), RunConfig::default());
    coordinator.on_observation(village_found(None)).unwrap();

    // Act
    let events = coordinator.skip_stage().unwrap();

    // Assert
    assert_eq!(
        common::types(&events),
        vec![TASK_COMPLETED, TASK_COMPLETED, STAGE_ADVANCED, STAGE_ADVANCED]
    );
    let snapshot = coordinator.snapshot();
    assert_eq!(snapshot.progression.current_stage_index, 2);
    assert_eq!(
        snapshot.progression.current_stage_key.as_deref(),
        Some("enter_nether")
    );
}

#[test]
fn test_skipping_every_stage_completes_the_run() {
    let coordinator = common::started(common::speedrun(), RunConfig::default());

    for _ in 0..5 {
        coordinator.skip_stage().unwrap();
    }

    let snapshot = coordinator.snapshot();
    assert!(snapshot.progression.run_completed);
    assert_eq!(
        coordinator.skip_stage(),
        Err(DomainError::Validation("no stage left to skip".to_owned()))
    );
}

#[test]
fn test_stage_index_never_moves_backwards() {
    let coordinator = common::started(common::speedrun(), RunConfig::default());
    let participant = ParticipantId::new_v4();
    let mut last_index = 0;

    let steps = [
        common::items(&[("OAK_LOG", 16), ("COOKED_COD", 8)]),
        common::items(&[]),
        common::items(&[("OAK_LOG", 1)]),
    ];
    for holdings in steps {
        coordinator
            .on_observation(Observation::InventorySnapshot {
                participant,
                items: holdings,
            })
            .unwrap();
        coordinator.tick(1);
        let index = coordinator.snapshot().progression.current_stage_index;
        assert!(index >= last_index);
        last_index = index;
    }

    assert_eq!(last_index, 1);
}

#[test]
fn test_portal_sides_credit_portal_task_in_their_space() {
    // Arrange
    let coordinator = common::started(common::speedrun(), RunConfig::default());

    // Act: the overworld side does not satisfy a nether-world task.
    let lit = coordinator
        .on_observation(Observation::PortalLit {
            location: common::overworld(10.0, 10.0),
            participant: None,
        })
        .unwrap();
    let exited = coordinator
        .on_observation(Observation::PortalExit {
            location: common::nether(1.0, 1.0),
        })
        .unwrap();

    // Assert
    assert_eq!(common::types(&lit), vec![PORTAL_PAIR_UPDATED]);
    assert_eq!(common::types(&exited), vec![PORTAL_PAIR_UPDATED, TASK_COMPLETED]);
    let snapshot = coordinator.snapshot();
    assert!(snapshot.structures.portal.linked);
    assert!(snapshot.progression.stages[2].tasks[0].completed);
}

#[test]
fn test_rejected_observation_changes_nothing() {
    let config = RunConfig {
        portal_reassignment: false,
        ..RunConfig::default()
    };
    let coordinator = common::started(common::speedrun(), config);
    coordinator
        .on_observation(Observation::PortalLit {
            location: common::overworld(0.0, 0.0),
            participant: None,
        })
        .unwrap();
    coordinator
        .on_observation(Observation::PortalExit {
            location: common::nether(0.0, 0.0),
        })
        .unwrap();
    let before = coordinator.snapshot();

    let relight = coordinator.on_observation(Observation::PortalLit {
        location: common::overworld(500.0, 500.0),
        participant: None,
    });
    let unknown = coordinator.on_observation(Observation::StructureFound {
        key: "ANCIENT_CITY".to_owned(),
        location: common::overworld(0.0, 0.0),
        participant: None,
    });

    assert_eq!(
        relight,
        Err(DomainError::ReassignmentDisabled("NETHER_PORTAL".to_owned()))
    );
    assert_eq!(
        unknown,
        Err(DomainError::UnknownStructure("ANCIENT_CITY".to_owned()))
    );
    assert_eq!(coordinator.snapshot(), before);
}

#[test]
fn test_village_search_fails_once_after_timeout() {
    // Arrange
    let config = RunConfig {
        village_search_timeout_secs: Some(600),
        ..RunConfig::default()
    };
    let (coordinator, clock) = common::started_with_clock(common::speedrun(), config);

    // Act
    clock.advance(Duration::from_secs(599));
    let early = coordinator.tick(1);
    clock.advance(Duration::from_secs(1));
    let at_timeout = coordinator.tick(1);
    clock.advance(Duration::from_secs(300));
    let later = coordinator.tick(1);

    // Assert
    assert!(early.is_empty());
    assert_eq!(common::types(&at_timeout), vec![VILLAGE_SEARCH_FAILED]);
    match &at_timeout[0] {
        RunEvent::Structure(event) => match &event.kind {
            StructureEventKind::VillageSearchFailed(payload) => {
                assert_eq!(payload.elapsed_secs, 600);
                assert_eq!(payload.timeout_secs, 600);
            }
            other => panic!("expected VillageSearchFailed, got {other:?}"),
        },
        other => panic!("expected a structure event, got {other:?}"),
    }
    assert!(later.is_empty());
    assert!(coordinator.snapshot().structures.village.failed);
}

#[test]
fn test_landmark_in_wrong_world_is_rejected_without_using_up_discovery() {
    // Arrange
    let coordinator = common::started(
        common::stages(
            r"
- key: fortress
  world: nether
  tasks:
    - key: STRUCTURE_NETHER_FORTRESS
      kind: structure
",
        ),
        RunConfig::default(),
    );
    let before = coordinator.snapshot();

    // Act
    let misplaced = coordinator.on_observation(Observation::StructureFound {
        key: "NETHER_FORTRESS".to_owned(),
        location: common::overworld(-120.0, 60.0),
        participant: None,
    });
    let unchanged = coordinator.snapshot();
    let found = coordinator
        .on_observation(Observation::StructureFound {
            key: "NETHER_FORTRESS".to_owned(),
            location: common::nether(-120.0, 60.0),
            participant: None,
        })
        .unwrap();
    let ticked = coordinator.tick(1);

    // Assert
    assert!(matches!(misplaced, Err(DomainError::Validation(_))));
    assert_eq!(unchanged, before);
    assert_eq!(common::types(&found), vec![STRUCTURE_FOUND, TASK_COMPLETED]);
    assert_eq!(common::types(&ticked), vec![STAGE_ADVANCED, RUN_COMPLETED]);
    assert!(coordinator.snapshot().progression.run_completed);
}

#[test]
fn test_village_search_started_by_reload_is_timed_from_reload() {
    // Arrange
    let config = RunConfig {
        village_search_timeout_secs: Some(600),
        ..RunConfig::default()
    };
    let (coordinator, clock) = common::started_with_clock(
        common::stages(
            r"
- key: wood
  world: overworld
  tasks:
    - key: ITEM_LOGS
      kind: item
      amount: 16
",
        ),
        config,
    );
    clock.advance(Duration::from_secs(500));
    coordinator.reload(common::stages(
        r"
- key: find_village
  world: overworld
  tasks:
    - key: STRUCTURE_VILLAGE
      kind: structure
",
    ));

    // Act
    clock.advance(Duration::from_secs(200));
    let early = coordinator.tick(1);
    clock.advance(Duration::from_secs(400));
    let at_timeout = coordinator.tick(1);

    // Assert
    assert!(early.is_empty());
    assert_eq!(common::types(&at_timeout), vec![VILLAGE_SEARCH_FAILED]);
}

#[test]
fn test_reset_restarts_everything_under_new_run_id() {
    // Arrange
    let config = RunConfig {
        village_search_timeout_secs: Some(60),
        ..RunConfig::default()
    };
    let (coordinator, clock) = common::started_with_clock(common::speedrun(), config);
    coordinator.on_observation(village_found(None)).unwrap();
    coordinator.skip_stage().unwrap();
    clock.advance(Duration::from_secs(120));
    let old_run = coordinator.run_id();

    // Act
    let events = coordinator.reset();

    // Assert
    assert_eq!(common::types(&events), vec!["run.started"]);
    let snapshot = coordinator.snapshot();
    assert_ne!(snapshot.run_id, old_run);
    assert_eq!(snapshot.progression.current_stage_index, 0);
    assert!(snapshot.structures.structures.iter().all(|s| s.location.is_none()));
    assert_eq!(snapshot.elapsed_secs, 0);
    assert!(snapshot.structures.village.pending);
}
