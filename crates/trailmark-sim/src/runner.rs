//! Plays a script through a coordinator.

use std::time::Duration;

use tokio::time::{MissedTickBehavior, interval};
use tracing::{info, warn};
use trailmark_core::event::DomainEvent;
use trailmark_run::application::coordinator::TickCoordinator;
use trailmark_run::application::query_handlers::RunSnapshot;
use trailmark_run::domain::events::{CONFIG_REJECTED_EVENT_TYPE, RunEvent};

use crate::script::ScriptStep;

/// Outcome of a replay.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    /// Ticks evaluated.
    pub ticks: u64,
    /// Every event emitted, in order.
    pub events: Vec<RunEvent>,
    /// Observations and control steps the coordinator rejected.
    pub rejected: usize,
    /// Final state of the run.
    pub snapshot: RunSnapshot,
}

/// Plays `steps` through `coordinator`, one tick per `tick_period`.
///
/// Observations and control steps apply as soon as they are read; tick
/// steps wait for the next period. Rejections are logged and counted but
/// never stop the replay.
pub async fn run(coordinator: &TickCoordinator, steps: &[ScriptStep], tick_period: Duration) -> RunReport {
    let mut ticker = interval(tick_period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut report_events = Vec::new();
    let mut ticks = 0;
    let mut rejected = 0;

    publish(coordinator.take_pending_events(), &mut report_events);
    for step in steps {
        match step {
            ScriptStep::Observe { observation } => {
                match coordinator.on_observation(observation.clone()) {
                    Ok(events) => publish(events, &mut report_events),
                    Err(error) => {
                        rejected += 1;
                        warn!(observation = observation.name(), %error, "observation rejected");
                    }
                }
            }
            ScriptStep::Tick { participants } => {
                ticker.tick().await;
                ticks += 1;
                publish(coordinator.tick(*participants), &mut report_events);
            }
            ScriptStep::SkipStage => match coordinator.skip_stage() {
                Ok(events) => publish(events, &mut report_events),
                Err(error) => {
                    rejected += 1;
                    warn!(%error, "skip rejected");
                }
            },
            ScriptStep::Reset => publish(coordinator.reset(), &mut report_events),
            ScriptStep::Reload { stages } => {
                publish(coordinator.reload(stages.clone()), &mut report_events);
            }
            ScriptStep::Predict {
                key,
                first,
                second,
                placeholder_y,
            } => match TickCoordinator::predict_landmark(first, second, *placeholder_y) {
                Ok(Some(location)) => info!(
                    structure = %key,
                    space = %location.space,
                    x = location.x,
                    y = location.y,
                    z = location.z,
                    "landmark predicted"
                ),
                Ok(None) => info!(structure = %key, "bearings are parallel; no prediction"),
                Err(error) => {
                    rejected += 1;
                    warn!(structure = %key, %error, "prediction rejected");
                }
            },
        }
    }

    RunReport {
        ticks,
        events: report_events,
        rejected,
        snapshot: coordinator.snapshot(),
    }
}

fn publish(events: Vec<RunEvent>, sink: &mut Vec<RunEvent>) {
    for event in events {
        let metadata = event.metadata();
        let payload = event.to_payload();
        if event.event_type() == CONFIG_REJECTED_EVENT_TYPE {
            warn!(
                event_type = event.event_type(),
                run_id = %metadata.aggregate_id,
                sequence = metadata.sequence_number,
                %payload,
                "event"
            );
        } else {
            info!(
                event_type = event.event_type(),
                run_id = %metadata.aggregate_id,
                sequence = metadata.sequence_number,
                %payload,
                "event"
            );
        }
        sink.push(event);
    }
}
