//! Trailmark replay entry point.

use std::error::Error;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;
use trailmark_core::clock::SystemClock;
use trailmark_run::application::coordinator::TickCoordinator;
use trailmark_sim::config::SimConfig;
use trailmark_sim::{runner, script};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Initialize tracing subscriber.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    tracing::info!("Starting Trailmark replay");

    // Read configuration from environment.
    let config = SimConfig::from_env()?;
    let definitions = script::load_stages(&config.stages_path).await?;
    let steps = script::load_script(&config.script_path).await?;
    tracing::info!(
        stages = definitions.len(),
        steps = steps.len(),
        tick_millis = config.tick_period.as_millis(),
        tracking_mode = %config.run.tracking_mode,
        "replay loaded"
    );

    let coordinator = TickCoordinator::new(definitions, config.run.clone(), Arc::new(SystemClock))?;
    let report = runner::run(&coordinator, &steps, config.tick_period).await;

    tracing::info!(
        run_id = %report.snapshot.run_id,
        ticks = report.ticks,
        events = report.events.len(),
        rejected = report.rejected,
        current_stage = ?report.snapshot.progression.current_stage_key,
        run_completed = report.snapshot.progression.run_completed,
        "replay finished"
    );
    tracing::info!(snapshot = %serde_json::to_string(&report.snapshot)?, "final snapshot");

    Ok(())
}
