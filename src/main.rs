//! RepCycle - Workout Session Engine
//!
//! Prints the performance summary of the latest training cycle and the
//! targets proposed for the next one.

use anyhow::Context;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use repcycle::alerts::TracingNotifier;
use repcycle::session::SessionController;
use repcycle::storage::config::{get_config_path, load_config, save_config};
use repcycle::storage::{Database, StaticIdentity};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting RepCycle v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config().context("loading configuration")?;
    let config_path = get_config_path();
    if !config_path.exists() {
        save_config(&config).context("writing default configuration")?;
        tracing::info!("Wrote default configuration to {}", config_path.display());
    }

    let Some(user_id) = config.user.user_id else {
        anyhow::bail!(
            "no user configured; set user.user_id in {}",
            config_path.display()
        );
    };

    let db_path = config.database_path();
    let db = Arc::new(
        Database::open(&db_path).with_context(|| format!("opening {}", db_path.display()))?,
    );

    let mut session = SessionController::new(
        db.clone(),
        db,
        StaticIdentity::user(user_id),
        TracingNotifier,
    )
    .with_settings(config.session.clone())
    .with_progression(config.progression.clone());

    let Some(cycle) = session.load_latest_cycle().await? else {
        println!("No training cycles yet.");
        return Ok(());
    };

    println!("Cycle {}", cycle);
    for (goal, performance) in session.cycle_summary() {
        println!(
            "  {:<24} {:>12}  {} sets, avg {:.1} reps, max {:.1} kg, volume {:.1}{}",
            goal.exercise_name,
            goal.target_summary(),
            performance.total_sets,
            performance.average_reps,
            performance.max_weight,
            performance.total_volume,
            if performance.was_completed { "  (done)" } else { "" }
        );
    }

    println!();
    println!("Proposed for cycle {}", cycle + 1);
    for proposal in session.propose_for_loaded_cycle() {
        let reps = proposal
            .target_reps
            .map(|r| format!(" x {}", r))
            .unwrap_or_default();
        println!(
            "  {:<24} {}{}  {}",
            proposal.exercise_name, proposal.target_sets, reps, proposal.rationale
        );
    }

    session.teardown();
    Ok(())
}
