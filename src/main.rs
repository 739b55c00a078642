//! Brawl Sim - headless authoritative session with bot clients
//!
//! Starts one authoritative session and a set of seeded bot clients that
//! predict locally, batch their inputs and reconcile against the session's
//! updates. Runs for the configured duration or until a shutdown signal.

use tokio::task::JoinSet;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use brawl_sim::app::AppState;
use brawl_sim::config::Config;
use brawl_sim::game::{BotInput, ClientSession, ClientStats};
use brawl_sim::util::time::{init_server_time, uptime_secs};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize tracing
    init_tracing(&config.log_level);

    // Initialize process time tracking
    init_server_time();

    info!("Starting Brawl Sim");
    info!(
        tps = config.simulation_tps,
        bots = config.bot_count,
        duration_secs = config.demo_duration_secs,
        "Demo configuration"
    );

    // Create application state
    let state = AppState::new(config.clone())?;
    let handle = state.session_for_join();
    info!(session_id = %handle.id, "Session ready");

    let names: Vec<String> = state.roster.names().map(str::to_string).collect();
    if names.is_empty() {
        anyhow::bail!("Roster has no characters");
    }
    let ticks = config.demo_duration_secs * u64::from(config.simulation_tps);

    // Spawn bot clients
    let mut bots = JoinSet::new();
    for i in 0..config.bot_count {
        let character = &names[i % names.len()];
        let source = Box::new(BotInput::new(config.bot_seed.wrapping_add(i as u64)));
        let mut client =
            ClientSession::connect(&handle, state.roster.clone(), character, source).await?;

        bots.spawn(async move {
            let player_id = client.player_id();
            if let Err(e) = client.run(ticks).await {
                warn!(player_id, error = %e, "Bot stopped early");
            }
            (player_id, client.leave().await)
        });
    }

    let finished = tokio::select! {
        _ = collect_bots(&mut bots) => true,
        _ = shutdown_signal() => false,
    };
    if finished {
        info!("Demo finished");
    } else {
        bots.abort_all();
    }

    state.registry.shutdown_all().await;
    info!(
        active_sessions = state.registry.active_sessions(),
        uptime_secs = uptime_secs(),
        "Shutdown complete"
    );
    Ok(())
}

/// Wait for every bot and log its counters
async fn collect_bots(bots: &mut JoinSet<(u8, ClientStats)>) {
    while let Some(result) = bots.join_next().await {
        match result {
            Ok((player_id, stats)) => info!(
                player_id,
                ticks = stats.ticks,
                batches = stats.batches_sent,
                reconciliations = stats.reconciliations,
                snaps = stats.snaps,
                max_correction = stats.max_correction,
                "Bot finished"
            ),
            Err(e) => error!(error = %e, "Bot task failed"),
        }
    }
}

/// Initialize tracing/logging
fn init_tracing(log_level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        }
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown");
        }
    }
}
