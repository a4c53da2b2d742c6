//! League engine binary for Courtside.
//!
//! Wires configuration, persistence, the judge, the HTTP API and the
//! tournament scheduler together and runs until `Ctrl-C`.
//!
//! # Startup Sequence
//!
//! 1. Initialize structured logging (tracing)
//! 2. Load configuration from `courtside-config.yaml`
//! 3. Open the store (`PostgreSQL` when `DATABASE_URL` is set, else memory)
//! 4. Build the judge (model backend from the environment, or fallback)
//! 5. Spawn the scheduler loop if enabled
//! 6. Serve the HTTP API until shutdown

mod error;

use std::path::Path;
use std::sync::Arc;

use courtside_core::{CourtsideConfig, League, run_scheduler};
use courtside_db::{LeagueStore, PostgresConfig};
use courtside_judge::WorldJudge;
use courtside_server::{AppState, start_server};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;

/// Path of the optional configuration file, relative to the working
/// directory.
const CONFIG_PATH: &str = "courtside-config.yaml";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if any initialization step fails or the server stops
/// with a fatal error.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("courtside-engine starting");

    // 2. Load configuration.
    let config = load_config()?;
    info!(
        port = config.server.port,
        season_games = config.season.total_games,
        tournament_rounds = config.tournament.total_rounds,
        scheduler_enabled = config.scheduler.enabled,
        "Configuration loaded"
    );

    // 3. Open the store.
    let store = open_store(&config).await?;
    info!(backend = store.backend_name(), "Store ready");

    // 4. Build the judge.
    let judge = WorldJudge::new(&config.judge_config()?).map_err(EngineError::from)?;
    if judge.is_model_enabled() {
        info!("Judge model backend enabled");
    } else {
        warn!("No judge backend configured, using deterministic fallback");
    }

    let port = config.server.port;
    let scheduler = config.scheduler.clone();
    let league = Arc::new(League::new(store, judge, config));

    // 5. Scheduler.
    let scheduler_handle = if scheduler.enabled {
        Some(tokio::spawn(run_scheduler(
            Arc::clone(&league),
            scheduler.interval(),
        )))
    } else {
        info!("In-process scheduler disabled, waiting for the cron endpoint");
        None
    };

    // 6. HTTP API until Ctrl-C.
    let served = start_server(port, AppState::new(league), shutdown_signal()).await;

    if let Some(handle) = scheduler_handle {
        handle.abort();
    }
    served.map_err(EngineError::from)?;

    info!("courtside-engine shutdown complete");
    Ok(())
}

/// Load configuration from [`CONFIG_PATH`], falling back to defaults, then
/// apply environment overrides.
fn load_config() -> Result<CourtsideConfig, EngineError> {
    let path = Path::new(CONFIG_PATH);
    if path.exists() {
        return Ok(CourtsideConfig::from_file(path)?);
    }
    info!("Config file not found, using defaults");
    let mut config = CourtsideConfig::default();
    config.apply_env_overrides();
    Ok(config)
}

/// `PostgreSQL` when a database URL is configured, otherwise memory.
async fn open_store(config: &CourtsideConfig) -> Result<LeagueStore, EngineError> {
    match &config.infrastructure.database_url {
        Some(url) if !url.is_empty() => {
            Ok(courtside_db::connect_store(&PostgresConfig::new(url)).await?)
        }
        _ => {
            warn!("DATABASE_URL not set, league state will not survive a restart");
            Ok(LeagueStore::memory())
        }
    }
}

/// Resolve on `Ctrl-C`.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
