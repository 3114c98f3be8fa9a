//! Engagement engine daemon for the Kudos meme platform.
//!
//! Connects to `PostgreSQL`, runs migrations, and keeps the
//! materialized trending view fresh on the configured interval until
//! interrupted.
//!
//! # Startup Sequence
//!
//! 1. Initialize structured logging (tracing)
//! 2. Load configuration from `kudos-config.yaml`
//! 3. Connect to `PostgreSQL` and run migrations
//! 4. Build the engagement engine
//! 5. Run the trending refresh loop until Ctrl-C

use std::path::Path;
use std::time::Duration;

use kudos_db::PostgresPool;
use kudos_engine::{EngagementEngine, EngineConfig};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Default configuration file path, relative to the working directory.
const CONFIG_PATH: &str = "kudos-config.yaml";

/// Application entry point for the engagement engine daemon.
///
/// # Errors
///
/// Returns an error if configuration loading or the database
/// connection fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("kudos-engine starting");

    // 2. Load configuration.
    let config_path = Path::new(CONFIG_PATH);
    let config = if config_path.exists() {
        EngineConfig::from_file(config_path)?
    } else {
        warn!(path = CONFIG_PATH, "Config file not found, using defaults");
        EngineConfig::default()
    };
    info!(
        trending_window_hours = config.trending.window_hours,
        refresh_interval_secs = config.trending.refresh_interval_secs,
        "Configuration loaded"
    );

    // 3. Connect to PostgreSQL and run migrations.
    let pool = PostgresPool::connect_url(&config.infrastructure.postgres_url).await?;
    pool.run_migrations().await?;
    info!("PostgreSQL connected, migrations applied");

    // 4. Build the engine, applying any badge catalog override.
    let mut engine = EngagementEngine::new(
        pool.pool().clone(),
        config.points.clone(),
        config.trending.window_hours,
    );
    if !config.badges.is_empty() {
        info!(badges = config.badges.len(), "Using badge catalog from config");
        engine = engine.with_catalog(config.badges.clone());
    }

    // 5. Refresh trending on the configured interval until Ctrl-C.
    let refresh_interval = Duration::from_secs(config.trending.refresh_interval_secs);
    let mut ticker = tokio::time::interval(refresh_interval);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match engine.refresh_trending().await {
                    Ok(memes) => info!(memes, "Trending view refreshed"),
                    Err(e) => error!(error = %e, "Trending refresh failed"),
                }
            }
            result = tokio::signal::ctrl_c() => {
                if let Err(e) = result {
                    error!(error = %e, "Failed to listen for shutdown signal");
                }
                break;
            }
        }
    }

    info!("kudos-engine shutting down");
    pool.close().await;
    Ok(())
}
