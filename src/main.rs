//! Application entry point for the `weatherflow` background service.
//!
//! This binary orchestrates the full startup sequence for the weather
//! acquisition pipeline, including:
//! - Loading configuration from environment variables or `.env`
//! - Initializing structured logging/tracing
//! - Selecting the observation store (PostgreSQL pool or in-memory)
//! - Creating the database schema if it does not exist
//! - Seeding the default location when the history is empty
//! - Running the poller until Ctrl-C
//!
//! # Environment Variables
//! - `DATABASE_URL` (optional) – PostgreSQL connection string
//! - `OPENWEATHER_API_KEY` (optional, but every fetch fails without it)
//! - `WEATHERFLOW_LOG_LEVEL` (optional) – log verbosity (default: `debug`)
//! - `WEATHERFLOW_SPAN_EVENTS` (optional) – span event mode for tracing
//!
//! See [`weatherflow::config`] for the full list.
use std::{env, sync::Arc};

use dotenvy::dotenv;
use is_terminal::IsTerminal;
use sqlx::postgres::PgPoolOptions;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

use anyhow::Result;

use weatherflow::{
    config, schema, AcquisitionService, Config, LocationRegistry, LocationResolver,
    MemoryObservationStore, ObservationStore, OpenWeatherClient, PgObservationStore, Poller,
};

// ---

#[tokio::main]
async fn main() -> Result<()> {
    // ---
    init_tracing();
    dotenv().ok();

    let cfg = config::load_from_env()?;
    cfg.log_config();

    let store = build_store(&cfg).await?;

    let registry = Arc::new(LocationRegistry::brazilian_capitals());
    let resolver = LocationResolver::new(registry.clone());
    let provider = OpenWeatherClient::new(
        &cfg.api_url,
        cfg.api_key.clone(),
        &cfg.api_lang,
        cfg.provider_timeout,
    )?;

    let service = AcquisitionService::new(resolver, Arc::new(provider), store);
    service.seed_if_empty(&cfg.default_location).await?;

    let cancel = CancellationToken::new();
    let poller = Poller::new(
        service,
        registry,
        cfg.poll_interval,
        cfg.poll_location_delay,
    );
    let handle = poller.start(cancel.clone());

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown requested, stopping poller");
    cancel.cancel();
    handle.await?;

    Ok(())
}

// ---

/// Connect to PostgreSQL when `DATABASE_URL` is set, otherwise keep the
/// history in memory for the lifetime of the process.
async fn build_store(cfg: &Config) -> Result<Arc<dyn ObservationStore>> {
    // ---
    let Some(db_url) = cfg.db_url.as_deref() else {
        tracing::warn!("DATABASE_URL not set; observations are kept in memory only");
        return Ok(Arc::new(MemoryObservationStore::new()));
    };

    tracing::info!("Attempting to connect to database");

    let pool = PgPoolOptions::new()
        .max_connections(cfg.db_pool_max)
        .connect(db_url)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to connect to database: {}", e))?;

    tracing::info!("Successfully connected to database");

    schema::create_schema(&pool).await?;
    Ok(Arc::new(PgObservationStore::new(pool)))
}

/// Initialize the global tracing subscriber for structured logging.
///
/// This function configures the [`tracing_subscriber`] with:
/// - Log target, file, and line number output enabled
/// - Color output controlled by TTY detection and `FORCE_COLOR` env var:
///   - `FORCE_COLOR=1|true|yes`: force colors on
///   - `FORCE_COLOR=0|false|no`: force colors off
///   - unset or other values: auto-detect TTY
/// - Span event emission mode controlled by the `WEATHERFLOW_SPAN_EVENTS` env var:
///   - `"full"`       : emit ENTER, EXIT, and CLOSE events with timing
///   - `"enter_exit"` : emit ENTER and EXIT only
///   - unset or other values: emit CLOSE events only (default)
/// - Log level controlled by the `WEATHERFLOW_LOG_LEVEL` env var
///
/// This should be called once at application startup before any logging
/// or tracing macros are invoked. It installs the subscriber globally
/// for the lifetime of the process.
fn init_tracing() {
    // ---
    let span_events = match env::var("WEATHERFLOW_SPAN_EVENTS").as_deref() {
        Ok("full") => FmtSpan::FULL,
        Ok("enter_exit") => FmtSpan::ENTER | FmtSpan::EXIT,
        _ => FmtSpan::CLOSE,
    };

    // Determine if we should use colors
    let use_color = match env::var("FORCE_COLOR").as_deref() {
        Ok("1") | Ok("true") | Ok("yes") => true,
        Ok("0") | Ok("false") | Ok("no") => false,
        _ => std::io::stdout().is_terminal(),
    };

    // Use RUST_LOG if available, otherwise fall back to WEATHERFLOW_LOG_LEVEL
    let env_filter = if env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        let level = match env::var("WEATHERFLOW_LOG_LEVEL").ok().as_deref() {
            Some("trace") => "trace",
            Some("debug") => "debug",
            Some("info") => "info",
            Some("warn") => "warn",
            Some("error") => "error",
            _ => "debug",
        };
        EnvFilter::new(format!("{level},sqlx::query=warn,hyper=info,reqwest=info"))
    };

    tracing_subscriber::fmt()
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(span_events)
        .with_env_filter(env_filter)
        .with_ansi(use_color)
        .compact()
        .init();
}
