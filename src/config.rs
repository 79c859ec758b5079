//! Configuration loader for the `weatherflow` service.
//!
//! This module centralizes all runtime configuration values and their defaults,
//! loading from environment variables (with optional `.env` file support
//! provided by the caller). By consolidating configuration logic here, we
//! avoid scattering `env::var` calls throughout the codebase.
//!
use std::env;
use std::time::Duration;

use anyhow::{anyhow, Result};
use chrono::{FixedOffset, Local};

/// Default poll interval when unset or non-positive.
pub const DEFAULT_POLL_INTERVAL_MINUTES: i64 = 15;

/// Parse an optional integer environment variable with a default value.
macro_rules! parse_env_num {
    ($var_name:expr, $ty:ty, $default:expr) => {
        env::var($var_name)
            .ok()
            .map(|v| v.trim().parse::<$ty>())
            .transpose()
            .map_err(|e| anyhow!("Invalid {}: {}", $var_name, e))?
            .unwrap_or($default)
    };
}

/// Read an optional string environment variable, treating blank as unset.
macro_rules! optional_env {
    ($var_name:expr) => {
        env::var($var_name).ok().filter(|v| !v.trim().is_empty())
    };
}

/// Strongly typed application configuration.
///
/// All fields are immutable after loading, ensuring a consistent configuration
/// snapshot for the lifetime of the application.
#[derive(Debug, Clone)]
pub struct Config {
    // ---
    /// PostgreSQL connection string. `None` selects the in-memory store.
    pub db_url: Option<String>,

    /// Maximum number of database connections in the pool.
    pub db_pool_max: u32,

    /// OpenWeatherMap API key. Absence makes every fetch fail.
    pub api_key: Option<String>,

    /// OpenWeatherMap base URL (without the `/weather` path).
    pub api_url: String,

    /// Response language requested from the provider.
    pub api_lang: String,

    /// Per-request timeout for provider calls.
    pub provider_timeout: Duration,

    /// Sleep between full sweeps.
    pub poll_interval: Duration,

    /// Delay between consecutive per-location fetches within a sweep.
    pub poll_location_delay: Duration,

    /// Location seeded on startup when the store is empty.
    pub default_location: String,

    /// Offset used to render chart labels and daily statistics boundaries.
    pub display_offset: FixedOffset,
}

impl Default for Config {
    fn default() -> Self {
        // ---
        Self {
            db_url: None,
            db_pool_max: 5,
            api_key: None,
            api_url: "https://api.openweathermap.org/data/2.5".to_string(),
            api_lang: "pt_br".to_string(),
            provider_timeout: Duration::from_secs(30),
            poll_interval: poll_interval_from_minutes(DEFAULT_POLL_INTERVAL_MINUTES),
            poll_location_delay: Duration::from_millis(500),
            default_location: "São Paulo".to_string(),
            display_offset: *Local::now().offset(),
        }
    }
}

/// Load configuration from environment variables with defaults.
///
/// Optional:
/// - `DATABASE_URL` – PostgreSQL connection string (default: in-memory store)
/// - `DB_POOL_MAX` – max DB connections (default: 5)
/// - `OPENWEATHER_API_KEY` – provider key (default: unset, fetches fail)
/// - `OPENWEATHER_BASE_URL` – provider base URL
/// - `OPENWEATHER_LANG` – provider response language (default: `pt_br`)
/// - `PROVIDER_TIMEOUT_SECS` – request timeout (default: 30)
/// - `POLL_INTERVAL_MINUTES` – sweep interval, ≤0 means default (default: 15)
/// - `POLL_LOCATION_DELAY_MS` – delay between locations (default: 500)
/// - `DEFAULT_LOCATION` – seeded location (default: `São Paulo`)
/// - `DISPLAY_UTC_OFFSET_MINUTES` – label offset (default: host local offset)
///
/// Returns an error if any numeric variable is invalid.
pub fn load_from_env() -> Result<Config> {
    // ---
    let defaults = Config::default();

    let db_url = optional_env!("DATABASE_URL");
    let db_pool_max = parse_env_num!("DB_POOL_MAX", u32, defaults.db_pool_max);
    let api_key = optional_env!("OPENWEATHER_API_KEY");
    let api_url = optional_env!("OPENWEATHER_BASE_URL").unwrap_or(defaults.api_url);
    let api_lang = optional_env!("OPENWEATHER_LANG").unwrap_or(defaults.api_lang);
    let timeout_secs = parse_env_num!("PROVIDER_TIMEOUT_SECS", u64, 30);
    let interval_minutes =
        parse_env_num!("POLL_INTERVAL_MINUTES", i64, DEFAULT_POLL_INTERVAL_MINUTES);
    let delay_ms = parse_env_num!("POLL_LOCATION_DELAY_MS", u64, 500);
    let default_location =
        optional_env!("DEFAULT_LOCATION").unwrap_or(defaults.default_location);

    let display_offset = match optional_env!("DISPLAY_UTC_OFFSET_MINUTES") {
        Some(raw) => {
            let minutes = raw
                .trim()
                .parse::<i32>()
                .map_err(|e| anyhow!("Invalid DISPLAY_UTC_OFFSET_MINUTES: {}", e))?;
            minutes
                .checked_mul(60)
                .and_then(FixedOffset::east_opt)
                .ok_or_else(|| anyhow!("DISPLAY_UTC_OFFSET_MINUTES out of range: {}", minutes))?
        }
        None => defaults.display_offset,
    };

    Ok(Config {
        db_url,
        db_pool_max,
        api_key,
        api_url,
        api_lang,
        provider_timeout: Duration::from_secs(timeout_secs),
        poll_interval: poll_interval_from_minutes(interval_minutes),
        poll_location_delay: Duration::from_millis(delay_ms),
        default_location,
        display_offset,
    })
}

/// Convert a configured minute count into the sweep interval.
///
/// Non-positive values fall back to [`DEFAULT_POLL_INTERVAL_MINUTES`];
/// oversized values saturate instead of overflowing.
pub fn poll_interval_from_minutes(minutes: i64) -> Duration {
    // ---
    let minutes = if minutes <= 0 {
        DEFAULT_POLL_INTERVAL_MINUTES
    } else {
        minutes
    };
    Duration::from_secs((minutes as u64).saturating_mul(60))
}

impl Config {
    /// Log the loaded configuration for debugging purposes.
    ///
    /// Masks sensitive information like database passwords and the API key
    /// while showing all configuration values that were loaded.
    pub fn log_config(&self) {
        // ---
        let masked_db_url = self
            .db_url
            .as_deref()
            .map_or_else(|| "(unset, in-memory store)".to_string(), mask_db_url);

        let masked_api_key = match self.api_key.as_deref() {
            Some(key) if key.chars().count() > 4 => {
                let tail: String = key.chars().skip(key.chars().count() - 4).collect();
                format!("****{}", tail)
            }
            Some(_) => "****".to_string(),
            None => "(unset)".to_string(),
        };

        tracing::info!("Configuration loaded:");
        tracing::info!("  DATABASE_URL               : {}", masked_db_url);
        tracing::info!("  DB_POOL_MAX                : {}", self.db_pool_max);
        tracing::info!("  OPENWEATHER_API_KEY        : {}", masked_api_key);
        tracing::info!("  OPENWEATHER_BASE_URL       : {}", self.api_url);
        tracing::info!("  OPENWEATHER_LANG           : {}", self.api_lang);
        tracing::info!("  PROVIDER_TIMEOUT_SECS      : {}", self.provider_timeout.as_secs());
        tracing::info!("  POLL_INTERVAL_MINUTES      : {}", self.poll_interval.as_secs() / 60);
        tracing::info!("  POLL_LOCATION_DELAY_MS     : {}", self.poll_location_delay.as_millis());
        tracing::info!("  DEFAULT_LOCATION           : {}", self.default_location);
        tracing::info!("  DISPLAY_UTC_OFFSET_MINUTES : {}", self.display_offset.local_minus_utc() / 60);

        if self.api_key.is_none() {
            tracing::error!("OPENWEATHER_API_KEY is not set; every weather fetch will fail");
        }
    }
}

/// Mask the password in a database URL
fn mask_db_url(db_url: &str) -> String {
    // ---
    if let Some(at_pos) = db_url.rfind('@') {
        if let Some(colon_pos) = db_url[..at_pos].rfind(':') {
            // `postgres://host@...` has its only colon in the scheme
            if !db_url[colon_pos..].starts_with("://") {
                return format!("{}:****{}", &db_url[..colon_pos], &db_url[at_pos..]);
            }
        }
    }
    db_url.to_string()
}
