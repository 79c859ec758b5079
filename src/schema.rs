//! Database schema management for `weatherflow`.
//!
//! Ensures the observation history table and its indexes exist before the
//! poller starts. Applied once on startup from `main.rs`, and only when a
//! PostgreSQL store is configured.

use anyhow::Result;
use sqlx::PgPool;

// ---

/// Append-only history. `seq` records ingestion order and breaks ties between
/// equal `observed_at` values.
///
/// String columns are unbounded `TEXT`: provider text and caller-supplied
/// names must round-trip exactly as the in-memory store keeps them.
const CREATE_OBSERVATIONS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS weather_observations (
        seq                 BIGSERIAL        PRIMARY KEY,
        id                  UUID             NOT NULL UNIQUE,
        location_name       TEXT             NOT NULL,
        region              TEXT             NOT NULL,
        country             TEXT             NOT NULL,
        temperature         DOUBLE PRECISION NOT NULL,
        feels_like          DOUBLE PRECISION NOT NULL,
        min_temperature     DOUBLE PRECISION NOT NULL,
        max_temperature     DOUBLE PRECISION NOT NULL,
        humidity            INTEGER          NOT NULL,
        pressure            DOUBLE PRECISION NOT NULL,
        wind_speed          DOUBLE PRECISION NOT NULL,
        wind_direction      INTEGER          NOT NULL,
        cloudiness          INTEGER          NOT NULL,
        weather_main        TEXT             NOT NULL,
        weather_description TEXT             NOT NULL,
        description         TEXT             NOT NULL,
        icon                TEXT             NOT NULL,
        observed_at         TIMESTAMPTZ      NOT NULL,
        ingested_at         TIMESTAMPTZ      NOT NULL
    );
"#;

/// Lifts length limits from tables created with bounded columns.
const WIDEN_TEXT_COLUMNS: &str = r#"
    ALTER TABLE weather_observations
        ALTER COLUMN location_name TYPE TEXT,
        ALTER COLUMN region        TYPE TEXT,
        ALTER COLUMN description   TYPE TEXT,
        ALTER COLUMN icon          TYPE TEXT;
"#;

// Location range scans
const CREATE_LOCATION_TIME_INDEX: &str = r#"
    CREATE INDEX IF NOT EXISTS idx_weather_observations_location_time
        ON weather_observations (location_name, region, observed_at);
"#;

/// Create or update the database schema (idempotent).
///
/// Safe to call on every startup; no-op if objects already exist.
pub async fn create_schema(pool: &PgPool) -> Result<()> {
    // ---
    let mut tx = pool.begin().await?;

    for statement in [
        CREATE_OBSERVATIONS_TABLE,
        WIDEN_TEXT_COLUMNS,
        CREATE_LOCATION_TIME_INDEX,
    ] {
        sqlx::query(statement).execute(&mut *tx).await?;
    }

    tx.commit().await?;
    Ok(())
}
