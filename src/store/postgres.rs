use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::{ObservationFilter, ObservationStore};
use crate::error::StoreError;
use crate::models::Observation;

// ---

const SELECT_COLUMNS: &str = r#"
    SELECT id, location_name, region, country,
           temperature, feels_like, min_temperature, max_temperature,
           humidity, pressure, wind_speed, wind_direction, cloudiness,
           weather_main, weather_description, description, icon,
           observed_at, ingested_at
    FROM weather_observations
"#;

/// PostgreSQL-backed history. Expects the schema from [`crate::schema`].
#[derive(Debug, Clone)]
pub struct PgObservationStore {
    pool: PgPool,
}

impl PgObservationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ObservationStore for PgObservationStore {
    async fn append(&self, obs: &Observation) -> Result<(), StoreError> {
        // ---
        sqlx::query(
            r#"
            INSERT INTO weather_observations (
                id, location_name, region, country,
                temperature, feels_like, min_temperature, max_temperature,
                humidity, pressure, wind_speed, wind_direction, cloudiness,
                weather_main, weather_description, description, icon,
                observed_at, ingested_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10,
                      $11, $12, $13, $14, $15, $16, $17, $18, $19)
            "#,
        )
        .bind(obs.id)
        .bind(&obs.location_name)
        .bind(&obs.region)
        .bind(&obs.country)
        .bind(obs.temperature)
        .bind(obs.feels_like)
        .bind(obs.min_temperature)
        .bind(obs.max_temperature)
        .bind(obs.humidity)
        .bind(obs.pressure)
        .bind(obs.wind_speed)
        .bind(obs.wind_direction)
        .bind(obs.cloudiness)
        .bind(&obs.weather_main)
        .bind(&obs.weather_description)
        .bind(&obs.description)
        .bind(&obs.icon)
        .bind(obs.observed_at)
        .bind(obs.ingested_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn query_range(
        &self,
        filter: &ObservationFilter,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Observation>, StoreError> {
        // ---
        let mut qb = QueryBuilder::<Postgres>::new(SELECT_COLUMNS);

        match filter {
            ObservationFilter::Location { name, region } => {
                qb.push(" WHERE location_name = ").push_bind(name.clone());
                qb.push(" AND region = ").push_bind(region.clone());
            }
            ObservationFilter::Name(name) => {
                qb.push(" WHERE location_name = ").push_bind(name.clone());
            }
            ObservationFilter::Country { name, country } => {
                qb.push(" WHERE location_name = ").push_bind(name.clone());
                qb.push(" AND LOWER(country) = LOWER(").push_bind(country.clone()).push(")");
            }
        }

        qb.push(" AND observed_at >= ").push_bind(start);
        qb.push(" AND observed_at <= ").push_bind(end);
        qb.push(" ORDER BY observed_at ASC, seq ASC");

        let rows = qb
            .build_query_as::<Observation>()
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    async fn latest(&self, name: &str, region: &str) -> Result<Option<Observation>, StoreError> {
        // ---
        let sql = format!(
            "{SELECT_COLUMNS} WHERE location_name = $1 AND region = $2 \
             ORDER BY observed_at DESC, seq DESC LIMIT 1"
        );

        let row = sqlx::query_as::<_, Observation>(&sql)
            .bind(name)
            .bind(region)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    async fn count(&self) -> Result<u64, StoreError> {
        // ---
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM weather_observations")
            .fetch_one(&self.pool)
            .await?;

        Ok(count.max(0) as u64)
    }
}
