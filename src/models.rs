//! Data models for the weather pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ProviderError;

// ---

/// A named place with coordinates usable for a provider fetch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Location {
    // ---
    pub name: String,
    pub region: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    // ---
    pub fn new(name: &str, region: &str, latitude: f64, longitude: f64) -> Self {
        Self {
            name: name.to_string(),
            region: region.to_string(),
            latitude,
            longitude,
        }
    }
}

/// One normalized weather reading, as persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Observation {
    // ---
    pub id: Uuid,
    pub location_name: String,
    pub region: String,
    pub country: String,
    pub temperature: f64,
    pub feels_like: f64,
    pub min_temperature: f64,
    pub max_temperature: f64,
    pub humidity: i32,
    pub pressure: f64,
    pub wind_speed: f64,
    pub wind_direction: i32,
    pub cloudiness: i32,
    pub weather_main: String,
    pub weather_description: String,
    pub description: String,
    pub icon: String,
    /// Instant reported by the provider (UTC).
    pub observed_at: DateTime<Utc>,
    /// When the observation was stored (UTC).
    pub ingested_at: DateTime<Utc>,
}

impl Observation {
    /// Stamp a freshly fetched reading with its canonical location and
    /// ingestion metadata.
    pub fn into_located(mut self, location: &Location, now: DateTime<Utc>) -> Self {
        // ---
        self.id = Uuid::new_v4();
        self.location_name = location.name.clone();
        self.region = location.region.clone();
        self.ingested_at = now;
        self
    }
}

// ---

/// Raw "current weather" payload from the provider.
///
/// Only `main` and a non-empty `weather` list are mandatory; the remaining
/// blocks fall back to zero values when absent.
#[derive(Debug, Deserialize)]
pub struct RawCurrentWeather {
    // ---
    pub dt: i64,
    pub main: Option<RawMain>,
    #[serde(default)]
    pub weather: Vec<RawCondition>,
    pub wind: Option<RawWind>,
    pub clouds: Option<RawClouds>,
    pub sys: Option<RawSys>,
}

#[derive(Debug, Deserialize)]
pub struct RawMain {
    pub temp: f64,
    pub feels_like: f64,
    pub temp_min: f64,
    pub temp_max: f64,
    pub pressure: f64,
    pub humidity: i32,
}

#[derive(Debug, Deserialize)]
pub struct RawCondition {
    #[serde(default)]
    pub main: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: String,
}

#[derive(Debug, Deserialize)]
pub struct RawWind {
    #[serde(default)]
    pub speed: f64,
    #[serde(default)]
    pub deg: i32,
}

#[derive(Debug, Deserialize)]
pub struct RawClouds {
    #[serde(default)]
    pub all: i32,
}

#[derive(Debug, Deserialize)]
pub struct RawSys {
    pub country: Option<String>,
}

/// Normalization from the provider payload
impl RawCurrentWeather {
    /// Convert into an [`Observation`] with blank location fields.
    ///
    /// Measurements are copied verbatim. Returns an error instead of a
    /// partially populated observation when the measurement block or the
    /// condition list is missing.
    pub fn to_observation(&self) -> Result<Observation, ProviderError> {
        // ---
        let main = self
            .main
            .as_ref()
            .ok_or_else(|| ProviderError::Malformed("missing `main` block".to_string()))?;

        let condition = self
            .weather
            .first()
            .ok_or_else(|| ProviderError::Malformed("empty `weather` list".to_string()))?;

        let observed_at = DateTime::<Utc>::from_timestamp(self.dt, 0)
            .ok_or_else(|| ProviderError::Malformed(format!("timestamp out of range: {}", self.dt)))?;

        let country = self
            .sys
            .as_ref()
            .and_then(|s| s.country.clone())
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| "BR".to_string());

        Ok(Observation {
            id: Uuid::nil(),
            location_name: String::new(),
            region: String::new(),
            country,
            temperature: main.temp,
            feels_like: main.feels_like,
            min_temperature: main.temp_min,
            max_temperature: main.temp_max,
            humidity: main.humidity,
            pressure: main.pressure,
            wind_speed: self.wind.as_ref().map_or(0.0, |w| w.speed),
            wind_direction: self.wind.as_ref().map_or(0, |w| w.deg),
            cloudiness: self.clouds.as_ref().map_or(0, |c| c.all),
            weather_main: condition.main.clone(),
            weather_description: condition.description.clone(),
            description: format!("{} - {}", condition.main, condition.description),
            icon: condition.icon.clone(),
            observed_at,
            ingested_at: observed_at,
        })
    }
}
