//! Chart-ready series over stored history.
//!
//! When the requested range holds no history the series falls back to a
//! single point taken from the current observation, so a newly tracked
//! location never renders as a blank chart.

use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;
use tracing::debug;

use crate::error::StoreError;
use crate::models::Observation;
use crate::service::AcquisitionService;

// ---

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemperaturePoint {
    pub temperature: f64,
    pub min_temp: f64,
    pub max_temp: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HumidityPoint {
    pub humidity: i32,
}

/// Index-aligned label / temperature / humidity sequences.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartSeries {
    pub labels: Vec<String>,
    pub temperature_data: Vec<TemperaturePoint>,
    pub humidity_data: Vec<HumidityPoint>,
}

impl ChartSeries {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    fn push(&mut self, obs: &Observation, offset: FixedOffset) {
        // ---
        self.labels.push(render_label(obs.observed_at, offset));
        self.temperature_data.push(TemperaturePoint {
            temperature: obs.temperature,
            min_temp: obs.min_temperature,
            max_temp: obs.max_temperature,
        });
        self.humidity_data.push(HumidityPoint {
            humidity: obs.humidity,
        });
    }
}

pub struct ChartAggregator {
    // ---
    service: AcquisitionService,
    display_offset: FixedOffset,
}

impl ChartAggregator {
    // ---
    pub fn new(service: AcquisitionService, display_offset: FixedOffset) -> Self {
        Self {
            service,
            display_offset,
        }
    }

    /// Build the series for `name` (and `region`, when given) over
    /// `[start, end]`.
    ///
    /// An empty range falls back to `get_current`, which may fetch and
    /// persist a fresh reading. If that also yields nothing the series is
    /// empty, which is not an error.
    pub async fn build_series(
        &self,
        name: &str,
        region: Option<&str>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<ChartSeries, StoreError> {
        // ---
        let region = region.map(str::trim).filter(|r| !r.is_empty());

        let mut rows = match region {
            Some(region) => {
                self.service
                    .get_historical_by_location(name, region, start, end)
                    .await?
            }
            None => self.service.get_historical_by_name(name, start, end).await?,
        };

        if rows.is_empty() {
            let region = region
                .or_else(|| self.service.resolver().region_for(name))
                .unwrap_or_default()
                .to_string();

            debug!("No history for {}-{}, falling back to current reading", name, region);
            rows.extend(self.service.get_current(name, &region).await);
        }

        let mut series = ChartSeries::default();
        for obs in &rows {
            series.push(obs, self.display_offset);
        }
        Ok(series)
    }
}

/// Local-time label in ISO "sortable" form, e.g. `2025-08-20T09:00:00`.
fn render_label(at: DateTime<Utc>, offset: FixedOffset) -> String {
    at.with_timezone(&offset).format("%Y-%m-%dT%H:%M:%S").to_string()
}
