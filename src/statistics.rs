//! Daily aggregate over one location's observations.

use chrono::{DateTime, Days, FixedOffset, NaiveDate, TimeZone, Utc};
use serde::Serialize;

use crate::models::Observation;

// ---

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyStatistics {
    // ---
    pub date: NaiveDate,
    pub location_name: String,
    pub region: String,
    pub min_temperature: f64,
    pub max_temperature: f64,
    pub average_temperature: f64,
    pub average_humidity: f64,
    pub average_pressure: f64,
    pub average_wind_speed: f64,
    pub count: usize,
}

impl DailyStatistics {
    /// Reduce one day's observations. `None` when there are none.
    ///
    /// The minimum is taken over each reading's `min_temperature` and the
    /// maximum over `max_temperature`; averages are rounded to 2 decimals.
    pub fn from_observations(
        date: NaiveDate,
        location_name: &str,
        region: &str,
        observations: &[Observation],
    ) -> Option<Self> {
        // ---
        if observations.is_empty() {
            return None;
        }

        let min_temperature = observations
            .iter()
            .map(|o| o.min_temperature)
            .fold(f64::INFINITY, f64::min);
        let max_temperature = observations
            .iter()
            .map(|o| o.max_temperature)
            .fold(f64::NEG_INFINITY, f64::max);

        Some(Self {
            date,
            location_name: location_name.to_string(),
            region: region.to_string(),
            min_temperature,
            max_temperature,
            average_temperature: average(observations, |o| o.temperature),
            average_humidity: average(observations, |o| f64::from(o.humidity)),
            average_pressure: average(observations, |o| o.pressure),
            average_wind_speed: average(observations, |o| o.wind_speed),
            count: observations.len(),
        })
    }
}

/// UTC bounds `[start, end]` of a local calendar day at `offset`.
///
/// `end` is the last microsecond of the day so inclusive range queries do not
/// pick up the next midnight.
pub fn day_bounds(date: NaiveDate, offset: FixedOffset) -> (DateTime<Utc>, DateTime<Utc>) {
    // ---
    let local_midnight = |d: NaiveDate| {
        let naive = d.and_hms_opt(0, 0, 0).unwrap_or_default();
        offset
            .from_local_datetime(&naive)
            .single()
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|| Utc.from_utc_datetime(&naive))
    };

    let start = local_midnight(date);
    let next = date.checked_add_days(Days::new(1)).unwrap_or(date);
    let end = local_midnight(next) - chrono::Duration::microseconds(1);
    (start, end)
}

fn average(observations: &[Observation], field: impl Fn(&Observation) -> f64) -> f64 {
    // ---
    let sum: f64 = observations.iter().map(field).sum();
    round2(sum / observations.len() as f64)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
