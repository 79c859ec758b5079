//! Storage collaborator for the observation history.
//!
//! The history is append-only. Range queries compare UTC instants, inclusive
//! on both ends, and return rows ordered by `observed_at` ascending with ties
//! broken by ingestion order.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::StoreError;
use crate::models::Observation;

mod memory;
mod postgres;

pub use memory::MemoryObservationStore;
pub use postgres::PgObservationStore;

// ---

/// Which observations a range query selects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObservationFilter {
    /// Exact canonical `(name, region)`.
    Location { name: String, region: String },
    /// Name only, across all regions.
    Name(String),
    /// Name plus country code; the country compares case-insensitively.
    Country { name: String, country: String },
}

impl ObservationFilter {
    pub fn matches(&self, obs: &Observation) -> bool {
        // ---
        match self {
            Self::Location { name, region } => {
                obs.location_name == *name && obs.region == *region
            }
            Self::Name(name) => obs.location_name == *name,
            Self::Country { name, country } => {
                obs.location_name == *name && obs.country.eq_ignore_ascii_case(country)
            }
        }
    }
}

#[async_trait]
pub trait ObservationStore: Send + Sync {
    /// Append one observation to the history.
    async fn append(&self, observation: &Observation) -> Result<(), StoreError>;

    /// Observations matching `filter` with `start <= observed_at <= end`.
    async fn query_range(
        &self,
        filter: &ObservationFilter,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Observation>, StoreError>;

    /// Most recent observation for a canonical `(name, region)`.
    async fn latest(&self, name: &str, region: &str) -> Result<Option<Observation>, StoreError>;

    /// Total number of stored observations.
    async fn count(&self) -> Result<u64, StoreError>;
}
