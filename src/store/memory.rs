use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::{ObservationFilter, ObservationStore};
use crate::error::StoreError;
use crate::models::Observation;

// ---

/// Process-local store. Rows are kept in ingestion order.
#[derive(Debug, Default)]
pub struct MemoryObservationStore {
    rows: RwLock<Vec<Observation>>,
}

impl MemoryObservationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ObservationStore for MemoryObservationStore {
    async fn append(&self, observation: &Observation) -> Result<(), StoreError> {
        self.rows.write().await.push(observation.clone());
        Ok(())
    }

    async fn query_range(
        &self,
        filter: &ObservationFilter,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Observation>, StoreError> {
        // ---
        let rows = self.rows.read().await;
        let mut matched: Vec<Observation> = rows
            .iter()
            .filter(|o| filter.matches(o) && o.observed_at >= start && o.observed_at <= end)
            .cloned()
            .collect();

        // Stable sort keeps ingestion order for equal timestamps
        matched.sort_by_key(|o| o.observed_at);
        Ok(matched)
    }

    async fn latest(&self, name: &str, region: &str) -> Result<Option<Observation>, StoreError> {
        // ---
        let rows = self.rows.read().await;
        let filter = ObservationFilter::Location {
            name: name.to_string(),
            region: region.to_string(),
        };

        // Last maximum wins so a later ingestion beats an earlier one at the same instant
        let latest = rows
            .iter()
            .filter(|o| filter.matches(o))
            .fold(None::<&Observation>, |best, o| match best {
                Some(b) if b.observed_at > o.observed_at => Some(b),
                _ => Some(o),
            });

        Ok(latest.cloned())
    }

    async fn count(&self) -> Result<u64, StoreError> {
        Ok(self.rows.read().await.len() as u64)
    }
}
