//! Acquisition service: resolve → fetch → normalize → persist, plus the
//! read-only queries over the stored history.
//!
//! All range boundaries are UTC instants. Callers holding local times must
//! convert them before calling in; see [`crate::statistics::day_bounds`].

use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use tracing::{debug, info, warn};

use crate::error::{AcquisitionError, StoreError};
use crate::locations::LocationResolver;
use crate::models::Observation;
use crate::provider::WeatherProvider;
use crate::statistics::{day_bounds, DailyStatistics};
use crate::store::{ObservationFilter, ObservationStore};

// ---

/// Sole writer of the observation history.
#[derive(Clone)]
pub struct AcquisitionService {
    // ---
    resolver: LocationResolver,
    provider: Arc<dyn WeatherProvider>,
    store: Arc<dyn ObservationStore>,
}

impl AcquisitionService {
    // ---
    pub fn new(
        resolver: LocationResolver,
        provider: Arc<dyn WeatherProvider>,
        store: Arc<dyn ObservationStore>,
    ) -> Self {
        Self {
            resolver,
            provider,
            store,
        }
    }

    pub fn resolver(&self) -> &LocationResolver {
        &self.resolver
    }

    /// Fetch and persist a fresh observation, keeping the failure cause.
    ///
    /// Unknown locations fail before any provider call is made.
    pub async fn acquire(&self, name: &str, region: &str) -> Result<Observation, AcquisitionError> {
        // ---
        let location = self.resolver.resolve(name, region).ok_or_else(|| {
            AcquisitionError::UnknownLocation {
                name: name.trim().to_string(),
                region: region.trim().to_string(),
            }
        })?;

        debug!("Acquiring weather for {}-{}", location.name, location.region);

        let observation = self
            .provider
            .fetch_current(location.latitude, location.longitude)
            .await?
            .into_located(location, Utc::now());

        self.store.append(&observation).await?;

        debug!(
            "Stored observation {} for {}-{} at {}",
            observation.id, observation.location_name, observation.region, observation.observed_at
        );
        Ok(observation)
    }

    /// Fetch, persist and return the current observation.
    ///
    /// Every failure (unknown location, provider error, storage fault) is
    /// logged and collapsed into `None`.
    pub async fn get_current(&self, name: &str, region: &str) -> Option<Observation> {
        // ---
        match self.acquire(name, region).await {
            Ok(observation) => Some(observation),
            Err(AcquisitionError::UnknownLocation { name, region }) => {
                warn!("Coordinates not found for {}-{}", name, region);
                None
            }
            Err(e) => {
                warn!("Error fetching weather for {}-{}: {}", name.trim(), region.trim(), e);
                None
            }
        }
    }

    /// Most recent stored observation. Never triggers a fetch.
    pub async fn get_latest(
        &self,
        name: &str,
        region: &str,
    ) -> Result<Option<Observation>, StoreError> {
        // ---
        let (name, region) = self.resolver.canonicalize(name, region);
        self.store.latest(&name, &region).await
    }

    pub async fn get_historical_by_location(
        &self,
        name: &str,
        region: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Observation>, StoreError> {
        // ---
        let (name, region) = self.resolver.canonicalize(name, region);
        let filter = ObservationFilter::Location { name, region };
        self.store.query_range(&filter, start, end).await
    }

    /// Range query on name alone, across every region.
    pub async fn get_historical_by_name(
        &self,
        name: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Observation>, StoreError> {
        // ---
        let filter = ObservationFilter::Name(self.resolver.canonical_name(name));
        self.store.query_range(&filter, start, end).await
    }

    pub async fn get_historical_by_country(
        &self,
        name: &str,
        country: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Observation>, StoreError> {
        // ---
        let filter = ObservationFilter::Country {
            name: self.resolver.canonical_name(name),
            country: country.trim().to_string(),
        };
        self.store.query_range(&filter, start, end).await
    }

    /// Statistics for the calendar day `date` as seen at `offset`.
    pub async fn daily_statistics(
        &self,
        name: &str,
        region: &str,
        date: NaiveDate,
        offset: FixedOffset,
    ) -> Result<Option<DailyStatistics>, StoreError> {
        // ---
        let (start, end) = day_bounds(date, offset);
        let rows = self.get_historical_by_location(name, region, start, end).await?;
        let (name, region) = self.resolver.canonicalize(name, region);

        Ok(DailyStatistics::from_observations(date, &name, &region, &rows))
    }

    /// Acquire `default_location` once if the history is empty.
    ///
    /// Returns the seeded observation, or `None` when the store already had
    /// data or the fetch failed.
    pub async fn seed_if_empty(
        &self,
        default_location: &str,
    ) -> Result<Option<Observation>, StoreError> {
        // ---
        if self.store.count().await? > 0 {
            info!("Weather data already exists, skipping seed");
            return Ok(None);
        }

        let region = self
            .resolver
            .region_for(default_location)
            .unwrap_or("SP")
            .to_string();

        info!("Seeding first weather sample for {}-{}", default_location, region);
        Ok(self.get_current(default_location, &region).await)
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::error::ProviderError;
    use crate::locations::LocationRegistry;
    use crate::store::MemoryObservationStore;
    use async_trait::async_trait;
    use chrono::{Duration, TimeZone};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use uuid::Uuid;

    /// Returns a fixed reading and counts calls.
    struct FixedProvider {
        observed_at: DateTime<Utc>,
        temperature: f64,
        calls: AtomicUsize,
        fail: bool,
    }

    impl FixedProvider {
        fn new(observed_at: DateTime<Utc>, temperature: f64) -> Self {
            Self {
                observed_at,
                temperature,
                calls: AtomicUsize::new(0),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::new(Utc::now(), 0.0)
            }
        }
    }

    #[async_trait]
    impl WeatherProvider for FixedProvider {
        async fn fetch_current(&self, _lat: f64, _lon: f64) -> Result<Observation, ProviderError> {
            // ---
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(ProviderError::Malformed("boom".to_string()));
            }
            Ok(sample(self.observed_at, self.temperature))
        }
    }

    fn sample(observed_at: DateTime<Utc>, temperature: f64) -> Observation {
        // ---
        Observation {
            id: Uuid::nil(),
            location_name: String::new(),
            region: String::new(),
            country: "BR".to_string(),
            temperature,
            feels_like: temperature,
            min_temperature: temperature,
            max_temperature: temperature,
            humidity: 70,
            pressure: 1014.0,
            wind_speed: 2.5,
            wind_direction: 180,
            cloudiness: 40,
            weather_main: "Clouds".to_string(),
            weather_description: "nuvens dispersas".to_string(),
            description: "Clouds - nuvens dispersas".to_string(),
            icon: "03d".to_string(),
            observed_at,
            ingested_at: observed_at,
        }
    }

    fn service(provider: Arc<FixedProvider>) -> (AcquisitionService, Arc<MemoryObservationStore>) {
        // ---
        let registry = Arc::new(LocationRegistry::brazilian_capitals());
        let store = Arc::new(MemoryObservationStore::new());
        let svc = AcquisitionService::new(LocationResolver::new(registry), provider, store.clone());
        (svc, store)
    }

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 8, 20, 12, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_current_then_latest_and_history() {
        // ---
        let provider = Arc::new(FixedProvider::new(noon(), 24.0));
        let (svc, _) = service(provider);

        let current = svc.get_current("curitiba", "pr").await.unwrap();
        assert_eq!(current.location_name, "Curitiba");
        assert_eq!(current.region, "PR");

        let latest = svc.get_latest("Curitiba", "PR").await.unwrap().unwrap();
        assert_eq!(latest.observed_at, current.observed_at);
        assert_eq!(latest.id, current.id);

        let rows = svc
            .get_historical_by_location("Curitiba", "PR", noon() - Duration::hours(1), noon())
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, current.id);
    }

    #[tokio::test]
    async fn test_unknown_location_never_calls_provider() {
        // ---
        let provider = Arc::new(FixedProvider::new(noon(), 24.0));
        let (svc, store) = service(provider.clone());

        assert!(svc.get_current("Unknown City", "").await.is_none());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
        assert_eq!(store.count().await.unwrap(), 0);

        let err = svc.acquire("Unknown City", "").await.unwrap_err();
        assert!(matches!(err, AcquisitionError::UnknownLocation { .. }));
    }

    #[tokio::test]
    async fn test_provider_failure_collapses_to_none() {
        // ---
        let provider = Arc::new(FixedProvider::failing());
        let (svc, store) = service(provider.clone());

        assert!(svc.get_current("Recife", "PE").await.is_none());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.count().await.unwrap(), 0);

        let err = svc.acquire("Recife", "PE").await.unwrap_err();
        assert!(matches!(err, AcquisitionError::Provider(_)));
    }

    #[tokio::test]
    async fn test_latest_without_data_is_none_and_does_not_fetch() {
        // ---
        let provider = Arc::new(FixedProvider::new(noon(), 24.0));
        let (svc, _) = service(provider.clone());

        assert!(svc.get_latest("Salvador", "BA").await.unwrap().is_none());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_range_is_empty_not_error() {
        // ---
        let provider = Arc::new(FixedProvider::new(noon(), 24.0));
        let (svc, _) = service(provider);

        let rows = svc
            .get_historical_by_location("Curitiba", "PR", noon() - Duration::days(1), noon())
            .await
            .unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_seed_only_when_empty() {
        // ---
        let provider = Arc::new(FixedProvider::new(noon(), 24.0));
        let (svc, store) = service(provider.clone());

        let seeded = svc.seed_if_empty("São Paulo").await.unwrap().unwrap();
        assert_eq!(seeded.region, "SP");
        assert_eq!(store.count().await.unwrap(), 1);

        assert!(svc.seed_if_empty("São Paulo").await.unwrap().is_none());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_name_and_country_queries() {
        // ---
        let provider = Arc::new(FixedProvider::new(noon(), 24.0));
        let (svc, _) = service(provider);
        svc.get_current("Natal", "").await.unwrap();

        let window = (noon() - Duration::hours(1), noon() + Duration::hours(1));
        let by_name = svc.get_historical_by_name(" Natal ", window.0, window.1).await.unwrap();
        assert_eq!(by_name.len(), 1);

        let by_name_folded = svc.get_historical_by_name("NATAL", window.0, window.1).await.unwrap();
        assert_eq!(by_name_folded.len(), 1);

        let by_country = svc
            .get_historical_by_country("natal", "br", window.0, window.1)
            .await
            .unwrap();
        assert_eq!(by_country.len(), 1);

        let other_country = svc
            .get_historical_by_country("Natal", "US", window.0, window.1)
            .await
            .unwrap();
        assert!(other_country.is_empty());
    }
}
