//! Background loop that keeps the observation history fresh.
//!
//! One sweep visits every registered location in catalog order, spacing
//! fetches by a fixed delay to stay under the provider's rate limit. A failing
//! location is logged and skipped; it is retried on the next sweep only.
//! Cancellation is honoured between fetches and during every sleep.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::locations::LocationRegistry;
use crate::service::AcquisitionService;

// ---

/// Outcome of one sweep.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// The sweep stopped early because cancellation was requested.
    pub cancelled: bool,
}

pub struct Poller {
    // ---
    service: AcquisitionService,
    registry: Arc<LocationRegistry>,
    interval: Duration,
    location_delay: Duration,
}

impl Poller {
    // ---
    pub fn new(
        service: AcquisitionService,
        registry: Arc<LocationRegistry>,
        interval: Duration,
        location_delay: Duration,
    ) -> Self {
        Self {
            service,
            registry,
            interval,
            location_delay,
        }
    }

    /// Spawn the loop on the current runtime.
    pub fn start(self, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(cancel))
    }

    /// Sweep, sleep, repeat until `cancel` fires.
    pub async fn run(self, cancel: CancellationToken) {
        // ---
        info!(
            "Weather poller started. Interval: {}s, {} locations",
            self.interval.as_secs(),
            self.registry.len()
        );

        loop {
            let report = self.run_sweep(&cancel).await;
            info!(
                "Sweep finished: {} attempted, {} succeeded, {} failed",
                report.attempted, report.succeeded, report.failed
            );

            if report.cancelled || !sleep_or_cancel(&cancel, self.interval).await {
                break;
            }
        }

        info!("Weather poller stopped");
    }

    /// One pass over every registered location.
    pub async fn run_sweep(&self, cancel: &CancellationToken) -> SweepReport {
        // ---
        let mut report = SweepReport::default();

        for (i, location) in self.registry.list_all().iter().enumerate() {
            if cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }
            if i > 0 && !sleep_or_cancel(cancel, self.location_delay).await {
                report.cancelled = true;
                break;
            }

            report.attempted += 1;
            debug!("Background fetch for {}-{}", location.name, location.region);

            match self.service.acquire(&location.name, &location.region).await {
                Ok(_) => report.succeeded += 1,
                Err(e) => {
                    warn!(
                        "Background fetch failed for {}-{}: {}",
                        location.name, location.region, e
                    );
                    report.failed += 1;
                }
            }
        }

        report
    }
}

/// Sleep for `duration`. Returns `false` if cancelled first.
async fn sleep_or_cancel(cancel: &CancellationToken, duration: Duration) -> bool {
    // ---
    tokio::select! {
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(duration) => true,
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::error::ProviderError;
    use crate::locations::LocationResolver;
    use crate::models::{Location, Observation};
    use crate::provider::WeatherProvider;
    use crate::store::{MemoryObservationStore, ObservationStore};
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::Mutex;
    use uuid::Uuid;

    /// Records every call; fails for one latitude.
    struct ScriptedProvider {
        fail_latitude: f64,
        calls: Mutex<Vec<f64>>,
    }

    #[async_trait]
    impl WeatherProvider for ScriptedProvider {
        async fn fetch_current(&self, lat: f64, _lon: f64) -> Result<Observation, ProviderError> {
            // ---
            self.calls.lock().unwrap().push(lat);
            if lat == self.fail_latitude {
                return Err(ProviderError::Malformed("scripted failure".to_string()));
            }
            let now = Utc::now();
            Ok(Observation {
                id: Uuid::nil(),
                location_name: String::new(),
                region: String::new(),
                country: "BR".to_string(),
                temperature: 25.0,
                feels_like: 25.0,
                min_temperature: 24.0,
                max_temperature: 26.0,
                humidity: 55,
                pressure: 1011.0,
                wind_speed: 1.0,
                wind_direction: 10,
                cloudiness: 0,
                weather_main: "Clear".to_string(),
                weather_description: "céu limpo".to_string(),
                description: "Clear - céu limpo".to_string(),
                icon: "01d".to_string(),
                observed_at: now,
                ingested_at: now,
            })
        }
    }

    fn setup() -> (Poller, Arc<ScriptedProvider>, Arc<MemoryObservationStore>) {
        // ---
        let registry = Arc::new(LocationRegistry::new(vec![
            Location::new("Recife", "PE", 1.0, 1.0),
            Location::new("Natal", "RN", 2.0, 2.0),
            Location::new("Aracaju", "SE", 3.0, 3.0),
        ]));
        let provider = Arc::new(ScriptedProvider {
            fail_latitude: 2.0,
            calls: Mutex::new(Vec::new()),
        });
        let store = Arc::new(MemoryObservationStore::new());
        let service = AcquisitionService::new(
            LocationResolver::new(registry.clone()),
            provider.clone(),
            store.clone(),
        );
        let poller = Poller::new(
            service,
            registry,
            Duration::from_secs(3600),
            Duration::from_millis(500),
        );
        (poller, provider, store)
    }

    #[tokio::test(start_paused = true)]
    async fn test_failing_location_does_not_abort_sweep() {
        // ---
        let (poller, provider, store) = setup();

        let report = poller.run_sweep(&CancellationToken::new()).await;

        assert_eq!(
            report,
            SweepReport {
                attempted: 3,
                succeeded: 2,
                failed: 1,
                cancelled: false
            }
        );
        assert_eq!(*provider.calls.lock().unwrap(), vec![1.0, 2.0, 3.0]);
        assert_eq!(store.count().await.unwrap(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_sweep_attempts_nothing() {
        // ---
        let (poller, provider, _) = setup();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let report = poller.run_sweep(&cancel).await;
        assert!(report.cancelled);
        assert_eq!(report.attempted, 0);
        assert!(provider.calls.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_between_locations_stops_sweep() {
        // ---
        let (poller, provider, store) = setup();
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let handle = tokio::spawn(async move { poller.run_sweep(&token).await });

        // First fetch is immediate; the second waits behind a 500ms delay
        tokio::time::sleep(Duration::from_millis(100)).await;
        cancel.cancel();
        let report = handle.await.unwrap();

        assert_eq!(
            report,
            SweepReport {
                attempted: 1,
                succeeded: 1,
                failed: 0,
                cancelled: true
            }
        );
        assert_eq!(*provider.calls.lock().unwrap(), vec![1.0]);
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_interval_sleep_stops_loop() {
        // ---
        let (poller, provider, _) = setup();
        let cancel = CancellationToken::new();
        let handle = poller.start(cancel.clone());

        // The first sweep takes about a second; the next one is an hour away
        tokio::time::sleep(Duration::from_secs(10)).await;
        cancel.cancel();
        handle.await.unwrap();

        assert_eq!(provider.calls.lock().unwrap().len(), 3);
    }
}
