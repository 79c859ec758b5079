//! `weatherflow`: weather acquisition and resolution engine.
//!
//! Periodically collects current-weather observations for a fixed catalog of
//! locations, stores them as an append-only history and derives views over
//! it (latest reading, ranges, daily statistics, chart series).
//!
//! Module map, leaf to root:
//! - [`locations`]: registry of known places and free-text resolution
//! - [`provider`]: external weather API boundary
//! - [`store`]: observation history (PostgreSQL or in-memory)
//! - [`service`]: resolve → fetch → persist, and history queries
//! - [`statistics`], [`chart`]: derived views
//! - [`poller`]: background sweep loop

pub mod chart;
pub mod config;
pub mod error;
pub mod locations;
pub mod models;
pub mod poller;
pub mod provider;
pub mod schema;
pub mod service;
pub mod statistics;
pub mod store;

pub use chart::{ChartAggregator, ChartSeries};
pub use config::Config;
pub use error::{AcquisitionError, ProviderError, StoreError};
pub use locations::{LocationRegistry, LocationResolver};
pub use models::{Location, Observation};
pub use poller::{Poller, SweepReport};
pub use provider::{OpenWeatherClient, WeatherProvider};
pub use service::AcquisitionService;
pub use statistics::DailyStatistics;
pub use store::{MemoryObservationStore, ObservationFilter, ObservationStore, PgObservationStore};
