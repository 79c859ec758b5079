//! Error taxonomy for the acquisition engine.
//!
//! Three layers, each wrapping the one below:
//! - [`ProviderError`]: anything that went wrong talking to the weather provider
//! - [`StoreError`]: a fault in the storage collaborator
//! - [`AcquisitionError`]: the resolve → fetch → persist pipeline as a whole
//!
//! Callers that only care about "data or no data" use
//! [`crate::service::AcquisitionService::get_current`], which collapses all of
//! these into `None` after logging.

use thiserror::Error;

// ---

/// Failure to obtain a usable observation from the external provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// No API key configured. Every fetch fails until the key is supplied.
    #[error("provider API key is not configured")]
    MissingApiKey,

    /// Transport failure, including timeouts.
    #[error("provider request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider answered with a non-success status.
    #[error("provider returned status {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    /// The payload was not valid JSON or lacked a required block.
    #[error("malformed provider payload: {0}")]
    Malformed(String),
}

/// Fault in the storage collaborator.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Why a single acquisition attempt produced no observation.
#[derive(Debug, Error)]
pub enum AcquisitionError {
    #[error("unknown location {name:?} / {region:?}")]
    UnknownLocation { name: String, region: String },

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
