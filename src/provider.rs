//! External weather provider boundary.
//!
//! [`WeatherProvider`] is the seam the acquisition service depends on;
//! [`OpenWeatherClient`] is the production implementation talking to the
//! OpenWeatherMap "current weather" endpoint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::error::ProviderError;
use crate::models::{Observation, RawCurrentWeather};

// ---

/// Fetches one current-observation snapshot for a coordinate pair.
///
/// Implementations either return a fully populated [`Observation`] (location
/// fields left blank) or a [`ProviderError`]; never a partial reading.
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn fetch_current(&self, latitude: f64, longitude: f64)
        -> Result<Observation, ProviderError>;
}

/// HTTP client for the OpenWeatherMap current-weather API.
#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    // ---
    http: Client,
    base_url: String,
    api_key: Option<String>,
    lang: String,
}

impl OpenWeatherClient {
    /// Build a client with a bounded request timeout.
    ///
    /// A missing or blank `api_key` is accepted here; every subsequent fetch
    /// then fails with [`ProviderError::MissingApiKey`].
    pub fn new(
        base_url: &str,
        api_key: Option<String>,
        lang: &str,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        // ---
        let http = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            lang: lang.to_string(),
        })
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherClient {
    async fn fetch_current(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<Observation, ProviderError> {
        // ---
        let Some(api_key) = self.api_key.as_deref() else {
            tracing::error!("OpenWeather API key is missing in configuration");
            return Err(ProviderError::MissingApiKey);
        };

        let url = format!("{}/weather", self.base_url);
        tracing::debug!("Fetching current weather from {} ({}, {})", url, latitude, longitude);

        let response = self
            .http
            .get(&url)
            .query(&[
                ("lat", latitude.to_string()),
                ("lon", longitude.to_string()),
                ("appid", api_key.to_string()),
                ("units", "metric".to_string()),
                ("lang", self.lang.clone()),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(ProviderError::Status {
                status,
                body: truncate_body(&body),
            });
        }

        let raw: RawCurrentWeather = serde_json::from_str(&body)
            .map_err(|e| ProviderError::Malformed(e.to_string()))?;

        raw.to_observation()
    }
}

fn truncate_body(body: &str) -> String {
    // ---
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    #[test]
    fn test_truncate_body_respects_char_boundaries() {
        // ---
        let long = "ã".repeat(300);
        let truncated = truncate_body(&long);
        assert_eq!(truncated.chars().count(), 203);
        assert!(truncated.ends_with("..."));

        assert_eq!(truncate_body("short"), "short");
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        // ---
        let client = OpenWeatherClient::new(
            "https://api.openweathermap.org/data/2.5/",
            Some("key".to_string()),
            "pt_br",
            Duration::from_secs(30),
        )
        .unwrap();
        assert_eq!(client.base_url, "https://api.openweathermap.org/data/2.5");
    }

    #[tokio::test]
    async fn test_missing_api_key_fails_without_network() {
        // ---
        let client = OpenWeatherClient::new(
            "http://127.0.0.1:9",
            Some("   ".to_string()),
            "pt_br",
            Duration::from_secs(1),
        )
        .unwrap();

        let err = client.fetch_current(-23.55, -46.63).await.unwrap_err();
        assert!(matches!(err, ProviderError::MissingApiKey));
    }
}
