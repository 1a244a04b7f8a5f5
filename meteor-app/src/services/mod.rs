//! Upstream API clients
//!
//! Three external services feed the view:
//! - **traffic_client** - camera list + images for a timestamp
//! - **weather_client** - 2-hour forecast areas for a timestamp
//! - **geocode_client** - street name for a coordinate pair
//!
//! Each is reached through a trait so the dashboard can be driven by test
//! doubles. Clients never retry; a failure is reported once to the caller.

pub mod geocode_client;
pub mod traffic_client;
pub mod weather_client;

pub use geocode_client::PositionstackClient;
pub use traffic_client::{TrafficClient, TrafficSnapshot};
pub use weather_client::WeatherClient;

use async_trait::async_trait;
use meteor_common::config::ApiConfig;
use meteor_common::{Coordinates, WeatherSnapshot};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

const USER_AGENT: &str = concat!("meteor/", env!("CARGO_PKG_VERSION"));

/// Upstream request errors
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("API error {0}: {1}")]
    ApiError(u16, String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("No result for {0}")]
    NoResult(String),
}

/// Source of traffic camera snapshots
#[async_trait]
pub trait TrafficSource: Send + Sync {
    /// Fetch the camera snapshot for an API-formatted timestamp
    async fn fetch_traffic(&self, timestamp: &str) -> Result<TrafficSnapshot, FetchError>;
}

/// Source of weather forecast snapshots
#[async_trait]
pub trait WeatherSource: Send + Sync {
    /// Fetch the forecast snapshot for an API-formatted timestamp
    async fn fetch_weather(&self, timestamp: &str) -> Result<WeatherSnapshot, FetchError>;
}

/// Resolves coordinates to a street name
#[async_trait]
pub trait ReverseGeocoder: Send + Sync {
    /// Street of the first candidate address for `location`
    async fn street_name(&self, location: Coordinates) -> Result<String, FetchError>;
}

/// Build the shared HTTP client
pub fn build_http_client(timeout_secs: u64) -> Result<reqwest::Client, FetchError> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| FetchError::NetworkError(e.to_string()))
}

/// The three production clients wired from configuration
pub struct HttpSources {
    pub traffic: Arc<dyn TrafficSource>,
    pub weather: Arc<dyn WeatherSource>,
    /// `None` when no geocoding key is configured
    pub geocoder: Option<Arc<dyn ReverseGeocoder>>,
}

impl HttpSources {
    pub fn from_config(apis: &ApiConfig, geocode_api_key: Option<String>) -> Result<Self, FetchError> {
        let http_client = build_http_client(apis.request_timeout_secs)?;

        let geocoder = geocode_api_key.map(|key| {
            Arc::new(PositionstackClient::new(
                http_client.clone(),
                &apis.geocode_url,
                key,
            )) as Arc<dyn ReverseGeocoder>
        });

        Ok(Self {
            traffic: Arc::new(TrafficClient::new(http_client.clone(), &apis.traffic_url)),
            weather: Arc::new(WeatherClient::new(http_client, &apis.weather_url)),
            geocoder,
        })
    }
}

/// Turn a response into its JSON body, mapping failures to `FetchError`
pub(crate) async fn read_json<T>(response: reqwest::Response) -> Result<T, FetchError>
where
    T: serde::de::DeserializeOwned,
{
    let status = response.status();

    if !status.is_success() {
        let error_text = response.text().await.unwrap_or_default();
        return Err(FetchError::ApiError(status.as_u16(), error_text));
    }

    response
        .json()
        .await
        .map_err(|e| FetchError::ParseError(e.to_string()))
}
