//! 2-hour weather forecast API client (data.gov.sg)
//!
//! `GET <weather_url>?date_time=YYYY-MM-DDTHH:MM:SS` answers with
//! `area_metadata` (area names + label points) and `items[0].forecasts`.

use async_trait::async_trait;
use meteor_common::models::ValidPeriod;
use meteor_common::{Coordinates, ForecastEntry, WeatherAreaMetadata, WeatherSnapshot};
use serde::Deserialize;

use super::{read_json, FetchError, WeatherSource};

/// Weather forecast API client
pub struct WeatherClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl WeatherClient {
    pub fn new(http_client: reqwest::Client, base_url: &str) -> Self {
        Self {
            http_client,
            base_url: base_url.to_string(),
        }
    }

    /// Fetch the forecast snapshot for `timestamp`
    pub async fn fetch(&self, timestamp: &str) -> Result<WeatherSnapshot, FetchError> {
        tracing::debug!(timestamp = %timestamp, url = %self.base_url, "Querying weather API");

        let response = self
            .http_client
            .get(&self.base_url)
            .query(&[("date_time", timestamp)])
            .send()
            .await
            .map_err(|e| FetchError::NetworkError(e.to_string()))?;

        let body: WeatherResponse = read_json(response).await?;
        let snapshot = body.into_snapshot();

        tracing::info!(
            timestamp = %timestamp,
            areas = snapshot.areas.len(),
            forecasts = snapshot.forecasts.len(),
            "Retrieved weather snapshot"
        );

        Ok(snapshot)
    }
}

#[async_trait]
impl WeatherSource for WeatherClient {
    async fn fetch_weather(&self, timestamp: &str) -> Result<WeatherSnapshot, FetchError> {
        self.fetch(timestamp).await
    }
}

/// Top-level weather API response
#[derive(Debug, Deserialize)]
pub struct WeatherResponse {
    #[serde(default)]
    pub area_metadata: Vec<RawArea>,
    #[serde(default)]
    pub items: Vec<WeatherItem>,
}

#[derive(Debug, Deserialize)]
pub struct RawArea {
    pub name: String,
    pub label_location: RawLocation,
}

#[derive(Debug, Deserialize)]
pub struct RawLocation {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Deserialize)]
pub struct WeatherItem {
    pub valid_period: Option<RawValidPeriod>,
    #[serde(default)]
    pub forecasts: Vec<RawForecast>,
}

#[derive(Debug, Deserialize)]
pub struct RawValidPeriod {
    pub start: String,
    pub end: String,
}

#[derive(Debug, Deserialize)]
pub struct RawForecast {
    pub area: String,
    pub forecast: String,
}

impl WeatherResponse {
    pub fn into_snapshot(self) -> WeatherSnapshot {
        let areas = self
            .area_metadata
            .into_iter()
            .map(|a| WeatherAreaMetadata {
                name: a.name,
                label_location: Coordinates::new(a.label_location.latitude, a.label_location.longitude),
            })
            .collect();

        let (forecasts, valid_period) = match self.items.into_iter().next() {
            Some(item) => (
                item.forecasts
                    .into_iter()
                    .map(|f| ForecastEntry {
                        area: f.area,
                        forecast: f.forecast,
                    })
                    .collect(),
                item.valid_period.map(|p| ValidPeriod {
                    start: p.start,
                    end: p.end,
                }),
            ),
            None => (Vec::new(), None),
        };

        WeatherSnapshot {
            areas,
            forecasts,
            valid_period,
        }
    }
}
