//! Traffic images API client (data.gov.sg)
//!
//! `GET <traffic_url>?date_time=YYYY-MM-DDTHH:MM:SS` answers with
//! `{ "items": [ { "timestamp": .., "cameras": [ .. ] } ] }`. For instants
//! without data the API returns `{ "items": [ {} ] }`.

use async_trait::async_trait;
use meteor_common::models::ImageMetadata;
use meteor_common::{CameraRecord, Coordinates};
use serde::Deserialize;

use super::{read_json, FetchError, TrafficSource};

/// Result of one traffic fetch
#[derive(Debug, Clone, PartialEq)]
pub enum TrafficSnapshot {
    /// No camera entries for this instant
    Empty,
    /// At least one camera
    Cameras(Vec<CameraRecord>),
}

/// Traffic images API client
pub struct TrafficClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl TrafficClient {
    pub fn new(http_client: reqwest::Client, base_url: &str) -> Self {
        Self {
            http_client,
            base_url: base_url.to_string(),
        }
    }

    /// Fetch the camera snapshot for `timestamp`
    pub async fn fetch(&self, timestamp: &str) -> Result<TrafficSnapshot, FetchError> {
        tracing::debug!(timestamp = %timestamp, url = %self.base_url, "Querying traffic API");

        let response = self
            .http_client
            .get(&self.base_url)
            .query(&[("date_time", timestamp)])
            .send()
            .await
            .map_err(|e| FetchError::NetworkError(e.to_string()))?;

        let body: TrafficResponse = read_json(response).await?;
        let snapshot = body.into_snapshot();

        match &snapshot {
            TrafficSnapshot::Empty => {
                tracing::info!(timestamp = %timestamp, "Traffic API returned no cameras")
            }
            TrafficSnapshot::Cameras(cameras) => tracing::info!(
                timestamp = %timestamp,
                cameras = cameras.len(),
                "Retrieved traffic snapshot"
            ),
        }

        Ok(snapshot)
    }
}

#[async_trait]
impl TrafficSource for TrafficClient {
    async fn fetch_traffic(&self, timestamp: &str) -> Result<TrafficSnapshot, FetchError> {
        self.fetch(timestamp).await
    }
}

/// Top-level traffic API response
#[derive(Debug, Deserialize)]
pub struct TrafficResponse {
    #[serde(default)]
    pub items: Vec<TrafficItem>,
}

/// One snapshot item; every field is absent in the "no data" shape
#[derive(Debug, Deserialize)]
pub struct TrafficItem {
    pub timestamp: Option<String>,
    pub cameras: Option<Vec<RawCamera>>,
}

/// Camera as sent on the wire
#[derive(Debug, Deserialize)]
pub struct RawCamera {
    pub camera_id: String,
    pub timestamp: Option<String>,
    pub image: String,
    pub location: RawLocation,
    #[serde(default)]
    pub image_metadata: Option<RawImageMetadata>,
}

#[derive(Debug, Deserialize)]
pub struct RawLocation {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Deserialize)]
pub struct RawImageMetadata {
    #[serde(default)]
    pub height: u32,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub md5: String,
}

impl TrafficResponse {
    /// Only the first item is used, as the API returns one item per instant
    pub fn into_snapshot(self) -> TrafficSnapshot {
        let cameras = self
            .items
            .into_iter()
            .next()
            .and_then(|item| item.cameras)
            .unwrap_or_default();

        if cameras.is_empty() {
            return TrafficSnapshot::Empty;
        }

        TrafficSnapshot::Cameras(cameras.into_iter().map(RawCamera::into_record).collect())
    }
}

impl RawCamera {
    fn into_record(self) -> CameraRecord {
        let image_metadata = self
            .image_metadata
            .map(|m| ImageMetadata {
                height: m.height,
                width: m.width,
                md5: m.md5,
            })
            .unwrap_or_default();

        CameraRecord {
            timestamp: self.timestamp,
            image_metadata,
            ..CameraRecord::new(
                self.camera_id,
                Coordinates::new(self.location.latitude, self.location.longitude),
                self.image,
            )
        }
    }
}
