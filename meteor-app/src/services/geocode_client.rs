//! positionstack reverse geocoding client
//!
//! `GET <geocode_url>?access_key=KEY&query=LAT,LNG&limit=1` answers with
//! `{ "data": [ { "street": .., "label": .., .. } ] }`. Only the first
//! candidate's `street` is used.

use async_trait::async_trait;
use meteor_common::Coordinates;
use serde::Deserialize;

use super::{read_json, FetchError, ReverseGeocoder};

/// Reverse geocoding client
pub struct PositionstackClient {
    http_client: reqwest::Client,
    base_url: String,
    access_key: String,
}

impl PositionstackClient {
    pub fn new(http_client: reqwest::Client, base_url: &str, access_key: String) -> Self {
        Self {
            http_client,
            base_url: base_url.to_string(),
            access_key,
        }
    }

    /// Street name of the first address candidate at `location`
    pub async fn reverse(&self, location: Coordinates) -> Result<String, FetchError> {
        let query = format!("{},{}", location.latitude, location.longitude);

        // access_key stays out of the log line
        tracing::debug!(query = %query, url = %self.base_url, "Querying reverse geocoder");

        let response = self
            .http_client
            .get(&self.base_url)
            .query(&[
                ("access_key", self.access_key.as_str()),
                ("query", query.as_str()),
                ("limit", "1"),
            ])
            .send()
            .await
            .map_err(|e| FetchError::NetworkError(e.to_string()))?;

        let body: ReverseResponse = read_json(response).await?;
        body.first_street()
            .ok_or_else(|| FetchError::NoResult(query))
    }
}

#[async_trait]
impl ReverseGeocoder for PositionstackClient {
    async fn street_name(&self, location: Coordinates) -> Result<String, FetchError> {
        self.reverse(location).await
    }
}

#[derive(Debug, Deserialize)]
pub struct ReverseResponse {
    #[serde(default)]
    pub data: Vec<AddressCandidate>,
}

#[derive(Debug, Deserialize)]
pub struct AddressCandidate {
    pub street: Option<String>,
}

impl ReverseResponse {
    /// The first candidate's street, if it has a non-blank one
    pub fn first_street(self) -> Option<String> {
        self.data
            .into_iter()
            .next()
            .and_then(|candidate| candidate.street)
            .filter(|street| !street.trim().is_empty())
    }
}
