//! Data model shared between the fetchers, the enrichment engine and the UI

use serde::{Deserialize, Serialize};

/// A latitude/longitude pair in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Image dimensions and checksum reported alongside each camera image
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageMetadata {
    pub height: u32,
    pub width: u32,
    pub md5: String,
}

/// One traffic camera from a traffic snapshot
///
/// The enrichment fields (`area`, `forecast`, `street`) are unset as fetched
/// and filled in by the enrichment engine, which always produces new records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraRecord {
    /// Camera identifier as issued by the traffic API
    pub camera_id: String,
    /// Capture timestamp of the image, verbatim from the API
    pub timestamp: Option<String>,
    pub location: Coordinates,
    /// Image URL
    pub image: String,
    pub image_metadata: ImageMetadata,
    /// Weather area assigned by the geo-join
    pub area: Option<String>,
    /// Forecast text of the assigned area
    pub forecast: Option<String>,
    /// Street name from reverse geocoding
    pub street: Option<String>,
}

impl CameraRecord {
    /// Create an un-enriched camera record
    pub fn new(camera_id: impl Into<String>, location: Coordinates, image: impl Into<String>) -> Self {
        Self {
            camera_id: camera_id.into(),
            timestamp: None,
            location,
            image: image.into(),
            image_metadata: ImageMetadata::default(),
            area: None,
            forecast: None,
            street: None,
        }
    }
}

/// Weather area name and the point its label is drawn at
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherAreaMetadata {
    pub name: String,
    pub label_location: Coordinates,
}

/// Forecast text for one named area
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForecastEntry {
    pub area: String,
    pub forecast: String,
}

/// Period a forecast is valid for, verbatim from the API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidPeriod {
    pub start: String,
    pub end: String,
}

/// Weather areas and forecasts for one timestamp
///
/// Immutable once fetched; a refetch replaces the whole snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub areas: Vec<WeatherAreaMetadata>,
    pub forecasts: Vec<ForecastEntry>,
    pub valid_period: Option<ValidPeriod>,
}

impl WeatherSnapshot {
    /// Forecast text for an area, by exact name match
    pub fn forecast_for(&self, area: &str) -> Option<&str> {
        self.forecasts
            .iter()
            .find(|entry| entry.area == area)
            .map(|entry| entry.forecast.as_str())
    }
}
