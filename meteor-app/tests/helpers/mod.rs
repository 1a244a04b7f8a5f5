//! Shared test doubles for meteor-app integration tests
//!
//! Upstream APIs are replaced by in-memory sources answering per timestamp.

#![allow(dead_code)]

use async_trait::async_trait;
use meteor_app::enrichment::MatchStrategy;
use meteor_app::services::{
    FetchError, ReverseGeocoder, TrafficSnapshot, TrafficSource, WeatherSource,
};
use meteor_app::Dashboard;
use meteor_common::events::{EventBus, MeteorEvent};
use meteor_common::{CameraRecord, Coordinates, ForecastEntry, WeatherAreaMetadata, WeatherSnapshot};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;
use tokio::sync::Notify;

/// Scripted traffic answer
#[derive(Debug, Clone)]
pub enum TrafficReply {
    Cameras(Vec<CameraRecord>),
    Empty,
    Fail,
}

/// Traffic source answering from a per-timestamp table
///
/// Unknown timestamps fail with a network error.
#[derive(Default)]
pub struct MockTraffic {
    replies: Mutex<HashMap<String, TrafficReply>>,
    holds: Mutex<HashMap<String, Arc<Notify>>>,
}

impl MockTraffic {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, timestamp: &str, reply: TrafficReply) -> Self {
        self.replies
            .lock()
            .unwrap()
            .insert(timestamp.to_string(), reply);
        self
    }

    /// Block fetches for `timestamp` until `gate` is notified
    pub fn hold(self, timestamp: &str, gate: Arc<Notify>) -> Self {
        self.holds
            .lock()
            .unwrap()
            .insert(timestamp.to_string(), gate);
        self
    }
}

#[async_trait]
impl TrafficSource for MockTraffic {
    async fn fetch_traffic(&self, timestamp: &str) -> Result<TrafficSnapshot, FetchError> {
        let gate = self.holds.lock().unwrap().get(timestamp).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        let reply = self.replies.lock().unwrap().get(timestamp).cloned();
        match reply {
            Some(TrafficReply::Cameras(cameras)) => Ok(TrafficSnapshot::Cameras(cameras)),
            Some(TrafficReply::Empty) => Ok(TrafficSnapshot::Empty),
            Some(TrafficReply::Fail) | None => {
                Err(FetchError::NetworkError("connection refused".to_string()))
            }
        }
    }
}

/// Weather source answering from a per-timestamp table; unknown fails
#[derive(Default)]
pub struct MockWeather {
    replies: Mutex<HashMap<String, WeatherSnapshot>>,
}

impl MockWeather {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, timestamp: &str, snapshot: WeatherSnapshot) -> Self {
        self.replies
            .lock()
            .unwrap()
            .insert(timestamp.to_string(), snapshot);
        self
    }
}

#[async_trait]
impl WeatherSource for MockWeather {
    async fn fetch_weather(&self, timestamp: &str) -> Result<WeatherSnapshot, FetchError> {
        self.replies
            .lock()
            .unwrap()
            .get(timestamp)
            .cloned()
            .ok_or_else(|| FetchError::ApiError(500, "Internal Server Error".to_string()))
    }
}

/// Geocoder keyed by camera latitude; unknown latitudes fail
pub struct MockGeocoder {
    streets: HashMap<u64, String>,
}

impl MockGeocoder {
    pub fn new(entries: &[(f64, &str)]) -> Self {
        Self {
            streets: entries
                .iter()
                .map(|(lat, street)| (lat.to_bits(), street.to_string()))
                .collect(),
        }
    }
}

#[async_trait]
impl ReverseGeocoder for MockGeocoder {
    async fn street_name(&self, location: Coordinates) -> Result<String, FetchError> {
        self.streets
            .get(&location.latitude.to_bits())
            .cloned()
            .ok_or_else(|| FetchError::NoResult(format!("{},{}", location.latitude, location.longitude)))
    }
}

pub fn camera(id: &str, latitude: f64, longitude: f64) -> CameraRecord {
    CameraRecord::new(
        id,
        Coordinates::new(latitude, longitude),
        format!("https://images.data.gov.sg/api/traffic-images/{}.jpg", id),
    )
}

pub fn bishan_weather(forecast: &str) -> WeatherSnapshot {
    WeatherSnapshot {
        areas: vec![WeatherAreaMetadata {
            name: "Bishan".to_string(),
            label_location: Coordinates::new(1.3, 103.8),
        }],
        forecasts: vec![ForecastEntry {
            area: "Bishan".to_string(),
            forecast: forecast.to_string(),
        }],
        valid_period: None,
    }
}

pub fn dashboard(
    traffic: MockTraffic,
    weather: MockWeather,
    geocoder: Option<MockGeocoder>,
) -> Dashboard {
    Dashboard::new(
        Arc::new(traffic),
        Arc::new(weather),
        geocoder.map(|g| Arc::new(g) as Arc<dyn ReverseGeocoder>),
        MatchStrategy::default(),
        EventBus::new(100),
    )
}

/// Drain every event already delivered to `rx`
pub fn drain(rx: &mut broadcast::Receiver<MeteorEvent>) -> Vec<MeteorEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
