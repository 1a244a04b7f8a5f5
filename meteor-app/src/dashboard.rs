//! View state and fetch orchestration
//!
//! `ViewState` is the single container for everything the page shows:
//! chosen date/time, the formatted timestamp, the camera and weather slices,
//! resolved streets and the selection. Every fetch runs under a `FetchKey`;
//! a completion whose key is no longer current is discarded.
//!
//! `Dashboard` owns the state and drives the upstream calls. Traffic and
//! weather are fetched by two independent tasks, each of which updates only
//! its own slice. Street lookups run after a traffic load, one per camera.

use chrono::{NaiveDate, NaiveTime};
use meteor_common::events::{EventBus, MeteorEvent};
use meteor_common::time::format_timestamp;
use meteor_common::{CameraRecord, WeatherSnapshot};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::enrichment::{enrich_cameras, MatchStrategy, StreetResolver};
use crate::services::{FetchError, ReverseGeocoder, TrafficSnapshot, TrafficSource, WeatherSource};

/// Identity of one fetch round; bumped on every new timestamp
pub type FetchKey = u64;

#[derive(Debug, Clone)]
struct Keyed<T> {
    key: FetchKey,
    value: T,
}

/// What applying a traffic completion did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrafficOutcome {
    /// Completion belonged to a superseded key; nothing changed
    Stale,
    /// Fetch failed; previous camera data kept
    Failed(String),
    /// Structurally empty snapshot; camera data cleared
    Empty,
    /// Camera list replaced
    Loaded(usize),
}

/// What applying a weather completion did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WeatherOutcome {
    Stale,
    Failed(String),
    Loaded,
}

/// Explicit view state
#[derive(Debug, Default)]
pub struct ViewState {
    selected_date: Option<NaiveDate>,
    selected_time: Option<NaiveTime>,
    timestamp: String,
    key: FetchKey,
    /// `None` until loaded, and after an empty snapshot
    cameras: Option<Keyed<Vec<CameraRecord>>>,
    weather: Option<Keyed<WeatherSnapshot>>,
    /// Weather of the held camera list's round, kept while a newer round's
    /// weather has arrived without its cameras
    joined_weather: Option<Keyed<WeatherSnapshot>>,
    /// Street names for the held camera list, by camera id
    streets: HashMap<String, String>,
    /// Camera id of the selected row
    selection: Option<String>,
}

impl ViewState {
    pub fn new(timestamp: impl Into<String>) -> Self {
        Self {
            timestamp: timestamp.into(),
            ..Default::default()
        }
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn key(&self) -> FetchKey {
        self.key
    }

    pub fn selected_date(&self) -> Option<NaiveDate> {
        self.selected_date
    }

    pub fn selected_time(&self) -> Option<NaiveTime> {
        self.selected_time
    }

    /// Record a submitted date/time and start a new fetch round
    pub fn begin_fetch(&mut self, date: NaiveDate, time: NaiveTime) -> FetchKey {
        self.selected_date = Some(date);
        self.selected_time = Some(time);
        self.restart(format_timestamp(date, time))
    }

    /// Start a new fetch round for an already formatted timestamp
    ///
    /// Clears the selection. Camera and weather data stay until the new
    /// round's completions replace them.
    pub fn restart(&mut self, timestamp: String) -> FetchKey {
        self.selection = None;
        self.timestamp = timestamp;
        self.key += 1;
        self.key
    }

    pub fn is_current(&self, key: FetchKey) -> bool {
        self.key == key
    }

    /// Apply a traffic fetch completion for `key`
    pub fn apply_traffic(
        &mut self,
        key: FetchKey,
        result: Result<TrafficSnapshot, FetchError>,
    ) -> TrafficOutcome {
        if !self.is_current(key) {
            return TrafficOutcome::Stale;
        }

        match result {
            Err(e) => TrafficOutcome::Failed(e.to_string()),
            Ok(TrafficSnapshot::Empty) => {
                self.cameras = None;
                self.joined_weather = None;
                self.streets.clear();
                TrafficOutcome::Empty
            }
            Ok(TrafficSnapshot::Cameras(cameras)) => {
                let count = cameras.len();
                self.cameras = Some(Keyed {
                    key,
                    value: cameras,
                });
                self.joined_weather = None;
                self.streets.clear();
                TrafficOutcome::Loaded(count)
            }
        }
    }

    /// Apply a weather fetch completion for `key`
    pub fn apply_weather(
        &mut self,
        key: FetchKey,
        result: Result<WeatherSnapshot, FetchError>,
    ) -> WeatherOutcome {
        if !self.is_current(key) {
            return WeatherOutcome::Stale;
        }

        match result {
            Err(e) => WeatherOutcome::Failed(e.to_string()),
            Ok(snapshot) => {
                let previous = self.weather.replace(Keyed {
                    key,
                    value: snapshot,
                });
                let camera_key = self.cameras.as_ref().map(|cameras| cameras.key);
                if let Some(previous) =
                    previous.filter(|w| w.key != key && Some(w.key) == camera_key)
                {
                    self.joined_weather = Some(previous);
                }
                WeatherOutcome::Loaded
            }
        }
    }

    /// Record a resolved street; ignored unless the camera belongs to the
    /// current key's camera list
    pub fn apply_street(&mut self, key: FetchKey, camera_id: &str, street: String) -> bool {
        let owned_by_key = match &self.cameras {
            Some(cameras) => {
                cameras.key == key && cameras.value.iter().any(|c| c.camera_id == camera_id)
            }
            None => false,
        };

        if !self.is_current(key) || !owned_by_key {
            return false;
        }

        self.streets.insert(camera_id.to_string(), street);
        true
    }

    /// Camera list held for `key`, if that is what is held
    pub fn cameras_for(&self, key: FetchKey) -> Option<Vec<CameraRecord>> {
        self.cameras
            .as_ref()
            .filter(|cameras| cameras.key == key)
            .map(|cameras| cameras.value.clone())
    }

    pub fn has_camera_data(&self) -> bool {
        self.cameras.is_some()
    }

    /// Weather snapshot fetched for the same key as the camera list
    ///
    /// After a failed traffic fetch the held cameras belong to an older round;
    /// they keep the weather they were joined with.
    fn matching_weather(&self) -> Option<&WeatherSnapshot> {
        let cameras = self.cameras.as_ref()?;
        [&self.weather, &self.joined_weather]
            .into_iter()
            .flatten()
            .find(|weather| weather.key == cameras.key)
            .map(|weather| &weather.value)
    }

    /// Enriched rows, derived from the current state on every call
    pub fn rows(&self, strategy: MatchStrategy) -> Vec<CameraRecord> {
        match &self.cameras {
            Some(cameras) => enrich_cameras(
                &cameras.value,
                self.matching_weather(),
                &self.streets,
                strategy,
            ),
            None => Vec::new(),
        }
    }

    /// Select a row by camera id; false if the id is not in the list
    pub fn select(&mut self, camera_id: &str) -> bool {
        let known = self
            .cameras
            .as_ref()
            .is_some_and(|cameras| cameras.value.iter().any(|c| c.camera_id == camera_id));

        if known {
            self.selection = Some(camera_id.to_string());
        }
        known
    }

    pub fn selection(&self) -> Option<&str> {
        self.selection.as_deref()
    }

    /// Enriched record of the selected camera
    pub fn selected_camera(&self, strategy: MatchStrategy) -> Option<CameraRecord> {
        let camera_id = self.selection.as_deref()?;
        self.rows(strategy)
            .into_iter()
            .find(|camera| camera.camera_id == camera_id)
    }
}

/// Join handles of one fetch round
pub struct FetchHandles {
    pub key: FetchKey,
    pub timestamp: String,
    traffic: JoinHandle<()>,
    weather: JoinHandle<()>,
}

impl FetchHandles {
    /// Wait for both fetches, including street resolution after traffic
    pub async fn wait(self) {
        let (traffic, weather) = tokio::join!(self.traffic, self.weather);
        if let Err(e) = traffic {
            warn!("Traffic task ended abnormally: {}", e);
        }
        if let Err(e) = weather {
            warn!("Weather task ended abnormally: {}", e);
        }
    }
}

/// Read-only copy of what the table needs
#[derive(Debug, Clone)]
pub struct ViewSnapshot {
    pub timestamp: String,
    pub selected_date: Option<NaiveDate>,
    pub selected_time: Option<NaiveTime>,
    pub has_camera_data: bool,
    pub rows: Vec<CameraRecord>,
    pub selection: Option<String>,
}

struct DashboardInner {
    state: RwLock<ViewState>,
    traffic: Arc<dyn TrafficSource>,
    weather: Arc<dyn WeatherSource>,
    streets: Option<StreetResolver>,
    strategy: MatchStrategy,
    event_bus: EventBus,
    /// Token of the current fetch round
    cancel_token: Mutex<CancellationToken>,
}

/// State owner and fetch driver, cheap to clone
#[derive(Clone)]
pub struct Dashboard {
    inner: Arc<DashboardInner>,
}

impl Dashboard {
    pub fn new(
        traffic: Arc<dyn TrafficSource>,
        weather: Arc<dyn WeatherSource>,
        geocoder: Option<Arc<dyn ReverseGeocoder>>,
        strategy: MatchStrategy,
        event_bus: EventBus,
    ) -> Self {
        Self {
            inner: Arc::new(DashboardInner {
                state: RwLock::new(ViewState::default()),
                traffic,
                weather,
                streets: geocoder.map(StreetResolver::new),
                strategy,
                event_bus,
                cancel_token: Mutex::new(CancellationToken::new()),
            }),
        }
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.inner.event_bus
    }

    pub fn strategy(&self) -> MatchStrategy {
        self.inner.strategy
    }

    /// Handle a submitted date/time: clear selection, refetch both sources
    pub async fn submit(&self, date: NaiveDate, time: NaiveTime) -> FetchHandles {
        self.start(|state| state.begin_fetch(date, time)).await
    }

    /// Refetch for an already formatted timestamp (used at startup)
    pub async fn refresh_at(&self, timestamp: String) -> FetchHandles {
        self.start(|state| state.restart(timestamp)).await
    }

    async fn start(&self, begin: impl FnOnce(&mut ViewState) -> FetchKey) -> FetchHandles {
        let (key, timestamp, token) = {
            let mut state = self.inner.state.write().await;
            let key = begin(&mut *state);

            let token = CancellationToken::new();
            let previous =
                std::mem::replace(&mut *self.inner.cancel_token.lock().await, token.clone());
            previous.cancel();

            (key, state.timestamp().to_string(), token)
        };

        info!(key, timestamp = %timestamp, "Fetching traffic and weather");

        let traffic = tokio::spawn(self.clone().run_traffic(key, timestamp.clone(), token.clone()));
        let weather = tokio::spawn(self.clone().run_weather(key, timestamp.clone(), token));

        FetchHandles {
            key,
            timestamp,
            traffic,
            weather,
        }
    }

    async fn run_traffic(self, key: FetchKey, timestamp: String, token: CancellationToken) {
        let result = tokio::select! {
            _ = token.cancelled() => {
                debug!(key, "Traffic fetch superseded");
                return;
            }
            result = self.inner.traffic.fetch_traffic(&timestamp) => result,
        };

        let outcome = self.inner.state.write().await.apply_traffic(key, result);
        let bus = &self.inner.event_bus;

        match outcome {
            TrafficOutcome::Stale => {
                debug!(key, "Discarded stale traffic completion");
            }
            TrafficOutcome::Failed(error) => {
                warn!(timestamp = %timestamp, error = %error, "Traffic fetch failed");
                bus.emit_lossy(MeteorEvent::TrafficFetchFailed { timestamp, error });
            }
            TrafficOutcome::Empty => {
                info!(timestamp = %timestamp, "No traffic data for timestamp");
                bus.emit_lossy(MeteorEvent::NoTrafficData {
                    timestamp: timestamp.clone(),
                });
                bus.emit_lossy(MeteorEvent::ViewUpdated { timestamp });
            }
            TrafficOutcome::Loaded(camera_count) => {
                bus.emit_lossy(MeteorEvent::TrafficFetched {
                    timestamp: timestamp.clone(),
                    camera_count,
                });
                bus.emit_lossy(MeteorEvent::ViewUpdated {
                    timestamp: timestamp.clone(),
                });
                self.resolve_streets(key, &timestamp, &token).await;
            }
        }
    }

    async fn run_weather(self, key: FetchKey, timestamp: String, token: CancellationToken) {
        let result = tokio::select! {
            _ = token.cancelled() => {
                debug!(key, "Weather fetch superseded");
                return;
            }
            result = self.inner.weather.fetch_weather(&timestamp) => result,
        };

        let outcome = self.inner.state.write().await.apply_weather(key, result);
        let bus = &self.inner.event_bus;

        match outcome {
            WeatherOutcome::Stale => {
                debug!(key, "Discarded stale weather completion");
            }
            WeatherOutcome::Failed(error) => {
                warn!(timestamp = %timestamp, error = %error, "Weather fetch failed");
                bus.emit_lossy(MeteorEvent::WeatherFetchFailed { timestamp, error });
            }
            WeatherOutcome::Loaded => {
                bus.emit_lossy(MeteorEvent::ViewUpdated { timestamp });
            }
        }
    }

    async fn resolve_streets(&self, key: FetchKey, timestamp: &str, token: &CancellationToken) {
        let Some(resolver) = &self.inner.streets else {
            return;
        };
        let Some(cameras) = self.inner.state.read().await.cameras_for(key) else {
            return;
        };

        let dashboard = self;
        let lookups = resolver.resolve_each(&cameras, move |camera_id, street| async move {
            let applied = dashboard
                .inner
                .state
                .write()
                .await
                .apply_street(key, &camera_id, street);
            if applied {
                dashboard.inner.event_bus.emit_lossy(MeteorEvent::ViewUpdated {
                    timestamp: timestamp.to_string(),
                });
            }
        });

        tokio::select! {
            _ = token.cancelled() => {
                debug!(key, "Street resolution superseded");
            }
            resolved = lookups => {
                info!(key, resolved, total = cameras.len(), "Street resolution finished");
            }
        }
    }

    /// Current rows plus the form and selection state
    pub async fn view(&self) -> ViewSnapshot {
        let state = self.inner.state.read().await;
        ViewSnapshot {
            timestamp: state.timestamp().to_string(),
            selected_date: state.selected_date(),
            selected_time: state.selected_time(),
            has_camera_data: state.has_camera_data(),
            rows: state.rows(self.inner.strategy),
            selection: state.selection().map(str::to_string),
        }
    }

    /// Select a row; false if the camera is not in the current list
    pub async fn select(&self, camera_id: &str) -> bool {
        self.inner.state.write().await.select(camera_id)
    }

    /// Detail record of the selected camera
    pub async fn selected_camera(&self) -> Option<CameraRecord> {
        self.inner
            .state
            .read()
            .await
            .selected_camera(self.inner.strategy)
    }
}
