//! Notification events and the EventBus
//!
//! Events are broadcast via EventBus and serialized for SSE transmission.
//! Four of them are user-visible notifications; `ViewUpdated` only tells the
//! page to re-read its rows.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Severity used by the page when rendering a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Error,
}

/// Meteor event types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum MeteorEvent {
    /// Traffic API request failed; previous camera data is kept
    TrafficFetchFailed {
        /// Formatted timestamp the request was made for
        timestamp: String,
        /// Underlying error, for the log view
        error: String,
    },

    /// Weather API request failed; previous weather snapshot is kept
    WeatherFetchFailed {
        timestamp: String,
        error: String,
    },

    /// Traffic API answered with a structurally empty snapshot
    NoTrafficData {
        timestamp: String,
    },

    /// Traffic API answered with cameras
    TrafficFetched {
        timestamp: String,
        camera_count: usize,
    },

    /// Rows changed (weather arrived, streets resolved, data cleared)
    ViewUpdated {
        timestamp: String,
    },
}

impl MeteorEvent {
    /// Event name used for the SSE `event:` field
    pub fn event_type(&self) -> &'static str {
        match self {
            MeteorEvent::TrafficFetchFailed { .. } => "TrafficFetchFailed",
            MeteorEvent::WeatherFetchFailed { .. } => "WeatherFetchFailed",
            MeteorEvent::NoTrafficData { .. } => "NoTrafficData",
            MeteorEvent::TrafficFetched { .. } => "TrafficFetched",
            MeteorEvent::ViewUpdated { .. } => "ViewUpdated",
        }
    }

    /// User-visible notification text, if this event is a notification
    pub fn notice(&self) -> Option<(NoticeLevel, &'static str)> {
        match self {
            MeteorEvent::TrafficFetchFailed { .. } => Some((
                NoticeLevel::Error,
                "Error fetching traffic data. Please try again later.",
            )),
            MeteorEvent::WeatherFetchFailed { .. } => Some((
                NoticeLevel::Error,
                "Error fetching weather data. Please try again later.",
            )),
            MeteorEvent::NoTrafficData { .. } => Some((
                NoticeLevel::Error,
                "No traffic data available for this date and time.",
            )),
            MeteorEvent::TrafficFetched { .. } => {
                Some((NoticeLevel::Success, "Traffic data fetched successfully."))
            }
            MeteorEvent::ViewUpdated { .. } => None,
        }
    }
}

/// Broadcast bus for MeteorEvents
///
/// Cloning is cheap; all clones share the same channel.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<MeteorEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// # Arguments
    ///
    /// * `capacity` - Number of events to buffer before dropping old events
    ///
    /// # Examples
    ///
    /// ```
    /// use meteor_common::events::EventBus;
    ///
    /// let event_bus = EventBus::new(100);
    /// assert_eq!(event_bus.capacity(), 100);
    /// ```
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<MeteorEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: MeteorEvent,
    ) -> Result<usize, broadcast::error::SendError<MeteorEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    ///
    /// Notifications are fire-and-forget: a page that is not open simply
    /// misses them.
    pub fn emit_lossy(&self, event: MeteorEvent) {
        let _ = self.tx.send(event);
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
