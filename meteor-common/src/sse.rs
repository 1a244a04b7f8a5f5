//! Server-Sent Events (SSE) utilities
//!
//! Bridges the EventBus onto an SSE response for the page.

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use serde_json::json;
use std::convert::Infallible;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

use crate::events::{EventBus, MeteorEvent};

/// Build the SSE frame for one event
///
/// The data is the event's JSON with a `notice` object added for the four
/// notification kinds, so the page does not need its own message table.
pub fn to_sse_event(event: &MeteorEvent) -> Event {
    let mut data = serde_json::to_value(event).unwrap_or_else(|_| json!({}));
    if let (Some((level, message)), Some(obj)) = (event.notice(), data.as_object_mut()) {
        obj.insert("notice".to_string(), json!({ "level": level, "message": message }));
    }

    Event::default()
        .event(event.event_type())
        .data(data.to_string())
}

/// Create an SSE stream forwarding every EventBus event
///
/// # Arguments
/// * `service_name` - Name of the service for logging
/// * `event_bus` - Bus to subscribe to
pub fn create_event_sse_stream(
    service_name: &'static str,
    event_bus: &EventBus,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    info!("New SSE client connected to {} events", service_name);

    let mut rx = event_bus.subscribe();

    let stream = async_stream::stream! {
        yield Ok(Event::default()
            .event("ConnectionStatus")
            .data("connected"));

        loop {
            match rx.recv().await {
                Ok(event) => {
                    debug!(event = event.event_type(), "SSE: forwarding event");
                    yield Ok(to_sse_event(&event));
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!("SSE: {} client lagged, {} events dropped", service_name, skipped);
                }
                Err(RecvError::Closed) => {
                    info!("SSE: {} event bus closed", service_name);
                    break;
                }
            }
        }
    };

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("heartbeat"),
    )
}
