//! Server-Sent Events for user notifications

use crate::AppState;
use axum::{
    extract::State,
    response::sse::{Event, Sse},
};
use futures::stream::Stream;
use std::convert::Infallible;

/// GET /events - SSE notification stream
///
/// Streams TrafficFetchFailed, WeatherFetchFailed, NoTrafficData,
/// TrafficFetched and ViewUpdated.
pub async fn event_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    meteor_common::sse::create_event_sse_stream("meteor-app", &state.event_bus)
}
