//! meteor-app library - traffic camera & weather viewer
//!
//! Exposes public APIs for integration testing

pub mod api;
pub mod config;
pub mod dashboard;
pub mod enrichment;
pub mod error;
pub mod pagination;
pub mod services;

pub use crate::dashboard::Dashboard;
pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use meteor_common::events::EventBus;
use tower_http::trace::TraceLayer;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// View state owner and fetch driver
    pub dashboard: Dashboard,
    /// Event bus for SSE notifications
    pub event_bus: EventBus,
}

impl AppState {
    pub fn new(dashboard: Dashboard) -> Self {
        Self {
            event_bus: dashboard.event_bus().clone(),
            dashboard,
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::get;

    Router::new()
        .route("/", get(api::serve_index))
        .route("/static/app.js", get(api::serve_app_js))
        .route("/events", get(api::event_stream))
        .merge(api::view_routes())
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
