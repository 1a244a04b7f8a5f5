//! HTTP API handlers for meteor-app

pub mod health;
pub mod sse;
pub mod ui;
pub mod view;

pub use health::health_routes;
pub use sse::event_stream;
pub use ui::{serve_app_js, serve_index};
pub use view::view_routes;
