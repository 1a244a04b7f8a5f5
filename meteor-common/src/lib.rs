//! # Meteor Common Library
//!
//! Shared code for the Meteor traffic & weather viewer:
//! - Camera / weather data model
//! - Notification events and the EventBus
//! - Configuration loading
//! - Timestamp formatting

pub mod config;
pub mod error;
pub mod events;
pub mod models;
pub mod sse;
pub mod time;

pub use error::{Error, Result};
pub use models::{CameraRecord, Coordinates, ForecastEntry, WeatherAreaMetadata, WeatherSnapshot};
