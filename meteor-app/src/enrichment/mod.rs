//! Enrichment engine
//!
//! Attaches derived fields to camera records:
//! - `area` / `forecast` from the geo-join against a weather snapshot
//! - `street` from reverse geocoding, resolved separately and keyed by
//!   camera id
//!
//! Enrichment is a pure transform: inputs are never mutated, and the same
//! inputs always give the same records.

pub mod geo_join;
pub mod streets;

pub use geo_join::MatchStrategy;
pub use streets::StreetResolver;

use meteor_common::{CameraRecord, WeatherSnapshot};
use std::collections::HashMap;

/// Produce enriched copies of `cameras`
///
/// # Arguments
/// * `cameras` - Camera list of the current traffic snapshot
/// * `weather` - Weather snapshot fetched for the same timestamp, if any
/// * `streets` - Resolved street names keyed by camera id
/// * `strategy` - Proximity rule for the geo-join
pub fn enrich_cameras(
    cameras: &[CameraRecord],
    weather: Option<&WeatherSnapshot>,
    streets: &HashMap<String, String>,
    strategy: MatchStrategy,
) -> Vec<CameraRecord> {
    cameras
        .iter()
        .map(|camera| {
            let (area, forecast) = match weather {
                Some(weather) => strategy.assign(camera.location, weather),
                None => (None, None),
            };

            CameraRecord {
                area,
                forecast,
                street: streets.get(&camera.camera_id).cloned(),
                ..camera.clone()
            }
        })
        .collect()
}
