//! Geo-join: assign each camera to a weather area by label-point proximity

use meteor_common::config::{GeoJoinConfig, MatchStrategyKind};
use meteor_common::{Coordinates, WeatherAreaMetadata, WeatherSnapshot};

/// Proximity rule used to pick a camera's weather area
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MatchStrategy {
    /// Area qualifies when `0 < dLat < tolerance && 0 < dLng < tolerance`,
    /// with `d = camera - label`. Last qualifying area wins.
    Literal { tolerance: f64 },
    /// Area qualifies when `|dLat| < tolerance && |dLng| < tolerance`.
    /// Closest qualifying label point wins; ties go to the later area.
    Nearest { tolerance: f64 },
}

impl Default for MatchStrategy {
    fn default() -> Self {
        Self::from(&GeoJoinConfig::default())
    }
}

impl From<&GeoJoinConfig> for MatchStrategy {
    fn from(config: &GeoJoinConfig) -> Self {
        match config.strategy {
            MatchStrategyKind::Literal => MatchStrategy::Literal {
                tolerance: config.tolerance,
            },
            MatchStrategyKind::Nearest => MatchStrategy::Nearest {
                tolerance: config.tolerance,
            },
        }
    }
}

impl MatchStrategy {
    /// Pick the area for a camera at `location`, if any qualifies
    pub fn match_area<'a>(
        &self,
        location: Coordinates,
        areas: &'a [WeatherAreaMetadata],
    ) -> Option<&'a WeatherAreaMetadata> {
        match *self {
            MatchStrategy::Literal { tolerance } => areas
                .iter()
                .filter(|area| {
                    let (d_lat, d_lng) = offset(location, area.label_location);
                    0.0 < d_lat && d_lat < tolerance && 0.0 < d_lng && d_lng < tolerance
                })
                .last(),
            MatchStrategy::Nearest { tolerance } => {
                let mut best: Option<(&WeatherAreaMetadata, f64)> = None;
                for area in areas {
                    let (d_lat, d_lng) = offset(location, area.label_location);
                    if d_lat.abs() >= tolerance || d_lng.abs() >= tolerance {
                        continue;
                    }
                    let distance = d_lat * d_lat + d_lng * d_lng;
                    if best.map_or(true, |(_, d)| distance <= d) {
                        best = Some((area, distance));
                    }
                }
                best.map(|(area, _)| area)
            }
        }
    }

    /// Area name and forecast text for a camera at `location`
    ///
    /// An area without a same-named forecast entry still yields its name.
    pub fn assign(
        &self,
        location: Coordinates,
        weather: &WeatherSnapshot,
    ) -> (Option<String>, Option<String>) {
        match self.match_area(location, &weather.areas) {
            Some(area) => (
                Some(area.name.clone()),
                weather.forecast_for(&area.name).map(str::to_string),
            ),
            None => (None, None),
        }
    }
}

fn offset(camera: Coordinates, label: Coordinates) -> (f64, f64) {
    (
        camera.latitude - label.latitude,
        camera.longitude - label.longitude,
    )
}
