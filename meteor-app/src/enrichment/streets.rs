//! Street name resolution via reverse geocoding
//!
//! One request per camera, all in flight at once, no cap. A failed lookup
//! is a silent miss: logged, never surfaced, street stays unset.

use futures::future::join_all;
use meteor_common::CameraRecord;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::services::ReverseGeocoder;

/// Concurrent street resolver
#[derive(Clone)]
pub struct StreetResolver {
    geocoder: Arc<dyn ReverseGeocoder>,
}

impl StreetResolver {
    pub fn new(geocoder: Arc<dyn ReverseGeocoder>) -> Self {
        Self { geocoder }
    }

    /// Street for one camera, `None` on any failure
    pub async fn resolve(&self, camera: &CameraRecord) -> Option<String> {
        match self.geocoder.street_name(camera.location).await {
            Ok(street) => {
                debug!(camera_id = %camera.camera_id, street = %street, "Street resolved");
                Some(street)
            }
            Err(e) => {
                warn!(
                    camera_id = %camera.camera_id,
                    error = %e,
                    "Reverse geocoding failed, street left unset"
                );
                None
            }
        }
    }

    /// Resolve every camera concurrently
    ///
    /// `on_resolved(camera_id, street)` runs as soon as that camera's lookup
    /// finishes, independently of the others. Returns the number resolved.
    pub async fn resolve_each<F, Fut>(&self, cameras: &[CameraRecord], on_resolved: F) -> usize
    where
        F: Fn(String, String) -> Fut,
        Fut: Future<Output = ()>,
    {
        let on_resolved = &on_resolved;
        let lookups = cameras.iter().map(|camera| async move {
            match self.resolve(camera).await {
                Some(street) => {
                    on_resolved(camera.camera_id.clone(), street).await;
                    true
                }
                None => false,
            }
        });

        join_all(lookups)
            .await
            .into_iter()
            .filter(|resolved| *resolved)
            .count()
    }
}
