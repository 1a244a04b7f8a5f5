//! View API: submit a date/time, read the camera table, select a row

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use meteor_common::models::ImageMetadata;
use meteor_common::time::{parse_date, parse_time};
use meteor_common::CameraRecord;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::pagination::{calculate_pagination, PAGE_SIZE};
use crate::AppState;

/// Build view routes
pub fn view_routes() -> Router<AppState> {
    Router::new()
        .route("/api/view", post(submit_view))
        .route("/api/cameras", get(get_cameras))
        .route("/api/cameras/:camera_id/select", post(select_camera))
        .route("/api/selection", get(get_selection))
}

/// Date/time form submission
#[derive(Debug, Deserialize)]
pub struct ViewRequest {
    /// `YYYY-MM-DD`
    pub date: String,
    /// `HH:MM` or `HH:MM:SS`
    pub time: String,
}

#[derive(Debug, Serialize)]
pub struct ViewStarted {
    /// Formatted timestamp both APIs are queried with
    pub timestamp: String,
}

/// POST /api/view
///
/// Clears the selection and starts fetching for the new timestamp. Results
/// arrive asynchronously; the page hears about them over SSE.
pub async fn submit_view(
    State(state): State<AppState>,
    Json(request): Json<ViewRequest>,
) -> ApiResult<Json<ViewStarted>> {
    let date = parse_date(&request.date)?;
    let time = parse_time(&request.time)?;

    let handles = state.dashboard.submit(date, time).await;
    info!(timestamp = %handles.timestamp, "View requested");

    Ok(Json(ViewStarted {
        timestamp: handles.timestamp,
    }))
}

/// Query parameters for the camera table
#[derive(Debug, Deserialize)]
pub struct CamerasQuery {
    /// Page number (1-indexed)
    #[serde(default = "default_page")]
    pub page: usize,
}

fn default_page() -> usize {
    1
}

/// One table row
#[derive(Debug, Serialize)]
pub struct CameraRow {
    pub id: String,
    /// Position in the full (unpaginated) list
    pub index: usize,
    pub street: Option<String>,
    pub area: Option<String>,
    pub forecast: Option<String>,
    pub image: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// Camera table response
#[derive(Debug, Serialize)]
pub struct CamerasResponse {
    pub timestamp: String,
    pub selected_date: Option<String>,
    pub selected_time: Option<String>,
    /// False before the first load and after an empty snapshot
    pub has_data: bool,
    pub total_rows: usize,
    pub page: usize,
    pub page_size: usize,
    pub total_pages: usize,
    pub selection: Option<String>,
    pub rows: Vec<CameraRow>,
}

/// GET /api/cameras?page=N
pub async fn get_cameras(
    State(state): State<AppState>,
    Query(query): Query<CamerasQuery>,
) -> Json<CamerasResponse> {
    let view = state.dashboard.view().await;
    let pagination = calculate_pagination(view.rows.len(), query.page);

    let rows = pagination
        .slice(&view.rows)
        .iter()
        .enumerate()
        .map(|(i, camera)| CameraRow {
            id: camera.camera_id.clone(),
            index: pagination.offset + i,
            street: camera.street.clone(),
            area: camera.area.clone(),
            forecast: camera.forecast.clone(),
            image: camera.image.clone(),
            latitude: camera.location.latitude,
            longitude: camera.location.longitude,
        })
        .collect();

    Json(CamerasResponse {
        timestamp: view.timestamp,
        selected_date: view.selected_date.map(|d| d.format("%Y-%m-%d").to_string()),
        selected_time: view.selected_time.map(|t| t.format("%H:%M").to_string()),
        has_data: view.has_camera_data,
        total_rows: view.rows.len(),
        page: pagination.page,
        page_size: PAGE_SIZE,
        total_pages: pagination.total_pages,
        selection: view.selection,
        rows,
    })
}

/// Detail panel contents
#[derive(Debug, Serialize)]
pub struct SelectionDetail {
    pub camera_id: String,
    /// Image capture time as reported by the traffic API
    pub captured_at: Option<String>,
    pub street: Option<String>,
    pub area: Option<String>,
    pub forecast: Option<String>,
    pub image: String,
    pub image_metadata: ImageMetadata,
    pub latitude: f64,
    pub longitude: f64,
}

impl From<CameraRecord> for SelectionDetail {
    fn from(camera: CameraRecord) -> Self {
        Self {
            camera_id: camera.camera_id,
            captured_at: camera.timestamp,
            street: camera.street,
            area: camera.area,
            forecast: camera.forecast,
            image: camera.image,
            image_metadata: camera.image_metadata,
            latitude: camera.location.latitude,
            longitude: camera.location.longitude,
        }
    }
}

/// POST /api/cameras/:camera_id/select
pub async fn select_camera(
    State(state): State<AppState>,
    Path(camera_id): Path<String>,
) -> ApiResult<Json<SelectionDetail>> {
    if !state.dashboard.select(&camera_id).await {
        return Err(ApiError::NotFound(format!("camera {}", camera_id)));
    }

    state
        .dashboard
        .selected_camera()
        .await
        .map(|camera| Json(SelectionDetail::from(camera)))
        .ok_or_else(|| ApiError::NotFound(format!("camera {}", camera_id)))
}

/// GET /api/selection
pub async fn get_selection(State(state): State<AppState>) -> Json<Option<SelectionDetail>> {
    Json(state.dashboard.selected_camera().await.map(SelectionDetail::from))
}
