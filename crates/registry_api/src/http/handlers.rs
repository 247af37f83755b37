use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use tracing::{error, warn};

use registry_domain::{DeviceService, DomainError, Geofence};

use crate::http::views::DeviceView;

pub async fn is_alive() -> StatusCode {
    StatusCode::NO_CONTENT
}

pub async fn list_devices(
    State(service): State<Arc<DeviceService>>,
) -> Result<Json<Vec<DeviceView>>, ApiError> {
    let devices = service.get_all_devices().await?;
    Ok(Json(devices.into_iter().map(DeviceView::from).collect()))
}

pub async fn get_device(
    State(service): State<Arc<DeviceService>>,
    Path(uuid): Path<String>,
) -> Result<Json<DeviceView>, ApiError> {
    let device = service
        .get_device_by_uuid(&uuid)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(DeviceView::from(device)))
}

/// Raw geofence query parameters. Kept as strings so parsing failures are
/// reported as client errors instead of extractor rejections.
#[derive(Debug, Deserialize)]
pub struct GeofenceParams {
    pub lat: Option<String>,
    pub lng: Option<String>,
    pub radius: Option<String>,
}

pub async fn list_devices_in_geofence(
    State(service): State<Arc<DeviceService>>,
    Query(params): Query<GeofenceParams>,
) -> Result<Json<Vec<DeviceView>>, ApiError> {
    let geofence = Geofence::from_query_params(
        params.lat.as_deref(),
        params.lng.as_deref(),
        params.radius.as_deref(),
    )?;

    let devices = service.get_devices_in_geofence(&geofence).await?;
    Ok(Json(devices.into_iter().map(DeviceView::from).collect()))
}

/// HTTP mapping of the domain error taxonomy: client-originated problems
/// answer 4xx, infrastructure problems answer 500. A store failure is never
/// masked as an empty result.
#[derive(Debug)]
pub enum ApiError {
    NotFound,
    Domain(DomainError),
}

impl From<DomainError> for ApiError {
    fn from(error: DomainError) -> Self {
        ApiError::Domain(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::NotFound => StatusCode::NOT_FOUND.into_response(),
            ApiError::Domain(DomainError::InvalidGeofenceParameter(reason)) => {
                warn!(reason = %reason, "rejecting geofence query");
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({"message": "Bad Request."})),
                )
                    .into_response()
            }
            ApiError::Domain(error) => {
                error!(error = %error, "query failed");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}
