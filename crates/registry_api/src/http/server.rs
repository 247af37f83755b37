use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::info;

use registry_domain::DeviceService;

use crate::http::handlers;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

/// Builds the read-surface router. The geofence route is registered as a
/// static segment so it is matched ahead of the uuid capture.
pub fn router(device_service: Arc<DeviceService>) -> Router {
    Router::new()
        .route("/isalive", get(handlers::is_alive))
        .route("/devices", get(handlers::list_devices))
        .route("/devices/geofence", get(handlers::list_devices_in_geofence))
        .route("/devices/{uuid}", get(handlers::get_device))
        .with_state(device_service)
}

/// Serves the query surface until the token is cancelled.
pub async fn serve(
    config: HttpServerConfig,
    device_service: Arc<DeviceService>,
    shutdown_token: CancellationToken,
) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port)).await?;
    info!(host = %config.host, port = config.port, "device registry API listening");

    axum::serve(listener, router(device_service))
        .with_graceful_shutdown(async move { shutdown_token.cancelled().await })
        .await?;

    Ok(())
}
