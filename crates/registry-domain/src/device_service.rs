use std::sync::Arc;

use tracing::debug;

use crate::error::DomainResult;
use crate::repository::DeviceRepository;
use crate::types::{Device, Geofence};

/// Read-only facade over the device store, used by the query surface.
pub struct DeviceService {
    repository: Arc<dyn DeviceRepository>,
}

impl DeviceService {
    pub fn new(repository: Arc<dyn DeviceRepository>) -> Self {
        Self { repository }
    }

    pub async fn get_all_devices(&self) -> DomainResult<Vec<Device>> {
        let devices = self.repository.get_all_devices().await?;
        debug!(count = devices.len(), "listed devices");
        Ok(devices)
    }

    /// Point lookup. `Ok(None)` when no device carries the uuid; that is a
    /// legitimate not-found result, not an error.
    pub async fn get_device_by_uuid(&self, uuid: &str) -> DomainResult<Option<Device>> {
        self.repository.get_device_by_uuid(uuid).await
    }

    /// Devices within the geofence, nearest first.
    pub async fn get_devices_in_geofence(&self, geofence: &Geofence) -> DomainResult<Vec<Device>> {
        let devices = self.repository.get_devices_within_radius(geofence).await?;
        debug!(
            count = devices.len(),
            latitude = geofence.latitude,
            longitude = geofence.longitude,
            radius_in_meters = geofence.radius_in_meters,
            "geofence query"
        );
        Ok(devices)
    }
}
