use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::{DomainError, DomainResult};
use crate::repository::DeviceRepository;
use crate::types::{Device, Geofence};

/// Mean Earth radius. Close enough to the spheroid distance a geospatial
/// storage engine computes for the radii this service works with.
const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// In-memory implementation of `DeviceRepository` backed by a HashMap and a
/// haversine distance scan. Honors the same contract as the PostgreSQL
/// implementation: uuid uniqueness on insert, nearest-first radius queries,
/// degenerate points excluded from geospatial results.
pub struct InMemoryDeviceRepository {
    devices: RwLock<HashMap<String, Device>>,
}

impl InMemoryDeviceRepository {
    pub fn new() -> Self {
        Self {
            devices: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryDeviceRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DeviceRepository for InMemoryDeviceRepository {
    async fn save_device(&self, device: &Device) -> DomainResult<()> {
        let mut devices = self.devices.write().await;
        if devices.contains_key(&device.uuid) {
            return Err(DomainError::DeviceAlreadyExists(device.uuid.clone()));
        }
        devices.insert(device.uuid.clone(), device.clone());
        Ok(())
    }

    async fn get_all_devices(&self) -> DomainResult<Vec<Device>> {
        let devices = self.devices.read().await;
        Ok(devices.values().cloned().collect())
    }

    async fn get_device_by_uuid(&self, uuid: &str) -> DomainResult<Option<Device>> {
        let devices = self.devices.read().await;
        Ok(devices.get(uuid).cloned())
    }

    async fn get_devices_within_radius(&self, geofence: &Geofence) -> DomainResult<Vec<Device>> {
        let devices = self.devices.read().await;

        let mut within: Vec<(f64, Device)> = devices
            .values()
            .filter_map(|device| {
                let longitude = device.geo_position.longitude()?;
                let latitude = device.geo_position.latitude()?;
                let distance = haversine_distance_meters(
                    geofence.longitude,
                    geofence.latitude,
                    longitude,
                    latitude,
                );
                (distance <= geofence.radius_in_meters).then(|| (distance, device.clone()))
            })
            .collect();

        within.sort_by(|a, b| a.0.total_cmp(&b.0));

        Ok(within.into_iter().map(|(_, device)| device).collect())
    }
}

fn haversine_distance_meters(lon1: f64, lat1: f64, lon2: f64, lat2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let delta_phi = (lat2 - lat1).to_radians();
    let delta_lambda = (lon2 - lon1).to_radians();

    let a = (delta_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (delta_lambda / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_METERS * a.sqrt().asin()
}
