use async_trait::async_trait;

use crate::error::DomainResult;
use crate::types::{Device, Geofence};

/// Storage operations for registered devices. Infrastructure crates
/// (registry-postgres) implement this trait; the in-memory implementation
/// lives beside it for tests and local wiring.
///
/// Uniqueness of `uuid` is enforced by the implementation (e.g. a primary
/// key); `save_device` must fail with `DomainError::DeviceAlreadyExists`
/// when a record with the same uuid is already present.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait DeviceRepository: Send + Sync {
    /// Inserts a new device record. Insert only: no upsert, no update path.
    async fn save_device(&self, device: &Device) -> DomainResult<()>;

    /// Returns every record. Iteration order is stable within a single call
    /// but otherwise not significant.
    async fn get_all_devices(&self) -> DomainResult<Vec<Device>>;

    /// Point lookup by uuid. An absent record is `Ok(None)`, not an error.
    async fn get_device_by_uuid(&self, uuid: &str) -> DomainResult<Option<Device>>;

    /// Radius query: every device within the geofence, ordered by increasing
    /// distance from its center. The ordering is contractual. Devices with a
    /// degenerate (empty) coordinate pair are never returned.
    async fn get_devices_within_radius(&self, geofence: &Geofence) -> DomainResult<Vec<Device>>;
}
