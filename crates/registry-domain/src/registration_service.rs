use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info};

use crate::error::{DomainError, DomainResult, ValidationError};
use crate::geoposition::GeoPoint;
use crate::repository::DeviceRepository;
use crate::types::{Device, RegistrationMessage};

/// Terminal state of one ingested registration message.
#[derive(Debug, Clone, PartialEq)]
pub enum RegistrationOutcome {
    /// First registration for this uuid; the device was persisted.
    Accepted(Device),
    /// A device with this uuid is already on record. Informational, not an
    /// error: the message is dropped without persistence.
    Duplicate(String),
}

/// Ingestion coordinator: validate, deduplicate, normalize, persist.
///
/// Each message runs through the pipeline independently; a rejected or
/// failed message is terminal and reported to the caller, never retried
/// here. The dedup lookup followed by the insert is not atomic against a
/// concurrent registration of the same uuid — an accepted race. The store's
/// uuid uniqueness constraint is the authoritative guard: a constraint
/// violation on insert is folded into the duplicate outcome.
pub struct RegistrationService {
    repository: Arc<dyn DeviceRepository>,
}

impl RegistrationService {
    pub fn new(repository: Arc<dyn DeviceRepository>) -> Self {
        Self { repository }
    }

    /// Runs one raw message through the pipeline.
    ///
    /// Errors are fail-closed: if the dedup lookup or the insert fails, the
    /// message is not recorded as registered and the failure is surfaced.
    pub async fn register(&self, raw: &Value) -> DomainResult<RegistrationOutcome> {
        let message = crate::validator::validate_registration_message(raw)?;

        let uuid = match message.uuid.as_deref() {
            Some(uuid) if !uuid.is_empty() => uuid.to_string(),
            _ => {
                // Identity is required for dedup; see DESIGN.md.
                return Err(DomainError::InvalidRegistration(
                    ValidationError::MissingProperty("uuid".to_string()),
                ));
            }
        };

        debug!(uuid = %uuid, "checking registration against existing records");

        if self.repository.get_device_by_uuid(&uuid).await?.is_some() {
            info!(uuid = %uuid, "device already registered, ignoring message");
            return Ok(RegistrationOutcome::Duplicate(uuid));
        }

        let device = build_device(uuid.clone(), message);

        match self.repository.save_device(&device).await {
            Ok(()) => {
                info!(uuid = %device.uuid, "device registered");
                Ok(RegistrationOutcome::Accepted(device))
            }
            // Lost the check-then-insert race: another message for the same
            // uuid got there first. Same outcome as the lookup hit.
            Err(DomainError::DeviceAlreadyExists(uuid)) => {
                info!(uuid = %uuid, "device registered concurrently, ignoring message");
                Ok(RegistrationOutcome::Duplicate(uuid))
            }
            Err(error) => Err(error),
        }
    }
}

fn build_device(uuid: String, message: RegistrationMessage) -> Device {
    Device {
        uuid,
        authorization: message.authorization,
        identification: message.identification,
        geo_position: GeoPoint::from_geoposition(Some(&message.geoposition)),
        timestamp: message.timestamp,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MockDeviceRepository;
    use serde_json::json;

    fn registration_message(uuid: &str) -> Value {
        json!({
            "uuid": uuid,
            "authorization": {
                "name": "Lawrence Robertson",
                "role": "C.E.O.",
                "deedOwner": "U.S. Robotics Corporation"
            },
            "geoposition": {"latitude": 64.065085, "longitude": -139.43114},
            "identification": {
                "company": "USR",
                "device": "Demolition Robot",
                "schedule": [],
                "version": "9-4"
            },
            "timestamp": "2019-09-01T12:34:43.502Z"
        })
    }

    #[tokio::test]
    async fn first_registration_is_persisted() {
        let mut repository = MockDeviceRepository::new();
        repository
            .expect_get_device_by_uuid()
            .withf(|uuid| uuid == "dev-1")
            .times(1)
            .returning(|_| Ok(None));
        repository
            .expect_save_device()
            .withf(|device| {
                device.uuid == "dev-1"
                    && device.geo_position.coordinates == vec![-139.43114, 64.065085]
            })
            .times(1)
            .returning(|_| Ok(()));

        let service = RegistrationService::new(Arc::new(repository));
        let outcome = service.register(&registration_message("dev-1")).await.unwrap();

        assert!(matches!(outcome, RegistrationOutcome::Accepted(_)));
    }

    #[tokio::test]
    async fn repeated_uuid_is_a_duplicate_without_second_save() {
        let mut repository = MockDeviceRepository::new();
        repository.expect_get_device_by_uuid().times(1).returning(|uuid| {
            let raw = registration_message(uuid);
            let message = crate::validator::validate_registration_message(&raw).unwrap();
            Ok(Some(super::build_device(uuid.to_string(), message)))
        });
        repository.expect_save_device().times(0);

        let service = RegistrationService::new(Arc::new(repository));
        let outcome = service.register(&registration_message("dev-1")).await.unwrap();

        assert_eq!(outcome, RegistrationOutcome::Duplicate("dev-1".to_string()));
    }

    #[tokio::test]
    async fn lost_insert_race_is_reported_as_duplicate() {
        let mut repository = MockDeviceRepository::new();
        repository
            .expect_get_device_by_uuid()
            .times(1)
            .returning(|_| Ok(None));
        repository
            .expect_save_device()
            .times(1)
            .returning(|device| Err(DomainError::DeviceAlreadyExists(device.uuid.clone())));

        let service = RegistrationService::new(Arc::new(repository));
        let outcome = service.register(&registration_message("dev-1")).await.unwrap();

        assert_eq!(outcome, RegistrationOutcome::Duplicate("dev-1".to_string()));
    }

    #[tokio::test]
    async fn invalid_message_is_rejected_before_any_store_access() {
        let mut repository = MockDeviceRepository::new();
        repository.expect_get_device_by_uuid().times(0);
        repository.expect_save_device().times(0);

        let mut message = registration_message("dev-1");
        message
            .as_object_mut()
            .unwrap()
            .insert("malice".to_string(), json!(true));

        let service = RegistrationService::new(Arc::new(repository));
        let error = service.register(&message).await.unwrap_err();

        assert_eq!(
            error.to_string(),
            "data should NOT have additional properties"
        );
    }

    #[tokio::test]
    async fn message_without_uuid_is_rejected() {
        let mut repository = MockDeviceRepository::new();
        repository.expect_get_device_by_uuid().times(0);
        repository.expect_save_device().times(0);

        let mut message = registration_message("dev-1");
        message.as_object_mut().unwrap().remove("uuid");

        let service = RegistrationService::new(Arc::new(repository));
        let error = service.register(&message).await.unwrap_err();

        assert_eq!(error.to_string(), "data should have required property 'uuid'");

        // An empty uuid is no identity either.
        let error = service
            .register(&registration_message(""))
            .await
            .unwrap_err();

        assert_eq!(error.to_string(), "data should have required property 'uuid'");
    }

    #[tokio::test]
    async fn lookup_failure_aborts_without_save() {
        let mut repository = MockDeviceRepository::new();
        repository
            .expect_get_device_by_uuid()
            .times(1)
            .returning(|_| Err(DomainError::StoreError(anyhow::anyhow!("connection refused"))));
        repository.expect_save_device().times(0);

        let service = RegistrationService::new(Arc::new(repository));
        let error = service.register(&registration_message("dev-1")).await.unwrap_err();

        assert!(matches!(error, DomainError::StoreError(_)));
    }
}
