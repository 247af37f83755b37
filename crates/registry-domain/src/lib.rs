pub mod device_service;
pub mod error;
pub mod geoposition;
pub mod in_memory_device_repository;
pub mod registration_service;
pub mod repository;
pub mod types;
pub mod validator;

pub use device_service::DeviceService;
pub use error::{DomainError, DomainResult, RangeBound, ValidationError};
pub use geoposition::GeoPoint;
pub use in_memory_device_repository::InMemoryDeviceRepository;
pub use registration_service::{RegistrationOutcome, RegistrationService};
pub use repository::DeviceRepository;
#[cfg(any(test, feature = "testing"))]
pub use repository::MockDeviceRepository;
pub use types::{
    Authorization, Device, Geofence, Geoposition, Identification, RegistrationMessage,
    ScheduleEntry,
};
pub use validator::validate_registration_message;
