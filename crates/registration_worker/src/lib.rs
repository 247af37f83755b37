pub mod config;
pub mod mqtt;
pub mod registration_worker;

pub use config::MqttConfig;
pub use registration_worker::RegistrationWorker;
