pub mod client;
pub mod config;
pub mod conversions;
pub mod device_repository;
pub mod migration;
pub mod models;

pub use client::PostgresClient;
pub use config::PostgresConfig;
pub use device_repository::PostgresDeviceRepository;
pub use migration::MigrationRunner;
