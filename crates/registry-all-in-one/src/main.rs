mod config;
mod telemetry;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing::{debug, error, info};

use config::ServiceConfig;
use registration_worker::RegistrationWorker;
use registry_domain::{DeviceRepository, DeviceService, RegistrationService};
use registry_postgres::{MigrationRunner, PostgresClient, PostgresDeviceRepository};
use registry_runner::Runner;

#[tokio::main]
async fn main() {
    let config = match ServiceConfig::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    telemetry::init_telemetry(&config.log_level);

    info!(
        mqtt_topic = %config.mqtt_topic,
        http_port = config.http_port,
        "starting device registry service"
    );
    debug!("configuration: {:?}", config);

    if let Err(e) = run(config).await {
        error!("service exited with error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(config: ServiceConfig) -> anyhow::Result<()> {
    let postgres_config = config.postgres_config();

    let migrations = MigrationRunner::new(
        postgres_config.goose_binary_path.clone(),
        postgres_config.migrations_dir.clone(),
        config.postgres_dsn(),
    );
    migrations
        .run_migrations()
        .await
        .context("failed to run database migrations")?;

    let postgres_client =
        PostgresClient::new(&postgres_config).context("failed to create postgres pool")?;
    postgres_client
        .ping()
        .await
        .context("failed to reach postgres")?;

    let repository: Arc<dyn DeviceRepository> = Arc::new(PostgresDeviceRepository::new(
        postgres_client,
        &postgres_config,
    ));
    let registration_service = Arc::new(RegistrationService::new(repository.clone()));
    let device_service = Arc::new(DeviceService::new(repository));

    let worker = RegistrationWorker::new(registration_service, config.mqtt_config());
    let http_config = config.http_config();

    Runner::new()
        .with_named_process("registration-worker", move |token| worker.run(token))
        .with_named_process("http-api", move |token| {
            registry_api::serve(http_config, device_service, token)
        })
        .with_closer_timeout(Duration::from_secs(10))
        .run()
        .await
}
