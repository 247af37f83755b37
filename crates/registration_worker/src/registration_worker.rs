use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use registry_domain::RegistrationService;

use crate::config::MqttConfig;
use crate::mqtt::run_mqtt_subscriber;

/// Long-running worker that consumes the registration topic and drives the
/// ingestion pipeline. Designed to be handed to the process runner.
pub struct RegistrationWorker {
    registration_service: Arc<RegistrationService>,
    config: MqttConfig,
}

impl RegistrationWorker {
    pub fn new(registration_service: Arc<RegistrationService>, config: MqttConfig) -> Self {
        Self {
            registration_service,
            config,
        }
    }

    /// Runs until the token is cancelled or the broker connection is given
    /// up after the configured retry budget.
    pub async fn run(self, shutdown_token: CancellationToken) -> anyhow::Result<()> {
        run_mqtt_subscriber(self.registration_service, self.config, shutdown_token).await;
        Ok(())
    }
}
