use std::time::Duration;

use serde::{Deserialize, Serialize};

/// MQTT subscriber configuration for the registration topic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MqttConfig {
    pub host: String,
    pub port: u16,
    pub topic: String,
    pub client_id: String,
    pub keep_alive_secs: u64,
    pub max_retry_attempts: u32,
    pub retry_delay_ms: u64,
}

impl MqttConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn keep_alive(&self) -> Duration {
        Duration::from_secs(self.keep_alive_secs)
    }
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 1883,
            topic: "registration".to_string(),
            client_id: "device-registry".to_string(),
            keep_alive_secs: 30,
            max_retry_attempts: 5,
            retry_delay_ms: 2000,
        }
    }
}
