use std::sync::Arc;

use rumqttc::{AsyncClient, Event, MqttOptions, Packet, QoS};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, instrument, warn, Instrument, Span};

use registry_domain::{DomainError, RegistrationOutcome, RegistrationService};

use crate::config::MqttConfig;

/// Run the MQTT subscriber for the registration topic.
///
/// Connects to the configured broker, subscribes to the registration topic
/// and feeds every published message into the ingestion pipeline. Connection
/// errors are retried with a bounded attempt count; message-level failures
/// are terminal for that message only and never tear down the subscriber.
#[instrument(name = "mqtt_subscriber", skip_all, fields(topic = %config.topic))]
pub async fn run_mqtt_subscriber(
    registration_service: Arc<RegistrationService>,
    config: MqttConfig,
    shutdown_token: CancellationToken,
) {
    info!(
        host = %config.host,
        port = config.port,
        topic = %config.topic,
        "starting MQTT subscriber"
    );

    let mut retry_count = 0;

    loop {
        if shutdown_token.is_cancelled() {
            debug!("MQTT subscriber cancelled before connection");
            break;
        }

        match run_mqtt_connection(&registration_service, &config, &shutdown_token).await {
            Ok(()) => {
                debug!("MQTT subscriber stopped cleanly");
                break;
            }
            Err(e) => {
                error!(error = %e, "MQTT connection error");

                retry_count += 1;
                if retry_count >= config.max_retry_attempts {
                    error!(
                        max_retries = config.max_retry_attempts,
                        "max retry attempts reached, stopping MQTT subscriber"
                    );
                    break;
                }

                warn!(
                    attempt = retry_count,
                    max_attempts = config.max_retry_attempts,
                    "retrying MQTT connection"
                );

                tokio::select! {
                    _ = shutdown_token.cancelled() => break,
                    _ = tokio::time::sleep(config.retry_delay()) => {}
                }
            }
        }
    }

    info!("MQTT subscriber stopped");
}

/// Run a single MQTT connection session.
async fn run_mqtt_connection(
    registration_service: &Arc<RegistrationService>,
    config: &MqttConfig,
    shutdown_token: &CancellationToken,
) -> anyhow::Result<()> {
    let mut mqtt_options = MqttOptions::new(&config.client_id, &config.host, config.port);
    mqtt_options.set_keep_alive(config.keep_alive());
    mqtt_options.set_clean_session(true);

    let (client, mut eventloop) = AsyncClient::new(mqtt_options, 100);

    client
        .subscribe(&config.topic, QoS::AtLeastOnce)
        .await
        .map_err(|e| anyhow::anyhow!("failed to subscribe: {}", e))?;

    info!(topic = %config.topic, "subscribed to MQTT topic");

    loop {
        tokio::select! {
            _ = shutdown_token.cancelled() => {
                debug!("shutdown signal received");
                let _ = client.disconnect().await;
                return Ok(());
            }
            event = eventloop.poll() => {
                match event {
                    Ok(Event::Incoming(Packet::Publish(publish))) => {
                        handle_registration_payload(registration_service, &publish.payload).await;
                    }
                    Ok(Event::Incoming(Packet::ConnAck(_))) => {
                        info!("connected to MQTT broker");
                    }
                    Ok(Event::Incoming(Packet::SubAck(_))) => {
                        debug!("subscription acknowledged");
                    }
                    Ok(_) => {}
                    Err(e) => {
                        return Err(anyhow::anyhow!("MQTT event loop error: {}", e));
                    }
                }
            }
        }
    }
}

/// Handle one inbound registration payload.
///
/// Every terminal state is reported: accepted and duplicate registrations at
/// info, client-side validation failures at warn, store failures at error.
/// Nothing is retried and nothing is silently dropped.
pub async fn handle_registration_payload(
    registration_service: &Arc<RegistrationService>,
    payload: &[u8],
) {
    // Each message gets its own root span, independent of the subscriber's.
    let span = info_span!(
        parent: Span::none(),
        "registration_message",
        payload_size = payload.len(),
    );

    async {
        let message: serde_json::Value = match serde_json::from_slice(payload) {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "discarding registration payload that is not valid JSON");
                return;
            }
        };

        match registration_service.register(&message).await {
            Ok(RegistrationOutcome::Accepted(device)) => {
                info!(uuid = %device.uuid, "device registered");
            }
            Ok(RegistrationOutcome::Duplicate(uuid)) => {
                info!(uuid = %uuid, "device already registered, message ignored");
            }
            Err(DomainError::InvalidRegistration(e)) => {
                warn!(error = %e, "invalid registration message");
            }
            Err(e) => {
                error!(error = %e, "failed to process registration message");
            }
        }
    }
    .instrument(span)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use registry_domain::{DeviceRepository, InMemoryDeviceRepository};
    use serde_json::json;

    fn service_with_store() -> (Arc<RegistrationService>, Arc<InMemoryDeviceRepository>) {
        let repository = Arc::new(InMemoryDeviceRepository::new());
        let service = Arc::new(RegistrationService::new(repository.clone()));
        (service, repository)
    }

    fn registration_payload(uuid: &str) -> Vec<u8> {
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
        .to_string()
        .into_bytes()
    }

    #[tokio::test]
    async fn valid_payload_is_persisted_once() {
        let (service, repository) = service_with_store();
        let payload = registration_payload("dev-1");

        handle_registration_payload(&service, &payload).await;
        handle_registration_payload(&service, &payload).await;

        let devices = repository.get_all_devices().await.unwrap();
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].uuid, "dev-1");
    }

    #[tokio::test]
    async fn non_json_payload_is_discarded() {
        let (service, repository) = service_with_store();

        handle_registration_payload(&service, b"not json at all").await;

        assert!(repository.get_all_devices().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn invalid_message_is_not_persisted() {
        let (service, repository) = service_with_store();
        let payload = json!({"malice": true}).to_string().into_bytes();

        handle_registration_payload(&service, &payload).await;

        assert!(repository.get_all_devices().await.unwrap().is_empty());
    }
}
