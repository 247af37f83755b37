use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tracing::debug;

use registry_domain::{Device, DeviceRepository, DomainError, DomainResult, Geofence};

use crate::client::PostgresClient;
use crate::config::PostgresConfig;
use crate::models::DeviceRow;

const SELECT_COLUMNS: &str = "uuid, auth_name, auth_role, auth_owner, company, device_name, \
     device_version, schedule, longitude, latitude, reported_at";

/// PostgreSQL + PostGIS implementation of `DeviceRepository`.
///
/// The `uuid` primary key is the authoritative dedup mechanism: a unique
/// violation on insert is reported as `DeviceAlreadyExists`. Every call is
/// wrapped in a bounded timeout.
#[derive(Clone)]
pub struct PostgresDeviceRepository {
    client: PostgresClient,
    query_timeout: Duration,
}

impl PostgresDeviceRepository {
    pub fn new(client: PostgresClient, config: &PostgresConfig) -> Self {
        Self {
            client,
            query_timeout: Duration::from_secs(config.query_timeout_secs),
        }
    }

    async fn bounded<T>(
        &self,
        operation: impl std::future::Future<Output = DomainResult<T>>,
    ) -> DomainResult<T> {
        tokio::time::timeout(self.query_timeout, operation)
            .await
            .map_err(|_| DomainError::StoreTimeout(self.query_timeout))?
    }

    async fn insert_device(&self, device: &Device) -> DomainResult<()> {
        let row = DeviceRow::try_from(device)?;
        let conn = self.client.get_connection().await?;
        let now = Utc::now();

        let result = conn
            .execute(
                "INSERT INTO devices (uuid, auth_name, auth_role, auth_owner, company, \
                 device_name, device_version, schedule, longitude, latitude, reported_at, \
                 created_at) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
                &[
                    &row.uuid,
                    &row.auth_name,
                    &row.auth_role,
                    &row.auth_owner,
                    &row.company,
                    &row.device_name,
                    &row.device_version,
                    &row.schedule,
                    &row.longitude,
                    &row.latitude,
                    &row.reported_at,
                    &now,
                ],
            )
            .await;

        if let Err(e) = result {
            if let Some(db_err) = e.as_db_error() {
                // 23505 is unique_violation on the uuid primary key.
                if db_err.code().code() == "23505" {
                    return Err(DomainError::DeviceAlreadyExists(device.uuid.clone()));
                }
            }
            return Err(DomainError::StoreError(e.into()));
        }

        debug!(uuid = %device.uuid, "inserted device");
        Ok(())
    }

    async fn fetch_all(&self) -> DomainResult<Vec<Device>> {
        let conn = self.client.get_connection().await?;

        let sql = format!("SELECT {} FROM devices", SELECT_COLUMNS);
        let rows = conn
            .query(sql.as_str(), &[])
            .await
            .map_err(|e| DomainError::StoreError(e.into()))?;

        rows.iter()
            .map(|row| Device::try_from(DeviceRow::from_row(row)))
            .collect()
    }

    async fn fetch_by_uuid(&self, uuid: &str) -> DomainResult<Option<Device>> {
        let conn = self.client.get_connection().await?;

        let sql = format!("SELECT {} FROM devices WHERE uuid = $1", SELECT_COLUMNS);
        let row = conn
            .query_opt(sql.as_str(), &[&uuid])
            .await
            .map_err(|e| DomainError::StoreError(e.into()))?;

        row.map(|row| Device::try_from(DeviceRow::from_row(&row)))
            .transpose()
    }

    async fn fetch_within_radius(&self, geofence: &Geofence) -> DomainResult<Vec<Device>> {
        let conn = self.client.get_connection().await?;

        // ST_DWithin prunes through the GIST index; ordering by ST_Distance
        // gives the contractual nearest-first result. Rows without a
        // geography (degenerate points) never match.
        let sql = format!(
            "SELECT {} FROM devices \
             WHERE geog IS NOT NULL \
               AND ST_DWithin(geog, ST_SetSRID(ST_MakePoint($1, $2), 4326)::geography, $3) \
             ORDER BY ST_Distance(geog, ST_SetSRID(ST_MakePoint($1, $2), 4326)::geography)",
            SELECT_COLUMNS
        );
        let rows = conn
            .query(
                sql.as_str(),
                &[&geofence.longitude, &geofence.latitude, &geofence.radius_in_meters],
            )
            .await
            .map_err(|e| DomainError::StoreError(e.into()))?;

        debug!(
            count = rows.len(),
            radius_in_meters = geofence.radius_in_meters,
            "geofence query"
        );

        rows.iter()
            .map(|row| Device::try_from(DeviceRow::from_row(row)))
            .collect()
    }
}

#[async_trait]
impl DeviceRepository for PostgresDeviceRepository {
    async fn save_device(&self, device: &Device) -> DomainResult<()> {
        self.bounded(self.insert_device(device)).await
    }

    async fn get_all_devices(&self) -> DomainResult<Vec<Device>> {
        self.bounded(self.fetch_all()).await
    }

    async fn get_device_by_uuid(&self, uuid: &str) -> DomainResult<Option<Device>> {
        self.bounded(self.fetch_by_uuid(uuid)).await
    }

    async fn get_devices_within_radius(&self, geofence: &Geofence) -> DomainResult<Vec<Device>> {
        self.bounded(self.fetch_within_radius(geofence)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // The pool is lazy, so a repository can be built against an unreachable
    // host without a running database.
    #[tokio::test]
    async fn store_call_exceeding_the_bound_fails_with_timeout() {
        let config = PostgresConfig {
            // TEST-NET-1, guaranteed non-routable.
            host: "192.0.2.1".to_string(),
            query_timeout_secs: 0,
            ..PostgresConfig::default()
        };
        let client = PostgresClient::new(&config).unwrap();
        let repository = PostgresDeviceRepository::new(client, &config);

        let error = repository.get_all_devices().await.unwrap_err();
        assert!(matches!(error, DomainError::StoreTimeout(_)));

        let error = repository.get_device_by_uuid("dev-1").await.unwrap_err();
        assert!(matches!(error, DomainError::StoreTimeout(_)));
    }
}
