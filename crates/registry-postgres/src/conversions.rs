use anyhow::Context;
use registry_domain::{
    Authorization, Device, DomainError, GeoPoint, Geoposition, Identification, ScheduleEntry,
};

use crate::models::DeviceRow;

impl TryFrom<&Device> for DeviceRow {
    type Error = DomainError;

    fn try_from(device: &Device) -> Result<Self, Self::Error> {
        let schedule = serde_json::to_value(&device.identification.schedule)
            .context("failed to serialize schedule")?;

        Ok(Self {
            uuid: device.uuid.clone(),
            auth_name: device.authorization.name.clone(),
            auth_role: device.authorization.role.clone(),
            auth_owner: device.authorization.owner.clone(),
            company: device.identification.company.clone(),
            device_name: device.identification.device.clone(),
            device_version: device.identification.version.clone(),
            schedule,
            longitude: device.geo_position.longitude(),
            latitude: device.geo_position.latitude(),
            reported_at: device.timestamp,
        })
    }
}

impl TryFrom<DeviceRow> for Device {
    type Error = DomainError;

    fn try_from(row: DeviceRow) -> Result<Self, Self::Error> {
        let schedule: Vec<ScheduleEntry> = serde_json::from_value(row.schedule)
            .context("failed to deserialize schedule")?;

        Ok(Self {
            uuid: row.uuid,
            authorization: Authorization {
                name: row.auth_name,
                role: row.auth_role,
                owner: row.auth_owner,
            },
            identification: Identification {
                company: row.company,
                device: row.device_name,
                version: row.device_version,
                schedule,
            },
            geo_position: GeoPoint::from_geoposition(Some(&Geoposition {
                latitude: row.latitude,
                longitude: row.longitude,
            })),
            timestamp: row.reported_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample_device() -> Device {
        Device {
            uuid: "dev-1".to_string(),
            authorization: Authorization {
                name: Some("Lawrence Robertson".to_string()),
                role: Some("C.E.O.".to_string()),
                owner: Some("U.S. Robotics Corporation".to_string()),
            },
            identification: Identification {
                company: Some("USR".to_string()),
                device: Some("Demolition Robot".to_string()),
                version: Some("9-4".to_string()),
                schedule: vec![ScheduleEntry {
                    date_time: Some("2004-07-07T08:00:00.00Z".to_string()),
                    description: Some("demolition".to_string()),
                }],
            },
            geo_position: GeoPoint::from_geoposition(Some(&Geoposition {
                latitude: Some(64.065085),
                longitude: Some(-139.43114),
            })),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn device_round_trips_through_row() {
        let device = sample_device();

        let row = DeviceRow::try_from(&device).unwrap();
        assert_eq!(row.longitude, Some(-139.43114));
        assert_eq!(row.latitude, Some(64.065085));

        let restored = Device::try_from(row).unwrap();
        assert_eq!(restored, device);
    }

    #[test]
    fn degenerate_point_round_trips_as_null_columns() {
        let mut device = sample_device();
        device.geo_position = GeoPoint::from_geoposition(None);

        let row = DeviceRow::try_from(&device).unwrap();
        assert_eq!(row.longitude, None);
        assert_eq!(row.latitude, None);

        let restored = Device::try_from(row).unwrap();
        assert!(restored.geo_position.is_degenerate());
    }
}
