use chrono::SecondsFormat;
use serde::Serialize;

use registry_domain::{Authorization, Device, Identification, ScheduleEntry};

/// Device as rendered to HTTP callers. Coordinates become a named
/// `{longitude, latitude}` pair here; the internal `[longitude, latitude]`
/// storage array never leaks past this boundary.
#[derive(Debug, Serialize)]
pub struct DeviceView {
    pub uuid: String,
    pub authorization: AuthorizationView,
    #[serde(rename = "geoPosition")]
    pub geo_position: GeoPositionView,
    pub identification: IdentificationView,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct AuthorizationView {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GeoPositionView {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub coordinates: CoordinatesView,
}

/// Degenerate points render as an empty object: absent coordinates stay
/// absent rather than becoming nulls.
#[derive(Debug, Serialize)]
pub struct CoordinatesView {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct IdentificationView {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub schedule: Vec<ScheduleEntry>,
}

impl From<Device> for DeviceView {
    fn from(device: Device) -> Self {
        let Device {
            uuid,
            authorization,
            identification,
            geo_position,
            timestamp,
        } = device;
        let Authorization { name, role, owner } = authorization;
        let Identification {
            company,
            device,
            version,
            schedule,
        } = identification;

        Self {
            uuid,
            authorization: AuthorizationView { name, role, owner },
            geo_position: GeoPositionView {
                kind: "Point",
                coordinates: CoordinatesView {
                    longitude: geo_position.longitude(),
                    latitude: geo_position.latitude(),
                },
            },
            identification: IdentificationView {
                company,
                device,
                version,
                schedule,
            },
            timestamp: timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use registry_domain::{GeoPoint, Geoposition};

    fn device() -> Device {
        Device {
            uuid: "device-a".to_string(),
            authorization: Authorization {
                name: Some("Lawrence Robertson".to_string()),
                role: None,
                owner: Some("U.S. Robotics Corporation".to_string()),
            },
            identification: Identification {
                company: Some("USR".to_string()),
                device: None,
                version: None,
                schedule: vec![ScheduleEntry {
                    date_time: Some("2004-07-07T08:00:00.00Z".to_string()),
                    description: Some("demolition".to_string()),
                }],
            },
            geo_position: GeoPoint::from_geoposition(Some(&Geoposition {
                latitude: Some(64.065085),
                longitude: Some(-139.43114),
            })),
            timestamp: Utc.with_ymd_and_hms(2019, 9, 1, 12, 34, 43).unwrap(),
        }
    }

    #[test]
    fn coordinates_render_as_a_named_pair() {
        let view = DeviceView::from(device());
        let json = serde_json::to_value(&view).unwrap();

        assert_eq!(json["geoPosition"]["type"], "Point");
        assert_eq!(json["geoPosition"]["coordinates"]["longitude"], -139.43114);
        assert_eq!(json["geoPosition"]["coordinates"]["latitude"], 64.065085);
        // The positional storage array must not appear at this boundary.
        assert!(!json["geoPosition"]["coordinates"].is_array());
    }

    #[test]
    fn absent_fields_are_omitted_not_null() {
        let view = DeviceView::from(device());
        let json = serde_json::to_value(&view).unwrap();

        assert!(json["authorization"].get("role").is_none());
        assert_eq!(json["identification"]["schedule"][0]["dateTime"], "2004-07-07T08:00:00.00Z");
    }

    #[test]
    fn degenerate_point_renders_empty_coordinates() {
        let mut device = device();
        device.geo_position = GeoPoint::from_geoposition(None);

        let json = serde_json::to_value(DeviceView::from(device)).unwrap();
        assert_eq!(
            json["geoPosition"]["coordinates"],
            serde_json::json!({})
        );
    }
}
