use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::geoposition::GeoPoint;

/// A registration message as it arrives on the wire, after structural
/// validation. Field names mirror the message schema; `deedOwner` is the
/// wire spelling for what the persisted record calls `owner`.
#[derive(Debug, Clone, PartialEq)]
pub struct RegistrationMessage {
    pub uuid: Option<String>,
    pub authorization: Authorization,
    pub geoposition: Geoposition,
    pub identification: Identification,
    pub timestamp: DateTime<Utc>,
}

/// Administrative metadata carried on a registration. Opaque to the
/// pipeline; all fields are optional on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Authorization {
    pub name: Option<String>,
    pub role: Option<String>,
    pub owner: Option<String>,
}

/// Device-supplied coordinates before normalization. Either coordinate may
/// be absent; the normalizer turns a partial pair into a degenerate point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geoposition {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identification {
    pub company: Option<String>,
    pub device: Option<String>,
    pub version: Option<String>,
    /// Mirrored verbatim from the message: never reordered, never deduplicated.
    pub schedule: Vec<ScheduleEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    #[serde(rename = "dateTime", skip_serializing_if = "Option::is_none")]
    pub date_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// The persisted device entity. Created exactly once per uuid by the
/// ingestion pipeline; never mutated or deleted by it.
#[derive(Debug, Clone, PartialEq)]
pub struct Device {
    pub uuid: String,
    pub authorization: Authorization,
    pub identification: Identification,
    pub geo_position: GeoPoint,
    /// Instant reported by the device itself, not server-receipt time.
    pub timestamp: DateTime<Utc>,
}

/// A circular search region: center point plus radius in meters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geofence {
    pub longitude: f64,
    pub latitude: f64,
    pub radius_in_meters: f64,
}

impl Geofence {
    /// Builds a geofence from raw query parameters. All three must be
    /// present and parseable; anything else is a client error.
    pub fn from_query_params(
        lat: Option<&str>,
        lng: Option<&str>,
        radius: Option<&str>,
    ) -> DomainResult<Self> {
        let latitude = parse_param("lat", lat)?;
        let longitude = parse_param("lng", lng)?;
        let radius_in_meters = parse_param("radius", radius)?;

        Ok(Self {
            longitude,
            latitude,
            radius_in_meters,
        })
    }
}

fn parse_param(name: &str, value: Option<&str>) -> DomainResult<f64> {
    let raw = value
        .ok_or_else(|| DomainError::InvalidGeofenceParameter(format!("missing '{}'", name)))?;
    raw.parse::<f64>().map_err(|_| {
        DomainError::InvalidGeofenceParameter(format!("'{}' is not a number: {}", name, raw))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn geofence_from_complete_params() {
        let geofence =
            Geofence::from_query_params(Some("64.065085"), Some("-139.43114"), Some("1000"))
                .unwrap();
        assert_eq!(geofence.latitude, 64.065085);
        assert_eq!(geofence.longitude, -139.43114);
        assert_eq!(geofence.radius_in_meters, 1000.0);
    }

    #[test]
    fn geofence_missing_param_is_client_error() {
        let result = Geofence::from_query_params(Some("64.0"), None, Some("1000"));
        assert!(matches!(
            result,
            Err(DomainError::InvalidGeofenceParameter(_))
        ));
    }

    #[test]
    fn geofence_unparsable_param_is_client_error() {
        let result = Geofence::from_query_params(Some("64.0"), Some("-139.4"), Some("nearby"));
        assert!(matches!(
            result,
            Err(DomainError::InvalidGeofenceParameter(_))
        ));
    }
}
