//! Structural validation of inbound registration messages.
//!
//! The message schema is closed: beyond the recognized properties, nothing is
//! accepted, at the top level or inside the nested objects. Checks run in a
//! fixed precedence and the first failure wins; no error accumulation.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::error::{RangeBound, ValidationError};
use crate::types::{
    Authorization, Geoposition, Identification, RegistrationMessage, ScheduleEntry,
};

const REQUIRED_PROPERTIES: [&str; 4] =
    ["authorization", "geoposition", "identification", "timestamp"];
const TOP_LEVEL_PROPERTIES: [&str; 5] =
    ["authorization", "geoposition", "identification", "timestamp", "uuid"];
const AUTHORIZATION_PROPERTIES: [&str; 3] = ["name", "role", "deedOwner"];
const GEOPOSITION_PROPERTIES: [&str; 2] = ["latitude", "longitude"];
const IDENTIFICATION_PROPERTIES: [&str; 4] = ["company", "device", "version", "schedule"];

/// Validates a raw payload against the registration message contract and
/// produces the typed message on success.
///
/// Precedence, first failure wins:
/// 1. the payload must be a JSON object;
/// 2. the required top-level properties must all be present;
/// 3. no unrecognized properties at the top level or inside `authorization`,
///    `geoposition`, `identification`;
/// 4. fields must have their declared types, and latitude/longitude must lie
///    within [-90, 90] / [-180, 180].
pub fn validate_registration_message(
    raw: &Value,
) -> Result<RegistrationMessage, ValidationError> {
    let message = raw.as_object().ok_or(ValidationError::TypeMismatch {
        path: "data".to_string(),
        expected: "object",
    })?;

    for property in REQUIRED_PROPERTIES {
        if !message.contains_key(property) {
            return Err(ValidationError::MissingProperty(property.to_string()));
        }
    }

    reject_additional_properties("data", message, &TOP_LEVEL_PROPERTIES)?;

    let authorization = require_object(message, "authorization")?;
    reject_additional_properties("data.authorization", authorization, &AUTHORIZATION_PROPERTIES)?;

    let geoposition = require_object(message, "geoposition")?;
    reject_additional_properties("data.geoposition", geoposition, &GEOPOSITION_PROPERTIES)?;

    let identification = require_object(message, "identification")?;
    reject_additional_properties(
        "data.identification",
        identification,
        &IDENTIFICATION_PROPERTIES,
    )?;

    let uuid = optional_string(message, "data", "uuid")?;
    let authorization = Authorization {
        name: optional_string(authorization, "data.authorization", "name")?,
        role: optional_string(authorization, "data.authorization", "role")?,
        owner: optional_string(authorization, "data.authorization", "deedOwner")?,
    };
    let latitude = optional_number(geoposition, "data.geoposition", "latitude")?;
    let longitude = optional_number(geoposition, "data.geoposition", "longitude")?;
    let identification = Identification {
        company: optional_string(identification, "data.identification", "company")?,
        device: optional_string(identification, "data.identification", "device")?,
        version: optional_string(identification, "data.identification", "version")?,
        schedule: extract_schedule(identification)?,
    };

    check_range("data.geoposition.latitude", latitude, -90.0, 90.0)?;
    check_range("data.geoposition.longitude", longitude, -180.0, 180.0)?;

    let timestamp = extract_timestamp(message)?;

    Ok(RegistrationMessage {
        uuid,
        authorization,
        geoposition: Geoposition {
            latitude,
            longitude,
        },
        identification,
        timestamp,
    })
}

fn reject_additional_properties(
    path: &str,
    object: &Map<String, Value>,
    recognized: &[&str],
) -> Result<(), ValidationError> {
    if object.keys().any(|key| !recognized.contains(&key.as_str())) {
        return Err(ValidationError::UnexpectedProperty {
            path: path.to_string(),
        });
    }
    Ok(())
}

fn require_object<'a>(
    message: &'a Map<String, Value>,
    property: &str,
) -> Result<&'a Map<String, Value>, ValidationError> {
    message[property]
        .as_object()
        .ok_or(ValidationError::TypeMismatch {
            path: format!("data.{}", property),
            expected: "object",
        })
}

fn optional_string(
    object: &Map<String, Value>,
    path: &str,
    property: &str,
) -> Result<Option<String>, ValidationError> {
    match object.get(property) {
        None => Ok(None),
        Some(Value::String(value)) => Ok(Some(value.clone())),
        Some(_) => Err(ValidationError::TypeMismatch {
            path: format!("{}.{}", path, property),
            expected: "string",
        }),
    }
}

fn optional_number(
    object: &Map<String, Value>,
    path: &str,
    property: &str,
) -> Result<Option<f64>, ValidationError> {
    match object.get(property) {
        None => Ok(None),
        Some(value) => value.as_f64().map(Some).ok_or(ValidationError::TypeMismatch {
            path: format!("{}.{}", path, property),
            expected: "number",
        }),
    }
}

fn check_range(
    field: &str,
    value: Option<f64>,
    minimum: f64,
    maximum: f64,
) -> Result<(), ValidationError> {
    let Some(value) = value else {
        return Ok(());
    };
    if value < minimum {
        return Err(ValidationError::RangeViolation {
            field: field.to_string(),
            bound: RangeBound::Minimum(minimum),
        });
    }
    if value > maximum {
        return Err(ValidationError::RangeViolation {
            field: field.to_string(),
            bound: RangeBound::Maximum(maximum),
        });
    }
    Ok(())
}

fn extract_schedule(
    identification: &Map<String, Value>,
) -> Result<Vec<ScheduleEntry>, ValidationError> {
    let entries = match identification.get("schedule") {
        None => return Ok(Vec::new()),
        Some(Value::Array(entries)) => entries,
        Some(_) => {
            return Err(ValidationError::TypeMismatch {
                path: "data.identification.schedule".to_string(),
                expected: "array",
            })
        }
    };

    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            let path = format!("data.identification.schedule[{}]", index);
            let entry = entry.as_object().ok_or(ValidationError::TypeMismatch {
                path: path.clone(),
                expected: "object",
            })?;
            Ok(ScheduleEntry {
                date_time: optional_string(entry, &path, "dateTime")?,
                description: optional_string(entry, &path, "description")?,
            })
        })
        .collect()
}

fn extract_timestamp(message: &Map<String, Value>) -> Result<DateTime<Utc>, ValidationError> {
    let raw = message["timestamp"]
        .as_str()
        .ok_or(ValidationError::TypeMismatch {
            path: "data.timestamp".to_string(),
            expected: "string",
        })?;

    DateTime::parse_from_rfc3339(raw)
        .map(|timestamp| timestamp.with_timezone(&Utc))
        .map_err(|_| ValidationError::TypeMismatch {
            path: "data.timestamp".to_string(),
            expected: "date-time",
        })
}
