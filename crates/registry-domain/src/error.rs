use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Validation failure for an inbound registration message.
///
/// The `Display` strings are a wire contract: callers and contract tests match
/// on the exact field-qualified text (e.g. "data.geoposition.latitude should
/// be >= -90"), so they must stay stable.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{path} should be {expected}")]
    TypeMismatch { path: String, expected: &'static str },

    #[error("data should have required property '{0}'")]
    MissingProperty(String),

    #[error("{path} should NOT have additional properties")]
    UnexpectedProperty { path: String },

    #[error("{field} should be {bound}")]
    RangeViolation { field: String, bound: RangeBound },
}

/// The violated edge of a numeric range check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RangeBound {
    Minimum(f64),
    Maximum(f64),
}

impl fmt::Display for RangeBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RangeBound::Minimum(bound) => write!(f, ">= {}", bound),
            RangeBound::Maximum(bound) => write!(f, "<= {}", bound),
        }
    }
}

#[derive(Error, Debug)]
pub enum DomainError {
    /// Client-originated, non-retryable. Transparent so the stable
    /// validation strings survive up to the reporting boundary.
    #[error(transparent)]
    InvalidRegistration(#[from] ValidationError),

    /// Raised by repositories on a uuid uniqueness violation. The ingestion
    /// coordinator converts this into a duplicate outcome, not a failure.
    #[error("device already exists: {0}")]
    DeviceAlreadyExists(String),

    /// Malformed or missing geofence query parameters. A client error,
    /// never a server fault.
    #[error("invalid geofence parameter: {0}")]
    InvalidGeofenceParameter(String),

    /// A storage call exceeded its bounded timeout. Surfaced to the caller,
    /// never retried internally.
    #[error("store operation timed out after {0:?}")]
    StoreTimeout(Duration),

    #[error("store error: {0}")]
    StoreError(#[from] anyhow::Error),
}

pub type DomainResult<T> = Result<T, DomainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_bound_renders_without_decimal_point() {
        assert_eq!(
            RangeBound::Minimum(-90.0).to_string(),
            ">= -90",
        );
        assert_eq!(
            RangeBound::Maximum(180.0).to_string(),
            "<= 180",
        );
    }

    #[test]
    fn validation_error_strings_are_field_qualified() {
        let err = ValidationError::RangeViolation {
            field: "data.geoposition.latitude".to_string(),
            bound: RangeBound::Minimum(-90.0),
        };
        assert_eq!(err.to_string(), "data.geoposition.latitude should be >= -90");

        let err = ValidationError::MissingProperty("authorization".to_string());
        assert_eq!(
            err.to_string(),
            "data should have required property 'authorization'"
        );
    }

    #[test]
    fn invalid_registration_is_transparent() {
        let err = DomainError::from(ValidationError::UnexpectedProperty {
            path: "data.authorization".to_string(),
        });
        assert_eq!(
            err.to_string(),
            "data.authorization should NOT have additional properties"
        );
    }
}
