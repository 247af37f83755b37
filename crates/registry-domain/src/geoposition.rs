use serde::{Deserialize, Serialize};

use crate::types::Geoposition;

/// The storage representation of a device position: a GeoJSON-style point
/// whose coordinate array is `[longitude, latitude]`. Longitude comes first
/// because the geospatial index is built on that order; it must never be
/// swapped. External callers see a named pair instead (see `longitude()` /
/// `latitude()`), so the array order stays an internal detail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub coordinates: Vec<f64>,
}

impl GeoPoint {
    /// Normalizes device-supplied coordinates into the storage form.
    ///
    /// A missing geoposition, or one missing either coordinate, yields an
    /// empty coordinate pair rather than an error: coordinate-less
    /// registrations are accepted but never match a geofence query (see
    /// DESIGN.md).
    pub fn from_geoposition(geoposition: Option<&Geoposition>) -> Self {
        let coordinates = match geoposition {
            Some(Geoposition {
                latitude: Some(latitude),
                longitude: Some(longitude),
            }) => vec![*longitude, *latitude],
            _ => Vec::new(),
        };

        Self { coordinates }
    }

    pub fn longitude(&self) -> Option<f64> {
        self.coordinates.first().copied()
    }

    pub fn latitude(&self) -> Option<f64> {
        self.coordinates.get(1).copied()
    }

    /// True when the point carries no usable coordinates.
    pub fn is_degenerate(&self) -> bool {
        self.coordinates.len() < 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_longitude_before_latitude() {
        let geoposition = Geoposition {
            latitude: Some(64.065085),
            longitude: Some(-139.43114),
        };

        let point = GeoPoint::from_geoposition(Some(&geoposition));

        assert_eq!(point.coordinates, vec![-139.43114, 64.065085]);
        assert_eq!(point.longitude(), Some(-139.43114));
        assert_eq!(point.latitude(), Some(64.065085));
    }

    #[test]
    fn missing_geoposition_yields_empty_pair() {
        let point = GeoPoint::from_geoposition(None);
        assert!(point.coordinates.is_empty());
        assert!(point.is_degenerate());
    }

    #[test]
    fn partial_geoposition_yields_empty_pair() {
        let geoposition = Geoposition {
            latitude: Some(64.065085),
            longitude: None,
        };

        let point = GeoPoint::from_geoposition(Some(&geoposition));

        assert!(point.coordinates.is_empty());
        assert!(point.is_degenerate());
    }
}
