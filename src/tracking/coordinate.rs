use geo::{Bearing, Distance, Haversine, Point};

use crate::error::{GeoError, Result};

/// Mean Earth radius in metres used for great-circle computations.
pub const EARTH_MEAN_RADIUS: f64 = 6_371_008.8; // same value as geo's private MEAN_EARTH_RADIUS

/// A WGS84 latitude/longitude fix in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GeoCoordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoCoordinate {
    #[must_use]
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Returns `true` for finite coordinates within the usual degree ranges.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }

    /// Returns `self` if valid.
    ///
    /// # Errors
    ///
    /// Returns [`GeoError::InvalidCoordinate`] otherwise.
    pub fn validated(self) -> Result<Self> {
        if self.is_valid() {
            Ok(self)
        } else {
            Err(GeoError::InvalidCoordinate {
                latitude: self.latitude,
                longitude: self.longitude,
            }
            .into())
        }
    }

    /// The fix as a `geo` point (x = longitude, y = latitude).
    #[must_use]
    pub fn point(&self) -> Point<f64> {
        Point::new(self.longitude, self.latitude)
    }

    /// Great-circle (haversine) distance to `other` in metres.
    #[must_use]
    pub fn distance_to(&self, other: &GeoCoordinate) -> f64 {
        Haversine::distance(self.point(), other.point())
    }

    /// Initial bearing towards `other` in degrees clockwise from north, in `[0, 360)`.
    #[must_use]
    pub fn azimuth_to(&self, other: &GeoCoordinate) -> f64 {
        let azimuth = Haversine::bearing(self.point(), other.point()).rem_euclid(360.0);
        // rem_euclid can round up to exactly 360 for tiny negative inputs.
        if azimuth >= 360.0 {
            0.0
        } else {
            azimuth
        }
    }
}

impl From<GeoCoordinate> for Point<f64> {
    fn from(coordinate: GeoCoordinate) -> Self {
        coordinate.point()
    }
}

impl From<Point<f64>> for GeoCoordinate {
    fn from(point: Point<f64>) -> Self {
        Self::new(point.y(), point.x())
    }
}
