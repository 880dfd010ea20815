use crate::math::{angle_between, Point2, Vector2};

use super::coordinate::GeoCoordinate;

/// Published movement state of the tracked object in the ribbon plane.
///
/// `position` starts at the origin; north is +Y and east is +X.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Orientation {
    /// Fix the current position was derived from; `None` before the first fix.
    pub reference: Option<GeoCoordinate>,
    pub position: Point2,
    /// Unit movement direction.
    pub direction: Vector2,
    pub previous_direction: Vector2,
    /// Azimuth of the last accepted movement in degrees from north.
    pub bearing: f64,
    /// Length of the last accepted movement.
    pub distance: f64,
    /// Unsigned angle between the previous and current direction, in radians.
    pub turn_angle: f64,
    /// Set on every accepted change until cleared by a reader.
    pub changed: bool,
}

impl Default for Orientation {
    fn default() -> Self {
        Self {
            reference: None,
            position: Point2::origin(),
            direction: Vector2::x(),
            previous_direction: Vector2::x(),
            bearing: 90.0,
            distance: 0.0,
            turn_angle: 0.0,
            changed: false,
        }
    }
}

impl Orientation {
    /// Records the first fix of a lap. The plane position is left untouched.
    pub fn begin(&mut self, reference: GeoCoordinate) {
        self.reference = Some(reference);
        self.changed = true;
    }

    /// Moves to `target` along the unit vector `direction`.
    pub fn advance(&mut self, target: Point2, direction: Vector2, distance: f64) {
        self.previous_direction = self.direction;
        self.direction = direction;
        self.turn_angle = angle_between(&self.previous_direction, &direction);
        self.bearing = bearing_of(&direction);
        self.distance = distance;
        self.position = target;
        self.changed = true;
    }
}

/// Unit plane direction for an azimuth in degrees clockwise from north.
#[must_use]
pub fn direction_of(bearing: f64) -> Vector2 {
    let (sin, cos) = bearing.to_radians().sin_cos();
    Vector2::new(sin, cos)
}

/// Azimuth in degrees in `[0, 360)` of a plane direction.
#[must_use]
pub fn bearing_of(direction: &Vector2) -> f64 {
    let bearing = direction.x.atan2(direction.y).to_degrees().rem_euclid(360.0);
    if bearing >= 360.0 {
        0.0
    } else {
        bearing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn bearing_and_direction_agree() {
        for bearing in [0.0, 45.0, 90.0, 180.0, 271.5] {
            let dir = direction_of(bearing);
            assert_abs_diff_eq!(dir.norm(), 1.0, epsilon = 1e-12);
            assert_abs_diff_eq!(bearing_of(&dir), bearing, epsilon = 1e-9);
        }
        assert_abs_diff_eq!(direction_of(0.0).y, 1.0);
        assert_abs_diff_eq!(direction_of(90.0).x, 1.0);
    }

    #[test]
    fn advance_tracks_turn() {
        let mut o = Orientation::default();
        assert!(o.reference.is_none());
        o.begin(GeoCoordinate::new(10.0, 10.0));
        assert!(o.changed);
        assert_eq!(o.position, Point2::origin());

        o.advance(Point2::new(0.0, 2.0), Vector2::y(), 2.0);
        assert_abs_diff_eq!(o.turn_angle, FRAC_PI_2, epsilon = 1e-12);
        assert_abs_diff_eq!(o.bearing, 0.0, epsilon = 1e-12);
        assert_eq!(o.previous_direction, Vector2::x());
    }
}
