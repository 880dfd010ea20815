use std::f64::consts::{FRAC_PI_2, TAU};

use crate::geometry::PolySegment;
use crate::math::{angle_between, cross, vec2_eq, Point2, Vector2};

use super::Triangle2;

/// Largest angle a single round-joint fan triangle may span (about 10 degrees).
pub const MIN_JOINT_ANGLE: f64 = 0.174_533;

/// A pair of ribbon edge points, ordered `(edge1 side, edge2 side)`.
pub type EdgePair = (Point2, Point2);

/// Geometry connecting two consecutive ribbon segments.
#[derive(Debug, Clone, PartialEq)]
pub struct Joint {
    /// Where the incoming segment's quad ends.
    pub end: EdgePair,
    /// Where the outgoing segment's quad starts.
    pub next_start: EdgePair,
    /// Round fan filling the outer side of the turn.
    pub fan: Vec<Triangle2>,
    /// `true` for a right-hand (clockwise) turn.
    pub clockwise: bool,
    /// Unsigned turn angle in radians.
    pub angle: f64,
}

impl Joint {
    /// Computes the joint between `seg1` and the following `seg2`.
    ///
    /// The inner edges are mitred at their bounded intersection. When they do
    /// not meet, the incoming inner endpoint is used for the corner and, for
    /// turns sharper than 90 degrees, the outgoing segment restarts from the
    /// outer corner instead. The outer edges are bridged by a fan around the
    /// shared centre point; no fan is produced when the outer endpoints
    /// already coincide.
    ///
    /// Returns `None` if either segment is degenerate.
    #[must_use]
    pub fn between(seg1: &PolySegment, seg2: &PolySegment) -> Option<Self> {
        let dir1 = seg1.direction()?;
        let dir2 = seg2.direction()?;
        let angle = angle_between(&dir1, &dir2);
        let clockwise = cross(&dir1, &dir2) < 0.0;

        // The counter-clockwise normal puts edge1 on the left.
        let (outer1, outer2, inner1, inner2) = if clockwise {
            (&seg1.edge1, &seg2.edge1, &seg1.edge2, &seg2.edge2)
        } else {
            (&seg1.edge2, &seg2.edge2, &seg1.edge1, &seg2.edge1)
        };

        let inner_hit = inner1.intersection(inner2);
        let inner_sec = inner_hit.unwrap_or(inner1.b);
        let inner_start = match inner_hit {
            Some(p) => p,
            None if angle > FRAC_PI_2 => outer1.b,
            None => inner1.b,
        };

        let (end, next_start) = if clockwise {
            ((outer1.b, inner_sec), (outer2.a, inner_start))
        } else {
            ((inner_sec, outer1.b), (inner_start, outer2.a))
        };

        let fan = if vec2_eq(&outer1.b, &outer2.a) {
            Vec::new()
        } else {
            triangle_fan(inner_sec, seg1.center.b, outer1.b, outer2.a, clockwise)
        };

        Some(Self {
            end,
            next_start,
            fan,
            clockwise,
            angle,
        })
    }
}

/// Builds a partial circle of triangles around `origin` from `start` to `end`.
///
/// `start` and `end` are expected to be equidistant from `origin`. Each
/// triangle is `(arc point, next arc point, connect_to)`; no triangle spans
/// more than [`MIN_JOINT_ANGLE`] unless a single triangle covers the turn, and
/// the last one ends exactly on `end`.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn triangle_fan(
    connect_to: Point2,
    origin: Point2,
    start: Point2,
    end: Point2,
    clockwise: bool,
) -> Vec<Triangle2> {
    let point1 = start - origin;
    let point2 = end - origin;

    let mut angle1 = point1.y.atan2(point1.x);
    let mut angle2 = point2.y.atan2(point2.x);

    // Sweep the outer side of the turn.
    if clockwise {
        if angle2 > angle1 {
            angle2 -= TAU;
        }
    } else if angle1 > angle2 {
        angle1 -= TAU;
    }

    let joint_angle = angle2 - angle1;
    let count = ((joint_angle.abs() / MIN_JOINT_ANGLE).floor() as usize).max(1);
    let step = joint_angle / count as f64;

    let mut triangles = Vec::with_capacity(count);
    let mut from = start;
    for t in 0..count {
        let to = if t + 1 == count {
            end
        } else {
            let (sin, cos) = ((t + 1) as f64 * step).sin_cos();
            origin + Vector2::new(
                cos * point1.x - sin * point1.y,
                sin * point1.x + cos * point1.y,
            )
        };
        triangles.push([from, to, connect_to]);
        from = to;
    }
    triangles
}
