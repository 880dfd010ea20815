use crate::math::triangle_2d::project_onto_line;
use crate::math::Point2;

/// Result of a revisit query at one point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitQuery {
    /// An old enough triangle strictly contains the point.
    pub hit: bool,
    /// Lane the point was classified onto, for the triangle that decided `painted`.
    pub lane: Option<usize>,
    /// Application bit of that lane when the triangle was stored.
    pub painted: bool,
    /// Draw elevation clear of every hit triangle.
    pub elevation: f64,
}

/// Lane of `point` within the triangle `positions`, whose vertices carry `lanes`.
///
/// The edge `v0`-`v1` is used when those vertices sit on different lanes,
/// `v0`-`v2` otherwise. The point is projected onto that edge and the lane
/// widths are walked from the lower-lane endpoint; if the walk runs out
/// before passing the projected point, lane 0 is returned.
///
/// This is an approximation. It relies on ribbon triangles spanning the
/// cross-section so that one edge runs across the lanes, and can pick a
/// neighbouring lane for acute triangles such as joint fans.
#[must_use]
pub fn classify_lane(
    positions: &[Point2; 3],
    lanes: [usize; 3],
    point: &Point2,
    lane_lengths: &[f64],
) -> usize {
    let (mut v1, mut v2, mut first, mut last) = if lanes[0] == lanes[1] {
        (positions[0], positions[2], lanes[0], lanes[2])
    } else {
        (positions[0], positions[1], lanes[0], lanes[1])
    };
    if first > last {
        std::mem::swap(&mut v1, &mut v2);
        std::mem::swap(&mut first, &mut last);
    }

    let projected = project_onto_line(&v1, &v2, point);
    let offset = (projected - v1).norm();

    let mut acc = 0.0;
    for (lane, len) in lane_lengths.iter().enumerate().take(last.saturating_add(1)).skip(first) {
        acc += len;
        if acc > offset {
            return lane;
        }
    }
    0
}

#[cfg(test)]
mod tests {
    use super::*;

    const LANES: [f64; 3] = [1.0, 1.0, 1.0];

    /// Triangle spanning a 3-lane cross-section along y = 0, lane 0 at x = 0.
    fn cross_section() -> [Point2; 3] {
        [
            Point2::new(0.0, 0.0),
            Point2::new(3.0, 0.0),
            Point2::new(0.0, 1.0),
        ]
    }

    #[test]
    fn walks_lane_widths_from_lower_lane() {
        let tri = cross_section();
        let lanes = [0, 2, 0];
        assert_eq!(classify_lane(&tri, lanes, &Point2::new(0.5, 0.3), &LANES), 0);
        assert_eq!(classify_lane(&tri, lanes, &Point2::new(1.5, 0.3), &LANES), 1);
        assert_eq!(classify_lane(&tri, lanes, &Point2::new(2.5, 0.1), &LANES), 2);
    }

    #[test]
    fn reversed_edge_starts_from_lower_lane() {
        let tri = [
            Point2::new(3.0, 0.0),
            Point2::new(0.0, 0.0),
            Point2::new(3.0, 1.0),
        ];
        let lanes = [2, 0, 2];
        assert_eq!(classify_lane(&tri, lanes, &Point2::new(0.5, 0.3), &LANES), 0);
        assert_eq!(classify_lane(&tri, lanes, &Point2::new(2.2, 0.3), &LANES), 2);
    }

    #[test]
    fn falls_back_to_second_edge_when_first_is_single_lane() {
        let tri = [
            Point2::new(0.0, 0.0),
            Point2::new(0.0, 1.0),
            Point2::new(3.0, 0.0),
        ];
        let lanes = [0, 0, 2];
        assert_eq!(classify_lane(&tri, lanes, &Point2::new(1.2, 0.2), &LANES), 1);
    }

    #[test]
    fn overshoot_falls_back_to_lane_zero() {
        let tri = cross_section();
        // Approximate by construction: the point projects past the last lane.
        assert_eq!(classify_lane(&tri, [0, 2, 0], &Point2::new(7.0, 0.0), &LANES), 0);
        assert_eq!(classify_lane(&tri, [0, 1, 0], &Point2::new(2.5, 0.0), &LANES), 0);
        let shifted = [
            Point2::new(1.0, 0.0),
            Point2::new(3.0, 0.0),
            Point2::new(1.0, 1.0),
        ];
        assert_eq!(classify_lane(&shifted, [1, 2, 1], &Point2::new(2.5, 0.0), &LANES), 2);
        assert_eq!(classify_lane(&shifted, [1, 2, 1], &Point2::new(4.5, 0.0), &LANES), 0);
    }

    #[test]
    fn lanes_beyond_configuration_fall_back_to_lane_zero() {
        let tri = cross_section();
        assert_eq!(classify_lane(&tri, [0, usize::MAX, 0], &Point2::new(1.5, 0.0), &LANES), 1);
        assert_eq!(classify_lane(&tri, [5, 7, 5], &Point2::new(1.5, 0.0), &LANES), 0);
    }
}
