use crate::math::intersect_2d::segment_segment_intersect_2d;
use crate::math::{direction, left_normal, Point2, Vector2};

/// A bounded line segment between two points.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LineSegment {
    pub a: Point2,
    pub b: Point2,
}

impl LineSegment {
    /// Creates a new segment from `a` to `b`.
    #[must_use]
    pub fn new(a: Point2, b: Point2) -> Self {
        Self { a, b }
    }

    /// Unit direction from `a` to `b`, or `None` if the segment is degenerate.
    #[must_use]
    pub fn direction(&self) -> Option<Vector2> {
        direction(&self.a, &self.b)
    }

    /// Counter-clockwise unit normal, or `None` if the segment is degenerate.
    #[must_use]
    pub fn normal(&self) -> Option<Vector2> {
        self.direction().map(|d| left_normal(&d))
    }

    /// Returns the segment translated by `offset`.
    #[must_use]
    pub fn offset(&self, offset: &Vector2) -> Self {
        Self {
            a: self.a + offset,
            b: self.b + offset,
        }
    }

    /// Bounded intersection with another segment.
    #[must_use]
    pub fn intersection(&self, other: &LineSegment) -> Option<Point2> {
        segment_segment_intersect_2d(&self.a, &self.b, &other.a, &other.b).map(|(p, _, _)| p)
    }
}

/// One ribbon segment: a centre line plus its two parallel offset edges.
///
/// `edge1` lies on the left of the centre line (along the counter-clockwise
/// normal), `edge2` on the right.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PolySegment {
    pub center: LineSegment,
    pub edge1: LineSegment,
    pub edge2: LineSegment,
}

impl PolySegment {
    /// Builds the ribbon segment from `a` to `b` with the given half thickness.
    ///
    /// Returns `None` for a zero-length centre line.
    #[must_use]
    pub fn new(a: Point2, b: Point2, half_thickness: f64) -> Option<Self> {
        let center = LineSegment::new(a, b);
        let normal = center.normal()?;
        let offset = normal * half_thickness;
        Some(Self {
            center,
            edge1: center.offset(&offset),
            edge2: center.offset(&-offset),
        })
    }

    /// Unit direction of the centre line.
    #[must_use]
    pub fn direction(&self) -> Option<Vector2> {
        self.center.direction()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn poly_segment_edges_are_offset_by_half_thickness() {
        let seg = PolySegment::new(Point2::new(0.0, 0.0), Point2::new(2.0, 0.0), 0.5).unwrap();
        assert_abs_diff_eq!(seg.edge1.a.y, 0.5);
        assert_abs_diff_eq!(seg.edge1.b.x, 2.0);
        assert_abs_diff_eq!(seg.edge2.a.y, -0.5);
        assert_abs_diff_eq!(seg.edge2.b.y, -0.5);
    }

    #[test]
    fn poly_segment_degenerate_is_none() {
        let p = Point2::new(1.0, 1.0);
        assert!(PolySegment::new(p, p, 1.0).is_none());
    }

    #[test]
    fn segment_intersection() {
        let s1 = LineSegment::new(Point2::new(0.0, -1.0), Point2::new(0.0, 1.0));
        let s2 = LineSegment::new(Point2::new(-1.0, 0.0), Point2::new(1.0, 0.0));
        let p = s1.intersection(&s2).unwrap();
        assert_abs_diff_eq!(p.x, 0.0);
        assert_abs_diff_eq!(p.y, 0.0);
    }

    #[test]
    fn normal_is_left_of_direction() {
        let s = LineSegment::new(Point2::new(0.0, 0.0), Point2::new(0.0, 3.0));
        let n = s.normal().unwrap();
        assert_abs_diff_eq!(n.x, -1.0);
        assert_abs_diff_eq!(n.y, 0.0);
    }
}
