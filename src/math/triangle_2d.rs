use super::{cross, Point2, TOLERANCE};

/// Returns `true` if `p` lies strictly inside triangle `(a, b, c)`.
///
/// Points on an edge or vertex are outside. Works for either winding.
#[must_use]
pub fn triangle_contains(a: &Point2, b: &Point2, c: &Point2, p: &Point2) -> bool {
    let det = cross(&(b - a), &(c - a));
    if det.abs() < TOLERANCE {
        return false;
    }
    let d1 = cross(&(b - a), &(p - a));
    let d2 = cross(&(c - b), &(p - b));
    let d3 = cross(&(a - c), &(p - c));
    det * d1 > 0.0 && det * d2 > 0.0 && det * d3 > 0.0
}

/// Orthogonal projection of `p` onto the infinite line through `v1` and `v2`.
///
/// Returns `v1` when the line is degenerate.
#[must_use]
pub fn project_onto_line(v1: &Point2, v2: &Point2, p: &Point2) -> Point2 {
    let e = v2 - v1;
    let len_sq = e.norm_squared();
    if len_sq < TOLERANCE {
        return *v1;
    }
    let t = (p - v1).dot(&e) / len_sq;
    v1 + e * t
}
