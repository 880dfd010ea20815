use super::{cross, Point2, Vector2, TOLERANCE};

/// Turn direction of an ordered point triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Collinear,
    Clockwise,
    CounterClockwise,
}

/// Parametric 2D line-line intersection.
///
/// Given lines `p1 + t * d1` and `p2 + u * d2`, returns `(t, u)` if not parallel.
#[must_use]
pub fn line_line_intersect_2d(
    p1: &Point2,
    d1: &Vector2,
    p2: &Point2,
    d2: &Vector2,
) -> Option<(f64, f64)> {
    let denom = cross(d1, d2);
    if denom.abs() < TOLERANCE {
        return None;
    }
    let dp = p2 - p1;
    let t = cross(&dp, d2) / denom;
    let u = cross(&dp, d1) / denom;
    Some((t, u))
}

/// Bounded segment-segment intersection in 2D.
///
/// Returns `(intersection_point, t, u)` where `t` and `u` are in `[0, 1]`.
#[must_use]
pub fn segment_segment_intersect_2d(
    a0: &Point2,
    a1: &Point2,
    b0: &Point2,
    b1: &Point2,
) -> Option<(Point2, f64, f64)> {
    let da = a1 - a0;
    let db = b1 - b0;
    let (t, u) = line_line_intersect_2d(a0, &da, b0, &db)?;

    // Use a small epsilon to include endpoints.
    let eps = TOLERANCE;
    if t >= -eps && t <= 1.0 + eps && u >= -eps && u <= 1.0 + eps {
        let t_clamped = t.clamp(0.0, 1.0);
        Some((a0 + da * t_clamped, t_clamped, u.clamp(0.0, 1.0)))
    } else {
        None
    }
}

/// Classifies the turn `p -> q -> r`.
#[must_use]
pub fn orientation(p: &Point2, q: &Point2, r: &Point2) -> Orientation {
    let val = (q.y - p.y) * (r.x - q.x) - (q.x - p.x) * (r.y - q.y);
    if val.abs() < TOLERANCE {
        Orientation::Collinear
    } else if val > 0.0 {
        Orientation::Clockwise
    } else {
        Orientation::CounterClockwise
    }
}

/// Returns `true` if `q` lies within the bounding box of segment `p`-`r`.
fn within_bounds(p: &Point2, q: &Point2, r: &Point2) -> bool {
    q.x <= p.x.max(r.x) && q.x >= p.x.min(r.x) && q.y <= p.y.max(r.y) && q.y >= p.y.min(r.y)
}

/// Returns `true` if the closed segments `p1`-`q1` and `p2`-`q2` share a point.
#[must_use]
pub fn segments_intersect(p1: &Point2, q1: &Point2, p2: &Point2, q2: &Point2) -> bool {
    let o1 = orientation(p1, q1, p2);
    let o2 = orientation(p1, q1, q2);
    let o3 = orientation(p2, q2, p1);
    let o4 = orientation(p2, q2, q1);

    if o1 != o2 && o3 != o4 {
        return true;
    }
    (o1 == Orientation::Collinear && within_bounds(p1, p2, q1))
        || (o2 == Orientation::Collinear && within_bounds(p1, q2, q1))
        || (o3 == Orientation::Collinear && within_bounds(p2, p1, q2))
        || (o4 == Orientation::Collinear && within_bounds(p2, q1, q2))
}

/// Returns `true` if `p` lies inside or on the boundary of the quadrilateral
/// `corners` (given in perimeter order).
#[must_use]
pub fn box_contains(corners: &[Point2; 4], p: &Point2) -> bool {
    let mut inside = false;
    for i in 0..4 {
        let a = &corners[i];
        let b = &corners[(i + 1) % 4];
        if orientation(a, b, p) == Orientation::Collinear && within_bounds(a, p, b) {
            return true;
        }
        // Even-odd crossing test against a horizontal ray towards +X.
        if (a.y > p.y) != (b.y > p.y) {
            let x_cross = a.x + (p.y - a.y) * (b.x - a.x) / (b.y - a.y);
            if p.x < x_cross {
                inside = !inside;
            }
        }
    }
    inside
}

/// Returns `true` if two quadrilaterals overlap (touching counts).
#[must_use]
pub fn boxes_overlap(a: &[Point2; 4], b: &[Point2; 4]) -> bool {
    if a.iter().any(|p| box_contains(b, p)) || b.iter().any(|p| box_contains(a, p)) {
        return true;
    }
    (0..4).any(|i| {
        (0..4).any(|j| segments_intersect(&a[i], &a[(i + 1) % 4], &b[j], &b[(j + 1) % 4]))
    })
}
