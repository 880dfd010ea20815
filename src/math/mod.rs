pub mod intersect_2d;
pub mod triangle_2d;

/// 2D point type.
pub type Point2 = nalgebra::Point2<f64>;

/// 2D vector type.
pub type Vector2 = nalgebra::Vector2<f64>;

/// Absolute floor for floating-point comparisons.
pub const TOLERANCE: f64 = 1e-10;

/// Relative tolerance used by [`float_eq`].
pub const RELATIVE_TOLERANCE: f64 = 1e-5;

/// Returns `true` if `val` equals `c` within a relative tolerance.
#[must_use]
pub fn float_eq(val: f64, c: f64) -> bool {
    let scale = val.abs().min(c.abs());
    (val - c).abs() <= (RELATIVE_TOLERANCE * scale).max(TOLERANCE)
}

/// Returns `true` if both coordinates of `a` and `b` are [`float_eq`].
#[must_use]
pub fn vec2_eq(a: &Point2, b: &Point2) -> bool {
    float_eq(a.x, b.x) && float_eq(a.y, b.y)
}

/// Returns the unit direction from `a` to `b`, or `None` for coincident points.
#[must_use]
pub fn direction(a: &Point2, b: &Point2) -> Option<Vector2> {
    let d = b - a;
    let len = d.norm();
    if len < TOLERANCE {
        None
    } else {
        Some(d / len)
    }
}

/// Returns the counter-clockwise (left) normal of a direction vector.
#[must_use]
pub fn left_normal(dir: &Vector2) -> Vector2 {
    Vector2::new(-dir.y, dir.x)
}

/// 2D cross product (z component of the 3D cross product).
#[must_use]
pub fn cross(a: &Vector2, b: &Vector2) -> f64 {
    a.x * b.y - a.y * b.x
}

/// Unsigned angle between two vectors in radians, `0` for degenerate input.
#[must_use]
pub fn angle_between(a: &Vector2, b: &Vector2) -> f64 {
    let denom = a.norm() * b.norm();
    if denom < TOLERANCE {
        return 0.0;
    }
    (a.dot(b) / denom).clamp(-1.0, 1.0).acos()
}
