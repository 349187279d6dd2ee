//! Bezier helpers for path conversion.

use crate::Point2D;

/// Elevate a quadratic Bezier `(p0, p1, p2)` to cubic control points.
///
/// Returns `(cp1, cp2)` with `cp1 = p0 + 2/3 (p1 - p0)` and
/// `cp2 = p2 + 2/3 (p1 - p2)`; the end points are unchanged.
pub fn elevate_quadratic(p0: &Point2D, p1: &Point2D, p2: &Point2D) -> (Point2D, Point2D) {
    (p0.lerp(p1, 2.0 / 3.0), p2.lerp(p1, 2.0 / 3.0))
}

/// Point on the cubic Bezier `(p0, c1, c2, p3)` at parameter `t`.
pub fn cubic_point(p0: &Point2D, c1: &Point2D, c2: &Point2D, p3: &Point2D, t: f64) -> Point2D {
    let u = 1.0 - t;
    let a = u * u * u;
    let b = 3.0 * u * u * t;
    let c = 3.0 * u * t * t;
    let d = t * t * t;
    Point2D::new(
        a * p0.x + b * c1.x + c * c2.x + d * p3.x,
        a * p0.y + b * c1.y + c * c2.y + d * p3.y,
    )
}
