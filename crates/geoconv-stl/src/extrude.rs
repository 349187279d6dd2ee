//! Linear extrusion of a 2D ring into a closed prism.

use geoconv_math::Point2D;

use crate::Triangle;

/// Extrude a ring of points from `z = 0` to `z = depth`.
///
/// The ring is implicitly closed; a repeated first point at the end is
/// dropped. Produces a fan-triangulated face at `z = 0`, a reversed fan at
/// `z = depth`, and two triangles per edge for the side walls, so an
/// `N`-point ring yields `(N-2) + (N-2) + 2N` triangles. Rings with fewer
/// than three distinct points yield nothing.
///
/// Fan triangulation is only correct for convex rings (and star-shaped
/// rings around the first point). Every normal comes from the winding, so
/// degenerate triangles carry a zero normal. Faces point outward for rings
/// that are clockwise in a Y-up frame, which is counter-clockwise as drawn
/// on a Y-down SVG canvas.
pub fn extrude(ring: &[Point2D], depth: f64) -> Vec<Triangle> {
    let mut points = ring;
    if points.len() > 1 && points.first() == points.last() {
        points = &points[..points.len() - 1];
    }
    let n = points.len();
    if n < 3 {
        return Vec::new();
    }

    let top: Vec<_> = points.iter().map(|p| p.with_z(0.0)).collect();
    let bottom: Vec<_> = points.iter().map(|p| p.with_z(depth)).collect();

    let mut triangles = Vec::with_capacity(4 * n - 4);
    for i in 1..n - 1 {
        triangles.push(Triangle::new(top[0], top[i], top[i + 1]));
    }
    for i in 1..n - 1 {
        triangles.push(Triangle::new(bottom[0], bottom[i + 1], bottom[i]));
    }
    for i in 0..n {
        let j = (i + 1) % n;
        triangles.push(Triangle::new(top[i], bottom[i], top[j]));
        triangles.push(Triangle::new(top[j], bottom[i], bottom[j]));
    }
    triangles
}
