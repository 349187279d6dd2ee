//! Point value types.

use serde::{Deserialize, Serialize};

use crate::Vec3;

/// A 2D point used by DXF entities, SVG paths and extrusion rings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point2D {
    /// X coordinate.
    pub x: f64,
    /// Y coordinate.
    pub y: f64,
}

impl Point2D {
    /// Create a new 2D point.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Origin point (0, 0).
    pub const ORIGIN: Self = Self { x: 0.0, y: 0.0 };

    /// Distance to another point.
    pub fn distance(&self, other: &Self) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    /// Point offset by `(dx, dy)`.
    pub fn offset(&self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// Linear interpolation toward `other` by `t`.
    pub fn lerp(&self, other: &Self, t: f64) -> Self {
        Self::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
        )
    }

    /// Lift into 3D at height `z`.
    pub fn with_z(&self, z: f64) -> Point3D {
        Point3D::new(self.x, self.y, z)
    }
}

impl Default for Point2D {
    fn default() -> Self {
        Self::ORIGIN
    }
}

/// A 3D point, also used for unit normals in STL meshes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point3D {
    /// X coordinate.
    pub x: f64,
    /// Y coordinate.
    pub y: f64,
    /// Z coordinate.
    pub z: f64,
}

impl Point3D {
    /// Create a new 3D point.
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Origin point (0, 0, 0), also the zero normal.
    pub const ORIGIN: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    /// As an nalgebra vector.
    pub fn to_vec(&self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }

    /// Euclidean length when treated as a vector.
    pub fn length(&self) -> f64 {
        self.to_vec().norm()
    }
}

impl Default for Point3D {
    fn default() -> Self {
        Self::ORIGIN
    }
}

impl From<Vec3> for Point3D {
    fn from(v: Vec3) -> Self {
        Self::new(v.x, v.y, v.z)
    }
}

impl From<Point3D> for Vec3 {
    fn from(p: Point3D) -> Self {
        p.to_vec()
    }
}

/// Unit normal of triangle `(a, b, c)` from the cross product of its edges.
///
/// Counter-clockwise winding points the normal toward the viewer. A
/// degenerate (zero-area) triangle yields the zero vector.
pub fn triangle_normal(a: &Point3D, b: &Point3D, c: &Point3D) -> Point3D {
    let e1 = b.to_vec() - a.to_vec();
    let e2 = c.to_vec() - a.to_vec();
    let n = e1.cross(&e2);
    let len = n.norm();
    if len > 0.0 {
        Point3D::from(n / len)
    } else {
        Point3D::ORIGIN
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_distance_and_lerp() {
        let a = Point2D::new(0.0, 0.0);
        let b = Point2D::new(3.0, 4.0);
        assert_relative_eq!(a.distance(&b), 5.0);
        assert_eq!(a.lerp(&b, 0.5), Point2D::new(1.5, 2.0));
    }

    #[test]
    fn test_normal_ccw_xy_triangle() {
        let n = triangle_normal(
            &Point3D::new(0.0, 0.0, 0.0),
            &Point3D::new(1.0, 0.0, 0.0),
            &Point3D::new(0.0, 1.0, 0.0),
        );
        assert_relative_eq!(n.z, 1.0);
        assert_relative_eq!(n.length(), 1.0);
    }

    #[test]
    fn test_normal_is_unit_for_large_triangle() {
        let n = triangle_normal(
            &Point3D::new(0.0, 0.0, 0.0),
            &Point3D::new(0.0, 100.0, 0.0),
            &Point3D::new(0.0, 0.0, 50.0),
        );
        assert_relative_eq!(n.x, 1.0);
        assert_relative_eq!(n.length(), 1.0);
    }

    #[test]
    fn test_degenerate_normal_is_zero() {
        let p = Point3D::new(1.0, 1.0, 1.0);
        let n = triangle_normal(&p, &Point3D::new(2.0, 2.0, 2.0), &Point3D::new(3.0, 3.0, 3.0));
        assert_eq!(n, Point3D::ORIGIN);
        assert_eq!(triangle_normal(&p, &p, &p), Point3D::ORIGIN);
    }
}
