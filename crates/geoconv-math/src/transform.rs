//! Linear transforms applied to mesh vertices before projection.

use nalgebra::Matrix3;

use crate::{Point3D, Vec3};

/// A 3x3 linear transform (rotation and scale, no translation).
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    /// The underlying 3x3 matrix.
    pub matrix: Matrix3<f64>,
}

impl Transform {
    /// Identity transform.
    pub fn identity() -> Self {
        Self {
            matrix: Matrix3::identity(),
        }
    }

    /// Non-uniform scale by `(sx, sy, sz)`.
    pub fn scale(sx: f64, sy: f64, sz: f64) -> Self {
        Self {
            matrix: Matrix3::new(sx, 0.0, 0.0, 0.0, sy, 0.0, 0.0, 0.0, sz),
        }
    }

    /// Rotation about the X axis by `angle` radians.
    pub fn rotation_x(angle: f64) -> Self {
        let (s, c) = angle.sin_cos();
        Self {
            matrix: Matrix3::new(1.0, 0.0, 0.0, 0.0, c, -s, 0.0, s, c),
        }
    }

    /// Rotation about the Y axis by `angle` radians.
    pub fn rotation_y(angle: f64) -> Self {
        let (s, c) = angle.sin_cos();
        Self {
            matrix: Matrix3::new(c, 0.0, s, 0.0, 1.0, 0.0, -s, 0.0, c),
        }
    }

    /// Rotation about the Z axis by `angle` radians.
    pub fn rotation_z(angle: f64) -> Self {
        let (s, c) = angle.sin_cos();
        Self {
            matrix: Matrix3::new(c, -s, 0.0, s, c, 0.0, 0.0, 0.0, 1.0),
        }
    }

    /// Euler rotation in degrees applied about X first, then Y, then Z.
    pub fn euler_degrees(x: f64, y: f64, z: f64) -> Self {
        Self::rotation_z(z.to_radians())
            .then(&Self::rotation_y(y.to_radians()))
            .then(&Self::rotation_x(x.to_radians()))
    }

    /// Compose: `self` then `other` (self * other), so `other` applies first.
    pub fn then(&self, other: &Transform) -> Self {
        Self {
            matrix: self.matrix * other.matrix,
        }
    }

    /// True when this is the identity.
    pub fn is_identity(&self) -> bool {
        self.matrix == Matrix3::identity()
    }

    /// Transform a point.
    pub fn apply_point(&self, p: &Point3D) -> Point3D {
        Point3D::from(self.matrix * p.to_vec())
    }

    /// Transform a normal vector (inverse transpose, identical to
    /// `apply_point` for pure rotations).
    pub fn apply_normal(&self, n: &Point3D) -> Point3D {
        let v: Vec3 = match self.matrix.try_inverse() {
            Some(inv) => inv.transpose() * n.to_vec(),
            None => n.to_vec(),
        };
        Point3D::from(v)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_identity() {
        let p = Point3D::new(1.0, 2.0, 3.0);
        assert_eq!(Transform::identity().apply_point(&p), p);
        assert!(Transform::euler_degrees(0.0, 0.0, 0.0).is_identity());
    }

    #[test]
    fn test_rotation_z_90() {
        let q = Transform::rotation_z(FRAC_PI_2).apply_point(&Point3D::new(1.0, 0.0, 0.0));
        assert_relative_eq!(q.x, 0.0, epsilon = 1e-12);
        assert_relative_eq!(q.y, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_euler_order_x_then_y() {
        // X 90 maps +Y to +Z, then Y 90 maps +Z to +X.
        let t = Transform::euler_degrees(90.0, 90.0, 0.0);
        let q = t.apply_point(&Point3D::new(0.0, 1.0, 0.0));
        assert_relative_eq!(q.x, 1.0, epsilon = 1e-12);
        assert_relative_eq!(q.y, 0.0, epsilon = 1e-12);
        assert_relative_eq!(q.z, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_normal_under_scale_stays_perpendicular() {
        let t = Transform::scale(2.0, 1.0, 1.0);
        let n = t.apply_normal(&Point3D::new(1.0, 1.0, 0.0));
        let tangent = t.apply_point(&Point3D::new(1.0, -1.0, 0.0));
        assert_relative_eq!(n.to_vec().dot(&tangent.to_vec()), 0.0, epsilon = 1e-12);
    }
}
