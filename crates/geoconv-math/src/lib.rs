#![warn(missing_docs)]

//! Geometry utilities shared by the geoconv format crates.
//!
//! Plain value types ([`Point2D`], [`Point3D`], [`BoundingBox2D`]) backed by
//! nalgebra for the vector algebra, plus the pure helpers every converter
//! leans on: cross-product normals, Euler rotations, view projections and
//! Bezier degree elevation.

mod bbox;
mod bezier;
mod point;
mod projection;
mod transform;

pub use bbox::BoundingBox2D;
pub use bezier::{cubic_point, elevate_quadratic};
pub use point::{triangle_normal, Point2D, Point3D};
pub use projection::{project, View};
pub use transform::Transform;

/// A vector in 3D space.
pub type Vec3 = nalgebra::Vector3<f64>;

/// A vector in 2D space.
pub type Vec2 = nalgebra::Vector2<f64>;
