//! Triangle soup mesh.

use std::fmt;
use std::str::FromStr;

use geoconv_math::{triangle_normal, Point3D};
use serde::{Deserialize, Serialize};

/// A facet: three vertices and a normal.
///
/// The normal is unit length, or zero for a degenerate triangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Triangle {
    /// Vertices in winding order.
    pub vertices: [Point3D; 3],
    /// Facet normal.
    pub normal: Point3D,
}

impl Triangle {
    /// Triangle with its normal computed from the winding.
    pub fn new(a: Point3D, b: Point3D, c: Point3D) -> Self {
        Self {
            vertices: [a, b, c],
            normal: triangle_normal(&a, &b, &c),
        }
    }

    /// Triangle with an explicit (stored) normal.
    pub fn with_normal(vertices: [Point3D; 3], normal: Point3D) -> Self {
        Self { vertices, normal }
    }

    /// Mean Z of the three vertices.
    pub fn average_z(&self) -> f64 {
        self.vertices.iter().map(|v| v.z).sum::<f64>() / 3.0
    }
}

/// A named list of triangles, without shared-vertex indexing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Mesh {
    /// Solid name (ASCII `solid NAME`), may be empty.
    pub name: String,
    /// Facets in file order.
    pub triangles: Vec<Triangle>,
}

impl Mesh {
    /// Create a mesh.
    pub fn new(name: impl Into<String>, triangles: Vec<Triangle>) -> Self {
        Self {
            name: name.into(),
            triangles,
        }
    }

    /// Number of triangles.
    pub fn len(&self) -> usize {
        self.triangles.len()
    }

    /// True when the mesh has no triangles.
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Axis-aligned bounds as `(min, max)`, `None` when empty.
    pub fn bounds(&self) -> Option<(Point3D, Point3D)> {
        let mut iter = self.triangles.iter().flat_map(|t| t.vertices.iter());
        let first = *iter.next()?;
        Some(iter.fold((first, first), |(lo, hi), v| {
            (
                Point3D::new(lo.x.min(v.x), lo.y.min(v.y), lo.z.min(v.z)),
                Point3D::new(hi.x.max(v.x), hi.y.max(v.y), hi.z.max(v.z)),
            )
        }))
    }
}

/// STL file encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StlEncoding {
    /// Text `solid ... endsolid`.
    Ascii,
    /// 80-byte header, count, 50-byte records.
    #[default]
    Binary,
}

impl StlEncoding {
    /// Lowercase name.
    pub fn name(&self) -> &'static str {
        match self {
            StlEncoding::Ascii => "ascii",
            StlEncoding::Binary => "binary",
        }
    }
}

impl fmt::Display for StlEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StlEncoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ascii" => Ok(StlEncoding::Ascii),
            "binary" => Ok(StlEncoding::Binary),
            _ => Err(format!("unknown STL encoding '{}', expected ascii or binary", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_triangle_normal_from_winding() {
        let t = Triangle::new(
            Point3D::new(0.0, 0.0, 0.0),
            Point3D::new(1.0, 0.0, 0.0),
            Point3D::new(0.0, 1.0, 0.0),
        );
        assert_eq!(t.normal, Point3D::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn test_degenerate_normal_is_zero() {
        let t = Triangle::new(
            Point3D::new(0.0, 0.0, 0.0),
            Point3D::new(1.0, 1.0, 1.0),
            Point3D::new(2.0, 2.0, 2.0),
        );
        assert_eq!(t.normal, Point3D::ORIGIN);
    }

    #[test]
    fn test_bounds() {
        assert!(Mesh::default().bounds().is_none());
        let mesh = Mesh::new(
            "t",
            vec![Triangle::new(
                Point3D::new(-1.0, 0.0, 2.0),
                Point3D::new(3.0, 4.0, 0.0),
                Point3D::new(0.0, -2.0, 1.0),
            )],
        );
        let (lo, hi) = mesh.bounds().unwrap();
        assert_eq!(lo, Point3D::new(-1.0, -2.0, 0.0));
        assert_eq!(hi, Point3D::new(3.0, 4.0, 2.0));
    }

    #[test]
    fn test_encoding_from_str() {
        assert_eq!("ASCII".parse::<StlEncoding>().unwrap(), StlEncoding::Ascii);
        assert!("obj".parse::<StlEncoding>().is_err());
    }
}
