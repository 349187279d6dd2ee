//! Axis-aligned 2D bounding boxes.

use serde::{Deserialize, Serialize};

use crate::Point2D;

/// 2D bounding box accumulated from heterogeneous point sources.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox2D {
    /// Minimum X coordinate.
    pub min_x: f64,
    /// Minimum Y coordinate.
    pub min_y: f64,
    /// Maximum X coordinate.
    pub max_x: f64,
    /// Maximum Y coordinate.
    pub max_y: f64,
}

impl BoundingBox2D {
    /// Create an empty (inverted) bounding box.
    pub fn empty() -> Self {
        Self {
            min_x: f64::INFINITY,
            min_y: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
            max_y: f64::NEG_INFINITY,
        }
    }

    /// Bounding box of an iterator of points.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point2D>) -> Self {
        let mut bbox = Self::empty();
        for p in points {
            bbox.include_point(p);
        }
        bbox
    }

    /// Expand to include a point.
    pub fn include_point(&mut self, p: &Point2D) {
        self.min_x = self.min_x.min(p.x);
        self.min_y = self.min_y.min(p.y);
        self.max_x = self.max_x.max(p.x);
        self.max_y = self.max_y.max(p.y);
    }

    /// Expand to include a circle's extent (center ± radius on both axes).
    pub fn include_circle(&mut self, center: &Point2D, radius: f64) {
        let r = radius.abs();
        self.include_point(&center.offset(-r, -r));
        self.include_point(&center.offset(r, r));
    }

    /// Expand to include another bounding box.
    pub fn include_box(&mut self, other: &BoundingBox2D) {
        if other.is_valid() {
            self.include_point(&Point2D::new(other.min_x, other.min_y));
            self.include_point(&Point2D::new(other.max_x, other.max_y));
        }
    }

    /// Width of the bounding box.
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Height of the bounding box.
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Center of the bounding box.
    pub fn center(&self) -> Point2D {
        Point2D::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    /// True once at least one point has been included.
    pub fn is_valid(&self) -> bool {
        self.min_x <= self.max_x && self.min_y <= self.max_y
    }

    /// This box if valid, otherwise a zero-size box at the origin.
    pub fn or_origin(self) -> Self {
        if self.is_valid() {
            self
        } else {
            Self {
                min_x: 0.0,
                min_y: 0.0,
                max_x: 0.0,
                max_y: 0.0,
            }
        }
    }
}

impl Default for BoundingBox2D {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_is_invalid() {
        let bbox = BoundingBox2D::empty();
        assert!(!bbox.is_valid());
        let fallback = bbox.or_origin();
        assert!(fallback.is_valid());
        assert_eq!(fallback.width(), 0.0);
    }

    #[test]
    fn test_mixed_sources() {
        let mut bbox = BoundingBox2D::from_points(&[Point2D::new(0.0, 0.0), Point2D::new(10.0, 0.0)]);
        bbox.include_circle(&Point2D::new(5.0, 5.0), 2.0);
        assert_eq!(bbox.min_x, 0.0);
        assert_eq!(bbox.max_x, 10.0);
        assert_eq!(bbox.min_y, 0.0);
        assert_eq!(bbox.max_y, 7.0);
        assert_eq!(bbox.center(), Point2D::new(5.0, 3.5));
    }

    #[test]
    fn test_include_box_ignores_empty() {
        let mut bbox = BoundingBox2D::from_points(&[Point2D::new(1.0, 1.0)]);
        bbox.include_box(&BoundingBox2D::empty());
        assert_eq!(bbox.width(), 0.0);
        bbox.include_box(&BoundingBox2D::from_points(&[Point2D::new(-1.0, 3.0)]));
        assert_eq!(bbox.width(), 2.0);
        assert_eq!(bbox.height(), 2.0);
    }
}
