//! Orthographic and axonometric projection of 3D points onto the SVG plane.

use std::f64::consts::FRAC_PI_6;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Point2D, Point3D};

/// Projection used when drawing a mesh in 2D.
///
/// Every view flips the vertical axis so that "up" in model space is
/// "up" on an SVG canvas whose Y axis points down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum View {
    /// Looking along Z: `(x, -y)`.
    #[default]
    Front,
    /// Looking down Y: `(x, -z)`.
    Top,
    /// Looking along X: `(z, -y)`.
    Side,
    /// Fixed 30° axonometric.
    Isometric,
}

impl View {
    /// All views.
    pub const ALL: [View; 4] = [View::Front, View::Top, View::Side, View::Isometric];

    /// Lowercase name.
    pub fn name(&self) -> &'static str {
        match self {
            View::Front => "front",
            View::Top => "top",
            View::Side => "side",
            View::Isometric => "isometric",
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for View {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        View::ALL
            .into_iter()
            .find(|v| v.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown view '{}', expected front, top, side or isometric", s))
    }
}

/// Project a 3D point onto the 2D plane of `view`.
pub fn project(p: &Point3D, view: View) -> Point2D {
    match view {
        View::Front => Point2D::new(p.x, -p.y),
        View::Top => Point2D::new(p.x, -p.z),
        View::Side => Point2D::new(p.z, -p.y),
        View::Isometric => {
            let (sin, cos) = FRAC_PI_6.sin_cos();
            Point2D::new((p.x - p.z) * cos, -p.y + (p.x + p.z) * sin * 0.5)
        }
    }
}
