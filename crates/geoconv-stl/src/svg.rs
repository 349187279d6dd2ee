//! Mesh projection to SVG.

use std::fmt::Write;

use geoconv_core::fmt::num;
use geoconv_core::{ConvertError, Result};
use geoconv_math::{project, BoundingBox2D, Point2D, Transform, View};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{Mesh, Triangle};

/// Euler rotation in degrees, applied X first, then Y, then Z.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rotation {
    /// About X.
    pub x: f64,
    /// About Y.
    pub y: f64,
    /// About Z.
    pub z: f64,
}

impl Rotation {
    fn transform(&self) -> Transform {
        Transform::euler_degrees(self.x, self.y, self.z)
    }
}

/// Options for STL→SVG projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StlSvgOptions {
    /// Projection view.
    pub view: View,
    /// Fixed scale; `None` fits the drawing into `fit_size`.
    pub scale: Option<f64>,
    /// Stroke facet edges.
    pub wireframe: bool,
    /// Fill facets with normal-based gray shading.
    pub fill: bool,
    /// Stroke width in model units.
    pub stroke_width: f64,
    /// Rotation applied before projection.
    pub rotation: Rotation,
    /// Target box size for automatic scaling.
    pub fit_size: f64,
}

impl Default for StlSvgOptions {
    fn default() -> Self {
        Self {
            view: View::Front,
            scale: None,
            wireframe: true,
            fill: false,
            stroke_width: 1.0,
            rotation: Rotation::default(),
            fit_size: 500.0,
        }
    }
}

impl StlSvgOptions {
    /// Reject non-positive sizes.
    pub fn validate(&self) -> Result<()> {
        if let Some(scale) = self.scale {
            if !(scale.is_finite() && scale > 0.0) {
                return Err(ConvertError::invalid_options(format!(
                    "scale must be positive, got {}",
                    scale
                )));
            }
        }
        if !(self.fit_size.is_finite() && self.fit_size > 0.0) {
            return Err(ConvertError::invalid_options(format!(
                "fit_size must be positive, got {}",
                self.fit_size
            )));
        }
        if !(self.stroke_width.is_finite() && self.stroke_width >= 0.0) {
            return Err(ConvertError::invalid_options(format!(
                "stroke_width must be non-negative, got {}",
                self.stroke_width
            )));
        }
        Ok(())
    }
}

/// A rendered projection.
#[derive(Debug, Clone, PartialEq)]
pub struct StlSvgRender {
    /// SVG text.
    pub svg: String,
    /// Output width.
    pub width: f64,
    /// Output height.
    pub height: f64,
    /// Number of faces drawn.
    pub face_count: usize,
}

struct Face {
    points: [Point2D; 3],
    depth: f64,
    normal_z: f64,
}

fn auto_scale(bbox: &BoundingBox2D, fit: f64) -> f64 {
    let (w, h) = (bbox.width(), bbox.height());
    match (w > 0.0, h > 0.0) {
        (true, true) => (fit / w).min(fit / h),
        (true, false) => fit / w,
        (false, true) => fit / h,
        (false, false) => 1.0,
    }
}

fn shade(normal_z: f64) -> u8 {
    let brightness = ((normal_z + 1.0) / 2.0).clamp(0.3, 1.0);
    (brightness * 255.0).floor() as u8
}

/// Project a mesh onto a 2D view and render it as SVG.
///
/// Each facet becomes one closed `<path>`. The isometric view draws faces
/// back to front by mean Z (painter's algorithm without occlusion tests,
/// so interpenetrating faces may draw in the wrong order). Fails with
/// `STL_NO_FACES` on an empty mesh.
pub fn render_svg(mesh: &Mesh, options: &StlSvgOptions) -> Result<StlSvgRender> {
    options.validate()?;
    if mesh.is_empty() {
        return Err(ConvertError::conversion(
            "STL_NO_FACES",
            "No faces found in STL file",
        ));
    }

    let rotation = options.rotation.transform();
    let rotate = !rotation.is_identity();
    let oriented = |t: &Triangle| -> Triangle {
        if rotate {
            Triangle::with_normal(
                t.vertices.map(|v| rotation.apply_point(&v)),
                rotation.apply_normal(&t.normal),
            )
        } else {
            *t
        }
    };

    let mut faces: Vec<Face> = mesh
        .triangles
        .iter()
        .map(|t| {
            let t = oriented(t);
            Face {
                points: t.vertices.map(|v| project(&v, options.view)),
                depth: t.average_z(),
                normal_z: t.normal.z,
            }
        })
        .collect();

    let bbox = BoundingBox2D::from_points(faces.iter().flat_map(|f| f.points.iter()));
    let scale = options
        .scale
        .unwrap_or_else(|| auto_scale(&bbox, options.fit_size));
    let width = bbox.width() * scale;
    let height = bbox.height() * scale;

    if options.view == View::Isometric {
        faces.sort_by(|a, b| a.depth.total_cmp(&b.depth));
    }

    let mut svg = String::new();
    writeln!(svg, r#"<?xml version="1.0" encoding="UTF-8"?>"#)?;
    writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
        w = num(width),
        h = num(height)
    )?;
    writeln!(
        svg,
        r#"  <g transform="translate({}, {}) scale({})">"#,
        num(-bbox.min_x * scale),
        num(-bbox.min_y * scale),
        num(scale)
    )?;

    for face in &faces {
        let [a, b, c] = &face.points;
        write!(
            svg,
            r#"    <path d="M {} {} L {} {} L {} {} Z" "#,
            num(a.x),
            num(a.y),
            num(b.x),
            num(b.y),
            num(c.x),
            num(c.y)
        )?;
        if options.fill {
            let gray = shade(face.normal_z);
            write!(svg, r#"fill="rgb({g}, {g}, {g})" "#, g = gray)?;
        } else {
            svg.push_str(r#"fill="none" "#);
        }
        if options.wireframe {
            write!(
                svg,
                r##"stroke="#000000" stroke-width="{}" "##,
                num(options.stroke_width)
            )?;
        }
        svg.push_str("/>\n");
    }

    svg.push_str("  </g>\n</svg>\n");
    debug!(faces = faces.len(), view = %options.view, scale, "projected STL mesh");

    Ok(StlSvgRender {
        svg,
        width,
        height,
        face_count: faces.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extrude;
    use geoconv_math::Point3D;

    fn unit_triangle() -> Mesh {
        Mesh::new(
            "t",
            vec![Triangle::new(
                Point3D::new(0.0, 0.0, 0.0),
                Point3D::new(1.0, 0.0, 0.0),
                Point3D::new(0.0, 1.0, 0.0),
            )],
        )
    }

    #[test]
    fn test_front_view_auto_scale() {
        let out = render_svg(&unit_triangle(), &StlSvgOptions::default()).unwrap();
        assert_eq!((out.width, out.height), (500.0, 500.0));
        assert!(out.svg.contains(r#"viewBox="0 0 500 500""#));
        // Front view flips y, so the bbox min is at y = -1.
        assert!(out.svg.contains(r#"translate(0, 500) scale(500)"#));
        assert!(out
            .svg
            .contains(r##"d="M 0 0 L 1 0 L 0 -1 Z" fill="none" stroke="#000000""##));
    }

    #[test]
    fn test_fixed_scale() {
        let opts = StlSvgOptions {
            scale: Some(10.0),
            ..Default::default()
        };
        let out = render_svg(&unit_triangle(), &opts).unwrap();
        assert_eq!((out.width, out.height), (10.0, 10.0));
    }

    #[test]
    fn test_flat_projection_does_not_divide_by_zero() {
        let opts = StlSvgOptions {
            view: View::Top,
            ..Default::default()
        };
        let out = render_svg(&unit_triangle(), &opts).unwrap();
        assert_eq!(out.width, 500.0);
        assert_eq!(out.height, 0.0);
        assert!(!out.svg.contains("inf"));
        assert!(!out.svg.contains("NaN"));
    }

    #[test]
    fn test_fill_shading() {
        let opts = StlSvgOptions {
            fill: true,
            wireframe: false,
            ..Default::default()
        };
        let out = render_svg(&unit_triangle(), &opts).unwrap();
        assert!(out.svg.contains(r#"fill="rgb(255, 255, 255)""#));
        assert!(!out.svg.contains("stroke="));
        assert_eq!(shade(-1.0), 76);
    }

    #[test]
    fn test_isometric_faces_cover_extruded_box() {
        let square = [
            geoconv_math::Point2D::new(0.0, 0.0),
            geoconv_math::Point2D::new(1.0, 0.0),
            geoconv_math::Point2D::new(1.0, 1.0),
            geoconv_math::Point2D::new(0.0, 1.0),
        ];
        let mesh = Mesh::new("box", extrude(&square, 2.0));
        let opts = StlSvgOptions {
            view: View::Isometric,
            ..Default::default()
        };
        let out = render_svg(&mesh, &opts).unwrap();
        assert_eq!(out.face_count, 12);
        assert_eq!(out.svg.matches("<path").count(), 12);
    }

    fn near_and_far() -> Mesh {
        // Near face points at +Z (bright), far face at -Z (dark).
        let near = Triangle::new(
            Point3D::new(0.0, 0.0, 5.0),
            Point3D::new(1.0, 0.0, 5.0),
            Point3D::new(0.0, 1.0, 5.0),
        );
        let far = Triangle::new(
            Point3D::new(0.0, 0.0, -5.0),
            Point3D::new(0.0, 1.0, -5.0),
            Point3D::new(1.0, 0.0, -5.0),
        );
        Mesh::new("pair", vec![near, far])
    }

    fn fill_order(svg: &str) -> (usize, usize) {
        let bright = svg.find("rgb(255, 255, 255)").unwrap();
        let dark = svg.find("rgb(76, 76, 76)").unwrap();
        (bright, dark)
    }

    #[test]
    fn test_isometric_sorted_back_to_front() {
        let opts = StlSvgOptions {
            view: View::Isometric,
            fill: true,
            ..Default::default()
        };
        let out = render_svg(&near_and_far(), &opts).unwrap();
        let (near, far) = fill_order(&out.svg);
        assert!(far < near, "far face must be drawn first");
    }

    #[test]
    fn test_orthographic_keeps_input_order() {
        let opts = StlSvgOptions {
            view: View::Front,
            fill: true,
            ..Default::default()
        };
        let out = render_svg(&near_and_far(), &opts).unwrap();
        let (near, far) = fill_order(&out.svg);
        assert!(near < far);
    }

    #[test]
    fn test_rotation_changes_projection() {
        let opts = StlSvgOptions {
            rotation: Rotation {
                x: 0.0,
                y: 0.0,
                z: 90.0,
            },
            scale: Some(1.0),
            ..Default::default()
        };
        let out = render_svg(&unit_triangle(), &opts).unwrap();
        // (1, 0) rotates to (0, 1), which projects to (0, -1).
        assert!(out.svg.contains("L 0 -1 L -1 0 Z"));
    }

    #[test]
    fn test_empty_mesh_fails() {
        let err = render_svg(&Mesh::default(), &StlSvgOptions::default()).unwrap_err();
        assert_eq!(err.code(), "STL_NO_FACES");
    }
}
