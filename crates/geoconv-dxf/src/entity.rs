//! Decoded DXF entity model.

use geoconv_math::{BoundingBox2D, Point2D};
use serde::{Deserialize, Serialize};

/// A line segment (`LINE`, codes 10/20 and 11/21).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    /// Start point.
    pub start: Point2D,
    /// End point.
    pub end: Point2D,
}

/// A full circle (`CIRCLE`, codes 10/20 and 40).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    /// Center.
    pub center: Point2D,
    /// Radius, always positive.
    pub radius: f64,
}

/// A circular arc running counter-clockwise from start to end angle
/// (`ARC`, codes 10/20, 40, 50/51).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Arc {
    /// Center.
    pub center: Point2D,
    /// Radius, always positive.
    pub radius: f64,
    /// Start angle in degrees.
    pub start_angle: f64,
    /// End angle in degrees.
    pub end_angle: f64,
}

impl Arc {
    /// Counter-clockwise angular span in degrees, in `(0, 360]`.
    pub fn sweep(&self) -> f64 {
        let span = (self.end_angle - self.start_angle).rem_euclid(360.0);
        if span == 0.0 {
            360.0
        } else {
            span
        }
    }

    /// Point on the arc at `angle` degrees.
    pub fn point_at(&self, angle: f64) -> Point2D {
        let (s, c) = angle.to_radians().sin_cos();
        self.center.offset(self.radius * c, self.radius * s)
    }
}

/// A polyline from `LWPOLYLINE` or `POLYLINE` + `VERTEX` records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polyline {
    /// Vertices in order.
    pub points: Vec<Point2D>,
    /// Closed flag (code 70, bit 1).
    pub closed: bool,
}

/// A `SPLINE` as stored: control points, knots and weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spline {
    /// Curve degree (code 71).
    pub degree: u32,
    /// Control points (codes 10/20).
    pub control_points: Vec<Point2D>,
    /// Knot vector (code 40).
    pub knots: Vec<f64>,
    /// Weights (code 41), empty for non-rational splines.
    pub weights: Vec<f64>,
    /// Closed flag (code 70, bit 1).
    pub closed: bool,
}

/// Which record a [`Text`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextKind {
    /// Single-line `TEXT`.
    Text,
    /// Multi-line `MTEXT`.
    MText,
}

/// Horizontal text alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HAlign {
    /// Left (DXF 0).
    #[default]
    Left,
    /// Center (DXF 1, or 4 "middle").
    Center,
    /// Right (DXF 2).
    Right,
}

impl HAlign {
    /// From a TEXT code 72 value.
    pub fn from_dxf(value: i32) -> Self {
        match value {
            1 | 4 => HAlign::Center,
            2 => HAlign::Right,
            _ => HAlign::Left,
        }
    }

    /// SVG `text-anchor` value.
    pub fn text_anchor(&self) -> &'static str {
        match self {
            HAlign::Left => "start",
            HAlign::Center => "middle",
            HAlign::Right => "end",
        }
    }
}

/// Vertical text alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum VAlign {
    /// Baseline (DXF 0).
    #[default]
    Baseline,
    /// Bottom (DXF 1).
    Bottom,
    /// Middle (DXF 2).
    Middle,
    /// Top (DXF 3).
    Top,
}

impl VAlign {
    /// From a TEXT code 73 value.
    pub fn from_dxf(value: i32) -> Self {
        match value {
            1 => VAlign::Bottom,
            2 => VAlign::Middle,
            3 => VAlign::Top,
            _ => VAlign::Baseline,
        }
    }

    /// SVG `dominant-baseline` value.
    pub fn dominant_baseline(&self) -> &'static str {
        match self {
            VAlign::Baseline => "alphabetic",
            VAlign::Bottom => "text-bottom",
            VAlign::Middle => "middle",
            VAlign::Top => "text-top",
        }
    }
}

/// Alignment from an MTEXT attachment point (code 71, 1..=9, row-major
/// from top-left).
pub(crate) fn attachment_alignment(point: i32) -> (HAlign, VAlign) {
    let h = match (point - 1).rem_euclid(3) {
        1 => HAlign::Center,
        2 => HAlign::Right,
        _ => HAlign::Left,
    };
    let v = match point {
        1..=3 => VAlign::Top,
        4..=6 => VAlign::Middle,
        7..=9 => VAlign::Bottom,
        _ => VAlign::Top,
    };
    (h, v)
}

/// `TEXT` or `MTEXT` with display-ready content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Text {
    /// Source record type.
    pub kind: TextKind,
    /// Insertion or alignment point.
    pub position: Point2D,
    /// Content with formatting codes removed; MTEXT paragraphs become `\n`.
    pub content: String,
    /// Text height (code 40).
    pub height: f64,
    /// Rotation in degrees (code 50).
    pub rotation: f64,
    /// Horizontal scale (code 41, TEXT only).
    pub width_factor: f64,
    /// Text style name (code 7).
    pub style: String,
    /// Horizontal alignment.
    pub halign: HAlign,
    /// Vertical alignment.
    pub valign: VAlign,
}

/// A `HATCH` boundary fill. Only the pattern is kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hatch {
    /// Pattern name (code 2).
    pub pattern: String,
    /// Solid fill (code 70 = 1, or pattern `SOLID`).
    pub solid: bool,
}

/// One decoded entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DxfEntity {
    /// `LINE`.
    Line(Line),
    /// `CIRCLE`.
    Circle(Circle),
    /// `ARC`.
    Arc(Arc),
    /// `POLYLINE` or `LWPOLYLINE`.
    Polyline(Polyline),
    /// `SPLINE`.
    Spline(Spline),
    /// `TEXT` or `MTEXT`.
    Text(Text),
    /// `HATCH`.
    Hatch(Hatch),
}

impl DxfEntity {
    /// DXF record name.
    pub fn type_name(&self) -> &'static str {
        match self {
            DxfEntity::Line(_) => "LINE",
            DxfEntity::Circle(_) => "CIRCLE",
            DxfEntity::Arc(_) => "ARC",
            DxfEntity::Polyline(_) => "LWPOLYLINE",
            DxfEntity::Spline(_) => "SPLINE",
            DxfEntity::Text(t) => match t.kind {
                TextKind::Text => "TEXT",
                TextKind::MText => "MTEXT",
            },
            DxfEntity::Hatch(_) => "HATCH",
        }
    }

    /// Add this entity's points to `bbox`.
    ///
    /// Circles and arcs contribute center ± radius, splines their control
    /// points, text its anchor. Hatches contribute nothing.
    pub fn extend_bounds(&self, bbox: &mut BoundingBox2D) {
        match self {
            DxfEntity::Line(l) => {
                bbox.include_point(&l.start);
                bbox.include_point(&l.end);
            }
            DxfEntity::Circle(c) => bbox.include_circle(&c.center, c.radius),
            DxfEntity::Arc(a) => bbox.include_circle(&a.center, a.radius),
            DxfEntity::Polyline(p) => p.points.iter().for_each(|pt| bbox.include_point(pt)),
            DxfEntity::Spline(s) => s.control_points.iter().for_each(|pt| bbox.include_point(pt)),
            DxfEntity::Text(t) => bbox.include_point(&t.position),
            DxfEntity::Hatch(_) => {}
        }
    }
}

/// Properties common to every entity record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityProps {
    /// Layer name (code 8).
    pub layer: Option<String>,
    /// AutoCAD color index (code 62).
    pub color: Option<i16>,
}

/// An entity with its common properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawingEntity {
    /// Layer and color.
    pub props: EntityProps,
    /// Geometry.
    pub entity: DxfEntity,
}

impl DrawingEntity {
    /// Entity with default properties.
    pub fn new(entity: DxfEntity) -> Self {
        Self {
            props: EntityProps::default(),
            entity,
        }
    }
}

/// Hex color for an AutoCAD color index, `None` for BYBLOCK (0),
/// BYLAYER (256), white/black (7) and indices outside the basic table.
pub fn aci_to_hex(index: i16) -> Option<&'static str> {
    match index {
        1 => Some("#ff0000"),
        2 => Some("#ffff00"),
        3 => Some("#00ff00"),
        4 => Some("#00ffff"),
        5 => Some("#0000ff"),
        6 => Some("#ff00ff"),
        8 => Some("#808080"),
        9 => Some("#c0c0c0"),
        _ => None,
    }
}
