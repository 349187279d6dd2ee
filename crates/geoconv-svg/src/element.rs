//! SVG element model.

use geoconv_math::{BoundingBox2D, Point2D};

use crate::{Attributes, PathData};

/// Presentation attributes shared by every element, unresolved.
///
/// Defaults are applied by the consumer: SVG paints fill black and stroke
/// none when unset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Style {
    /// `fill` value.
    pub fill: Option<String>,
    /// `stroke` value.
    pub stroke: Option<String>,
    /// `stroke-width` in user units.
    pub stroke_width: Option<f64>,
    /// Raw `transform` attribute.
    pub transform: Option<String>,
}

impl Style {
    /// Extract the shared presentation attributes.
    pub fn from_attributes(attrs: &Attributes) -> Self {
        Self {
            fill: attrs.get("fill").map(str::to_string),
            stroke: attrs.get("stroke").map(str::to_string),
            stroke_width: attrs.length("stroke-width"),
            transform: attrs
                .get("transform")
                .filter(|t| !t.trim().is_empty())
                .map(str::to_string),
        }
    }

    /// Fill value with the SVG default applied.
    pub fn fill_or_default(&self) -> &str {
        self.fill.as_deref().unwrap_or("black")
    }

    /// Stroke value with the SVG default applied.
    pub fn stroke_or_default(&self) -> &str {
        self.stroke.as_deref().unwrap_or("none")
    }

    /// Stroke width with the SVG default applied.
    pub fn stroke_width_or_default(&self) -> f64 {
        self.stroke_width.unwrap_or(1.0)
    }
}

/// A drawable element extracted from SVG text.
#[derive(Debug, Clone, PartialEq)]
pub enum SvgElement {
    /// `<path d="...">`.
    Path {
        /// Parsed path data.
        data: PathData,
        /// Presentation attributes.
        style: Style,
    },
    /// `<rect>`.
    Rect {
        /// Left edge.
        x: f64,
        /// Top edge.
        y: f64,
        /// Width.
        width: f64,
        /// Height.
        height: f64,
        /// Presentation attributes.
        style: Style,
    },
    /// `<circle>`.
    Circle {
        /// Center.
        center: Point2D,
        /// Radius.
        radius: f64,
        /// Presentation attributes.
        style: Style,
    },
    /// `<line>`.
    Line {
        /// Start point.
        start: Point2D,
        /// End point.
        end: Point2D,
        /// Presentation attributes.
        style: Style,
    },
    /// `<polyline>` or, when `closed`, `<polygon>`.
    Polyline {
        /// Vertices.
        points: Vec<Point2D>,
        /// True for `<polygon>`.
        closed: bool,
        /// Presentation attributes.
        style: Style,
    },
    /// `<text>` with its character content.
    Text {
        /// Anchor position.
        position: Point2D,
        /// Text content, entities decoded and inner markup removed.
        content: String,
        /// Font size in user units.
        font_size: f64,
        /// Font family, first entry of the list, unquoted.
        font_family: String,
        /// Presentation attributes.
        style: Style,
    },
}

impl SvgElement {
    /// Tag name this element was read from.
    pub fn tag(&self) -> &'static str {
        match self {
            SvgElement::Path { .. } => "path",
            SvgElement::Rect { .. } => "rect",
            SvgElement::Circle { .. } => "circle",
            SvgElement::Line { .. } => "line",
            SvgElement::Polyline { closed: true, .. } => "polygon",
            SvgElement::Polyline { closed: false, .. } => "polyline",
            SvgElement::Text { .. } => "text",
        }
    }

    /// Presentation attributes.
    pub fn style(&self) -> &Style {
        match self {
            SvgElement::Path { style, .. }
            | SvgElement::Rect { style, .. }
            | SvgElement::Circle { style, .. }
            | SvgElement::Line { style, .. }
            | SvgElement::Polyline { style, .. }
            | SvgElement::Text { style, .. } => style,
        }
    }

    /// Geometric extent, ignoring stroke width and transforms.
    pub fn bounds(&self) -> BoundingBox2D {
        match self {
            SvgElement::Path { data, .. } => data.bounds(),
            SvgElement::Rect {
                x,
                y,
                width,
                height,
                ..
            } => BoundingBox2D::from_points(&[
                Point2D::new(*x, *y),
                Point2D::new(x + width, y + height),
            ]),
            SvgElement::Circle { center, radius, .. } => {
                let mut bbox = BoundingBox2D::empty();
                bbox.include_circle(center, *radius);
                bbox
            }
            SvgElement::Line { start, end, .. } => BoundingBox2D::from_points([start, end]),
            SvgElement::Polyline { points, .. } => BoundingBox2D::from_points(points),
            SvgElement::Text { position, .. } => BoundingBox2D::from_points([position]),
        }
    }

    pub(crate) fn from_tag(tag: &str, attrs: &Attributes, content: Option<String>) -> Option<Self> {
        let style = Style::from_attributes(attrs);
        let element = match tag {
            "path" => {
                let data = PathData::parse(attrs.get("d")?);
                if data.is_empty() {
                    return None;
                }
                SvgElement::Path { data, style }
            }
            "rect" => SvgElement::Rect {
                x: attrs.length_or("x", 0.0),
                y: attrs.length_or("y", 0.0),
                width: attrs.length_or("width", 0.0),
                height: attrs.length_or("height", 0.0),
                style,
            },
            "circle" => SvgElement::Circle {
                center: Point2D::new(attrs.length_or("cx", 0.0), attrs.length_or("cy", 0.0)),
                radius: attrs.length_or("r", 0.0),
                style,
            },
            "line" => SvgElement::Line {
                start: Point2D::new(attrs.length_or("x1", 0.0), attrs.length_or("y1", 0.0)),
                end: Point2D::new(attrs.length_or("x2", 0.0), attrs.length_or("y2", 0.0)),
                style,
            },
            "polyline" | "polygon" => SvgElement::Polyline {
                points: crate::parse_points(attrs.get("points")?),
                closed: tag == "polygon",
                style,
            },
            "text" => SvgElement::Text {
                position: Point2D::new(attrs.length_or("x", 0.0), attrs.length_or("y", 0.0)),
                content: content.unwrap_or_default(),
                font_size: attrs.length_or("font-size", 12.0),
                font_family: attrs
                    .get("font-family")
                    .and_then(|f| f.split(',').next())
                    .map(|f| f.trim().trim_matches(|c| c == '\'' || c == '"').to_string())
                    .filter(|f| !f.is_empty())
                    .unwrap_or_else(|| "Helvetica".to_string()),
                style,
            },
            _ => return None,
        };
        Some(element)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_style_defaults() {
        let style = Style::default();
        assert_eq!(style.fill_or_default(), "black");
        assert_eq!(style.stroke_or_default(), "none");
        assert_eq!(style.stroke_width_or_default(), 1.0);
    }

    #[test]
    fn test_blank_transform_is_none() {
        let attrs = Attributes::parse(r#"<rect transform="  " stroke-width="3"/>"#);
        let style = Style::from_attributes(&attrs);
        assert_eq!(style.transform, None);
        assert_eq!(style.stroke_width, Some(3.0));
    }

    #[test]
    fn test_text_font_family_first_entry() {
        let attrs = Attributes::parse(r#"<text font-family="'Open Sans', Arial" font-size="16px">"#);
        let el = SvgElement::from_tag("text", &attrs, Some("hi".into())).unwrap();
        match el {
            SvgElement::Text {
                font_family,
                font_size,
                content,
                ..
            } => {
                assert_eq!(font_family, "Open Sans");
                assert_eq!(font_size, 16.0);
                assert_eq!(content, "hi");
            }
            other => panic!("expected text, got {:?}", other),
        }
    }

    #[test]
    fn test_path_without_commands_is_skipped() {
        let attrs = Attributes::parse(r#"<path d="  "/>"#);
        assert!(SvgElement::from_tag("path", &attrs, None).is_none());
        let attrs = Attributes::parse(r#"<path fill="red"/>"#);
        assert!(SvgElement::from_tag("path", &attrs, None).is_none());
    }

    #[test]
    fn test_bounds() {
        let attrs = Attributes::parse(r#"<rect x="1" y="2" width="3" height="4"/>"#);
        let rect = SvgElement::from_tag("rect", &attrs, None).unwrap();
        let b = rect.bounds();
        assert_eq!((b.min_x, b.min_y, b.max_x, b.max_y), (1.0, 2.0, 4.0, 6.0));
        assert_eq!(rect.tag(), "rect");
    }
}
