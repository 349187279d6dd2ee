//! Entity to SVG emitter.

use std::fmt::Write;

use geoconv_core::fmt::num;
use geoconv_core::{ConvertError, Result};
use geoconv_svg::escape_xml;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{aci_to_hex, spline_path, DrawingEntity, DxfDrawing, DxfEntity, Text};

/// Options for DXF→SVG rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DxfSvgOptions {
    /// Uniform scale applied to the whole drawing.
    pub scale: f64,
    /// Stroke width in drawing units.
    pub stroke_width: f64,
    /// Stroke color for entities without a mapped ACI color.
    pub default_color: String,
}

impl Default for DxfSvgOptions {
    fn default() -> Self {
        Self {
            scale: 1.0,
            stroke_width: 1.0,
            default_color: "#000000".to_string(),
        }
    }
}

impl DxfSvgOptions {
    /// Reject non-positive scale or negative stroke width.
    pub fn validate(&self) -> Result<()> {
        if !(self.scale.is_finite() && self.scale > 0.0) {
            return Err(ConvertError::invalid_options(format!(
                "scale must be positive, got {}",
                self.scale
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

/// A rendered SVG document and its outer size.
#[derive(Debug, Clone, PartialEq)]
pub struct SvgRender {
    /// SVG text.
    pub svg: String,
    /// `width` attribute (bounding box width × scale).
    pub width: f64,
    /// `height` attribute (bounding box height × scale).
    pub height: f64,
}

/// Render a parsed drawing as SVG.
///
/// The `viewBox` spans the drawing's bounding box scaled by
/// `options.scale`; an empty box collapses to the origin. DXF's Y-up
/// coordinates are written as-is.
pub fn render_svg(drawing: &DxfDrawing, options: &DxfSvgOptions) -> Result<SvgRender> {
    options.validate()?;
    let bbox = drawing.bounds().or_origin();
    let s = options.scale;
    let width = bbox.width() * s;
    let height = bbox.height() * s;

    let mut svg = String::new();
    writeln!(svg, r#"<?xml version="1.0" encoding="UTF-8"?>"#)?;
    writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}" viewBox="{} {} {} {}">"#,
        num(width),
        num(height),
        num(bbox.min_x * s),
        num(bbox.min_y * s),
        num(width),
        num(height)
    )?;
    writeln!(svg, r#"<g transform="scale({})">"#, num(s))?;

    for entity in &drawing.entities {
        write_entity(&mut svg, entity, options)?;
    }

    writeln!(svg, "</g>")?;
    writeln!(svg, "</svg>")?;
    debug!(entities = drawing.entities.len(), width, height, "rendered DXF drawing");
    Ok(SvgRender { svg, width, height })
}

fn stroke_color<'a>(entity: &DrawingEntity, options: &'a DxfSvgOptions) -> &'a str {
    entity
        .props
        .color
        .and_then(aci_to_hex)
        .unwrap_or(options.default_color.as_str())
}

fn write_entity(
    out: &mut String,
    entity: &DrawingEntity,
    options: &DxfSvgOptions,
) -> std::fmt::Result {
    let color = escape_xml(stroke_color(entity, options));
    let stroke = format!(
        r#"stroke="{}" stroke-width="{}" fill="none""#,
        color,
        num(options.stroke_width)
    );

    match &entity.entity {
        DxfEntity::Line(l) => writeln!(
            out,
            r#"<line x1="{}" y1="{}" x2="{}" y2="{}" {}/>"#,
            num(l.start.x),
            num(l.start.y),
            num(l.end.x),
            num(l.end.y),
            stroke
        ),
        DxfEntity::Circle(c) => writeln!(
            out,
            r#"<circle cx="{}" cy="{}" r="{}" {}/>"#,
            num(c.center.x),
            num(c.center.y),
            num(c.radius),
            stroke
        ),
        DxfEntity::Arc(a) => {
            let start = a.point_at(a.start_angle);
            let end = a.point_at(a.end_angle);
            let large_arc = u8::from(a.sweep() > 180.0);
            writeln!(
                out,
                r#"<path d="M {} {} A {} {} 0 {} 1 {} {}" {}/>"#,
                num(start.x),
                num(start.y),
                num(a.radius),
                num(a.radius),
                large_arc,
                num(end.x),
                num(end.y),
                stroke
            )
        }
        DxfEntity::Polyline(p) => {
            let mut d = String::new();
            for (i, pt) in p.points.iter().enumerate() {
                let cmd = if i == 0 { "M" } else { " L" };
                write!(d, "{} {} {}", cmd, num(pt.x), num(pt.y))?;
            }
            if p.closed {
                d.push_str(" Z");
            }
            writeln!(out, r#"<path d="{}" {}/>"#, d, stroke)
        }
        DxfEntity::Spline(sp) => {
            let d = spline_path(sp)?;
            if d.is_empty() {
                return Ok(());
            }
            writeln!(out, r#"<path d="{}" {}/>"#, d, stroke)
        }
        DxfEntity::Text(t) => write_text(out, t, &color),
        DxfEntity::Hatch(h) => {
            if h.solid {
                writeln!(
                    out,
                    "<!-- HATCH entity ({}) - simplified rendering -->",
                    escape_xml(&h.pattern).replace("--", "- -")
                )
            } else {
                Ok(())
            }
        }
    }
}

fn write_text(out: &mut String, t: &Text, color: &str) -> std::fmt::Result {
    let x = num(t.position.x);
    let y = num(t.position.y);

    let mut transforms = Vec::new();
    if t.rotation != 0.0 {
        transforms.push(format!("rotate({} {} {})", num(-t.rotation), x, y));
    }
    if t.width_factor != 1.0 && t.width_factor > 0.0 {
        transforms.push(format!(
            "translate({x} {y}) scale({} 1) translate({} {})",
            num(t.width_factor),
            num(-t.position.x),
            num(-t.position.y)
        ));
    }
    let transform = if transforms.is_empty() {
        String::new()
    } else {
        format!(r#" transform="{}""#, transforms.join(" "))
    };

    let attrs = format!(
        r#"font-size="{}" font-family="{}" text-anchor="{}" dominant-baseline="{}" fill="{}""#,
        num(t.height),
        escape_xml(&t.style),
        t.halign.text_anchor(),
        t.valign.dominant_baseline(),
        color
    );

    let lines: Vec<&str> = t.content.split('\n').collect();
    if lines.len() == 1 {
        return writeln!(
            out,
            r#"<text x="{}" y="{}" {}{}>{}</text>"#,
            x,
            y,
            attrs,
            transform,
            escape_xml(&t.content)
        );
    }

    let line_height = t.height * 1.2;
    writeln!(out, "<g{}>", transform)?;
    for (i, line) in lines.iter().enumerate() {
        writeln!(
            out,
            r#"<text x="{}" y="{}" {}>{}</text>"#,
            x,
            num(t.position.y + line_height * i as f64),
            attrs,
            escape_xml(line)
        )?;
    }
    writeln!(out, "</g>")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Arc, Circle, HAlign, Hatch, Line, TextKind, VAlign};
    use geoconv_math::Point2D;

    fn drawing(entities: Vec<DxfEntity>) -> DxfDrawing {
        DxfDrawing {
            entities: entities.into_iter().map(DrawingEntity::new).collect(),
            found_types: Vec::new(),
            skipped: 0,
        }
    }

    fn line_and_circle() -> DxfDrawing {
        drawing(vec![
            DxfEntity::Line(Line {
                start: Point2D::new(0.0, 0.0),
                end: Point2D::new(10.0, 0.0),
            }),
            DxfEntity::Circle(Circle {
                center: Point2D::new(5.0, 5.0),
                radius: 2.0,
            }),
        ])
    }

    #[test]
    fn test_line_and_circle_view_box() {
        let out = render_svg(&line_and_circle(), &DxfSvgOptions::default()).unwrap();
        assert!(out.svg.contains(r#"viewBox="0 0 10 7""#));
        assert!(out.svg.contains(r#"<line x1="0" y1="0" x2="10" y2="0""#));
        assert!(out.svg.contains(r#"<circle cx="5" cy="5" r="2""#));
        assert_eq!((out.width, out.height), (10.0, 7.0));
    }

    #[test]
    fn test_scale_applies_to_view_box() {
        let opts = DxfSvgOptions {
            scale: 2.0,
            ..Default::default()
        };
        let out = render_svg(&line_and_circle(), &opts).unwrap();
        assert!(out.svg.contains(r#"width="20" height="14" viewBox="0 0 20 14""#));
        assert!(out.svg.contains(r#"<g transform="scale(2)">"#));
    }

    #[test]
    fn test_invalid_scale_rejected() {
        let opts = DxfSvgOptions {
            scale: 0.0,
            ..Default::default()
        };
        let err = render_svg(&line_and_circle(), &opts).unwrap_err();
        assert_eq!(err.code(), "INVALID_OPTIONS");
    }

    #[test]
    fn test_arc_large_flag() {
        let small = drawing(vec![DxfEntity::Arc(Arc {
            center: Point2D::ORIGIN,
            radius: 1.0,
            start_angle: 0.0,
            end_angle: 90.0,
        })]);
        let out = render_svg(&small, &DxfSvgOptions::default()).unwrap();
        assert!(out.svg.contains("A 1 1 0 0 1 0 1"));

        let large = drawing(vec![DxfEntity::Arc(Arc {
            center: Point2D::ORIGIN,
            radius: 1.0,
            start_angle: 0.0,
            end_angle: 270.0,
        })]);
        let out = render_svg(&large, &DxfSvgOptions::default()).unwrap();
        assert!(out.svg.contains("A 1 1 0 1 1 0 -1"));
    }

    #[test]
    fn test_aci_color_and_default() {
        let mut d = line_and_circle();
        d.entities[0].props.color = Some(1);
        let opts = DxfSvgOptions {
            default_color: "#123456".into(),
            ..Default::default()
        };
        let out = render_svg(&d, &opts).unwrap();
        assert!(out.svg.contains(r##"x2="10" y2="0" stroke="#ff0000""##));
        assert!(out.svg.contains(r##"r="2" stroke="#123456""##));
    }

    #[test]
    fn test_text_alignment_and_escaping() {
        let d = drawing(vec![DxfEntity::Text(Text {
            kind: TextKind::Text,
            position: Point2D::new(1.0, 2.0),
            content: "a < b".into(),
            height: 5.0,
            rotation: 0.0,
            width_factor: 1.0,
            style: "Standard".into(),
            halign: HAlign::Right,
            valign: VAlign::Top,
        })]);
        let out = render_svg(&d, &DxfSvgOptions::default()).unwrap();
        assert!(out.svg.contains(r#"text-anchor="end""#));
        assert!(out.svg.contains(r#"dominant-baseline="text-top""#));
        assert!(out.svg.contains(">a &lt; b</text>"));
    }

    #[test]
    fn test_multiline_text_group() {
        let d = drawing(vec![DxfEntity::Text(Text {
            kind: TextKind::MText,
            position: Point2D::new(0.0, 0.0),
            content: "one\ntwo".into(),
            height: 10.0,
            rotation: 0.0,
            width_factor: 1.0,
            style: "Standard".into(),
            halign: HAlign::Left,
            valign: VAlign::Top,
        })]);
        let out = render_svg(&d, &DxfSvgOptions::default()).unwrap();
        assert!(out.svg.contains("<g>"));
        assert!(out.svg.contains(r#"<text x="0" y="12""#));
        assert!(out.svg.contains(">two</text>"));
    }

    #[test]
    fn test_hatch_comment_only_when_solid() {
        let mut d = line_and_circle();
        d.entities.push(DrawingEntity::new(DxfEntity::Hatch(Hatch {
            pattern: "SOLID".into(),
            solid: true,
        })));
        d.entities.push(DrawingEntity::new(DxfEntity::Hatch(Hatch {
            pattern: "ANSI31".into(),
            solid: false,
        })));
        let out = render_svg(&d, &DxfSvgOptions::default()).unwrap();
        assert!(out.svg.contains("<!-- HATCH entity (SOLID) - simplified rendering -->"));
        assert!(!out.svg.contains("ANSI31"));
    }
}
