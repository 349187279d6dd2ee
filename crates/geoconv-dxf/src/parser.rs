//! Entity decoding with skip-and-continue error handling.

use geoconv_core::{ConvertError, Result};
use geoconv_math::{BoundingBox2D, Point2D};
use thiserror::Error;
use tracing::{debug, trace};

use crate::entity::attachment_alignment;
use crate::reader::{self, GroupPair, Record};
use crate::{
    decode_text_codes, strip_mtext, Arc, Circle, DrawingEntity, DxfEntity, EntityProps, HAlign,
    Hatch, Line, Polyline, Spline, Text, TextKind, VAlign,
};

/// Entity types the parser decodes.
pub const SUPPORTED_ENTITY_TYPES: &[&str] = &[
    "LINE",
    "CIRCLE",
    "ARC",
    "POLYLINE",
    "LWPOLYLINE",
    "SPLINE",
    "TEXT",
    "MTEXT",
    "HATCH",
];

/// Why a single record could not be decoded.
#[derive(Error, Debug)]
enum EntityError {
    /// A required group code is absent.
    #[error("missing group code {0}")]
    Missing(i32),

    /// A value could not be parsed or is out of range.
    #[error("invalid value {value:?} for group code {code}")]
    Invalid {
        /// Group code.
        code: i32,
        /// Raw value.
        value: String,
    },
}

type EntityResult<T> = std::result::Result<T, EntityError>;

/// Typed access to a record's fields.
struct Fields<'a> {
    pairs: &'a [GroupPair<'a>],
}

impl<'a> Fields<'a> {
    fn new(pairs: &'a [GroupPair<'a>]) -> Self {
        Self { pairs }
    }

    fn raw(&self, code: i32) -> Option<&'a str> {
        self.pairs.iter().find(|p| p.code == code).map(|p| p.value)
    }

    fn f64(&self, code: i32) -> EntityResult<Option<f64>> {
        self.raw(code).map(|v| parse_f64(code, v)).transpose()
    }

    fn f64_or(&self, code: i32, default: f64) -> EntityResult<f64> {
        Ok(self.f64(code)?.unwrap_or(default))
    }

    fn require(&self, code: i32) -> EntityResult<f64> {
        self.f64(code)?.ok_or(EntityError::Missing(code))
    }

    fn int_or(&self, code: i32, default: i32) -> EntityResult<i32> {
        match self.raw(code) {
            Some(v) => v.parse().map_err(|_| EntityError::Invalid {
                code,
                value: v.to_string(),
            }),
            None => Ok(default),
        }
    }

    fn point(&self, x: i32, y: i32) -> EntityResult<Point2D> {
        Ok(Point2D::new(self.require(x)?, self.require(y)?))
    }

    /// Every point given as repeated x/y codes, in order.
    fn points(&self, x: i32, y: i32) -> EntityResult<Vec<Point2D>> {
        let mut out = Vec::new();
        let mut pending_x = None;
        for p in self.pairs {
            if p.code == x {
                pending_x = Some(parse_f64(x, p.value)?);
            } else if p.code == y {
                let px = pending_x.take().ok_or(EntityError::Missing(x))?;
                out.push(Point2D::new(px, parse_f64(y, p.value)?));
            }
        }
        Ok(out)
    }

    fn all_f64(&self, code: i32) -> EntityResult<Vec<f64>> {
        self.pairs
            .iter()
            .filter(|p| p.code == code)
            .map(|p| parse_f64(code, p.value))
            .collect()
    }

    fn props(&self) -> EntityProps {
        EntityProps {
            layer: self.raw(8).map(str::to_string),
            color: self.raw(62).and_then(|v| v.parse().ok()),
        }
    }
}

fn parse_f64(code: i32, value: &str) -> EntityResult<f64> {
    value
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| EntityError::Invalid {
            code,
            value: value.to_string(),
        })
}

fn positive_radius(fields: &Fields<'_>) -> EntityResult<f64> {
    let r = fields.require(40)?;
    if r > 0.0 {
        Ok(r)
    } else {
        Err(EntityError::Invalid {
            code: 40,
            value: r.to_string(),
        })
    }
}

fn decode_line(f: &Fields<'_>) -> EntityResult<DxfEntity> {
    Ok(DxfEntity::Line(Line {
        start: f.point(10, 20)?,
        end: f.point(11, 21)?,
    }))
}

fn decode_circle(f: &Fields<'_>) -> EntityResult<DxfEntity> {
    Ok(DxfEntity::Circle(Circle {
        center: f.point(10, 20)?,
        radius: positive_radius(f)?,
    }))
}

fn decode_arc(f: &Fields<'_>) -> EntityResult<DxfEntity> {
    Ok(DxfEntity::Arc(Arc {
        center: f.point(10, 20)?,
        radius: positive_radius(f)?,
        start_angle: f.f64_or(50, 0.0)?,
        end_angle: f.f64_or(51, 360.0)?,
    }))
}

fn decode_lwpolyline(f: &Fields<'_>) -> EntityResult<DxfEntity> {
    let points = f.points(10, 20)?;
    if points.is_empty() {
        return Err(EntityError::Missing(10));
    }
    Ok(DxfEntity::Polyline(Polyline {
        points,
        closed: f.int_or(70, 0)? & 1 == 1,
    }))
}

fn decode_spline(f: &Fields<'_>) -> EntityResult<DxfEntity> {
    let control_points = f.points(10, 20)?;
    if control_points.is_empty() {
        return Err(EntityError::Missing(10));
    }
    let degree = f.int_or(71, 3)?;
    Ok(DxfEntity::Spline(Spline {
        degree: u32::try_from(degree).map_err(|_| EntityError::Invalid {
            code: 71,
            value: degree.to_string(),
        })?,
        control_points,
        knots: f.all_f64(40)?,
        weights: f.all_f64(41)?,
        closed: f.int_or(70, 0)? & 1 == 1,
    }))
}

fn decode_text(f: &Fields<'_>, kind: TextKind) -> EntityResult<DxfEntity> {
    if f.raw(1).is_none() && f.raw(3).is_none() {
        return Err(EntityError::Missing(1));
    }
    // MTEXT splits long content into code 3 chunks ahead of the final code 1.
    let mut raw = String::new();
    for p in f.pairs.iter().filter(|p| p.code == 3) {
        raw.push_str(p.value);
    }
    if let Some(v) = f.raw(1) {
        raw.push_str(v);
    }

    let (content, halign, valign, position, width_factor) = match kind {
        TextKind::MText => {
            let (h, v) = attachment_alignment(f.int_or(71, 1)?);
            (strip_mtext(&raw), h, v, f.point(10, 20)?, 1.0)
        }
        TextKind::Text => {
            let h = f.int_or(72, 0)?;
            let v = f.int_or(73, 0)?;
            let insertion = f.point(10, 20)?;
            // Justified text is placed by its alignment point when present.
            let position = if h != 0 || v != 0 {
                match (f.f64(11)?, f.f64(21)?) {
                    (Some(x), Some(y)) => Point2D::new(x, y),
                    _ => insertion,
                }
            } else {
                insertion
            };
            (
                decode_text_codes(&raw),
                HAlign::from_dxf(h),
                VAlign::from_dxf(v),
                position,
                f.f64_or(41, 1.0)?,
            )
        }
    };

    Ok(DxfEntity::Text(Text {
        kind,
        position,
        content,
        height: f.f64_or(40, 10.0)?,
        rotation: f.f64_or(50, 0.0)?,
        width_factor,
        style: f.raw(7).unwrap_or("Standard").to_string(),
        halign,
        valign,
    }))
}

fn decode_hatch(f: &Fields<'_>) -> EntityResult<DxfEntity> {
    let pattern = f.raw(2).unwrap_or("SOLID").to_string();
    let solid = f.int_or(70, 0)? == 1 || pattern.eq_ignore_ascii_case("SOLID");
    Ok(DxfEntity::Hatch(Hatch { pattern, solid }))
}

/// Decoded contents of a DXF `ENTITIES` section.
#[derive(Debug, Clone, PartialEq)]
pub struct DxfDrawing {
    /// Successfully decoded entities in file order.
    pub entities: Vec<DrawingEntity>,
    /// Every entity type name seen, supported or not, in first-seen order.
    pub found_types: Vec<String>,
    /// Records of supported types that were malformed and skipped.
    pub skipped: usize,
}

impl DxfDrawing {
    /// Parse DXF text.
    ///
    /// Fails with a validation error when the `SECTION`/`ENTITIES` markers
    /// are missing, and with `DXF_NO_SUPPORTED_ENTITIES` when no entity
    /// decodes. Malformed or unsupported records are skipped.
    pub fn parse(text: &str) -> Result<Self> {
        reader::validate_markers(text)?;
        let pairs = reader::read_pairs(text);
        let section = reader::entities_section(&pairs)?;
        let records = reader::records(section);

        let mut drawing = DxfDrawing {
            entities: Vec::new(),
            found_types: Vec::new(),
            skipped: 0,
        };

        let mut i = 0;
        while i < records.len() {
            let record = records[i];
            i += 1;
            drawing.note_type(record.kind);
            let fields = Fields::new(record.fields);

            let decoded = match record.kind {
                "LINE" => decode_line(&fields),
                "CIRCLE" => decode_circle(&fields),
                "ARC" => decode_arc(&fields),
                "LWPOLYLINE" => decode_lwpolyline(&fields),
                "POLYLINE" => {
                    let (result, consumed) = decode_polyline(&fields, &records[i..]);
                    i += consumed;
                    result
                }
                "SPLINE" => decode_spline(&fields),
                "TEXT" => decode_text(&fields, TextKind::Text),
                "MTEXT" => decode_text(&fields, TextKind::MText),
                "HATCH" => decode_hatch(&fields),
                other => {
                    trace!(entity = other, "skipping unsupported entity");
                    continue;
                }
            };

            match decoded {
                Ok(entity) => {
                    trace!(entity = record.kind, "decoded entity");
                    drawing.entities.push(DrawingEntity {
                        props: fields.props(),
                        entity,
                    });
                }
                Err(err) => {
                    let line = record.fields.first().map_or(0, |p| p.line);
                    debug!(entity = record.kind, line, error = %err, "skipping malformed entity");
                    drawing.skipped += 1;
                }
            }
        }

        if drawing.entities.is_empty() {
            let found = if drawing.found_types.is_empty() {
                "none".to_string()
            } else {
                drawing.found_types.join(", ")
            };
            return Err(ConvertError::conversion(
                "DXF_NO_SUPPORTED_ENTITIES",
                format!(
                    "No drawable entities found in DXF file. Found entity types: {}. Supported types: {}",
                    found,
                    SUPPORTED_ENTITY_TYPES.join(", ")
                ),
            ));
        }
        Ok(drawing)
    }

    fn note_type(&mut self, kind: &str) {
        if !self.found_types.iter().any(|t| t == kind) {
            self.found_types.push(kind.to_string());
        }
    }

    /// Bounding box over all point-bearing entities.
    pub fn bounds(&self) -> BoundingBox2D {
        let mut bbox = BoundingBox2D::empty();
        for e in &self.entities {
            e.entity.extend_bounds(&mut bbox);
        }
        bbox
    }

    /// Count of decoded entities per type name, in first-seen order.
    pub fn type_counts(&self) -> Vec<(&'static str, usize)> {
        let mut counts: Vec<(&'static str, usize)> = Vec::new();
        for e in &self.entities {
            let name = e.entity.type_name();
            match counts.iter_mut().find(|(t, _)| *t == name) {
                Some(entry) => entry.1 += 1,
                None => counts.push((name, 1)),
            }
        }
        counts
    }
}

/// Decode a `POLYLINE` header plus its trailing `VERTEX` records.
///
/// Returns the result and how many following records were consumed
/// (vertices plus the terminating `SEQEND`).
fn decode_polyline(header: &Fields<'_>, rest: &[Record<'_>]) -> (EntityResult<DxfEntity>, usize) {
    let vertex_count = rest.iter().take_while(|r| r.kind == "VERTEX").count();
    let consumed = match rest.get(vertex_count) {
        Some(r) if r.kind == "SEQEND" => vertex_count + 1,
        _ => vertex_count,
    };
    (polyline_from_vertices(header, &rest[..vertex_count]), consumed)
}

fn polyline_from_vertices(header: &Fields<'_>, vertices: &[Record<'_>]) -> EntityResult<DxfEntity> {
    let points = vertices
        .iter()
        .map(|v| Fields::new(v.fields).point(10, 20))
        .collect::<EntityResult<Vec<_>>>()?;
    if points.is_empty() {
        return Err(EntityError::Missing(10));
    }
    Ok(DxfEntity::Polyline(Polyline {
        points,
        closed: header.int_or(70, 0)? & 1 == 1,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dxf(entities: &str) -> String {
        format!(
            "0\nSECTION\n2\nHEADER\n0\nENDSEC\n0\nSECTION\n2\nENTITIES\n{}0\nENDSEC\n0\nEOF\n",
            entities
        )
    }

    const LINE: &str = "0\nLINE\n8\n0\n10\n0\n20\n0\n30\n0\n11\n10\n21\n0\n31\n0\n";
    const CIRCLE: &str = "0\nCIRCLE\n8\n0\n10\n5\n20\n5\n30\n0\n40\n2\n";

    #[test]
    fn test_line_and_circle() {
        let drawing = DxfDrawing::parse(&dxf(&format!("{}{}", LINE, CIRCLE))).unwrap();
        assert_eq!(drawing.entities.len(), 2);
        assert_eq!(
            drawing.entities[0].entity,
            DxfEntity::Line(Line {
                start: Point2D::new(0.0, 0.0),
                end: Point2D::new(10.0, 0.0)
            })
        );
        assert_eq!(
            drawing.entities[1].entity,
            DxfEntity::Circle(Circle {
                center: Point2D::new(5.0, 5.0),
                radius: 2.0
            })
        );
        assert_eq!(drawing.entities[0].props.layer.as_deref(), Some("0"));
        let b = drawing.bounds();
        assert_eq!((b.min_x, b.min_y, b.max_x, b.max_y), (0.0, 0.0, 10.0, 7.0));
    }

    #[test]
    fn test_skip_malformed_arc() {
        let bad_arc = "0\nARC\n10\n1\n20\n1\n50\n0\n51\n90\n";
        let body = format!("{}{}{}{}", LINE, bad_arc, LINE, LINE);
        let drawing = DxfDrawing::parse(&dxf(&body)).unwrap();
        assert_eq!(drawing.entities.len(), 3);
        assert_eq!(drawing.skipped, 1);
        assert!(drawing
            .entities
            .iter()
            .all(|e| matches!(e.entity, DxfEntity::Line(_))));
    }

    #[test]
    fn test_trailing_blank_lines_after_eof() {
        let text = format!("{}\n\n\n", dxf(LINE));
        let drawing = DxfDrawing::parse(&text).unwrap();
        assert_eq!(drawing.entities.len(), 1);
    }

    #[test]
    fn test_bad_group_code_in_header() {
        let text = format!(
            "0\nSECTION\n2\nHEADER\n9\n$ACADVER\nXX\nAC1015\n0\nENDSEC\n0\nSECTION\n2\nENTITIES\n{}0\nENDSEC\n0\nEOF\n",
            LINE
        );
        let drawing = DxfDrawing::parse(&text).unwrap();
        assert_eq!(drawing.entities.len(), 1);
        assert!(matches!(drawing.entities[0].entity, DxfEntity::Line(_)));
    }

    #[test]
    fn test_bad_group_code_inside_entity() {
        let line = "0\nLINE\n8\n0\n1O\nx\n10\n0\n20\n0\n11\n10\n21\n0\n";
        let drawing = DxfDrawing::parse(&dxf(&format!("{}{}", line, CIRCLE))).unwrap();
        assert_eq!(drawing.entities.len(), 2);
        assert_eq!(drawing.skipped, 0);
    }

    #[test]
    fn test_non_numeric_value_skips_entity() {
        let bad = "0\nCIRCLE\n10\nabc\n20\n1\n40\n1\n";
        let drawing = DxfDrawing::parse(&dxf(&format!("{}{}", bad, LINE))).unwrap();
        assert_eq!(drawing.entities.len(), 1);
        assert_eq!(drawing.skipped, 1);
    }

    #[test]
    fn test_only_unsupported_lists_types() {
        let body = "0\nINSERT\n2\nBLOCK1\n10\n0\n20\n0\n0\nPOINT\n10\n1\n20\n1\n";
        let err = DxfDrawing::parse(&dxf(body)).unwrap_err();
        assert_eq!(err.code(), "DXF_NO_SUPPORTED_ENTITIES");
        let msg = err.to_string();
        assert!(msg.contains("Found entity types: INSERT, POINT"));
        assert!(msg.contains("Supported types: LINE, CIRCLE"));
    }

    #[test]
    fn test_empty_section_reports_none() {
        let err = DxfDrawing::parse(&dxf("")).unwrap_err();
        assert!(err.to_string().contains("Found entity types: none"));
    }

    #[test]
    fn test_missing_markers() {
        assert_eq!(
            DxfDrawing::parse("not a dxf").unwrap_err().code(),
            "DXF_MISSING_SECTION"
        );
    }

    #[test]
    fn test_lwpolyline_inline_vertices() {
        let body = "0\nLWPOLYLINE\n8\n0\n90\n3\n70\n1\n10\n0\n20\n0\n10\n4\n20\n0\n10\n4\n20\n3\n";
        let drawing = DxfDrawing::parse(&dxf(body)).unwrap();
        match &drawing.entities[0].entity {
            DxfEntity::Polyline(p) => {
                assert_eq!(p.points.len(), 3);
                assert_eq!(p.points[2], Point2D::new(4.0, 3.0));
                assert!(p.closed);
            }
            other => panic!("expected polyline, got {:?}", other),
        }
    }

    #[test]
    fn test_polyline_with_vertices_and_seqend() {
        let body = "0\nPOLYLINE\n8\n0\n66\n1\n70\n0\n0\nVERTEX\n10\n1\n20\n2\n0\nVERTEX\n10\n3\n20\n4\n0\nSEQEND\n0\nLINE\n10\n0\n20\n0\n11\n1\n21\n1\n";
        let drawing = DxfDrawing::parse(&dxf(body)).unwrap();
        assert_eq!(drawing.entities.len(), 2);
        match &drawing.entities[0].entity {
            DxfEntity::Polyline(p) => {
                assert_eq!(p.points, vec![Point2D::new(1.0, 2.0), Point2D::new(3.0, 4.0)]);
                assert!(!p.closed);
            }
            other => panic!("expected polyline, got {:?}", other),
        }
        assert!(!drawing.found_types.contains(&"VERTEX".to_string()));
    }

    #[test]
    fn test_spline_fields() {
        let body = "0\nSPLINE\n70\n8\n71\n3\n72\n8\n73\n4\n40\n0\n40\n0\n40\n0\n40\n0\n40\n1\n40\n1\n40\n1\n40\n1\n10\n0\n20\n0\n10\n1\n20\n2\n10\n2\n20\n2\n10\n3\n20\n0\n";
        let drawing = DxfDrawing::parse(&dxf(body)).unwrap();
        match &drawing.entities[0].entity {
            DxfEntity::Spline(s) => {
                assert_eq!(s.degree, 3);
                assert_eq!(s.control_points.len(), 4);
                assert_eq!(s.knots.len(), 8);
                assert!(s.weights.is_empty());
                assert!(!s.closed);
            }
            other => panic!("expected spline, got {:?}", other),
        }
    }

    #[test]
    fn test_text_alignment_point() {
        let body = "0\nTEXT\n10\n1\n20\n1\n11\n5\n21\n6\n40\n2.5\n1\nAngle 45%%d\n72\n1\n73\n2\n";
        let drawing = DxfDrawing::parse(&dxf(body)).unwrap();
        match &drawing.entities[0].entity {
            DxfEntity::Text(t) => {
                assert_eq!(t.position, Point2D::new(5.0, 6.0));
                assert_eq!(t.content, "Angle 45\u{00B0}");
                assert_eq!(t.halign, HAlign::Center);
                assert_eq!(t.valign, VAlign::Middle);
                assert_eq!(t.height, 2.5);
                assert_eq!(t.style, "Standard");
            }
            other => panic!("expected text, got {:?}", other),
        }
    }

    #[test]
    fn test_mtext_chunks_and_formatting() {
        let body = "0\nMTEXT\n10\n0\n20\n0\n40\n3\n41\n120\n71\n5\n3\n{\\H2;Fir\n1\nst line}\\PSecond\n";
        let drawing = DxfDrawing::parse(&dxf(body)).unwrap();
        match &drawing.entities[0].entity {
            DxfEntity::Text(t) => {
                assert_eq!(t.kind, TextKind::MText);
                assert_eq!(t.content, "First line\nSecond");
                assert_eq!(t.width_factor, 1.0);
                assert_eq!(t.halign, HAlign::Center);
                assert_eq!(t.valign, VAlign::Middle);
            }
            other => panic!("expected mtext, got {:?}", other),
        }
    }

    #[test]
    fn test_hatch_and_color() {
        let body = "0\nHATCH\n8\nFILL\n62\n1\n2\nANSI31\n70\n1\n";
        let drawing = DxfDrawing::parse(&dxf(body)).unwrap();
        assert_eq!(drawing.entities[0].props.color, Some(1));
        assert_eq!(drawing.entities[0].props.layer.as_deref(), Some("FILL"));
        assert_eq!(
            drawing.entities[0].entity,
            DxfEntity::Hatch(Hatch {
                pattern: "ANSI31".into(),
                solid: true
            })
        );
        assert_eq!(drawing.type_counts(), vec![("HATCH", 1)]);
    }
}
