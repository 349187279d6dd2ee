//! ASCII DXF export.
//!
//! Writes a minimal DXF: a `HEADER` section with version, extents and
//! units, then one `ENTITIES` section. Every entity is written on the
//! configured layer and color.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use geoconv_core::{ConvertError, Result};
use geoconv_math::{BoundingBox2D, Point2D};
use serde::{Deserialize, Serialize};

use crate::{Arc, Circle, DxfEntity, Line, Polyline};

/// Options for DXF output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DxfWriteOptions {
    /// `$ACADVER` value.
    pub dxf_version: String,
    /// Layer name for every entity.
    pub layer: String,
    /// ACI color for every entity.
    pub color: i16,
}

impl Default for DxfWriteOptions {
    fn default() -> Self {
        Self {
            dxf_version: "AC1015".to_string(),
            layer: "0".to_string(),
            color: 7,
        }
    }
}

impl DxfWriteOptions {
    /// Reject an empty layer or a color outside 0..=256.
    pub fn validate(&self) -> Result<()> {
        if self.layer.trim().is_empty() || self.layer.contains('\n') {
            return Err(ConvertError::invalid_options("layer must be a non-empty single line"));
        }
        if !(0..=256).contains(&self.color) {
            return Err(ConvertError::invalid_options(format!(
                "color must be an ACI index 0..=256, got {}",
                self.color
            )));
        }
        if !self.dxf_version.starts_with("AC") {
            return Err(ConvertError::invalid_options(format!(
                "dxf_version must look like AC1015, got {:?}",
                self.dxf_version
            )));
        }
        Ok(())
    }
}

/// DXF document builder.
///
/// Accepts line, circle, arc and polyline geometry. Text, splines and
/// hatches have no writer and are rejected by [`DxfDocument::add`].
#[derive(Debug, Clone, Default)]
pub struct DxfDocument {
    entities: Vec<DxfEntity>,
    options: DxfWriteOptions,
}

impl DxfDocument {
    /// Create an empty document.
    pub fn new(options: DxfWriteOptions) -> Self {
        Self {
            entities: Vec::new(),
            options,
        }
    }

    /// Add an entity. Returns false for entity kinds the writer cannot emit.
    pub fn add(&mut self, entity: DxfEntity) -> bool {
        match entity {
            DxfEntity::Line(_) | DxfEntity::Circle(_) | DxfEntity::Arc(_) => {
                self.entities.push(entity);
                true
            }
            DxfEntity::Polyline(ref p) if !p.points.is_empty() => {
                self.entities.push(entity);
                true
            }
            _ => false,
        }
    }

    /// Add a line segment.
    pub fn add_line(&mut self, start: Point2D, end: Point2D) {
        self.add(DxfEntity::Line(Line { start, end }));
    }

    /// Add a circle.
    pub fn add_circle(&mut self, center: Point2D, radius: f64) {
        self.add(DxfEntity::Circle(Circle { center, radius }));
    }

    /// Add a polyline; ignored when `points` is empty.
    pub fn add_polyline(&mut self, points: Vec<Point2D>, closed: bool) {
        self.add(DxfEntity::Polyline(Polyline { points, closed }));
    }

    /// Entities added so far.
    pub fn entities(&self) -> &[DxfEntity] {
        &self.entities
    }

    /// Number of entities.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// True when no entity has been added.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Output options.
    pub fn options(&self) -> &DxfWriteOptions {
        &self.options
    }

    /// Extents over every entity, the origin when empty.
    pub fn bounds(&self) -> BoundingBox2D {
        let mut bbox = BoundingBox2D::empty();
        for e in &self.entities {
            e.extend_bounds(&mut bbox);
        }
        bbox.or_origin()
    }

    /// Export to a DXF file.
    pub fn export(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        self.export_to_writer(&mut writer)?;
        writer.flush()?;
        Ok(())
    }

    /// Render the document as DXF text.
    pub fn to_dxf_string(&self) -> Result<String> {
        let mut buf = Vec::new();
        self.export_to_writer(&mut buf)?;
        String::from_utf8(buf)
            .map_err(|e| ConvertError::conversion("CONVERSION_FAILED", e.to_string()))
    }

    /// Write the document to any writer.
    pub fn export_to_writer(&self, writer: &mut impl Write) -> std::io::Result<()> {
        let bbox = self.bounds();

        // Header
        writeln!(writer, "0")?;
        writeln!(writer, "SECTION")?;
        writeln!(writer, "2")?;
        writeln!(writer, "HEADER")?;
        writeln!(writer, "9")?;
        writeln!(writer, "$ACADVER")?;
        writeln!(writer, "1")?;
        writeln!(writer, "{}", self.options.dxf_version)?;
        writeln!(writer, "9")?;
        writeln!(writer, "$EXTMIN")?;
        writeln!(writer, "10")?;
        writeln!(writer, "{:.6}", bbox.min_x)?;
        writeln!(writer, "20")?;
        writeln!(writer, "{:.6}", bbox.min_y)?;
        writeln!(writer, "30")?;
        writeln!(writer, "0.0")?;
        writeln!(writer, "9")?;
        writeln!(writer, "$EXTMAX")?;
        writeln!(writer, "10")?;
        writeln!(writer, "{:.6}", bbox.max_x)?;
        writeln!(writer, "20")?;
        writeln!(writer, "{:.6}", bbox.max_y)?;
        writeln!(writer, "30")?;
        writeln!(writer, "0.0")?;
        writeln!(writer, "9")?;
        writeln!(writer, "$LUNITS")?;
        writeln!(writer, "70")?;
        writeln!(writer, "2")?; // Decimal
        writeln!(writer, "9")?;
        writeln!(writer, "$INSUNITS")?;
        writeln!(writer, "70")?;
        writeln!(writer, "4")?; // Millimeters
        writeln!(writer, "0")?;
        writeln!(writer, "ENDSEC")?;

        // Entities
        writeln!(writer, "0")?;
        writeln!(writer, "SECTION")?;
        writeln!(writer, "2")?;
        writeln!(writer, "ENTITIES")?;

        for entity in &self.entities {
            match entity {
                DxfEntity::Line(l) => self.write_line(writer, l)?,
                DxfEntity::Circle(c) => self.write_circle(writer, c)?,
                DxfEntity::Arc(a) => self.write_arc(writer, a)?,
                DxfEntity::Polyline(p) => self.write_polyline(writer, p)?,
                // Rejected by `add`.
                DxfEntity::Spline(_) | DxfEntity::Text(_) | DxfEntity::Hatch(_) => {}
            }
        }

        writeln!(writer, "0")?;
        writeln!(writer, "ENDSEC")?;

        writeln!(writer, "0")?;
        writeln!(writer, "EOF")?;
        Ok(())
    }

    fn write_common(&self, writer: &mut impl Write, kind: &str) -> std::io::Result<()> {
        writeln!(writer, "0")?;
        writeln!(writer, "{}", kind)?;
        writeln!(writer, "8")?;
        writeln!(writer, "{}", self.options.layer)?;
        writeln!(writer, "62")?;
        writeln!(writer, "{}", self.options.color)?;
        Ok(())
    }

    fn write_line(&self, writer: &mut impl Write, line: &Line) -> std::io::Result<()> {
        self.write_common(writer, "LINE")?;
        writeln!(writer, "10")?;
        writeln!(writer, "{:.6}", line.start.x)?;
        writeln!(writer, "20")?;
        writeln!(writer, "{:.6}", line.start.y)?;
        writeln!(writer, "30")?;
        writeln!(writer, "0.0")?;
        writeln!(writer, "11")?;
        writeln!(writer, "{:.6}", line.end.x)?;
        writeln!(writer, "21")?;
        writeln!(writer, "{:.6}", line.end.y)?;
        writeln!(writer, "31")?;
        writeln!(writer, "0.0")?;
        Ok(())
    }

    fn write_circle(&self, writer: &mut impl Write, circle: &Circle) -> std::io::Result<()> {
        self.write_common(writer, "CIRCLE")?;
        writeln!(writer, "10")?;
        writeln!(writer, "{:.6}", circle.center.x)?;
        writeln!(writer, "20")?;
        writeln!(writer, "{:.6}", circle.center.y)?;
        writeln!(writer, "30")?;
        writeln!(writer, "0.0")?;
        writeln!(writer, "40")?;
        writeln!(writer, "{:.6}", circle.radius)?;
        Ok(())
    }

    fn write_arc(&self, writer: &mut impl Write, arc: &Arc) -> std::io::Result<()> {
        self.write_common(writer, "ARC")?;
        writeln!(writer, "10")?;
        writeln!(writer, "{:.6}", arc.center.x)?;
        writeln!(writer, "20")?;
        writeln!(writer, "{:.6}", arc.center.y)?;
        writeln!(writer, "30")?;
        writeln!(writer, "0.0")?;
        writeln!(writer, "40")?;
        writeln!(writer, "{:.6}", arc.radius)?;
        writeln!(writer, "50")?;
        writeln!(writer, "{:.6}", arc.start_angle)?;
        writeln!(writer, "51")?;
        writeln!(writer, "{:.6}", arc.end_angle)?;
        Ok(())
    }

    fn write_polyline(&self, writer: &mut impl Write, polyline: &Polyline) -> std::io::Result<()> {
        self.write_common(writer, "LWPOLYLINE")?;
        writeln!(writer, "90")?;
        writeln!(writer, "{}", polyline.points.len())?;
        writeln!(writer, "70")?;
        writeln!(writer, "{}", u8::from(polyline.closed))?;
        for p in &polyline.points {
            writeln!(writer, "10")?;
            writeln!(writer, "{:.6}", p.x)?;
            writeln!(writer, "20")?;
            writeln!(writer, "{:.6}", p.y)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DxfDrawing;
    use std::fs;

    fn sample() -> DxfDocument {
        let mut doc = DxfDocument::new(DxfWriteOptions::default());
        doc.add_line(Point2D::new(0.0, 0.0), Point2D::new(10.0, 0.0));
        doc.add_circle(Point2D::new(5.0, 5.0), 2.0);
        doc.add_polyline(
            vec![
                Point2D::new(0.0, 0.0),
                Point2D::new(4.0, 0.0),
                Point2D::new(4.0, 3.0),
            ],
            true,
        );
        doc
    }

    #[test]
    fn test_dxf_structure() {
        let content = sample().to_dxf_string().unwrap();
        assert!(content.starts_with("0\nSECTION\n2\nHEADER\n9\n$ACADVER\n1\nAC1015\n"));
        assert!(content.contains("$EXTMAX\n10\n10.000000\n20\n7.000000\n"));
        assert!(content.contains("$INSUNITS\n70\n4\n"));
        assert!(content.contains("0\nLWPOLYLINE\n8\n0\n62\n7\n90\n3\n70\n1\n"));
        assert!(content.ends_with("0\nENDSEC\n0\nEOF\n"));
    }

    #[test]
    fn test_layer_and_color_options() {
        let mut doc = DxfDocument::new(DxfWriteOptions {
            layer: "CUT".into(),
            color: 1,
            ..Default::default()
        });
        doc.add_circle(Point2D::new(1.0, 1.0), 0.5);
        let content = doc.to_dxf_string().unwrap();
        assert!(content.contains("0\nCIRCLE\n8\nCUT\n62\n1\n10\n1.000000\n"));
    }

    #[test]
    fn test_output_parses_back() {
        let content = sample().to_dxf_string().unwrap();
        let drawing = DxfDrawing::parse(&content).unwrap();
        assert_eq!(drawing.entities.len(), 3);
        assert_eq!(drawing.entities[1].entity, sample().entities()[1]);
        assert_eq!(drawing.entities[2].props.color, Some(7));
        assert_eq!(drawing.entities[2].props.layer.as_deref(), Some("0"));
    }

    #[test]
    fn test_export_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.dxf");
        sample().export(&path).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("CIRCLE"));
        assert!(content.contains("EOF"));
    }

    #[test]
    fn test_add_rejects_text() {
        let mut doc = DxfDocument::default();
        assert!(!doc.add(DxfEntity::Hatch(crate::Hatch {
            pattern: "SOLID".into(),
            solid: true
        })));
        assert!(doc.add(DxfEntity::Arc(Arc {
            center: Point2D::ORIGIN,
            radius: 1.0,
            start_angle: 0.0,
            end_angle: 90.0
        })));
        assert_eq!(doc.len(), 1);
    }

    #[test]
    fn test_validate_options() {
        assert!(DxfWriteOptions::default().validate().is_ok());
        let bad = DxfWriteOptions {
            color: 300,
            ..Default::default()
        };
        assert_eq!(bad.validate().unwrap_err().code(), "INVALID_OPTIONS");
    }
}
