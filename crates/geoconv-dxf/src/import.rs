//! SVG element to DXF entity mapping.

use geoconv_core::{ConvertError, Result};
use geoconv_math::Point2D;
use geoconv_svg::{PathCommand, PathData, SvgDocument, SvgElement};
use tracing::debug;

use crate::{DxfDocument, DxfWriteOptions};

impl DxfDocument {
    /// Build a document from parsed SVG.
    ///
    /// - `<line>` becomes `LINE`, `<circle>` becomes `CIRCLE`
    /// - `<rect>` becomes four `LINE`s
    /// - `<polyline>`/`<polygon>` become `LWPOLYLINE`
    /// - `<path>` segments become `LINE`s from the current point; a cubic
    ///   contributes a straight line to its end point and `Z` closes back
    ///   to the subpath start
    ///
    /// Text is not converted. Fails with `SVG_NO_ELEMENTS` when nothing
    /// convertible is found.
    pub fn from_svg(svg: &SvgDocument, options: DxfWriteOptions) -> Result<Self> {
        options.validate()?;
        let mut doc = DxfDocument::new(options);

        for element in &svg.elements {
            match element {
                SvgElement::Line { start, end, .. } => doc.add_line(*start, *end),
                SvgElement::Circle { center, radius, .. } => {
                    if *radius > 0.0 {
                        doc.add_circle(*center, *radius);
                    }
                }
                SvgElement::Rect {
                    x,
                    y,
                    width,
                    height,
                    ..
                } => {
                    let corners = [
                        Point2D::new(*x, *y),
                        Point2D::new(x + width, *y),
                        Point2D::new(x + width, y + height),
                        Point2D::new(*x, y + height),
                    ];
                    for i in 0..4 {
                        doc.add_line(corners[i], corners[(i + 1) % 4]);
                    }
                }
                SvgElement::Polyline { points, closed, .. } => {
                    doc.add_polyline(points.clone(), *closed);
                }
                SvgElement::Path { data, .. } => add_path(&mut doc, data),
                SvgElement::Text { .. } => {
                    debug!("text element has no DXF mapping, skipped");
                }
            }
        }

        if doc.is_empty() {
            return Err(ConvertError::conversion(
                "SVG_NO_ELEMENTS",
                "No convertible elements (line, circle, rect, polyline, polygon, path) found in SVG",
            ));
        }
        Ok(doc)
    }
}

fn add_path(doc: &mut DxfDocument, data: &PathData) {
    let mut current = Point2D::ORIGIN;
    let mut start = Point2D::ORIGIN;
    for command in &data.commands {
        let mut next = command.end_point(current);
        match command {
            PathCommand::MoveTo(p) => start = *p,
            PathCommand::LineTo(_)
            | PathCommand::HorizontalTo(_)
            | PathCommand::VerticalTo(_)
            | PathCommand::CubicTo { .. } => doc.add_line(current, next),
            PathCommand::Close => {
                if current != start {
                    doc.add_line(current, start);
                }
                next = start;
            }
            PathCommand::Unsupported { command, .. } => {
                debug!(command = %command, "path command has no DXF mapping, moving cursor");
            }
        }
        current = next;
    }
}
