use geoconv_core::{report, Converted, Metadata, Payload, ProgressSink, Result};
use geoconv_dxf::{render_svg, DxfDocument, DxfDrawing};
use geoconv_svg::SvgDocument;
use tracing::debug;

use super::text;
use crate::{ConvertOptions, Converter, Format};

/// DXF drawing to SVG.
#[derive(Debug, Clone, Copy, Default)]
pub struct DxfToSvg;

impl Converter for DxfToSvg {
    fn source(&self) -> Format {
        Format::Dxf
    }

    fn target(&self) -> Format {
        Format::Svg
    }

    fn name(&self) -> &'static str {
        "dxf-to-svg"
    }

    fn description(&self) -> &'static str {
        "Render DXF lines, arcs, polylines, splines, hatches and text as SVG"
    }

    fn convert(
        &self,
        input: &[u8],
        options: &ConvertOptions,
        progress: Option<&dyn ProgressSink>,
    ) -> Result<Converted> {
        report(progress, 0.1);
        options.dxf_svg.validate()?;
        let drawing = DxfDrawing::parse(&text(input))?;
        if drawing.skipped > 0 {
            debug!(skipped = drawing.skipped, "skipped malformed DXF entities");
        }
        report(progress, 0.5);

        let render = render_svg(&drawing, &options.dxf_svg)?;
        report(progress, 0.9);
        let metadata = Metadata {
            entity_count: Some(drawing.entities.len()),
            ..Metadata::new("svg", 0).with_dimensions(render.width, render.height)
        };
        let out = Converted::new(Payload::Text(render.svg), Format::Svg.mime_type(), metadata);
        report(progress, 1.0);
        Ok(out)
    }
}

/// SVG shapes to DXF entities.
#[derive(Debug, Clone, Copy, Default)]
pub struct SvgToDxf;

impl Converter for SvgToDxf {
    fn source(&self) -> Format {
        Format::Svg
    }

    fn target(&self) -> Format {
        Format::Dxf
    }

    fn name(&self) -> &'static str {
        "svg-to-dxf"
    }

    fn description(&self) -> &'static str {
        "Write SVG lines, circles, rects, polylines and paths as DXF entities"
    }

    fn convert(
        &self,
        input: &[u8],
        options: &ConvertOptions,
        progress: Option<&dyn ProgressSink>,
    ) -> Result<Converted> {
        report(progress, 0.1);
        let svg = SvgDocument::parse(&text(input))?;
        report(progress, 0.3);

        let doc = DxfDocument::from_svg(&svg, options.svg_dxf.clone())?;
        report(progress, 0.7);
        let bounds = doc.bounds();
        let dxf = doc.to_dxf_string()?;
        let metadata = Metadata {
            entity_count: Some(doc.len()),
            ..Metadata::new("dxf", 0).with_dimensions(bounds.width(), bounds.height())
        };
        let out = Converted::new(Payload::Text(dxf), Format::Dxf.mime_type(), metadata);
        report(progress, 1.0);
        Ok(out)
    }
}
