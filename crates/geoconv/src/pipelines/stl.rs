use geoconv_core::{report, ConvertError, Converted, Metadata, Payload, ProgressSink, Result};
use geoconv_stl::{extrude, parse_stl, render_svg, to_ascii, to_binary, Mesh, StlEncoding};
use geoconv_svg::{SvgDocument, SvgElement};
use tracing::debug;

use super::text;
use crate::{ConvertOptions, Converter, Format};

/// Solid name for extruded meshes.
const SOLID_NAME: &str = "svg_extrusion";
/// Binary STL header for extruded meshes.
const BINARY_HEADER: &str = "SVG to STL conversion by geoconv";

/// STL mesh projected to SVG.
#[derive(Debug, Clone, Copy, Default)]
pub struct StlToSvg;

impl Converter for StlToSvg {
    fn source(&self) -> Format {
        Format::Stl
    }

    fn target(&self) -> Format {
        Format::Svg
    }

    fn name(&self) -> &'static str {
        "stl-to-svg"
    }

    fn description(&self) -> &'static str {
        "Project an ASCII or binary STL mesh onto a 2D view"
    }

    fn convert(
        &self,
        input: &[u8],
        options: &ConvertOptions,
        progress: Option<&dyn ProgressSink>,
    ) -> Result<Converted> {
        report(progress, 0.1);
        options.stl_svg.validate()?;
        let parsed = parse_stl(input)?;
        debug!(
            encoding = %parsed.encoding,
            triangles = parsed.mesh.len(),
            "parsed STL"
        );
        report(progress, 0.4);

        let render = render_svg(&parsed.mesh, &options.stl_svg)?;
        report(progress, 0.9);
        let metadata = Metadata {
            face_count: Some(render.face_count),
            triangle_count: Some(parsed.mesh.len()),
            ..Metadata::new("svg", 0).with_dimensions(render.width, render.height)
        };
        let out = Converted::new(Payload::Text(render.svg), Format::Svg.mime_type(), metadata);
        report(progress, 1.0);
        Ok(out)
    }
}

/// SVG paths extruded into an STL solid.
#[derive(Debug, Clone, Copy, Default)]
pub struct SvgToStl;

impl SvgToStl {
    /// Extrude every `<path>` subpath of three or more points.
    ///
    /// Fails with `SVG_NO_PATHS` when the document has no paths and with
    /// `SVG_TO_STL_NO_GEOMETRY` when none of them yields a triangle.
    pub fn mesh(doc: &SvgDocument, depth: f64, curve_segments: usize) -> Result<Mesh> {
        let paths: Vec<_> = doc
            .elements
            .iter()
            .filter_map(|el| match el {
                SvgElement::Path { data, .. } => Some(data),
                _ => None,
            })
            .collect();
        if paths.is_empty() {
            return Err(ConvertError::conversion(
                "SVG_NO_PATHS",
                "No paths found in SVG. Only <path> elements can be extruded",
            ));
        }

        let mut triangles = Vec::new();
        let mut rings = 0usize;
        for data in paths {
            for sub in data.subpaths(curve_segments) {
                let faces = extrude(&sub.points, depth);
                if faces.is_empty() {
                    debug!(points = sub.points.len(), "skipping degenerate subpath");
                    continue;
                }
                rings += 1;
                triangles.extend(faces);
            }
        }
        if triangles.is_empty() {
            return Err(ConvertError::conversion(
                "SVG_TO_STL_NO_GEOMETRY",
                "Paths produced no geometry: every subpath has fewer than 3 points",
            ));
        }
        debug!(rings, triangles = triangles.len(), "extruded SVG paths");
        Ok(Mesh::new(SOLID_NAME, triangles))
    }
}

impl Converter for SvgToStl {
    fn source(&self) -> Format {
        Format::Svg
    }

    fn target(&self) -> Format {
        Format::Stl
    }

    fn name(&self) -> &'static str {
        "svg-to-stl"
    }

    fn description(&self) -> &'static str {
        "Extrude SVG paths into a 3D STL solid"
    }

    fn convert(
        &self,
        input: &[u8],
        options: &ConvertOptions,
        progress: Option<&dyn ProgressSink>,
    ) -> Result<Converted> {
        let opts = &options.svg_stl;
        report(progress, 0.1);
        opts.validate()?;
        let doc = SvgDocument::parse(&text(input))?;
        report(progress, 0.3);

        let mesh = Self::mesh(&doc, opts.extrusion_depth, opts.curve_segments)?;
        report(progress, 0.7);
        let data = match opts.output_format {
            StlEncoding::Ascii => Payload::Text(to_ascii(&mesh)),
            StlEncoding::Binary => Payload::Binary(to_binary(&mesh, BINARY_HEADER)),
        };
        report(progress, 0.9);
        let metadata = Metadata {
            triangle_count: Some(mesh.len()),
            ..Metadata::new("stl", 0)
                .with_extra("extrusion_depth", opts.extrusion_depth)
                .with_extra("output_format", opts.output_format)
        };
        let out = Converted::new(data, Format::Stl.mime_type(), metadata);
        report(progress, 1.0);
        Ok(out)
    }
}
