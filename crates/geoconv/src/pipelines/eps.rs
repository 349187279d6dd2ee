use geoconv_core::{report, Converted, Metadata, Payload, ProgressSink, Result};
use geoconv_eps::{extract_postscript, read_eps, write_eps};
use geoconv_svg::SvgDocument;

use super::text;
use crate::{ConvertOptions, Converter, Format};

/// SVG elements emitted as PostScript.
#[derive(Debug, Clone, Copy, Default)]
pub struct SvgToEps;

impl Converter for SvgToEps {
    fn source(&self) -> Format {
        Format::Svg
    }

    fn target(&self) -> Format {
        Format::Eps
    }

    fn name(&self) -> &'static str {
        "svg-to-eps"
    }

    fn description(&self) -> &'static str {
        "Emit SVG shapes and text as Encapsulated PostScript"
    }

    fn convert(
        &self,
        input: &[u8],
        options: &ConvertOptions,
        progress: Option<&dyn ProgressSink>,
    ) -> Result<Converted> {
        report(progress, 0.1);
        let doc = SvgDocument::parse(&text(input))?;
        report(progress, 0.4);

        let eps = write_eps(&doc, &options.svg_eps)?;
        report(progress, 0.9);
        let metadata = Metadata {
            element_count: Some(doc.elements.len()),
            ..Metadata::new("eps", 0).with_dimensions(doc.width, doc.height)
        };
        let out = Converted::new(Payload::Text(eps), Format::Eps.mime_type(), metadata);
        report(progress, 1.0);
        Ok(out)
    }
}

/// PostScript drawing operators collected into SVG.
#[derive(Debug, Clone, Copy, Default)]
pub struct EpsToSvg;

impl Converter for EpsToSvg {
    fn source(&self) -> Format {
        Format::Eps
    }

    fn target(&self) -> Format {
        Format::Svg
    }

    fn name(&self) -> &'static str {
        "eps-to-svg"
    }

    fn description(&self) -> &'static str {
        "Interpret EPS paths, fills, strokes and text into SVG"
    }

    fn convert(
        &self,
        input: &[u8],
        options: &ConvertOptions,
        progress: Option<&dyn ProgressSink>,
    ) -> Result<Converted> {
        report(progress, 0.1);
        let source = extract_postscript(input)?;
        report(progress, 0.2);

        let render = read_eps(&source, &options.eps_svg)?;
        report(progress, 0.9);
        let metadata = Metadata {
            element_count: Some(render.element_count),
            ..Metadata::new("svg", 0).with_dimensions(render.width, render.height)
        };
        let out = Converted::new(Payload::Text(render.svg), Format::Svg.mime_type(), metadata);
        report(progress, 1.0);
        Ok(out)
    }
}
