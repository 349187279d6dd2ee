use std::fmt::Write;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use geoconv_core::fmt::num;
use geoconv_core::{report, Converted, Metadata, Payload, ProgressSink, Result};
use geoconv_raster::{encode_bmp, encode_ico, normalize_sizes, IcoFile, IconPayload, Rasterizer};
use geoconv_svg::SvgDocument;
use rayon::prelude::*;
use tracing::debug;

use super::text;
use crate::options::MAX_RASTER_EDGE;
use crate::{ConvertOptions, Converter, Format};

/// Output size: explicit values win, a single explicit edge keeps the
/// document's aspect ratio, and the intrinsic size fills the rest.
fn output_size(doc: &SvgDocument, width: Option<u32>, height: Option<u32>) -> (u32, u32) {
    let edge = |v: f64| (v.round() as u32).clamp(1, MAX_RASTER_EDGE);
    let aspect = if doc.width > 0.0 && doc.height > 0.0 {
        doc.width / doc.height
    } else {
        1.0
    };
    match (width, height) {
        (Some(w), Some(h)) => (w, h),
        (Some(w), None) => (w, edge(f64::from(w) / aspect)),
        (None, Some(h)) => (edge(f64::from(h) * aspect), h),
        (None, None) => (edge(doc.width.ceil()), edge(doc.height.ceil())),
    }
}

/// SVG rasterized into a BMP.
pub struct SvgToBmp {
    rasterizer: Arc<dyn Rasterizer>,
}

impl SvgToBmp {
    /// Converter rendering with `rasterizer`.
    pub fn new(rasterizer: Arc<dyn Rasterizer>) -> Self {
        Self { rasterizer }
    }
}

impl Converter for SvgToBmp {
    fn source(&self) -> Format {
        Format::Svg
    }

    fn target(&self) -> Format {
        Format::Bmp
    }

    fn name(&self) -> &'static str {
        "svg-to-bmp"
    }

    fn description(&self) -> &'static str {
        "Rasterize SVG into an uncompressed 1 to 32 bit BMP"
    }

    fn convert(
        &self,
        input: &[u8],
        options: &ConvertOptions,
        progress: Option<&dyn ProgressSink>,
    ) -> Result<Converted> {
        let opts = &options.svg_bmp;
        report(progress, 0.1);
        opts.validate()?;
        let background = opts.background_rgb()?;
        let source = text(input);
        let doc = SvgDocument::parse(&source)?;
        let (width, height) = output_size(&doc, opts.width, opts.height);
        report(progress, 0.2);

        let image = self.rasterizer.rasterize(&source, width, height)?;
        report(progress, 0.7);
        let bmp = encode_bmp(&image, opts.bit_depth, background)?;
        report(progress, 0.9);
        let metadata = Metadata::new("bmp", 0)
            .with_dimensions(f64::from(width), f64::from(height))
            .with_extra("bit_depth", opts.bit_depth);
        let out = Converted::new(Payload::Binary(bmp), Format::Bmp.mime_type(), metadata);
        report(progress, 1.0);
        Ok(out)
    }
}

/// SVG rasterized into a PNG.
pub struct SvgToPng {
    rasterizer: Arc<dyn Rasterizer>,
}

impl SvgToPng {
    /// Converter rendering with `rasterizer`.
    pub fn new(rasterizer: Arc<dyn Rasterizer>) -> Self {
        Self { rasterizer }
    }
}

impl Converter for SvgToPng {
    fn source(&self) -> Format {
        Format::Svg
    }

    fn target(&self) -> Format {
        Format::Png
    }

    fn name(&self) -> &'static str {
        "svg-to-png"
    }

    fn description(&self) -> &'static str {
        "Rasterize SVG into an RGBA PNG"
    }

    fn convert(
        &self,
        input: &[u8],
        options: &ConvertOptions,
        progress: Option<&dyn ProgressSink>,
    ) -> Result<Converted> {
        let opts = &options.svg_png;
        report(progress, 0.1);
        opts.validate()?;
        let source = text(input);
        let doc = SvgDocument::parse(&source)?;
        let (width, height) = output_size(&doc, opts.width, opts.height);
        report(progress, 0.2);

        let png = self.rasterizer.rasterize(&source, width, height)?.to_png()?;
        report(progress, 0.9);
        let metadata =
            Metadata::new("png", 0).with_dimensions(f64::from(width), f64::from(height));
        let out = Converted::new(Payload::Binary(png), Format::Png.mime_type(), metadata);
        report(progress, 1.0);
        Ok(out)
    }
}

/// SVG rendered at several sizes and packed into an ICO.
pub struct SvgToIco {
    rasterizer: Arc<dyn Rasterizer>,
}

impl SvgToIco {
    /// Converter rendering with `rasterizer`.
    pub fn new(rasterizer: Arc<dyn Rasterizer>) -> Self {
        Self { rasterizer }
    }
}

impl Converter for SvgToIco {
    fn source(&self) -> Format {
        Format::Svg
    }

    fn target(&self) -> Format {
        Format::Ico
    }

    fn name(&self) -> &'static str {
        "svg-to-ico"
    }

    fn description(&self) -> &'static str {
        "Render SVG at standard icon sizes into a multi-image ICO"
    }

    fn convert(
        &self,
        input: &[u8],
        options: &ConvertOptions,
        progress: Option<&dyn ProgressSink>,
    ) -> Result<Converted> {
        let opts = &options.svg_ico;
        report(progress, 0.1);
        let sizes = normalize_sizes(&opts.sizes, opts.include_large)?;
        let source = text(input);
        SvgDocument::parse(&source)?;
        report(progress, 0.2);

        // Results keep the order of `sizes`.
        let images = sizes
            .par_iter()
            .map(|&size| self.rasterizer.rasterize(&source, size, size))
            .collect::<Result<Vec<_>>>()?;
        report(progress, 0.8);
        let ico = encode_ico(&images, opts.and_mask)?;
        report(progress, 0.9);

        let largest = sizes.last().copied().unwrap_or_default();
        let listed = sizes
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join(",");
        debug!(sizes = %listed, bytes = ico.len(), "packed icon");
        let metadata = Metadata::new("ico", 0)
            .with_dimensions(f64::from(largest), f64::from(largest))
            .with_extra("sizes", listed);
        let out = Converted::new(Payload::Binary(ico), Format::Ico.mime_type(), metadata);
        report(progress, 1.0);
        Ok(out)
    }
}

/// One icon from an ICO embedded in SVG as a PNG image.
#[derive(Debug, Clone, Copy, Default)]
pub struct IcoToSvg;

impl Converter for IcoToSvg {
    fn source(&self) -> Format {
        Format::Ico
    }

    fn target(&self) -> Format {
        Format::Svg
    }

    fn name(&self) -> &'static str {
        "ico-to-svg"
    }

    fn description(&self) -> &'static str {
        "Embed the largest (or preferred) ICO image in SVG as a base64 PNG"
    }

    fn convert(
        &self,
        input: &[u8],
        options: &ConvertOptions,
        progress: Option<&dyn ProgressSink>,
    ) -> Result<Converted> {
        report(progress, 0.1);
        let file = IcoFile::parse(input)?;
        let entry = file.select(options.ico_svg.preferred_size);
        debug!(
            entries = file.entries().len(),
            width = entry.width,
            height = entry.height,
            "selected icon"
        );
        let payload = file.payload(entry)?;
        let image = payload.decode()?;
        report(progress, 0.5);

        let png = match payload {
            IconPayload::Png(bytes) => bytes.to_vec(),
            IconPayload::Dib(_) => image.to_png()?,
        };
        let (w, h) = (f64::from(image.width), f64::from(image.height));
        let mut svg = String::with_capacity(png.len() * 4 / 3 + 320);
        writeln!(svg, r#"<?xml version="1.0" encoding="UTF-8"?>"#)?;
        writeln!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            w = num(w),
            h = num(h)
        )?;
        writeln!(
            svg,
            r#"  <image x="0" y="0" width="{}" height="{}" xlink:href="data:image/png;base64,{}"/>"#,
            num(w),
            num(h),
            STANDARD.encode(&png)
        )?;
        svg.push_str("</svg>\n");
        report(progress, 0.9);

        let metadata = Metadata::new("svg", 0).with_dimensions(w, h);
        let out = Converted::new(Payload::Text(svg), Format::Svg.mime_type(), metadata);
        report(progress, 1.0);
        Ok(out)
    }
}

/// One icon from an ICO extracted as a BMP file.
#[derive(Debug, Clone, Copy, Default)]
pub struct IcoToBmp;

impl Converter for IcoToBmp {
    fn source(&self) -> Format {
        Format::Ico
    }

    fn target(&self) -> Format {
        Format::Bmp
    }

    fn name(&self) -> &'static str {
        "ico-to-bmp"
    }

    fn description(&self) -> &'static str {
        "Extract the largest (or preferred) ICO image as a BMP"
    }

    fn convert(
        &self,
        input: &[u8],
        options: &ConvertOptions,
        progress: Option<&dyn ProgressSink>,
    ) -> Result<Converted> {
        report(progress, 0.1);
        let file = IcoFile::parse(input)?;
        let entry = file.select(options.ico_svg.preferred_size);
        let payload = file.payload(entry)?;
        let image = payload.decode()?;
        report(progress, 0.5);

        // DIB payloads keep their own pixel format; PNG ones become 32-bit.
        let bmp = match payload.to_bmp_file()? {
            Some(bmp) => bmp,
            None => encode_bmp(&image, 32, [255, 255, 255])?,
        };
        debug!(
            width = image.width,
            height = image.height,
            bytes = bmp.len(),
            "extracted icon"
        );
        let metadata = Metadata::new("bmp", 0)
            .with_dimensions(f64::from(image.width), f64::from(image.height));
        let out = Converted::new(Payload::Binary(bmp), Format::Bmp.mime_type(), metadata);
        report(progress, 1.0);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geoconv_core::ConvertError;
    use geoconv_raster::{decode_bmp, RasterImage};

    /// Solid color at any size, so tests do not depend on a renderer.
    struct Solid([u8; 4]);

    impl Rasterizer for Solid {
        fn rasterize(&self, _svg: &str, width: u32, height: u32) -> Result<RasterImage> {
            Ok(RasterImage::filled(width, height, self.0))
        }
    }

    struct Broken;

    impl Rasterizer for Broken {
        fn rasterize(&self, _svg: &str, _width: u32, _height: u32) -> Result<RasterImage> {
            Err(ConvertError::conversion("SVG_RENDER_FAILED", "no renderer"))
        }
    }

    const SVG: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" width="20" height="10"><rect width="20" height="10" fill="red"/></svg>"#;

    fn solid() -> Arc<dyn Rasterizer> {
        Arc::new(Solid([255, 0, 0, 255]))
    }

    #[test]
    fn test_output_size() {
        let doc = SvgDocument::parse(SVG).unwrap();
        assert_eq!(output_size(&doc, None, None), (20, 10));
        assert_eq!(output_size(&doc, Some(40), None), (40, 20));
        assert_eq!(output_size(&doc, None, Some(5)), (10, 5));
        assert_eq!(output_size(&doc, Some(3), Some(3)), (3, 3));
    }

    #[test]
    fn test_svg_to_bmp() {
        let mut options = ConvertOptions::default();
        options.svg_bmp.bit_depth = 32;
        let out = SvgToBmp::new(solid())
            .convert(SVG.as_bytes(), &options, None)
            .unwrap();
        assert_eq!(out.mime_type, "image/bmp");
        assert_eq!(out.metadata.width, Some(20.0));
        assert_eq!(out.metadata.extra["bit_depth"], "32");
        let bytes = out.data.as_bytes();
        assert_eq!(&bytes[..2], b"BM");
        assert_eq!(bytes.len(), 54 + 20 * 4 * 10);
        let decoded = decode_bmp(bytes).unwrap();
        assert_eq!(decoded.pixel(19, 9), Some([255, 0, 0, 255]));
    }

    #[test]
    fn test_svg_to_bmp_rejects_bad_depth() {
        let mut options = ConvertOptions::default();
        options.svg_bmp.bit_depth = 2;
        let err = SvgToBmp::new(solid())
            .convert(SVG.as_bytes(), &options, None)
            .unwrap_err();
        assert_eq!(err.code(), "INVALID_OPTIONS");
    }

    #[test]
    fn test_svg_to_ico_sizes() {
        let mut options = ConvertOptions::default();
        options.svg_ico.sizes = vec![48, 16, 32, 16];
        let out = SvgToIco::new(solid())
            .convert(SVG.as_bytes(), &options, None)
            .unwrap();
        assert_eq!(out.mime_type, "image/x-icon");
        assert_eq!(out.metadata.extra["sizes"], "16,32,48");
        assert_eq!(out.metadata.width, Some(48.0));
        let file = IcoFile::parse(out.data.as_bytes()).unwrap();
        let widths: Vec<u32> = file.entries().iter().map(|e| e.width).collect();
        assert_eq!(widths, vec![16, 32, 48]);
    }

    #[test]
    fn test_svg_to_ico_no_sizes() {
        let mut options = ConvertOptions::default();
        options.svg_ico.sizes = vec![256];
        options.svg_ico.include_large = false;
        let err = SvgToIco::new(solid())
            .convert(SVG.as_bytes(), &options, None)
            .unwrap_err();
        assert_eq!(err.code(), "ICO_NO_SIZES");
    }

    #[test]
    fn test_render_failure_propagates() {
        let err = SvgToIco::new(Arc::new(Broken))
            .convert(SVG.as_bytes(), &ConvertOptions::default(), None)
            .unwrap_err();
        assert_eq!(err.code(), "SVG_RENDER_FAILED");
    }

    #[test]
    fn test_ico_to_svg_embeds_png() {
        let images = vec![
            RasterImage::filled(16, 16, [0, 0, 255, 255]),
            RasterImage::filled(32, 32, [0, 255, 0, 255]),
        ];
        let ico = encode_ico(&images, true).unwrap();

        let out = IcoToSvg
            .convert(&ico, &ConvertOptions::default(), None)
            .unwrap();
        assert_eq!(out.metadata.width, Some(32.0));
        let svg = out.data.as_text().unwrap();
        assert!(svg.contains(r#"viewBox="0 0 32 32""#));

        let start = svg.find("base64,").unwrap() + 7;
        let end = start + svg[start..].find('"').unwrap();
        let png = STANDARD.decode(&svg[start..end]).unwrap();
        let decoded = RasterImage::from_png(&png).unwrap();
        assert_eq!(decoded, images[1]);

        let mut options = ConvertOptions::default();
        options.ico_svg.preferred_size = Some(16);
        let out = IcoToSvg.convert(&ico, &options, None).unwrap();
        assert_eq!(out.metadata.width, Some(16.0));
    }

    #[test]
    fn test_ico_to_svg_rejects_garbage() {
        let err = IcoToSvg
            .convert(b"\x00\x00\x02\x00\x01\x00", &ConvertOptions::default(), None)
            .unwrap_err();
        assert_eq!(err.code(), "ICO_INVALID_TYPE");
    }

    #[test]
    fn test_ico_to_bmp_dib_and_png_payloads() {
        let small = RasterImage::filled(16, 16, [0, 0, 255, 255]);
        let large = RasterImage::filled(256, 256, [0, 255, 0, 255]);
        let ico = encode_ico(&[small.clone(), large.clone()], true).unwrap();

        let mut options = ConvertOptions::default();
        options.ico_svg.preferred_size = Some(16);
        let out = IcoToBmp.convert(&ico, &options, None).unwrap();
        assert_eq!(out.mime_type, "image/bmp");
        assert_eq!(out.metadata.width, Some(16.0));
        assert_eq!(decode_bmp(out.data.as_bytes()).unwrap(), small);

        let out = IcoToBmp
            .convert(&ico, &ConvertOptions::default(), None)
            .unwrap();
        assert_eq!(out.metadata.height, Some(256.0));
        assert_eq!(decode_bmp(out.data.as_bytes()).unwrap(), large);
    }
}
