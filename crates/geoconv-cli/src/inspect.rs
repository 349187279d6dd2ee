//! Structural summaries for `geoconv inspect`.

use std::fmt::Write;

use anyhow::{bail, Result};
use geoconv::{EpsSvgOptions, Format, RasterImage};
use geoconv_dxf::DxfDrawing;
use geoconv_eps::{extract_postscript, read_eps, BoundingBox};
use geoconv_raster::{BmpHeader, IcoFile, IconPayload};
use geoconv_stl::parse_stl;
use geoconv_svg::SvgDocument;

/// Describe `data` as `format`.
pub fn summarize(data: &[u8], format: Format) -> Result<String> {
    let mut out = String::new();
    writeln!(out, "format: {} ({} bytes)", format, data.len())?;
    match format {
        Format::Dxf => {
            let drawing = DxfDrawing::parse(&String::from_utf8_lossy(data))?;
            let bounds = drawing.bounds();
            writeln!(out, "entities: {}", drawing.entities.len())?;
            for (kind, count) in drawing.type_counts() {
                writeln!(out, "  {:<12} {}", kind, count)?;
            }
            if drawing.skipped > 0 {
                writeln!(out, "skipped: {}", drawing.skipped)?;
            }
            writeln!(out, "found types: {}", drawing.found_types.join(", "))?;
            writeln!(
                out,
                "bounds: ({}, {}) - ({}, {})",
                bounds.min_x, bounds.min_y, bounds.max_x, bounds.max_y
            )?;
        }
        Format::Stl => {
            let parsed = parse_stl(data)?;
            writeln!(out, "encoding: {}", parsed.encoding)?;
            writeln!(out, "name: {}", parsed.mesh.name)?;
            writeln!(out, "triangles: {}", parsed.mesh.len())?;
            if let Some((min, max)) = parsed.mesh.bounds() {
                writeln!(
                    out,
                    "bounds: ({}, {}, {}) - ({}, {}, {})",
                    min.x, min.y, min.z, max.x, max.y, max.z
                )?;
            }
        }
        Format::Svg => {
            let doc = SvgDocument::parse(&String::from_utf8_lossy(data))?;
            writeln!(out, "size: {} x {}", doc.width, doc.height)?;
            if let Some(vb) = doc.view_box {
                writeln!(
                    out,
                    "viewBox: {} {} {} {}",
                    vb.min_x, vb.min_y, vb.width, vb.height
                )?;
            }
            writeln!(out, "elements: {}", doc.elements.len())?;
            for (tag, count) in doc.tag_counts() {
                writeln!(out, "  {:<12} {}", tag, count)?;
            }
        }
        Format::Eps => {
            let source = extract_postscript(data)?;
            match BoundingBox::find(&source) {
                Some(bbox) => writeln!(
                    out,
                    "bounding box: {} {} {} {}",
                    bbox.llx, bbox.lly, bbox.urx, bbox.ury
                )?,
                None => writeln!(out, "bounding box: missing")?,
            }
            let painted = read_eps(&source, &EpsSvgOptions::default())
                .map(|r| r.element_count)
                .unwrap_or(0);
            writeln!(out, "painted elements: {}", painted)?;
        }
        Format::Bmp => {
            let header = BmpHeader::parse(data)?;
            writeln!(out, "size: {} x {}", header.width, header.height)?;
            writeln!(out, "bit depth: {}", header.bit_depth)?;
            writeln!(out, "compression: {}", header.compression)?;
            writeln!(out, "palette: {} colors", header.palette_len)?;
            writeln!(
                out,
                "rows: {}",
                if header.top_down { "top-down" } else { "bottom-up" }
            )?;
            writeln!(out, "pixel data offset: {}", header.data_offset)?;
        }
        Format::Ico => {
            let file = IcoFile::parse(data)?;
            writeln!(out, "icons: {}", file.entries().len())?;
            for entry in file.entries() {
                let kind = match file.payload(entry) {
                    Ok(IconPayload::Png(_)) => "png",
                    Ok(IconPayload::Dib(_)) => "dib",
                    Err(_) => "out of bounds",
                };
                writeln!(
                    out,
                    "  {}x{} {}bpp {} {} bytes at {}",
                    entry.width, entry.height, entry.bit_count, kind, entry.size, entry.offset
                )?;
            }
        }
        Format::Png => {
            let image = RasterImage::from_png(data)?;
            writeln!(out, "size: {} x {}", image.width, image.height)?;
        }
        other => bail!("inspect does not understand {} files", other),
    }
    Ok(out)
}
