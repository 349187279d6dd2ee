//! EPS to SVG.

use std::borrow::Cow;
use std::fmt::Write;
use std::sync::LazyLock;

use geoconv_core::fmt::num;
use geoconv_core::{ByteReader, ConvertError, Result};
use geoconv_svg::escape_xml;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{tokenize, Interpreter, Painted};

static BBOX_RE: LazyLock<Regex> = LazyLock::new(|| {
    let n = r"([-+]?(?:\d+\.?\d*|\.\d+))";
    Regex::new(&format!(r"%%BoundingBox:[ \t]*{n}[ \t]+{n}[ \t]+{n}[ \t]+{n}"))
        .expect("valid regex")
});

/// Magic of the DOS EPS binary header (`C5 D0 D3 C6`).
const DOS_EPS_MAGIC: [u8; 4] = [0xC5, 0xD0, 0xD3, 0xC6];

/// Options for EPS→SVG.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EpsSvgOptions {
    /// Line width in effect before the document sets one.
    pub stroke_width: f64,
    /// Straight segments per full turn when flattening `arc`.
    pub arc_segments_per_turn: usize,
}

impl Default for EpsSvgOptions {
    fn default() -> Self {
        Self {
            stroke_width: 1.0,
            arc_segments_per_turn: 72,
        }
    }
}

impl EpsSvgOptions {
    /// Reject negative widths and degenerate arc flattening.
    pub fn validate(&self) -> Result<()> {
        if !(self.stroke_width.is_finite() && self.stroke_width >= 0.0) {
            return Err(ConvertError::invalid_options(format!(
                "stroke_width must be non-negative, got {}",
                self.stroke_width
            )));
        }
        if !(4..=4096).contains(&self.arc_segments_per_turn) {
            return Err(ConvertError::invalid_options(format!(
                "arc_segments_per_turn must be between 4 and 4096, got {}",
                self.arc_segments_per_turn
            )));
        }
        Ok(())
    }
}

/// The `%%BoundingBox` DSC comment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// Lower-left x.
    pub llx: f64,
    /// Lower-left y.
    pub lly: f64,
    /// Upper-right x.
    pub urx: f64,
    /// Upper-right y.
    pub ury: f64,
}

impl BoundingBox {
    /// First complete `%%BoundingBox:` comment; `(atend)` placeholders are
    /// skipped in favor of the trailer value.
    pub fn find(source: &str) -> Option<Self> {
        let cap = BBOX_RE.captures(source)?;
        let v = |i: usize| cap[i].parse::<f64>().ok();
        Some(Self {
            llx: v(1)?,
            lly: v(2)?,
            urx: v(3)?,
            ury: v(4)?,
        })
    }

    /// `urx - llx`.
    pub fn width(&self) -> f64 {
        self.urx - self.llx
    }

    /// `ury - lly`.
    pub fn height(&self) -> f64 {
        self.ury - self.lly
    }
}

/// A converted EPS.
#[derive(Debug, Clone, PartialEq)]
pub struct EpsSvgRender {
    /// SVG text.
    pub svg: String,
    /// Bounding box width.
    pub width: f64,
    /// Bounding box height.
    pub height: f64,
    /// Painted elements written.
    pub element_count: usize,
}

/// PostScript section of an EPS file.
///
/// DOS EPS binaries (with a TIFF/WMF preview) carry the PostScript at an
/// offset named in their 30-byte header; plain EPS is returned whole.
pub fn extract_postscript(data: &[u8]) -> Result<Cow<'_, str>> {
    if !data.starts_with(&DOS_EPS_MAGIC) {
        return Ok(String::from_utf8_lossy(data));
    }
    let mut reader = ByteReader::new(data).with_code("EPS_MISSING_BOUNDING_BOX");
    reader.skip(4)?;
    let offset = reader.read_u32()? as usize;
    let length = reader.read_u32()? as usize;
    reader.seek(offset)?;
    let ps = reader.read_bytes(length.min(reader.remaining()))?;
    debug!(offset, length, "extracted PostScript from DOS EPS binary");
    Ok(String::from_utf8_lossy(ps))
}

/// Interpret an EPS file and collect what it paints as SVG.
///
/// Fails with `EPS_MISSING_BOUNDING_BOX` when there is no usable
/// `%%BoundingBox` and with `EPS_NO_PATHS` when nothing is painted.
pub fn read_eps(source: &str, options: &EpsSvgOptions) -> Result<EpsSvgRender> {
    options.validate()?;
    let bbox = BoundingBox::find(source).ok_or_else(|| {
        ConvertError::validation(
            "EPS_MISSING_BOUNDING_BOX",
            "Invalid EPS: missing %%BoundingBox comment",
        )
    })?;
    let (width, height) = (bbox.width(), bbox.height());

    let mut interp = Interpreter::new(bbox.llx, bbox.lly, height)
        .with_line_width(options.stroke_width)
        .with_arc_segments(options.arc_segments_per_turn);
    interp.run(&tokenize(source));
    let unknown: Vec<&str> = interp.unknown_operators().collect();
    if !unknown.is_empty() {
        debug!(operators = ?unknown, "ignored unknown PostScript operators");
    }
    let painted = interp.finish();
    if painted.is_empty() {
        return Err(ConvertError::conversion(
            "EPS_NO_PATHS",
            "No paths found in EPS file",
        ));
    }

    let mut svg = String::with_capacity(256 + painted.len() * 96);
    writeln!(svg, r#"<?xml version="1.0" encoding="UTF-8"?>"#)?;
    writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
        w = num(width),
        h = num(height)
    )?;
    for item in &painted {
        match item {
            Painted::Path { d, fill, stroke } => {
                write!(svg, r#"  <path d="{}" "#, d)?;
                match fill {
                    Some(color) => write!(svg, r#"fill="{}" "#, color.to_hex())?,
                    None => svg.push_str(r#"fill="none" "#),
                }
                match stroke {
                    Some((color, width)) => write!(
                        svg,
                        r#"stroke="{}" stroke-width="{}""#,
                        color.to_hex(),
                        num(*width)
                    )?,
                    None => svg.push_str(r#"stroke="none""#),
                }
                svg.push_str("/>\n");
            }
            Painted::Text {
                position,
                content,
                font_size,
                font_family,
                color,
            } => writeln!(
                svg,
                r#"  <text x="{}" y="{}" font-size="{}" font-family="{}" fill="{}">{}</text>"#,
                num(position.x),
                num(position.y),
                num(*font_size),
                escape_xml(font_family),
                color.to_hex(),
                escape_xml(content)
            )?,
        }
    }
    svg.push_str("</svg>\n");

    Ok(EpsSvgRender {
        svg,
        width,
        height,
        element_count: painted.len(),
    })
}
