//! STL reading with ASCII/binary detection.

use geoconv_core::{ByteReader, ConvertError, Result};
use geoconv_math::Point3D;
use tracing::{debug, warn};

use crate::{Mesh, StlEncoding, Triangle};

const HEADER_LEN: usize = 80;
const RECORD_LEN: usize = 50;
const MIN_BINARY_LEN: usize = HEADER_LEN + 4;

/// A parsed STL file.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedStl {
    /// Decoded triangles.
    pub mesh: Mesh,
    /// Detected encoding.
    pub encoding: StlEncoding,
}

fn looks_ascii(data: &[u8]) -> bool {
    if !data.starts_with(b"solid") {
        return false;
    }
    let text = String::from_utf8_lossy(data);
    text.contains("facet") && text.contains("vertex")
}

/// Parse STL bytes, detecting the encoding.
///
/// Data starting with `solid` that also contains `facet` and `vertex` is
/// ASCII. Anything else must be a binary STL of at least 84 bytes whose
/// declared triangle count fits the buffer.
pub fn parse_stl(data: &[u8]) -> Result<ParsedStl> {
    if looks_ascii(data) {
        let text = String::from_utf8_lossy(data);
        return Ok(ParsedStl {
            mesh: parse_ascii(&text)?,
            encoding: StlEncoding::Ascii,
        });
    }
    if data.len() < MIN_BINARY_LEN {
        if data.starts_with(b"solid") {
            return Err(ConvertError::validation(
                "STL_MISSING_MARKERS",
                "Invalid STL: Missing STL markers",
            ));
        }
        return Err(ConvertError::validation(
            "STL_TOO_SMALL",
            format!(
                "Invalid STL: File too small ({} bytes, binary STL needs at least {})",
                data.len(),
                MIN_BINARY_LEN
            ),
        ));
    }
    Ok(ParsedStl {
        mesh: parse_binary(data)?,
        encoding: StlEncoding::Binary,
    })
}

fn parse_coords<'a>(tokens: &mut impl Iterator<Item = &'a str>) -> Option<Point3D> {
    let mut next = || tokens.next().and_then(|t| t.parse::<f64>().ok());
    Some(Point3D::new(next()?, next()?, next()?))
}

/// Parse ASCII STL text.
///
/// Token based, so line breaks are irrelevant. A facet with a malformed
/// number or without exactly three vertices is skipped. Fails with
/// `STL_MISSING_MARKERS` when neither `solid` nor `facet` appears.
pub fn parse_ascii(text: &str) -> Result<Mesh> {
    if !text.contains("solid") && !text.contains("facet") {
        return Err(ConvertError::validation(
            "STL_MISSING_MARKERS",
            "Invalid STL: Missing STL markers",
        ));
    }

    let mut name = String::new();
    let mut triangles = Vec::new();
    let mut skipped = 0usize;

    let mut tokens = text.split_whitespace().peekable();
    let mut normal: Option<Point3D> = None;
    let mut vertices: Vec<Point3D> = Vec::with_capacity(3);
    let mut in_facet = false;
    let mut facet_ok = true;

    while let Some(token) = tokens.next() {
        match token {
            "solid" if !in_facet && triangles.is_empty() && name.is_empty() => {
                if let Some(&next) = tokens.peek() {
                    if next != "facet" && next != "endsolid" {
                        name = next.to_string();
                        tokens.next();
                    }
                }
            }
            "facet" => {
                in_facet = true;
                facet_ok = true;
                vertices.clear();
                normal = None;
                if tokens.peek() == Some(&"normal") {
                    tokens.next();
                    normal = parse_coords(&mut tokens);
                    facet_ok &= normal.is_some();
                }
            }
            "vertex" if in_facet => match parse_coords(&mut tokens) {
                Some(v) => vertices.push(v),
                None => facet_ok = false,
            },
            "endfacet" if in_facet => {
                in_facet = false;
                if facet_ok && vertices.len() == 3 {
                    let vs = [vertices[0], vertices[1], vertices[2]];
                    triangles.push(Triangle::with_normal(vs, normal.unwrap_or_default()));
                } else {
                    skipped += 1;
                }
            }
            _ => {}
        }
    }

    if skipped > 0 {
        debug!(skipped, "skipped malformed ASCII STL facets");
    }
    Ok(Mesh::new(name, triangles))
}

fn read_vec(r: &mut ByteReader<'_>) -> Result<Point3D> {
    Ok(Point3D::new(
        f64::from(r.read_f32()?),
        f64::from(r.read_f32()?),
        f64::from(r.read_f32()?),
    ))
}

/// Parse binary STL bytes.
///
/// Fails with `STL_TOO_SMALL` under 84 bytes and `STL_TRUNCATED` when the
/// declared triangle count needs more bytes than are present.
pub fn parse_binary(data: &[u8]) -> Result<Mesh> {
    if data.len() < MIN_BINARY_LEN {
        return Err(ConvertError::validation(
            "STL_TOO_SMALL",
            "Invalid STL: File too small",
        ));
    }
    let mut reader = ByteReader::new(data).with_code("STL_TRUNCATED");
    let header = reader.read_bytes(HEADER_LEN)?;
    let count = reader.read_u32()? as usize;

    let expected = count
        .checked_mul(RECORD_LEN)
        .and_then(|n| n.checked_add(MIN_BINARY_LEN))
        .ok_or_else(|| {
            ConvertError::validation(
                "STL_TRUNCATED",
                format!("Invalid STL: triangle count {} overflows", count),
            )
        })?;
    if data.len() < expected {
        return Err(ConvertError::validation(
            "STL_TRUNCATED",
            format!(
                "Invalid STL: expected {} bytes for {} triangles, got {}",
                expected,
                count,
                data.len()
            ),
        ));
    }
    if data.len() > expected {
        warn!(
            extra = data.len() - expected,
            "binary STL has trailing bytes after the last triangle"
        );
    }

    let mut triangles = Vec::with_capacity(count);
    for _ in 0..count {
        let normal = read_vec(&mut reader)?;
        let a = read_vec(&mut reader)?;
        let b = read_vec(&mut reader)?;
        let c = read_vec(&mut reader)?;
        reader.skip(2)?; // attribute byte count
        triangles.push(Triangle::with_normal([a, b, c], normal));
    }

    let name = String::from_utf8_lossy(header)
        .trim_end_matches('\0')
        .trim()
        .to_string();
    Ok(Mesh::new(name, triangles))
}
