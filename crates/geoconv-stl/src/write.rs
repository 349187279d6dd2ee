//! STL export in both encodings.

use std::fmt::Write as _;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use geoconv_core::fmt::num;
use geoconv_core::{ByteWriter, Result};
use geoconv_math::Point3D;

use crate::{Mesh, StlEncoding};

fn xyz(p: &Point3D) -> String {
    format!("{} {} {}", num(p.x), num(p.y), num(p.z))
}

/// Render a mesh as ASCII STL. An empty mesh name becomes `mesh`.
pub fn to_ascii(mesh: &Mesh) -> String {
    let name = if mesh.name.trim().is_empty() {
        "mesh"
    } else {
        mesh.name.trim()
    };
    let mut out = String::with_capacity(64 + mesh.len() * 200);
    // Writing to a String cannot fail.
    let _ = writeln!(out, "solid {}", name);
    for t in &mesh.triangles {
        let _ = writeln!(out, "  facet normal {}", xyz(&t.normal));
        out.push_str("    outer loop\n");
        for v in &t.vertices {
            let _ = writeln!(out, "      vertex {}", xyz(v));
        }
        out.push_str("    endloop\n");
        out.push_str("  endfacet\n");
    }
    let _ = writeln!(out, "endsolid {}", name);
    out
}

/// Encode a mesh as binary STL.
///
/// `header` is written into the 80-byte header, truncated and zero padded.
/// Coordinates are narrowed to `f32`; the attribute field is zero.
pub fn to_binary(mesh: &Mesh, header: &str) -> Vec<u8> {
    let mut w = ByteWriter::with_capacity(84 + mesh.len() * 50);
    let bytes = header.as_bytes();
    let n = bytes.len().min(80);
    w.write_bytes(&bytes[..n]);
    w.write_zeros(80 - n);
    w.write_u32(mesh.len() as u32);
    for t in &mesh.triangles {
        for p in std::iter::once(&t.normal).chain(t.vertices.iter()) {
            w.write_f32(p.x as f32);
            w.write_f32(p.y as f32);
            w.write_f32(p.z as f32);
        }
        w.write_u16(0);
    }
    w.into_inner()
}

/// Write a mesh to a file in the given encoding.
pub fn export(mesh: &Mesh, path: impl AsRef<Path>, encoding: StlEncoding) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    match encoding {
        StlEncoding::Ascii => writer.write_all(to_ascii(mesh).as_bytes())?,
        StlEncoding::Binary => writer.write_all(&to_binary(mesh, &mesh.name))?,
    }
    writer.flush()?;
    Ok(())
}
