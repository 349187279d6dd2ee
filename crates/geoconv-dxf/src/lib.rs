#![warn(missing_docs)]

//! DXF support for geoconv.
//!
//! Reading goes through three layers:
//!
//! 1. [`reader`] splits the text into `(group code, value)` pairs and
//!    locates the `ENTITIES` section.
//! 2. [`DxfDrawing::parse`] groups pairs into records and decodes the
//!    supported entity kinds into [`DxfEntity`] values. A malformed record
//!    is logged and skipped; the parse only fails when nothing decodes.
//! 3. [`render_svg`] lays the entities out in an SVG document.
//!
//! The reverse direction builds a [`DxfDocument`] from SVG elements
//! ([`DxfDocument::from_svg`]) and writes it as ASCII DXF.
//!
//! # Example
//!
//! ```
//! use geoconv_dxf::{render_svg, DxfDrawing, DxfSvgOptions};
//!
//! let dxf = "0\nSECTION\n2\nENTITIES\n0\nLINE\n8\n0\n10\n0\n20\n0\n11\n10\n21\n0\n0\nENDSEC\n0\nEOF\n";
//! let drawing = DxfDrawing::parse(dxf).unwrap();
//! let svg = render_svg(&drawing, &DxfSvgOptions::default()).unwrap();
//! assert!(svg.svg.contains(r#"<line x1="0" y1="0" x2="10" y2="0""#));
//! ```

mod entity;
mod import;
mod mtext;
mod parser;
pub mod reader;
mod spline;
mod svg;
mod writer;

pub use entity::{
    aci_to_hex, Arc, Circle, DrawingEntity, DxfEntity, EntityProps, HAlign, Hatch, Line, Polyline,
    Spline, Text, TextKind, VAlign,
};
pub use mtext::{decode_text_codes, strip_mtext};
pub use parser::{DxfDrawing, SUPPORTED_ENTITY_TYPES};
pub use spline::spline_path;
pub use svg::{render_svg, DxfSvgOptions, SvgRender};
pub use writer::{DxfDocument, DxfWriteOptions};
