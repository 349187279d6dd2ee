#![warn(missing_docs)]

//! Encapsulated PostScript for geoconv.
//!
//! Two directions with very different depth:
//!
//! - [`write_eps`] lays an [`SvgDocument`](geoconv_svg::SvgDocument) out as a
//!   single-page EPS with a short-alias prolog and a Y flip so SVG
//!   coordinates can be written unchanged.
//! - [`read_eps`] runs a small PostScript interpreter over the drawing
//!   subset (paths, painting, graphics state, simple text) and collects
//!   whatever gets painted as SVG elements. There is no font machinery,
//!   clipping, images or control flow.
//!
//! # Example
//!
//! ```
//! use geoconv_eps::{read_eps, write_eps, EpsOptions, EpsSvgOptions};
//! use geoconv_svg::SvgDocument;
//!
//! let doc = SvgDocument::parse(
//!     r#"<svg width="40" height="20"><rect x="0" y="0" width="10" height="5" fill="red"/></svg>"#,
//! ).unwrap();
//! let eps = write_eps(&doc, &EpsOptions::default()).unwrap();
//! assert!(eps.contains("%%BoundingBox: 0 0 40 20"));
//!
//! let back = read_eps(&eps, &EpsSvgOptions::default()).unwrap();
//! assert_eq!(back.element_count, 1);
//! assert!(back.svg.contains(r##"fill="#ff0000""##));
//! ```

mod color;
mod interp;
mod lexer;
mod reader;
mod writer;

pub use color::ColorMode;
pub use interp::{Interpreter, Painted};
pub use lexer::{tokenize, Token};
pub use reader::{extract_postscript, read_eps, BoundingBox, EpsSvgOptions, EpsSvgRender};
pub use writer::{escape_ps, transform_to_ps, write_eps, EpsOptions};
