#![warn(missing_docs)]

//! STL support for geoconv.
//!
//! - [`parse_stl`] reads ASCII or binary STL into a [`Mesh`]
//! - [`to_ascii`] / [`to_binary`] write a mesh back out
//! - [`extrude`] builds a closed prism from a 2D point ring
//! - [`render_svg`] projects a mesh onto a 2D view as SVG
//!
//! # Example
//!
//! ```
//! use geoconv_math::Point2D;
//! use geoconv_stl::{extrude, parse_stl, to_binary, Mesh};
//!
//! let square = [
//!     Point2D::new(0.0, 0.0),
//!     Point2D::new(10.0, 0.0),
//!     Point2D::new(10.0, 10.0),
//!     Point2D::new(0.0, 10.0),
//! ];
//! let mesh = Mesh::new("square", extrude(&square, 5.0));
//! assert_eq!(mesh.len(), 12);
//!
//! let parsed = parse_stl(&to_binary(&mesh, "square")).unwrap();
//! assert_eq!(parsed.mesh.len(), 12);
//! ```

mod extrude;
mod mesh;
mod parse;
mod svg;
mod write;

pub use extrude::extrude;
pub use mesh::{Mesh, StlEncoding, Triangle};
pub use parse::{parse_ascii, parse_binary, parse_stl, ParsedStl};
pub use svg::{render_svg, Rotation, StlSvgOptions, StlSvgRender};
pub use write::{export, to_ascii, to_binary};
