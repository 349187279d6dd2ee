#![warn(missing_docs)]

//! geoconv: convert between CAD, mesh, vector and raster formats.
//!
//! SVG is the hub format. Local converters cover:
//!
//! | From | To | Notes |
//! |------|----|-------|
//! | DXF | SVG | lines, arcs, polylines, splines, hatches, text |
//! | SVG | DXF | lines, circles, rects, polylines, paths |
//! | STL | SVG | front, top, side or isometric projection |
//! | SVG | STL | path extrusion, ASCII or binary |
//! | SVG | EPS | PostScript level 1 to 3, RGB, CMYK or gray |
//! | EPS | SVG | drawing subset of PostScript |
//! | SVG | BMP, PNG | rasterized with resvg |
//! | SVG | ICO | multi-size, PNG payload at 256 |
//! | ICO | SVG | embedded PNG |
//! | ICO | BMP | one icon, DIB kept as is |
//!
//! Every conversion goes through a [`Registry`], which applies the input
//! size limit and maps failures to stable error codes. Pairs without a
//! local converter can be delegated to a [`RemoteBackend`].
//!
//! # Example
//!
//! ```
//! use geoconv::{ConvertOptions, Format, Registry, Request};
//!
//! let dxf = "0\nSECTION\n2\nENTITIES\n0\nLINE\n10\n0\n20\n0\n11\n10\n21\n0\n0\nENDSEC\n0\nEOF\n";
//! let registry = Registry::new();
//! let out = registry
//!     .convert(
//!         &Request::new(dxf.as_bytes(), Format::Dxf, Format::Svg),
//!         &ConvertOptions::default(),
//!         None,
//!     )
//!     .unwrap();
//! assert_eq!(out.mime_type, "image/svg+xml");
//! assert_eq!(out.metadata.entity_count, Some(1));
//! assert!(out.data.as_text().unwrap().contains(r#"<line x1="0" y1="0" x2="10" y2="0""#));
//! ```

mod format;
mod options;
pub mod pipelines;
mod registry;
pub mod render;

pub use format::Format;
pub use options::{
    BmpOptions, ConfigError, ConvertOptions, IcoOptions, IcoSvgOptions, Limits, PngOptions,
    SvgStlOptions, MAX_RASTER_EDGE,
};
pub use registry::{Converter, Registry, RemoteBackend, Request};
pub use render::ResvgRasterizer;

pub use geoconv_core::{
    ConvertError, Converted, ErrorKind, Metadata, NoProgress, Payload, ProgressSink, Result,
};
pub use geoconv_dxf::{DxfSvgOptions, DxfWriteOptions};
pub use geoconv_eps::{ColorMode, EpsOptions, EpsSvgOptions};
pub use geoconv_math::View;
pub use geoconv_raster::{RasterImage, Rasterizer};
pub use geoconv_stl::{Rotation, StlEncoding, StlSvgOptions};

/// Convert with a default [`Registry`].
///
/// Builds the registry on each call; hold a [`Registry`] when converting
/// repeatedly.
pub fn convert(
    input: &[u8],
    from: Format,
    to: Format,
    options: &ConvertOptions,
) -> Result<Converted> {
    Registry::new().convert(&Request::new(input, from, to), options, None)
}
