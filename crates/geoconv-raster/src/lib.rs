#![warn(missing_docs)]

//! Raster containers for geoconv.
//!
//! Pixels travel as straight (not premultiplied) RGBA in a [`RasterImage`].
//! Producing pixels from vector input is abstracted behind [`Rasterizer`]
//! so this crate stays free of any renderer.
//!
//! - [`encode_bmp`] / [`decode_bmp`]: uncompressed BI_RGB bitmaps
//! - [`encode_ico`] / [`IcoFile`]: multi-size icons with PNG or DIB payloads
//!
//! # Example
//!
//! ```
//! use geoconv_raster::{decode_bmp, encode_bmp, RasterImage};
//!
//! let img = RasterImage::filled(3, 2, [255, 0, 0, 255]);
//! let bmp = encode_bmp(&img, 24, [255, 255, 255]).unwrap();
//! // 54-byte headers, rows of 9 bytes padded to 12.
//! assert_eq!(bmp.len(), 54 + 12 * 2);
//! assert_eq!(decode_bmp(&bmp).unwrap(), img);
//! ```

mod bmp;
mod ico;
mod raster;

pub use bmp::{decode_bmp, encode_bmp, row_size, BmpHeader, SUPPORTED_BIT_DEPTHS};
pub use ico::{encode_ico, normalize_sizes, IcoEntry, IcoFile, IconPayload, STANDARD_ICO_SIZES};
pub use raster::{RasterImage, Rasterizer};
