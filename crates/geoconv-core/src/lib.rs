#![warn(missing_docs)]

//! Shared building blocks for the geoconv format crates.
//!
//! Every format crate speaks the same contract:
//!
//! - [`ConvertError`] with a stable machine-readable code per failure
//! - [`Converted`] carrying the payload, its mime type and [`Metadata`]
//! - [`ProgressSink`] for coarse best-effort progress reporting
//! - [`ByteReader`] / [`ByteWriter`] for little-endian binary layouts
//!
//! # Example
//!
//! ```
//! use geoconv_core::{ByteWriter, ByteReader};
//!
//! let mut w = ByteWriter::new();
//! w.write_u32(42);
//! w.write_f32(1.5);
//! let bytes = w.into_inner();
//!
//! let mut r = ByteReader::new(&bytes);
//! assert_eq!(r.read_u32().unwrap(), 42);
//! assert_eq!(r.read_f32().unwrap(), 1.5);
//! ```

mod bytes;
mod error;
pub mod fmt;
mod progress;
mod result;

pub use bytes::{ByteReader, ByteWriter};
pub use error::{ConvertError, ErrorKind, Result};
pub use progress::{report, NoProgress, ProgressSink};
pub use result::{Converted, Metadata, Payload};
