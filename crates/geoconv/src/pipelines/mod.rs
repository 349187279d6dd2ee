//! Local converters, one per format pair.

mod dxf;
mod eps;
mod raster;
mod stl;

use std::borrow::Cow;
use std::sync::Arc;

use geoconv_raster::Rasterizer;

use crate::Converter;

pub use dxf::{DxfToSvg, SvgToDxf};
pub use eps::{EpsToSvg, SvgToEps};
pub use raster::{IcoToBmp, IcoToSvg, SvgToBmp, SvgToIco, SvgToPng};
pub use stl::{StlToSvg, SvgToStl};

/// Every local converter.
pub fn all(rasterizer: Arc<dyn Rasterizer>) -> Vec<Box<dyn Converter>> {
    vec![
        Box::new(DxfToSvg),
        Box::new(SvgToDxf),
        Box::new(StlToSvg),
        Box::new(SvgToStl),
        Box::new(SvgToEps),
        Box::new(EpsToSvg),
        Box::new(SvgToBmp::new(Arc::clone(&rasterizer))),
        Box::new(SvgToIco::new(Arc::clone(&rasterizer))),
        Box::new(SvgToPng::new(rasterizer)),
        Box::new(IcoToSvg),
        Box::new(IcoToBmp),
    ]
}

/// Input bytes as text; invalid UTF-8 sequences are replaced.
fn text(input: &[u8]) -> Cow<'_, str> {
    String::from_utf8_lossy(input)
}
