//! SVG rasterization with resvg.

use std::sync::{Arc, LazyLock};

use geoconv_core::{ConvertError, Result};
use geoconv_raster::{RasterImage, Rasterizer};
use resvg::tiny_skia::{Pixmap, Transform};
use resvg::usvg::{fontdb, Options, Tree};
use tracing::{debug, trace};

static SYSTEM_FONTS: LazyLock<Arc<fontdb::Database>> = LazyLock::new(|| {
    let mut db = fontdb::Database::new();
    db.load_system_fonts();
    debug!(faces = db.len(), "loaded system fonts");
    Arc::new(db)
});

fn render_failed(message: impl Into<String>) -> ConvertError {
    ConvertError::conversion("SVG_RENDER_FAILED", message)
}

/// [`Rasterizer`] backed by resvg.
///
/// Text renders with the system fonts, loaded once per process on first
/// use. [`ResvgRasterizer::without_fonts`] skips the font scan.
#[derive(Debug, Clone)]
pub struct ResvgRasterizer {
    fonts: Option<Arc<fontdb::Database>>,
}

impl Default for ResvgRasterizer {
    fn default() -> Self {
        Self::new()
    }
}

impl ResvgRasterizer {
    /// Rasterizer using the system fonts.
    pub fn new() -> Self {
        Self { fonts: None }
    }

    /// Rasterizer with an empty font database; text is not drawn.
    pub fn without_fonts() -> Self {
        Self {
            fonts: Some(Arc::new(fontdb::Database::new())),
        }
    }

    fn parse(&self, svg: &str) -> Result<Tree> {
        let mut options = Options::default();
        options.fontdb = match &self.fonts {
            Some(db) => Arc::clone(db),
            None => Arc::clone(&SYSTEM_FONTS),
        };
        Tree::from_str(svg, &options).map_err(|e| render_failed(format!("Failed to parse SVG: {}", e)))
    }
}

impl Rasterizer for ResvgRasterizer {
    fn rasterize(&self, svg: &str, width: u32, height: u32) -> Result<RasterImage> {
        let tree = self.parse(svg)?;
        let mut pixmap = Pixmap::new(width, height).ok_or_else(|| {
            render_failed(format!("Failed to create image buffer: {}x{}", width, height))
        })?;

        let size = tree.size();
        let (sw, sh) = (size.width(), size.height());
        if sw > 0.0 && sh > 0.0 {
            let scale = (width as f32 / sw).min(height as f32 / sh);
            let dx = (width as f32 - sw * scale) / 2.0;
            let dy = (height as f32 - sh * scale) / 2.0;
            let transform = Transform::from_scale(scale, scale).post_translate(dx, dy);
            resvg::render(&tree, transform, &mut pixmap.as_mut());
        }
        trace!(width, height, "rasterized SVG");

        let mut pixels = Vec::with_capacity(width as usize * height as usize * 4);
        for p in pixmap.pixels() {
            let c = p.demultiply();
            pixels.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
        }
        RasterImage::new(width, height, pixels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SQUARE: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" width="10" height="10"><rect width="10" height="10" fill="red"/></svg>"#;

    #[test]
    fn test_renders_at_requested_size() {
        let img = ResvgRasterizer::without_fonts().rasterize(SQUARE, 4, 4).unwrap();
        assert_eq!((img.width, img.height), (4, 4));
        assert_eq!(img.pixel(1, 1), Some([255, 0, 0, 255]));
    }

    #[test]
    fn test_fit_and_center() {
        let wide = r#"<svg xmlns="http://www.w3.org/2000/svg" width="20" height="10"><rect width="20" height="10" fill="blue"/></svg>"#;
        let img = ResvgRasterizer::without_fonts().rasterize(wide, 8, 8).unwrap();
        // Drawing occupies rows 2..6.
        assert_eq!(img.pixel(4, 0).map(|p| p[3]), Some(0));
        assert_eq!(img.pixel(4, 4), Some([0, 0, 255, 255]));
        assert_eq!(img.pixel(4, 7).map(|p| p[3]), Some(0));
    }

    #[test]
    fn test_invalid_svg() {
        let err = ResvgRasterizer::without_fonts()
            .rasterize("<svg", 4, 4)
            .unwrap_err();
        assert_eq!(err.code(), "SVG_RENDER_FAILED");
    }

    #[test]
    fn test_zero_size_buffer() {
        let err = ResvgRasterizer::without_fonts()
            .rasterize(SQUARE, 0, 4)
            .unwrap_err();
        assert_eq!(err.code(), "SVG_RENDER_FAILED");
    }
}
