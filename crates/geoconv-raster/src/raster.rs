//! RGBA pixel buffer and the rasterizer seam.

use geoconv_core::{ConvertError, Result};
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, ImageFormat};

/// An 8-bit straight-alpha RGBA image, rows top to bottom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// `width * height * 4` bytes.
    pub pixels: Vec<u8>,
}

impl RasterImage {
    /// Wrap an RGBA buffer, checking its length.
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            return Err(ConvertError::conversion(
                "CONVERSION_FAILED",
                format!(
                    "RGBA buffer for {}x{} needs {} bytes, got {}",
                    width,
                    height,
                    expected,
                    pixels.len()
                ),
            ));
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Image of a single color.
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        Self {
            width,
            height,
            pixels: rgba.repeat(width as usize * height as usize),
        }
    }

    /// Pixel at `(x, y)`, `None` outside the image.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        Some([
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ])
    }

    /// Rows top to bottom, 4 bytes per pixel.
    pub fn rows(&self) -> impl DoubleEndedIterator<Item = &[u8]> + ExactSizeIterator {
        self.pixels.chunks_exact((self.width as usize * 4).max(1))
    }

    /// Composite over an opaque background, returning RGB triples row-major.
    pub fn flatten(&self, background: [u8; 3]) -> Vec<[u8; 3]> {
        self.pixels
            .chunks_exact(4)
            .map(|p| {
                let a = u32::from(p[3]);
                let mix = |fg: u8, bg: u8| {
                    ((u32::from(fg) * a + u32::from(bg) * (255 - a) + 127) / 255) as u8
                };
                [
                    mix(p[0], background[0]),
                    mix(p[1], background[1]),
                    mix(p[2], background[2]),
                ]
            })
            .collect()
    }

    /// Encode as PNG.
    pub fn to_png(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        PngEncoder::new(&mut out)
            .write_image(&self.pixels, self.width, self.height, ExtendedColorType::Rgba8)
            .map_err(|e| {
                ConvertError::conversion("CONVERSION_FAILED", format!("PNG encoding failed: {}", e))
            })?;
        Ok(out)
    }

    /// Decode a PNG into RGBA.
    pub fn from_png(data: &[u8]) -> Result<Self> {
        let decoded = image::load_from_memory_with_format(data, ImageFormat::Png)
            .map_err(|e| ConvertError::validation("ICO_INVALID_DATA", format!("Invalid PNG: {}", e)))?
            .to_rgba8();
        let (width, height) = decoded.dimensions();
        Ok(Self {
            width,
            height,
            pixels: decoded.into_raw(),
        })
    }
}

/// Turns SVG text into pixels.
///
/// Implementations scale the drawing to fit `width` x `height`, preserving
/// its aspect ratio and centering it; uncovered pixels are transparent.
pub trait Rasterizer: Send + Sync {
    /// Render `svg` at the requested size.
    fn rasterize(&self, svg: &str, width: u32, height: u32) -> Result<RasterImage>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_checks_length() {
        assert!(RasterImage::new(2, 2, vec![0; 16]).is_ok());
        let err = RasterImage::new(2, 2, vec![0; 15]).unwrap_err();
        assert_eq!(err.code(), "CONVERSION_FAILED");
    }

    #[test]
    fn test_pixel_access() {
        let img = RasterImage::filled(2, 1, [1, 2, 3, 4]);
        assert_eq!(img.pixel(1, 0), Some([1, 2, 3, 4]));
        assert_eq!(img.pixel(2, 0), None);
        assert_eq!(img.rows().len(), 1);
    }

    #[test]
    fn test_flatten_alpha() {
        let img = RasterImage::new(3, 1, vec![255, 0, 0, 255, 255, 0, 0, 0, 0, 0, 0, 128]).unwrap();
        assert_eq!(
            img.flatten([255, 255, 255]),
            vec![[255, 0, 0], [255, 255, 255], [127, 127, 127]]
        );
    }

    #[test]
    fn test_png_round_trip() {
        let img = RasterImage::new(2, 1, vec![10, 20, 30, 255, 0, 0, 0, 0]).unwrap();
        let png = img.to_png().unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
        assert_eq!(RasterImage::from_png(&png).unwrap(), img);
    }
}
