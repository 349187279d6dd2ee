//! Uncompressed Windows bitmaps.
//!
//! Layout: 14-byte `BITMAPFILEHEADER`, 40-byte `BITMAPINFOHEADER`, an
//! optional color table, then pixel rows padded to four bytes. A negative
//! height means rows are stored top to bottom.

use geoconv_core::{ByteReader, ByteWriter, ConvertError, Result};
use tracing::trace;

use crate::RasterImage;

/// Bit depths the encoder and decoder handle.
pub const SUPPORTED_BIT_DEPTHS: [u16; 6] = [1, 4, 8, 16, 24, 32];

const FILE_HEADER_LEN: usize = 14;
const INFO_HEADER_LEN: u32 = 40;
/// 72 DPI.
const PIXELS_PER_METER: i32 = 2835;
const BI_RGB: u32 = 0;

/// Bytes per stored row: `ceil(width * bit_depth / 32) * 4`.
pub fn row_size(width: u32, bit_depth: u16) -> usize {
    (width as usize * bit_depth as usize).div_ceil(32) * 4
}

fn palette_len(bit_depth: u16) -> usize {
    if bit_depth <= 8 {
        1 << bit_depth
    } else {
        0
    }
}

fn check_depth(bit_depth: u16) -> Result<()> {
    if SUPPORTED_BIT_DEPTHS.contains(&bit_depth) {
        Ok(())
    } else {
        Err(ConvertError::invalid_options(format!(
            "bit_depth must be one of 1, 4, 8, 16, 24 or 32, got {}",
            bit_depth
        )))
    }
}

/// Integer Rec. 601 luma.
fn luma([r, g, b]: [u8; 3]) -> u32 {
    (299 * u32::from(r) + 587 * u32::from(g) + 114 * u32::from(b) + 500) / 1000
}

/// Encode an image as a top-down BMP.
///
/// Depths below 32 drop alpha by compositing over `background`. Depths of
/// 8 and below use a gray ramp color table (`gray_i = i * 255 / (n - 1)`),
/// 16 bits is RGB 5-5-5, 24 is BGR and 32 is BGRA.
pub fn encode_bmp(image: &RasterImage, bit_depth: u16, background: [u8; 3]) -> Result<Vec<u8>> {
    check_depth(bit_depth)?;
    let width = i32::try_from(image.width)
        .map_err(|_| ConvertError::invalid_options("image too wide for BMP"))?;
    let height = i32::try_from(image.height)
        .map_err(|_| ConvertError::invalid_options("image too tall for BMP"))?;

    let row = row_size(image.width, bit_depth);
    let colors = palette_len(bit_depth);
    let header_size = FILE_HEADER_LEN + INFO_HEADER_LEN as usize + colors * 4;
    let pixel_size = row * image.height as usize;
    let file_size = header_size + pixel_size;

    let mut w = ByteWriter::with_capacity(file_size);
    w.write_bytes(b"BM");
    w.write_u32(file_size as u32);
    w.write_u32(0);
    w.write_u32(header_size as u32);

    w.write_u32(INFO_HEADER_LEN);
    w.write_i32(width);
    w.write_i32(-height);
    w.write_u16(1);
    w.write_u16(bit_depth);
    w.write_u32(BI_RGB);
    w.write_u32(pixel_size as u32);
    w.write_i32(PIXELS_PER_METER);
    w.write_i32(PIXELS_PER_METER);
    w.write_u32(colors as u32);
    w.write_u32(colors as u32);

    for i in 0..colors {
        let gray = (i * 255 / (colors - 1)) as u8;
        w.write_bytes(&[gray, gray, gray, 0]);
    }

    let flat = if bit_depth == 32 {
        Vec::new()
    } else {
        image.flatten(background)
    };
    let width = image.width as usize;
    let mut line = Vec::with_capacity(row);
    for y in 0..image.height as usize {
        line.clear();
        match bit_depth {
            32 => {
                for p in image.pixels[y * width * 4..(y + 1) * width * 4].chunks_exact(4) {
                    line.extend_from_slice(&[p[2], p[1], p[0], p[3]]);
                }
            }
            24 => {
                for p in &flat[y * width..(y + 1) * width] {
                    line.extend_from_slice(&[p[2], p[1], p[0]]);
                }
            }
            16 => {
                for p in &flat[y * width..(y + 1) * width] {
                    let v = (u16::from(p[0] >> 3) << 10)
                        | (u16::from(p[1] >> 3) << 5)
                        | u16::from(p[2] >> 3);
                    line.extend_from_slice(&v.to_le_bytes());
                }
            }
            _ => {
                let max_index = colors as u32 - 1;
                let per_byte = 8 / bit_depth as usize;
                for chunk in flat[y * width..(y + 1) * width].chunks(per_byte) {
                    let mut byte = 0u8;
                    for (i, p) in chunk.iter().enumerate() {
                        let index = (luma(*p) * max_index + 127) / 255;
                        let shift = 8 - bit_depth as usize * (i + 1);
                        byte |= (index as u8) << shift;
                    }
                    line.push(byte);
                }
            }
        }
        line.resize(row, 0);
        w.write_bytes(&line);
    }

    let out = w.into_inner();
    trace!(bytes = out.len(), bit_depth, "encoded BMP");
    Ok(out)
}

/// The parsed `BITMAPINFOHEADER` fields that matter for decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct DibInfo {
    pub header_size: u32,
    pub width: i32,
    pub height: i32,
    pub bit_depth: u16,
    pub compression: u32,
    pub colors_used: u32,
}

impl DibInfo {
    pub(crate) fn parse(dib: &[u8], code: &'static str) -> Result<Self> {
        let mut r = ByteReader::new(dib).with_code(code);
        let header_size = r.read_u32()?;
        if header_size < INFO_HEADER_LEN {
            return Err(ConvertError::validation(
                "BMP_UNSUPPORTED",
                format!("Unsupported BMP: {}-byte core header", header_size),
            ));
        }
        let width = r.read_i32()?;
        let height = r.read_i32()?;
        let _planes = r.read_u16()?;
        let bit_depth = r.read_u16()?;
        let compression = r.read_u32()?;
        r.skip(12)?; // image size, resolution
        let colors_used = r.read_u32()?;
        Ok(Self {
            header_size,
            width,
            height,
            bit_depth,
            compression,
            colors_used,
        })
    }

    pub(crate) fn palette_len(&self) -> usize {
        match (self.bit_depth, self.colors_used) {
            (d, 0) => palette_len(d),
            (d, n) if d <= 8 => (n as usize).min(palette_len(d)),
            (_, n) => n as usize,
        }
    }

    fn check_supported(&self) -> Result<()> {
        if !SUPPORTED_BIT_DEPTHS.contains(&self.bit_depth) {
            return Err(ConvertError::validation(
                "BMP_UNSUPPORTED",
                format!("Unsupported BMP bit depth {}", self.bit_depth),
            ));
        }
        if self.compression != BI_RGB {
            return Err(ConvertError::validation(
                "BMP_UNSUPPORTED",
                format!("Unsupported BMP compression {}", self.compression),
            ));
        }
        Ok(())
    }
}

/// Decode stored rows into RGBA.
///
/// `pixels` starts at the first stored row. Missing data is an error under
/// `code`; palette indexes past the table read as black.
pub(crate) fn decode_rows(
    info: &DibInfo,
    palette: &[u8],
    pixels: &[u8],
    rows: u32,
    top_down: bool,
    code: &'static str,
) -> Result<RasterImage> {
    info.check_supported()?;
    if info.width <= 0 || rows == 0 {
        return Err(ConvertError::validation(
            code,
            format!("Invalid bitmap size {}x{}", info.width, rows),
        ));
    }
    let width = info.width as u32;
    let row = row_size(width, info.bit_depth);
    let needed = row
        .checked_mul(rows as usize)
        .filter(|n| *n <= pixels.len())
        .ok_or_else(|| {
            ConvertError::validation(
                code,
                format!(
                    "Truncated bitmap: {} rows of {} bytes need more than the {} available",
                    rows,
                    row,
                    pixels.len()
                ),
            )
        })?;
    trace!(width, rows, bit_depth = info.bit_depth, needed, "decoding bitmap rows");

    let color = |index: usize| -> [u8; 4] {
        match palette.get(index * 4..index * 4 + 3) {
            Some(bgr) => [bgr[2], bgr[1], bgr[0], 255],
            None => [0, 0, 0, 255],
        }
    };

    let mut out = Vec::with_capacity(width as usize * rows as usize * 4);
    for y in 0..rows as usize {
        let stored = if top_down { y } else { rows as usize - 1 - y };
        let line = &pixels[stored * row..(stored + 1) * row];
        for x in 0..width as usize {
            let rgba = match info.bit_depth {
                32 => {
                    let p = &line[x * 4..x * 4 + 4];
                    [p[2], p[1], p[0], p[3]]
                }
                24 => {
                    let p = &line[x * 3..x * 3 + 3];
                    [p[2], p[1], p[0], 255]
                }
                16 => {
                    let v = u16::from_le_bytes([line[x * 2], line[x * 2 + 1]]);
                    let expand = |c: u16| ((u32::from(c & 0x1f) * 255 + 15) / 31) as u8;
                    [expand(v >> 10), expand(v >> 5), expand(v), 255]
                }
                depth => {
                    let depth = depth as usize;
                    let bit = x * depth;
                    let shift = 8 - depth - bit % 8;
                    let mask = ((1u16 << depth) - 1) as u8;
                    color(usize::from((line[bit / 8] >> shift) & mask))
                }
            };
            out.extend_from_slice(&rgba);
        }
    }

    if info.bit_depth == 32 && out.chunks_exact(4).all(|p| p[3] == 0) {
        // An all-zero alpha channel means the fourth byte is unused.
        out.chunks_exact_mut(4).for_each(|p| p[3] = 255);
    }
    RasterImage::new(width, rows, out)
}

/// Summary of a BMP file's headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BmpHeader {
    /// Declared file size.
    pub file_size: u32,
    /// Offset of the first pixel row.
    pub data_offset: u32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Rows stored top to bottom.
    pub top_down: bool,
    /// Bits per pixel.
    pub bit_depth: u16,
    /// Compression code, 0 for BI_RGB.
    pub compression: u32,
    /// Color table entries.
    pub palette_len: usize,
}

impl BmpHeader {
    /// Read the file and info headers. Fails with `BMP_INVALID`.
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < FILE_HEADER_LEN + INFO_HEADER_LEN as usize || !data.starts_with(b"BM") {
            return Err(ConvertError::validation(
                "BMP_INVALID",
                "Invalid BMP: missing BM signature or headers",
            ));
        }
        let mut r = ByteReader::new(data).with_code("BMP_INVALID");
        r.skip(2)?;
        let file_size = r.read_u32()?;
        r.skip(4)?;
        let data_offset = r.read_u32()?;
        let info = DibInfo::parse(&data[FILE_HEADER_LEN..], "BMP_INVALID")?;
        Ok(Self {
            file_size,
            data_offset,
            width: info.width.unsigned_abs(),
            height: info.height.unsigned_abs(),
            top_down: info.height < 0,
            bit_depth: info.bit_depth,
            compression: info.compression,
            palette_len: info.palette_len(),
        })
    }
}

/// Decode a BI_RGB BMP of depth 1, 4, 8, 16, 24 or 32 into RGBA.
///
/// Fails with `BMP_INVALID` for malformed or truncated files and
/// `BMP_UNSUPPORTED` for other depths or compressed data.
pub fn decode_bmp(data: &[u8]) -> Result<RasterImage> {
    let header = BmpHeader::parse(data)?;
    let dib = &data[FILE_HEADER_LEN..];
    let info = DibInfo::parse(dib, "BMP_INVALID")?;
    let palette_start = info.header_size as usize;
    let palette = dib
        .get(palette_start..palette_start + info.palette_len() * 4)
        .unwrap_or_default();
    let pixels = data.get(header.data_offset as usize..).ok_or_else(|| {
        ConvertError::validation(
            "BMP_INVALID",
            format!("Invalid BMP: pixel offset {} past end of file", header.data_offset),
        )
    })?;
    decode_rows(
        &info,
        palette,
        pixels,
        header.height,
        header.top_down,
        "BMP_INVALID",
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(width: u32, height: u32) -> RasterImage {
        let mut pixels = Vec::new();
        for y in 0..height {
            for x in 0..width {
                pixels.extend_from_slice(&[(x * 40) as u8, (y * 60) as u8, 200, 255]);
            }
        }
        RasterImage::new(width, height, pixels).unwrap()
    }

    #[test]
    fn test_row_size() {
        assert_eq!(row_size(1, 1), 4);
        assert_eq!(row_size(33, 1), 8);
        assert_eq!(row_size(3, 24), 12);
        assert_eq!(row_size(4, 24), 12);
        assert_eq!(row_size(5, 4), 4);
        assert_eq!(row_size(3, 16), 8);
    }

    #[test]
    fn test_file_length_matches_padded_rows() {
        for depth in SUPPORTED_BIT_DEPTHS {
            for width in 1..=9 {
                let img = RasterImage::filled(width, 3, [10, 20, 30, 255]);
                let bmp = encode_bmp(&img, depth, [255, 255, 255]).unwrap();
                let table = if depth <= 8 { (1usize << depth) * 4 } else { 0 };
                assert_eq!(
                    bmp.len(),
                    54 + table + row_size(width, depth) * 3,
                    "depth {} width {}",
                    depth,
                    width
                );
            }
        }
    }

    #[test]
    fn test_header_fields() {
        let bmp = encode_bmp(&RasterImage::filled(2, 5, [0, 0, 0, 255]), 8, [255; 3]).unwrap();
        assert_eq!(&bmp[..2], b"BM");
        assert_eq!(u32::from_le_bytes(bmp[2..6].try_into().unwrap()) as usize, bmp.len());
        assert_eq!(u32::from_le_bytes(bmp[10..14].try_into().unwrap()), 54 + 1024);
        assert_eq!(i32::from_le_bytes(bmp[22..26].try_into().unwrap()), -5);
        assert_eq!(i32::from_le_bytes(bmp[38..42].try_into().unwrap()), 2835);
        // Last palette entry is white.
        assert_eq!(&bmp[54 + 255 * 4..54 + 256 * 4], &[255, 255, 255, 0]);
    }

    #[test]
    fn test_round_trip_true_color() {
        let img = gradient(5, 3);
        assert_eq!(decode_bmp(&encode_bmp(&img, 24, [0; 3]).unwrap()).unwrap(), img);
        assert_eq!(decode_bmp(&encode_bmp(&img, 32, [0; 3]).unwrap()).unwrap(), img);
    }

    #[test]
    fn test_round_trip_16_bit_primaries() {
        let img = RasterImage::new(3, 1, vec![255, 0, 0, 255, 0, 255, 0, 255, 0, 0, 255, 255])
            .unwrap();
        assert_eq!(decode_bmp(&encode_bmp(&img, 16, [0; 3]).unwrap()).unwrap(), img);
    }

    #[test]
    fn test_round_trip_gray_palettes() {
        let levels: Vec<u8> = (0..16).map(|i| i * 17).collect();
        let pixels: Vec<u8> = levels.iter().flat_map(|&v| [v, v, v, 255]).collect();
        let img = RasterImage::new(16, 1, pixels).unwrap();
        assert_eq!(decode_bmp(&encode_bmp(&img, 4, [0; 3]).unwrap()).unwrap(), img);
        assert_eq!(decode_bmp(&encode_bmp(&img, 8, [0; 3]).unwrap()).unwrap(), img);

        let bw = RasterImage::new(2, 1, vec![0, 0, 0, 255, 255, 255, 255, 255]).unwrap();
        let bmp = encode_bmp(&bw, 1, [0; 3]).unwrap();
        // One row: 0b01000000 then padding.
        assert_eq!(&bmp[62..66], &[0b0100_0000, 0, 0, 0]);
        assert_eq!(decode_bmp(&bmp).unwrap(), bw);
    }

    #[test]
    fn test_transparent_pixels_use_background() {
        let img = RasterImage::filled(1, 1, [0, 0, 0, 0]);
        let decoded = decode_bmp(&encode_bmp(&img, 24, [255, 255, 255]).unwrap()).unwrap();
        assert_eq!(decoded.pixel(0, 0), Some([255, 255, 255, 255]));
    }

    #[test]
    fn test_bottom_up_rows() {
        let img = gradient(1, 2);
        let mut bmp = encode_bmp(&img, 24, [0; 3]).unwrap();
        bmp[22..26].copy_from_slice(&2i32.to_le_bytes());
        let (top, bottom) = bmp[54..62].split_at_mut(4);
        top.swap_with_slice(bottom);
        assert_eq!(decode_bmp(&bmp).unwrap(), img);
        assert!(!BmpHeader::parse(&bmp).unwrap().top_down);
    }

    #[test]
    fn test_invalid_inputs() {
        assert_eq!(decode_bmp(b"PK\x03\x04").unwrap_err().code(), "BMP_INVALID");

        let mut bmp = encode_bmp(&gradient(2, 2), 24, [0; 3]).unwrap();
        bmp.truncate(bmp.len() - 4);
        assert_eq!(decode_bmp(&bmp).unwrap_err().code(), "BMP_INVALID");

        let mut rle = encode_bmp(&gradient(2, 2), 8, [0; 3]).unwrap();
        rle[30] = 1;
        assert_eq!(decode_bmp(&rle).unwrap_err().code(), "BMP_UNSUPPORTED");

        let err = encode_bmp(&gradient(1, 1), 12, [0; 3]).unwrap_err();
        assert_eq!(err.code(), "INVALID_OPTIONS");
    }
}
