//! Windows icon files.
//!
//! An ICO is a 6-byte `ICONDIR`, one 16-byte `ICONDIRENTRY` per image and
//! the image payloads. A payload is either a complete PNG or a DIB: a
//! `BITMAPINFOHEADER` whose height counts both the color rows and the
//! 1-bit AND mask that follows them, with rows stored bottom up.

use geoconv_core::{ByteReader, ByteWriter, ConvertError, Result};
use tracing::{debug, trace};

use crate::bmp::{decode_rows, row_size, DibInfo};
use crate::RasterImage;

/// Sizes generated when none are requested.
pub const STANDARD_ICO_SIZES: [u32; 7] = [16, 24, 32, 48, 64, 128, 256];

const ICONDIR_LEN: usize = 6;
const ENTRY_LEN: usize = 16;
const DIB_HEADER_LEN: u32 = 40;
const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
/// Payloads at this size or above are stored as PNG.
const PNG_THRESHOLD: u32 = 256;

/// Keep sizes in `1..=256`, optionally drop 256, then sort and dedup.
///
/// Fails with `ICO_NO_SIZES` when nothing is left.
pub fn normalize_sizes(sizes: &[u32], include_large: bool) -> Result<Vec<u32>> {
    let mut out: Vec<u32> = sizes
        .iter()
        .copied()
        .filter(|s| (1..=256).contains(s))
        .filter(|s| include_large || *s < 256)
        .collect();
    out.sort_unstable();
    out.dedup();
    if out.is_empty() {
        return Err(ConvertError::conversion(
            "ICO_NO_SIZES",
            "No valid sizes specified for ICO generation",
        ));
    }
    Ok(out)
}

fn dib_payload(image: &RasterImage, and_mask: bool) -> Vec<u8> {
    let (w, h) = (image.width as usize, image.height as usize);
    let mask_row = row_size(image.width, 1);
    let color_size = w * h * 4;
    let mask_size = if and_mask { mask_row * h } else { 0 };

    let mut out = ByteWriter::with_capacity(DIB_HEADER_LEN as usize + color_size + mask_size);
    out.write_u32(DIB_HEADER_LEN);
    out.write_i32(image.width as i32);
    out.write_i32(image.height as i32 * 2);
    out.write_u16(1);
    out.write_u16(32);
    out.write_u32(0);
    out.write_u32((color_size + mask_size) as u32);
    out.write_i32(0);
    out.write_i32(0);
    out.write_u32(0);
    out.write_u32(0);

    for row in image.rows().rev() {
        for p in row.chunks_exact(4) {
            out.write_bytes(&[p[2], p[1], p[0], p[3]]);
        }
    }
    if and_mask {
        let mut line = vec![0u8; mask_row];
        for row in image.rows().rev() {
            line.fill(0);
            for (x, p) in row.chunks_exact(4).enumerate() {
                if p[3] == 0 {
                    line[x / 8] |= 0x80 >> (x % 8);
                }
            }
            out.write_bytes(&line);
        }
    }
    out.into_inner()
}

/// Pack images into an ICO file, one directory entry per image in order.
///
/// Images of 256 pixels or more are stored as PNG, smaller ones as 32-bit
/// DIBs, with a transparency AND mask when `and_mask` is set. Fails with
/// `ICO_NO_SIZES` for an empty list.
pub fn encode_ico(images: &[RasterImage], and_mask: bool) -> Result<Vec<u8>> {
    if images.is_empty() {
        return Err(ConvertError::conversion(
            "ICO_NO_SIZES",
            "No images to pack into ICO",
        ));
    }
    let mut payloads = Vec::with_capacity(images.len());
    for image in images {
        if image.width == 0 || image.height == 0 || image.width > 256 || image.height > 256 {
            return Err(ConvertError::conversion(
                "CONVERSION_FAILED",
                format!(
                    "ICO images must be 1 to 256 pixels, got {}x{}",
                    image.width, image.height
                ),
            ));
        }
        let payload = if image.width >= PNG_THRESHOLD || image.height >= PNG_THRESHOLD {
            image.to_png()?
        } else {
            dib_payload(image, and_mask)
        };
        payloads.push(payload);
    }

    let count = images.len();
    let total = ICONDIR_LEN + ENTRY_LEN * count + payloads.iter().map(Vec::len).sum::<usize>();
    let mut w = ByteWriter::with_capacity(total);
    w.write_u16(0);
    w.write_u16(1);
    w.write_u16(count as u16);

    let mut offset = ICONDIR_LEN + ENTRY_LEN * count;
    for (image, payload) in images.iter().zip(&payloads) {
        // A dimension byte of 0 means 256.
        w.write_u8((image.width % 256) as u8);
        w.write_u8((image.height % 256) as u8);
        w.write_u8(0);
        w.write_u8(0);
        w.write_u16(1);
        w.write_u16(32);
        w.write_u32(payload.len() as u32);
        w.write_u32(offset as u32);
        offset += payload.len();
    }
    for payload in &payloads {
        w.write_bytes(payload);
    }
    let out = w.into_inner();
    trace!(images = count, bytes = out.len(), "encoded ICO");
    Ok(out)
}

/// One `ICONDIRENTRY`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IcoEntry {
    /// Width, 256 when stored as 0.
    pub width: u32,
    /// Height, 256 when stored as 0.
    pub height: u32,
    /// Palette size, 0 for true color.
    pub color_count: u8,
    /// Color planes.
    pub planes: u16,
    /// Bits per pixel.
    pub bit_count: u16,
    /// Payload length.
    pub size: u32,
    /// Payload offset from the start of the file.
    pub offset: u32,
}

impl IcoEntry {
    /// Pixel area.
    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

/// An icon payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IconPayload<'a> {
    /// A complete PNG stream.
    Png(&'a [u8]),
    /// A headerless DIB with a doubled height.
    Dib(&'a [u8]),
}

impl IconPayload<'_> {
    /// Decode to RGBA.
    ///
    /// For DIBs the AND mask, when present, clears alpha on masked pixels
    /// unless the color data already carries alpha.
    pub fn decode(&self) -> Result<RasterImage> {
        let dib = match self {
            IconPayload::Png(png) => return RasterImage::from_png(png),
            IconPayload::Dib(dib) => *dib,
        };
        let info = DibInfo::parse(dib, "ICO_INVALID_DATA")?;
        let rows = info.height.unsigned_abs() / 2;
        let pixel_start = info.header_size as usize + info.palette_len() * 4;
        let palette = dib
            .get(info.header_size as usize..pixel_start)
            .unwrap_or_default();
        let pixels = dib.get(pixel_start..).ok_or_else(|| {
            ConvertError::validation("ICO_INVALID_DATA", "Invalid ICO: truncated DIB header")
        })?;
        let mut image = decode_rows(&info, palette, pixels, rows, false, "ICO_INVALID_DATA")?;

        let has_alpha = info.bit_depth == 32 && image.pixels.chunks_exact(4).any(|p| p[3] != 255);
        if has_alpha {
            return Ok(image);
        }
        let mask_start = row_size(image.width, info.bit_depth) * rows as usize;
        let mask_row = row_size(image.width, 1);
        let Some(mask) = pixels.get(mask_start..mask_start + mask_row * rows as usize) else {
            debug!("ICO DIB without AND mask");
            return Ok(image);
        };
        let width = image.width as usize;
        for y in 0..rows as usize {
            let line = &mask[(rows as usize - 1 - y) * mask_row..][..mask_row];
            for x in 0..width {
                if line[x / 8] & (0x80 >> (x % 8)) != 0 {
                    image.pixels[(y * width + x) * 4 + 3] = 0;
                }
            }
        }
        Ok(image)
    }

    /// PNG bytes, re-encoding DIB payloads.
    pub fn to_png(&self) -> Result<Vec<u8>> {
        match self {
            IconPayload::Png(png) => Ok(png.to_vec()),
            IconPayload::Dib(_) => self.decode()?.to_png(),
        }
    }

    /// Wrap a DIB payload into a standalone BMP file (color rows only).
    /// Returns `None` for PNG payloads.
    pub fn to_bmp_file(&self) -> Result<Option<Vec<u8>>> {
        let IconPayload::Dib(dib) = self else {
            return Ok(None);
        };
        let info = DibInfo::parse(dib, "ICO_INVALID_DATA")?;
        let pixel_offset = 14 + info.header_size as usize + info.palette_len() * 4;
        let rows = info.height.unsigned_abs() / 2;
        let color_len = row_size(info.width.unsigned_abs(), info.bit_depth) * rows as usize;
        let body_len = (info.header_size as usize + info.palette_len() * 4 + color_len).min(dib.len());

        let mut w = ByteWriter::with_capacity(14 + body_len);
        w.write_bytes(b"BM");
        w.write_u32((14 + body_len) as u32);
        w.write_u32(0);
        w.write_u32(pixel_offset as u32);
        let mut body = dib[..body_len].to_vec();
        // Real height in place of the doubled one.
        body[8..12].copy_from_slice(&(rows as i32).to_le_bytes());
        w.write_bytes(&body);
        Ok(Some(w.into_inner()))
    }
}

/// A parsed icon directory borrowing the file bytes.
#[derive(Debug, Clone)]
pub struct IcoFile<'a> {
    data: &'a [u8],
    entries: Vec<IcoEntry>,
}

impl<'a> IcoFile<'a> {
    /// Parse the header and directory.
    ///
    /// Fails with `ICO_INVALID_HEADER` under 6 bytes, `ICO_INVALID_TYPE`
    /// when the type is not 1, `ICO_NO_ICONS` for an empty directory and
    /// `ICO_INVALID_DIRECTORY` when the entries overrun the file.
    pub fn parse(data: &'a [u8]) -> Result<Self> {
        if data.len() < ICONDIR_LEN {
            return Err(ConvertError::validation(
                "ICO_INVALID_HEADER",
                "Invalid ICO file: too small",
            ));
        }
        let mut r = ByteReader::new(data).with_code("ICO_INVALID_DIRECTORY");
        let _reserved = r.read_u16()?;
        let kind = r.read_u16()?;
        let count = r.read_u16()? as usize;
        if kind != 1 {
            return Err(ConvertError::validation(
                "ICO_INVALID_TYPE",
                format!("Invalid ICO file: wrong type {}", kind),
            ));
        }
        if count == 0 {
            return Err(ConvertError::validation(
                "ICO_NO_ICONS",
                "Invalid ICO file: no icons found",
            ));
        }
        if ICONDIR_LEN + count * ENTRY_LEN > data.len() {
            return Err(ConvertError::validation(
                "ICO_INVALID_DIRECTORY",
                format!("Invalid ICO file: directory of {} entries overruns the file", count),
            ));
        }

        let mut entries = Vec::with_capacity(count);
        for _ in 0..count {
            let dim = |b: u8| if b == 0 { 256 } else { u32::from(b) };
            let width = dim(r.read_u8()?);
            let height = dim(r.read_u8()?);
            let color_count = r.read_u8()?;
            let _reserved = r.read_u8()?;
            entries.push(IcoEntry {
                width,
                height,
                color_count,
                planes: r.read_u16()?,
                bit_count: r.read_u16()?,
                size: r.read_u32()?,
                offset: r.read_u32()?,
            });
        }
        Ok(Self { data, entries })
    }

    /// Directory entries in file order; never empty.
    pub fn entries(&self) -> &[IcoEntry] {
        &self.entries
    }

    /// Pick an entry: an exact width match for `preferred`, else the
    /// closest width, else (no preference) the largest by area. Ties go to
    /// the earlier entry.
    pub fn select(&self, preferred: Option<u32>) -> &IcoEntry {
        let first = &self.entries[0];
        match preferred {
            Some(size) => self
                .entries
                .iter()
                .find(|e| e.width == size)
                .or_else(|| self.entries.iter().min_by_key(|e| e.width.abs_diff(size)))
                .unwrap_or(first),
            None => self
                .entries
                .iter()
                .fold(first, |best, e| if e.area() > best.area() { e } else { best }),
        }
    }

    /// Payload bytes for `entry`. Fails with `ICO_INVALID_DATA` when out of
    /// bounds.
    pub fn payload(&self, entry: &IcoEntry) -> Result<IconPayload<'a>> {
        let start = entry.offset as usize;
        let bytes = start
            .checked_add(entry.size as usize)
            .and_then(|end| self.data.get(start..end))
            .ok_or_else(|| {
                ConvertError::validation(
                    "ICO_INVALID_DATA",
                    format!(
                        "Invalid ICO file: data out of bounds ({} bytes at {}, file is {})",
                        entry.size,
                        entry.offset,
                        self.data.len()
                    ),
                )
            })?;
        Ok(if bytes.starts_with(&PNG_SIGNATURE) {
            IconPayload::Png(bytes)
        } else {
            IconPayload::Dib(bytes)
        })
    }

    /// Decode `entry` to RGBA.
    pub fn decode(&self, entry: &IcoEntry) -> Result<RasterImage> {
        self.payload(entry)?.decode()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checker(size: u32) -> RasterImage {
        let mut pixels = Vec::new();
        for y in 0..size {
            for x in 0..size {
                let on = (x + y) % 2 == 0;
                pixels.extend_from_slice(&[if on { 255 } else { 0 }, 0, y as u8, if on { 255 } else { 0 }]);
            }
        }
        RasterImage::new(size, size, pixels).unwrap()
    }

    #[test]
    fn test_normalize_sizes() {
        assert_eq!(
            normalize_sizes(&[64, 16, 300, 0, 16, 256], true).unwrap(),
            vec![16, 64, 256]
        );
        assert_eq!(normalize_sizes(&[256, 32], false).unwrap(), vec![32]);
        assert_eq!(normalize_sizes(&[256], false).unwrap_err().code(), "ICO_NO_SIZES");
    }

    #[test]
    fn test_directory_offsets_chain() {
        let images: Vec<_> = [16, 32, 48].iter().map(|s| checker(*s)).collect();
        let ico = encode_ico(&images, false).unwrap();
        let file = IcoFile::parse(&ico).unwrap();
        let entries = file.entries();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].offset as usize, 6 + 16 * 3);
        for pair in entries.windows(2) {
            assert_eq!(pair[0].offset + pair[0].size, pair[1].offset);
        }
        let last = entries[2];
        assert_eq!((last.offset + last.size) as usize, ico.len());
    }

    #[test]
    fn test_dib_layout() {
        let ico = encode_ico(&[checker(2)], false).unwrap();
        let dib = &ico[22..];
        assert_eq!(dib.len(), 40 + 16);
        assert_eq!(i32::from_le_bytes(dib[8..12].try_into().unwrap()), 4);
        // Bottom row first, BGRA: pixel (0, 1) is off with blue channel 1.
        assert_eq!(&dib[40..44], &[1, 0, 0, 0]);
        assert_eq!(&dib[44..48], &[1, 0, 255, 255]);
    }

    #[test]
    fn test_large_size_is_png() {
        let ico = encode_ico(&[RasterImage::filled(256, 256, [0, 0, 255, 255])], false).unwrap();
        assert_eq!(&ico[6..8], &[0, 0]);
        let file = IcoFile::parse(&ico).unwrap();
        let entry = file.entries()[0];
        assert_eq!((entry.width, entry.height), (256, 256));
        assert!(matches!(file.payload(&entry).unwrap(), IconPayload::Png(_)));
        assert_eq!(file.decode(&entry).unwrap().pixel(10, 10), Some([0, 0, 255, 255]));
    }

    #[test]
    fn test_decode_round_trip_with_mask() {
        let img = checker(5);
        for and_mask in [false, true] {
            let ico = encode_ico(&[img.clone()], and_mask).unwrap();
            let file = IcoFile::parse(&ico).unwrap();
            assert_eq!(file.decode(file.select(None)).unwrap(), img);
        }
    }

    #[test]
    fn test_mask_applies_to_opaque_dib() {
        let mut ico = encode_ico(&[RasterImage::filled(2, 1, [9, 9, 9, 255])], true).unwrap();
        // Mask out pixel (1, 0): the mask row follows 40 + 8 bytes of DIB.
        ico[22 + 48] = 0b0100_0000;
        let file = IcoFile::parse(&ico).unwrap();
        let decoded = file.decode(&file.entries()[0]).unwrap();
        assert_eq!(decoded.pixel(0, 0), Some([9, 9, 9, 255]));
        assert_eq!(decoded.pixel(1, 0), Some([9, 9, 9, 0]));
    }

    #[test]
    fn test_select() {
        let images: Vec<_> = [16, 32, 48].iter().map(|s| checker(*s)).collect();
        let ico = encode_ico(&images, false).unwrap();
        let file = IcoFile::parse(&ico).unwrap();
        assert_eq!(file.select(Some(32)).width, 32);
        assert_eq!(file.select(Some(40)).width, 32);
        assert_eq!(file.select(Some(100)).width, 48);
        assert_eq!(file.select(None).width, 48);
    }

    #[test]
    fn test_header_errors() {
        let code = |data: &[u8]| IcoFile::parse(data).unwrap_err().code().to_string();
        assert_eq!(code(&[0, 0, 1]), "ICO_INVALID_HEADER");
        assert_eq!(code(&[0, 0, 2, 0, 1, 0]), "ICO_INVALID_TYPE");
        assert_eq!(code(&[0, 0, 1, 0, 0, 0]), "ICO_NO_ICONS");
        assert_eq!(code(&[0, 0, 1, 0, 2, 0, 16, 16]), "ICO_INVALID_DIRECTORY");
    }

    #[test]
    fn test_payload_out_of_bounds() {
        let mut ico = encode_ico(&[checker(4)], false).unwrap();
        ico[14..18].copy_from_slice(&10_000u32.to_le_bytes());
        let file = IcoFile::parse(&ico).unwrap();
        let err = file.payload(&file.entries()[0]).unwrap_err();
        assert_eq!(err.code(), "ICO_INVALID_DATA");
    }

    #[test]
    fn test_dib_to_bmp_file() {
        let img = checker(3);
        let ico = encode_ico(&[img.clone()], true).unwrap();
        let file = IcoFile::parse(&ico).unwrap();
        let bmp = file
            .payload(&file.entries()[0])
            .unwrap()
            .to_bmp_file()
            .unwrap()
            .unwrap();
        assert_eq!(crate::decode_bmp(&bmp).unwrap(), img);
    }
}
