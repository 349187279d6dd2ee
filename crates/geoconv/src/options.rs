//! Conversion options and their TOML form.

use std::path::Path;

use geoconv_core::{ConvertError, Result};
use geoconv_dxf::{DxfSvgOptions, DxfWriteOptions};
use geoconv_eps::{EpsOptions, EpsSvgOptions};
use geoconv_raster::{STANDARD_ICO_SIZES, SUPPORTED_BIT_DEPTHS};
use geoconv_stl::{StlEncoding, StlSvgOptions};
use geoconv_svg::Rgb;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Largest raster edge accepted for explicit output sizes.
pub const MAX_RASTER_EDGE: u32 = 16384;

/// Errors loading or saving a configuration file.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// Path that failed.
        path: String,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The TOML did not match the options schema.
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// The options could not be written as TOML.
    #[error("failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// A value is out of range.
    #[error(transparent)]
    Invalid(#[from] ConvertError),
}

/// Options for SVG→STL extrusion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SvgStlOptions {
    /// Extrusion depth along Z in SVG user units.
    pub extrusion_depth: f64,
    /// Output encoding.
    pub output_format: StlEncoding,
    /// Straight segments per curve when flattening paths.
    pub curve_segments: usize,
}

impl Default for SvgStlOptions {
    fn default() -> Self {
        Self {
            extrusion_depth: 10.0,
            output_format: StlEncoding::Binary,
            curve_segments: 8,
        }
    }
}

impl SvgStlOptions {
    /// Reject a non-positive depth or a segment count outside `1..=256`.
    pub fn validate(&self) -> Result<()> {
        if !(self.extrusion_depth.is_finite() && self.extrusion_depth > 0.0) {
            return Err(ConvertError::invalid_options(format!(
                "extrusion_depth must be positive, got {}",
                self.extrusion_depth
            )));
        }
        if !(1..=256).contains(&self.curve_segments) {
            return Err(ConvertError::invalid_options(format!(
                "curve_segments must be between 1 and 256, got {}",
                self.curve_segments
            )));
        }
        Ok(())
    }
}

/// Options for SVG→BMP.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BmpOptions {
    /// Bits per pixel: 1, 4, 8, 16, 24 or 32.
    pub bit_depth: u16,
    /// Output width; the SVG's intrinsic width when unset.
    pub width: Option<u32>,
    /// Output height; the SVG's intrinsic height when unset.
    pub height: Option<u32>,
    /// Color composited under transparent pixels.
    pub background: String,
}

impl Default for BmpOptions {
    fn default() -> Self {
        Self {
            bit_depth: 24,
            width: None,
            height: None,
            background: "white".to_string(),
        }
    }
}

impl BmpOptions {
    /// Check the bit depth, explicit sizes and background color.
    pub fn validate(&self) -> Result<()> {
        if !SUPPORTED_BIT_DEPTHS.contains(&self.bit_depth) {
            return Err(ConvertError::invalid_options(format!(
                "bit_depth must be one of {:?}, got {}",
                SUPPORTED_BIT_DEPTHS, self.bit_depth
            )));
        }
        check_edges(self.width, self.height)?;
        self.background_rgb().map(|_| ())
    }

    /// Background as RGB.
    pub fn background_rgb(&self) -> Result<[u8; 3]> {
        let rgb = Rgb::parse_color(&self.background).ok_or_else(|| {
            ConvertError::invalid_options(format!(
                "background is not a color: {:?}",
                self.background
            ))
        })?;
        Ok([rgb.r, rgb.g, rgb.b])
    }
}

/// Output size for SVG→PNG.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PngOptions {
    /// Output width; the SVG's intrinsic width when unset.
    pub width: Option<u32>,
    /// Output height; the SVG's intrinsic height when unset.
    pub height: Option<u32>,
}

impl PngOptions {
    /// Check explicit sizes.
    pub fn validate(&self) -> Result<()> {
        check_edges(self.width, self.height)
    }
}

fn check_edges(width: Option<u32>, height: Option<u32>) -> Result<()> {
    for (name, value) in [("width", width), ("height", height)] {
        if let Some(v) = value {
            if !(1..=MAX_RASTER_EDGE).contains(&v) {
                return Err(ConvertError::invalid_options(format!(
                    "{} must be between 1 and {}, got {}",
                    name, MAX_RASTER_EDGE, v
                )));
            }
        }
    }
    Ok(())
}

/// Options for SVG→ICO.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IcoOptions {
    /// Square sizes to render.
    pub sizes: Vec<u32>,
    /// Keep the 256 size.
    pub include_large: bool,
    /// Write the 1-bit AND mask after each DIB.
    pub and_mask: bool,
}

impl Default for IcoOptions {
    fn default() -> Self {
        Self {
            sizes: STANDARD_ICO_SIZES.to_vec(),
            include_large: true,
            and_mask: false,
        }
    }
}

/// Options for ICO→SVG and ICO→BMP.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IcoSvgOptions {
    /// Icon width to extract; the largest icon when unset.
    pub preferred_size: Option<u32>,
}

/// Resource limits applied before any converter runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Largest accepted input in bytes.
    pub max_input_bytes: u64,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_input_bytes: 100 * 1024 * 1024,
        }
    }
}

/// Options for every pipeline, one table per conversion.
///
/// ```
/// use geoconv::ConvertOptions;
///
/// let opts = ConvertOptions::from_toml_str(
///     "[svg_stl]\nextrusion_depth = 2.5\noutput_format = \"ascii\"\n",
/// )
/// .unwrap();
/// assert_eq!(opts.svg_stl.extrusion_depth, 2.5);
/// assert_eq!(opts.svg_stl.curve_segments, 8);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertOptions {
    /// Input limits.
    pub limits: Limits,
    /// DXF→SVG.
    pub dxf_svg: DxfSvgOptions,
    /// STL→SVG.
    pub stl_svg: StlSvgOptions,
    /// SVG→STL.
    pub svg_stl: SvgStlOptions,
    /// SVG→EPS.
    pub svg_eps: EpsOptions,
    /// EPS→SVG.
    pub eps_svg: EpsSvgOptions,
    /// SVG→DXF.
    pub svg_dxf: DxfWriteOptions,
    /// SVG→BMP.
    pub svg_bmp: BmpOptions,
    /// SVG→PNG.
    pub svg_png: PngOptions,
    /// SVG→ICO.
    pub svg_ico: IcoOptions,
    /// ICO→SVG and ICO→BMP.
    pub ico_svg: IcoSvgOptions,
}

impl ConvertOptions {
    /// Parse TOML; missing tables and keys keep their defaults.
    pub fn from_toml_str(text: &str) -> std::result::Result<Self, ConfigError> {
        let options: Self = toml::from_str(text)?;
        options.validate()?;
        Ok(options)
    }

    /// Read and parse a TOML file.
    pub fn load(path: impl AsRef<Path>) -> std::result::Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Render as TOML.
    pub fn to_toml_string(&self) -> std::result::Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Validate every table.
    pub fn validate(&self) -> Result<()> {
        self.dxf_svg.validate()?;
        self.stl_svg.validate()?;
        self.svg_stl.validate()?;
        self.svg_eps.validate()?;
        self.eps_svg.validate()?;
        self.svg_dxf.validate()?;
        self.svg_bmp.validate()?;
        self.svg_png.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let opts = ConvertOptions::default();
        assert_eq!(opts.limits.max_input_bytes, 104_857_600);
        assert_eq!(opts.svg_stl.output_format, StlEncoding::Binary);
        assert_eq!(opts.svg_bmp.bit_depth, 24);
        assert_eq!(opts.svg_ico.sizes, vec![16, 24, 32, 48, 64, 128, 256]);
        assert!(opts.svg_ico.include_large);
        assert_eq!(opts.ico_svg.preferred_size, None);
        assert_eq!(opts.svg_dxf.dxf_version, "AC1015");
        assert_eq!(opts.eps_svg.arc_segments_per_turn, 72);
        opts.validate().unwrap();
    }

    #[test]
    fn test_toml_round_trip() {
        let mut opts = ConvertOptions::default();
        opts.svg_bmp.width = Some(64);
        opts.svg_eps.title = Some("Plate".into());
        opts.stl_svg.scale = Some(2.0);
        let text = opts.to_toml_string().unwrap();
        assert!(text.contains("[svg_bmp]"));
        assert_eq!(ConvertOptions::from_toml_str(&text).unwrap(), opts);
    }

    #[test]
    fn test_partial_toml() {
        let opts = ConvertOptions::from_toml_str(
            "[svg_ico]\nsizes = [32, 16]\nand_mask = true\n\n[stl_svg]\nview = \"isometric\"\n",
        )
        .unwrap();
        assert_eq!(opts.svg_ico.sizes, vec![32, 16]);
        assert!(opts.svg_ico.and_mask);
        assert!(opts.svg_ico.include_large);
        assert_eq!(opts.stl_svg.view.name(), "isometric");
    }

    #[test]
    fn test_invalid_values() {
        let err = ConvertOptions::from_toml_str("[svg_bmp]\nbit_depth = 12\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(ref e) if e.code() == "INVALID_OPTIONS"));

        let err = ConvertOptions::from_toml_str("[svg_stl]\nextrusion_depth = -1.0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = ConvertOptions::from_toml_str("[svg_stl]\nextrusion_depth = \"deep\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_background_color() {
        let opts = BmpOptions {
            background: "#102030".into(),
            ..Default::default()
        };
        assert_eq!(opts.background_rgb().unwrap(), [0x10, 0x20, 0x30]);
        let opts = BmpOptions {
            background: "mauve-ish".into(),
            ..Default::default()
        };
        assert_eq!(opts.validate().unwrap_err().code(), "INVALID_OPTIONS");
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("geoconv.toml");
        std::fs::write(&path, "[limits]\nmax_input_bytes = 1024\n").unwrap();
        assert_eq!(ConvertOptions::load(&path).unwrap().limits.max_input_bytes, 1024);
        assert!(matches!(
            ConvertOptions::load(dir.path().join("missing.toml")),
            Err(ConfigError::Io { .. })
        ));
    }
}
