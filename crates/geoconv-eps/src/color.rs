//! Color model selection for emitted PostScript.

use std::fmt;
use std::str::FromStr;

use geoconv_core::fmt::num;
use geoconv_svg::Rgb;
use serde::{Deserialize, Serialize};

/// Color space used for `set*color` operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    /// `r g b rgb` (the prolog alias for `setrgbcolor`).
    #[default]
    Rgb,
    /// `c m y k setcmykcolor`.
    Cmyk,
    /// `l setgray`, Rec. 601 luma.
    Gray,
}

impl ColorMode {
    /// Lowercase name.
    pub fn name(&self) -> &'static str {
        match self {
            ColorMode::Rgb => "rgb",
            ColorMode::Cmyk => "cmyk",
            ColorMode::Gray => "gray",
        }
    }

    /// PostScript that makes `color` current.
    pub fn set_color(&self, color: Rgb) -> String {
        let [r, g, b] = color.unit();
        match self {
            ColorMode::Rgb => format!("{} {} {} rgb", num(r), num(g), num(b)),
            ColorMode::Cmyk => {
                let k = 1.0 - r.max(g).max(b);
                if k >= 1.0 {
                    return "0 0 0 1 setcmykcolor".to_string();
                }
                let part = |v: f64| (1.0 - v - k) / (1.0 - k);
                format!(
                    "{} {} {} {} setcmykcolor",
                    num(part(r)),
                    num(part(g)),
                    num(part(b)),
                    num(k)
                )
            }
            ColorMode::Gray => format!("{} setgray", num(color.luminance())),
        }
    }
}

impl fmt::Display for ColorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ColorMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "rgb" => Ok(ColorMode::Rgb),
            "cmyk" => Ok(ColorMode::Cmyk),
            "gray" | "grey" => Ok(ColorMode::Gray),
            _ => Err(format!("unknown color mode '{}', expected rgb, cmyk or gray", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgb_operator() {
        assert_eq!(ColorMode::Rgb.set_color(Rgb::new(255, 0, 0)), "1 0 0 rgb");
        assert_eq!(
            ColorMode::Rgb.set_color(Rgb::new(0, 128, 255)),
            "0 0.501961 1 rgb"
        );
    }

    #[test]
    fn test_cmyk_conversion() {
        assert_eq!(
            ColorMode::Cmyk.set_color(Rgb::new(255, 0, 0)),
            "0 1 1 0 setcmykcolor"
        );
        assert_eq!(ColorMode::Cmyk.set_color(Rgb::BLACK), "0 0 0 1 setcmykcolor");
    }

    #[test]
    fn test_gray_conversion() {
        assert_eq!(ColorMode::Gray.set_color(Rgb::new(255, 255, 255)), "1 setgray");
        assert_eq!(ColorMode::Gray.set_color(Rgb::BLACK), "0 setgray");
    }

    #[test]
    fn test_parse_mode() {
        assert_eq!("CMYK".parse::<ColorMode>().unwrap(), ColorMode::Cmyk);
        assert_eq!("grey".parse::<ColorMode>().unwrap(), ColorMode::Gray);
        assert!("lab".parse::<ColorMode>().is_err());
    }
}
