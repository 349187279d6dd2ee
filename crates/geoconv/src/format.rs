//! File formats known to the converter registry.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use geoconv_core::ConvertError;
use serde::{Deserialize, Serialize};

/// A file format, identified by its usual extension.
///
/// Only some formats have local converters; the rest can be handled by a
/// [`RemoteBackend`](crate::RemoteBackend).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// AutoCAD Drawing Exchange Format.
    Dxf,
    /// Scalable Vector Graphics.
    Svg,
    /// Stereolithography mesh.
    Stl,
    /// Encapsulated PostScript.
    Eps,
    /// Windows bitmap.
    Bmp,
    /// Windows icon.
    Ico,
    /// Portable Network Graphics.
    Png,
    /// Adobe Illustrator.
    Ai,
    /// AV1 image.
    Avif,
    /// Enhanced Metafile.
    Emf,
    /// Windows Metafile.
    Wmf,
    /// HEIF image.
    Heic,
    /// WebP image.
    Webp,
    /// Portable Document Format.
    Pdf,
}

impl Format {
    /// Every format, local ones first.
    pub const ALL: [Format; 14] = [
        Format::Dxf,
        Format::Svg,
        Format::Stl,
        Format::Eps,
        Format::Bmp,
        Format::Ico,
        Format::Png,
        Format::Ai,
        Format::Avif,
        Format::Emf,
        Format::Wmf,
        Format::Heic,
        Format::Webp,
        Format::Pdf,
    ];

    /// Canonical extension without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            Format::Dxf => "dxf",
            Format::Svg => "svg",
            Format::Stl => "stl",
            Format::Eps => "eps",
            Format::Bmp => "bmp",
            Format::Ico => "ico",
            Format::Png => "png",
            Format::Ai => "ai",
            Format::Avif => "avif",
            Format::Emf => "emf",
            Format::Wmf => "wmf",
            Format::Heic => "heic",
            Format::Webp => "webp",
            Format::Pdf => "pdf",
        }
    }

    /// Mime type used for converted output.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Format::Dxf => "application/dxf",
            Format::Svg => "image/svg+xml",
            Format::Stl => "model/stl",
            Format::Eps => "application/postscript",
            Format::Bmp => "image/bmp",
            Format::Ico => "image/x-icon",
            Format::Png => "image/png",
            Format::Ai => "application/illustrator",
            Format::Avif => "image/avif",
            Format::Emf => "image/emf",
            Format::Wmf => "image/wmf",
            Format::Heic => "image/heic",
            Format::Webp => "image/webp",
            Format::Pdf => "application/pdf",
        }
    }

    /// True for formats whose payload is text.
    pub fn is_text(&self) -> bool {
        matches!(self, Format::Dxf | Format::Svg | Format::Eps)
    }

    /// Format implied by a path's extension.
    pub fn from_path(path: impl AsRef<Path>) -> Option<Format> {
        path.as_ref()
            .extension()
            .and_then(|e| e.to_str())
            .and_then(|e| e.parse().ok())
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for Format {
    type Err = ConvertError;

    /// Case-insensitive extension, with or without a leading dot. `ps` and
    /// `epsf` read as EPS, `heif` as HEIC.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().trim_start_matches('.').to_ascii_lowercase();
        let alias = match name.as_str() {
            "ps" | "epsf" | "epsi" => Some(Format::Eps),
            "heif" => Some(Format::Heic),
            _ => None,
        };
        alias
            .or_else(|| Format::ALL.into_iter().find(|f| f.extension() == name))
            .ok_or_else(|| ConvertError::unsupported(s, &Format::ALL))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_extensions() {
        assert_eq!("DXF".parse::<Format>().unwrap(), Format::Dxf);
        assert_eq!(".svg".parse::<Format>().unwrap(), Format::Svg);
        assert_eq!("ps".parse::<Format>().unwrap(), Format::Eps);
        let err = "docx".parse::<Format>().unwrap_err();
        assert_eq!(err.code(), "UNSUPPORTED_FORMAT");
        assert!(err.to_string().contains("dxf, svg, stl"));
    }

    #[test]
    fn test_from_path() {
        assert_eq!(Format::from_path("out/part.STL"), Some(Format::Stl));
        assert_eq!(Format::from_path("favicon.ico"), Some(Format::Ico));
        assert_eq!(Format::from_path("README"), None);
    }

    #[test]
    fn test_mime_types() {
        assert_eq!(Format::Svg.mime_type(), "image/svg+xml");
        assert_eq!(Format::Stl.mime_type(), "model/stl");
        assert_eq!(Format::Ico.mime_type(), "image/x-icon");
        for format in Format::ALL {
            assert_eq!(format.extension().parse::<Format>().unwrap(), format);
        }
    }
}
