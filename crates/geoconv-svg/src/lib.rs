#![warn(missing_docs)]

//! SVG input model for the `svg -> *` converters.
//!
//! Elements are extracted by pattern matching over the raw text rather than
//! by a DOM parse. That keeps the reader dependency-light and tolerant of
//! sloppy markup, at the cost of known gaps:
//!
//! - group (`<g>`) transforms and inherited styles are not applied to children
//! - `<use>`, CSS stylesheets and nested `<svg>` are ignored
//! - path arcs and quadratic segments (`A`, `Q`, `S`, `T`) are recognized so
//!   the current point stays correct, but are reported as
//!   [`PathCommand::Unsupported`] rather than converted
//!
//! Comments and `<defs>` blocks are removed before scanning.
//!
//! # Example
//!
//! ```
//! use geoconv_svg::{SvgDocument, SvgElement};
//!
//! let doc = SvgDocument::parse(
//!     r#"<svg width="20" height="10"><rect x="1" y="2" width="3" height="4"/></svg>"#,
//! ).unwrap();
//! assert_eq!(doc.width, 20.0);
//! assert!(matches!(doc.elements[0], SvgElement::Rect { .. }));
//! ```

mod attrs;
mod document;
mod element;
mod paint;
mod path;
mod units;

pub use attrs::Attributes;
pub use document::{SvgDocument, ViewBox};
pub use element::{Style, SvgElement};
pub use paint::Rgb;
pub use path::{parse_points, PathCommand, PathData, Subpath};
pub use units::parse_length;

/// Escape text for use inside SVG character data or attribute values.
pub fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

/// Decode the predefined XML entities and numeric character references.
pub fn unescape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find('&') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        let Some(end) = tail.find(';') else {
            out.push_str(tail);
            return out;
        };
        let entity = &tail[1..end];
        let decoded = match entity {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            _ => entity
                .strip_prefix("#x")
                .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                .or_else(|| entity.strip_prefix('#').and_then(|dec| dec.parse().ok()))
                .and_then(char::from_u32),
        };
        match decoded {
            Some(c) => {
                out.push(c);
                rest = &tail[end + 1..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}
