//! SVG element list to EPS.

use std::sync::LazyLock;

use geoconv_core::fmt::num;
use geoconv_core::{ConvertError, Result};
use geoconv_math::Point2D;
use geoconv_svg::{PathCommand, PathData, Rgb, Style, SvgDocument, SvgElement};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::ColorMode;

static TRANSLATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"translate\(([^)]*)\)").expect("valid regex"));
static SCALE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"scale\(([^)]*)\)").expect("valid regex"));
static ROTATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"rotate\(([^)]*)\)").expect("valid regex"));

/// Prolog aliases. The reader understands the same names.
const PROLOG: &str = "\
/m {moveto} bind def
/l {lineto} bind def
/c {curveto} bind def
/cp {closepath} bind def
/f {fill} bind def
/s {stroke} bind def
/gs {gsave} bind def
/gr {grestore} bind def
/rgb {setrgbcolor} bind def
/w {setlinewidth} bind def
";

/// Options for SVG→EPS.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EpsOptions {
    /// PostScript language level, 1 to 3.
    pub ps_level: u8,
    /// Color operators to emit.
    pub color_mode: ColorMode,
    /// `%%Title`; defaults to a generic title.
    pub title: Option<String>,
    /// `%%CreationDate`; omitted when unset so output is reproducible.
    pub creation_date: Option<String>,
}

impl Default for EpsOptions {
    fn default() -> Self {
        Self {
            ps_level: 3,
            color_mode: ColorMode::Rgb,
            title: None,
            creation_date: None,
        }
    }
}

impl EpsOptions {
    /// Reject unknown language levels.
    pub fn validate(&self) -> Result<()> {
        if !(1..=3).contains(&self.ps_level) {
            return Err(ConvertError::invalid_options(format!(
                "ps_level must be 1, 2 or 3, got {}",
                self.ps_level
            )));
        }
        Ok(())
    }
}

/// Escape a string for a PostScript `( )` literal.
///
/// Backslashes and parentheses are escaped. Characters outside printable
/// ASCII become octal escapes when they fit in Latin-1 and `?` otherwise.
pub fn escape_ps(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '(' => out.push_str("\\("),
            ')' => out.push_str("\\)"),
            ' '..='~' => out.push(ch),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) <= 0xff => {
                // Three-digit octal escape.
                let v = c as u32;
                out.push('\\');
                for shift in [6, 3, 0] {
                    out.push(char::from(b'0' + ((v >> shift) & 7) as u8));
                }
            }
            _ => out.push('?'),
        }
    }
    out
}

fn numbers(args: &str) -> Vec<f64> {
    args.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse().ok())
        .collect()
}

/// Translate an SVG `transform` attribute into one PostScript operator.
///
/// Only one transform is honored: `translate` if present, else `scale`,
/// else `rotate`. Composed lists such as `translate(..) scale(..)` lose
/// everything but the first match in that order. `rotate` keeps the SVG
/// angle as is, which turns the same way on the flipped page.
pub fn transform_to_ps(transform: &str) -> Option<String> {
    if let Some(cap) = TRANSLATE_RE.captures(transform) {
        let args = numbers(&cap[1]);
        let x = args.first().copied().unwrap_or(0.0);
        let y = args.get(1).copied().unwrap_or(0.0);
        return Some(format!("{} {} translate", num(x), num(y)));
    }
    if let Some(cap) = SCALE_RE.captures(transform) {
        let args = numbers(&cap[1]);
        let sx = args.first().copied().unwrap_or(1.0);
        let sy = args.get(1).copied().unwrap_or(sx);
        return Some(format!("{} {} scale", num(sx), num(sy)));
    }
    if let Some(cap) = ROTATE_RE.captures(transform) {
        let angle = numbers(&cap[1]).first().copied().unwrap_or(0.0);
        return Some(format!("{} rotate", num(angle)));
    }
    debug!(transform, "transform not translated to PostScript");
    None
}

struct Emitter<'a> {
    out: String,
    options: &'a EpsOptions,
}

fn xy(p: &Point2D) -> String {
    format!("{} {}", num(p.x), num(p.y))
}

impl Emitter<'_> {
    fn line(&mut self, text: impl AsRef<str>) {
        self.out.push_str(text.as_ref());
        self.out.push('\n');
    }

    fn color(&self, color: Rgb) -> String {
        self.options.color_mode.set_color(color)
    }

    /// Paint the current path with the element's fill and stroke.
    fn paint(&mut self, style: &Style, fillable: bool) {
        let fill = if fillable {
            Rgb::parse_paint(style.fill_or_default())
        } else {
            None
        };
        let stroke = Rgb::parse_paint(style.stroke_or_default());
        match (fill, stroke) {
            (Some(fill), Some(stroke)) => {
                self.line(format!("gs {} f gr", self.color(fill)));
                self.stroke(stroke, style.stroke_width_or_default());
            }
            (Some(fill), None) => self.line(format!("{} f", self.color(fill))),
            (None, Some(stroke)) => self.stroke(stroke, style.stroke_width_or_default()),
            (None, None) => self.line("newpath"),
        }
    }

    fn stroke(&mut self, color: Rgb, width: f64) {
        self.line(format!("{} {} w s", self.color(color), num(width)));
    }

    fn path(&mut self, data: &PathData) {
        self.line("newpath");
        let mut cursor = Point2D::ORIGIN;
        let mut start = Point2D::ORIGIN;
        for command in &data.commands {
            match command {
                PathCommand::MoveTo(p) => {
                    self.line(format!("{} m", xy(p)));
                    start = *p;
                }
                PathCommand::LineTo(_)
                | PathCommand::HorizontalTo(_)
                | PathCommand::VerticalTo(_) => {
                    let p = command.end_point(cursor);
                    self.line(format!("{} l", xy(&p)));
                }
                PathCommand::CubicTo { c1, c2, end } => {
                    self.line(format!("{} {} {} c", xy(c1), xy(c2), xy(end)));
                }
                PathCommand::Close => self.line("cp"),
                PathCommand::Unsupported { command, end } => {
                    debug!(%command, "path command drawn as a straight line");
                    self.line(format!("{} l", xy(end)));
                }
            }
            cursor = match command {
                PathCommand::Close => start,
                other => other.end_point(cursor),
            };
        }
    }

    fn rect_path(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.line(format!(
            "newpath {x} {y} m {x2} {y} l {x2} {y2} l {x} {y2} l cp",
            x = num(x),
            y = num(y),
            x2 = num(x + width),
            y2 = num(y + height)
        ));
    }

    fn element(&mut self, element: &SvgElement) {
        match element {
            SvgElement::Path { data, style } => {
                self.path(data);
                self.paint(style, true);
            }
            SvgElement::Rect {
                x,
                y,
                width,
                height,
                style,
            } => {
                if self.options.ps_level == 1 {
                    self.rect_path(*x, *y, *width, *height);
                    self.paint(style, true);
                    return;
                }
                // rectfill/rectstroke are Level 2 operators.
                let rect = format!("{} {} {} {}", num(*x), num(*y), num(*width), num(*height));
                if let Some(fill) = Rgb::parse_paint(style.fill_or_default()) {
                    self.line(format!("{} {} rectfill", self.color(fill), rect));
                }
                if let Some(stroke) = Rgb::parse_paint(style.stroke_or_default()) {
                    self.line(format!(
                        "{} {} w {} rectstroke",
                        self.color(stroke),
                        num(style.stroke_width_or_default()),
                        rect
                    ));
                }
            }
            SvgElement::Circle {
                center,
                radius,
                style,
            } => {
                self.line(format!("newpath {} {} 0 360 arc cp", xy(center), num(*radius)));
                self.paint(style, true);
            }
            SvgElement::Line { start, end, style } => {
                self.line(format!("newpath {} m {} l", xy(start), xy(end)));
                self.paint(style, false);
            }
            SvgElement::Polyline {
                points,
                closed,
                style,
            } => {
                let Some((first, rest)) = points.split_first() else {
                    return;
                };
                self.line(format!("newpath {} m", xy(first)));
                for p in rest {
                    self.line(format!("{} l", xy(p)));
                }
                if *closed {
                    self.line("cp");
                }
                self.paint(style, true);
            }
            SvgElement::Text {
                position,
                content,
                font_size,
                font_family,
                style,
            } => {
                let color = Rgb::parse_paint(style.fill_or_default()).unwrap_or(Rgb::BLACK);
                self.line(self.color(color));
                self.line(format!(
                    "/{} findfont {} scalefont setfont",
                    font_family.replace(char::is_whitespace, "-"),
                    num(*font_size)
                ));
                // Undo the page flip locally so glyphs stand upright.
                self.line(format!(
                    "gs {} translate 1 -1 scale 0 0 m ({}) show gr",
                    xy(position),
                    escape_ps(content)
                ));
            }
        }
    }
}

/// Render parsed SVG as a single-page EPS document.
///
/// The page is flipped (`0 height translate 1 -1 scale`) so SVG user
/// coordinates are written unchanged. Each element is wrapped in
/// `gsave`/`grestore`. Fill defaults to black and stroke to none as in SVG;
/// unknown paints fall back to black.
pub fn write_eps(doc: &SvgDocument, options: &EpsOptions) -> Result<String> {
    options.validate()?;
    let mut e = Emitter {
        out: String::with_capacity(1024 + doc.elements.len() * 96),
        options,
    };

    e.line("%!PS-Adobe-3.0 EPSF-3.0");
    e.line("%%Creator: geoconv");
    e.line(format!(
        "%%Title: {}",
        options.title.as_deref().unwrap_or("SVG to EPS Conversion")
    ));
    if let Some(date) = &options.creation_date {
        e.line(format!("%%CreationDate: {}", date));
    }
    e.line(format!(
        "%%BoundingBox: 0 0 {} {}",
        doc.width.max(0.0).ceil(),
        doc.height.max(0.0).ceil()
    ));
    e.line(format!(
        "%%HiResBoundingBox: 0 0 {} {}",
        num(doc.width),
        num(doc.height)
    ));
    e.line(format!("%%LanguageLevel: {}", options.ps_level));
    e.line("%%Pages: 1");
    e.line("%%EndComments");
    e.line("%%BeginProlog");
    e.out.push_str(PROLOG);
    e.line("%%EndProlog");
    e.line("%%Page: 1 1");
    e.line("gsave");
    e.line(format!("0 {} translate", num(doc.height)));
    e.line("1 -1 scale");

    for element in &doc.elements {
        e.line("gsave");
        if let Some(ps) = element.style().transform.as_deref().and_then(transform_to_ps) {
            e.line(ps);
        }
        e.element(element);
        e.line("grestore");
    }

    e.line("grestore");
    e.line("showpage");
    e.line("%%EOF");
    debug!(elements = doc.elements.len(), "wrote EPS");
    Ok(e.out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eps(svg: &str) -> String {
        write_eps(&SvgDocument::parse(svg).unwrap(), &EpsOptions::default()).unwrap()
    }

    #[test]
    fn test_header_and_flip() {
        let out = eps(r#"<svg width="100.5" height="50"></svg>"#);
        assert!(out.starts_with("%!PS-Adobe-3.0 EPSF-3.0\n%%Creator: geoconv\n"));
        assert!(out.contains("%%BoundingBox: 0 0 101 50\n"));
        assert!(out.contains("%%LanguageLevel: 3\n"));
        assert!(!out.contains("%%CreationDate"));
        assert!(out.contains("/rgb {setrgbcolor} bind def\n"));
        assert!(out.contains("gsave\n0 50 translate\n1 -1 scale\n"));
        assert!(out.ends_with("grestore\nshowpage\n%%EOF\n"));
    }

    #[test]
    fn test_path_commands() {
        let out = eps(
            r##"<svg width="10" height="10"><path d="M1 2 H5 V6 C1 1 2 2 3 3 Z" fill="none" stroke="#0000ff" stroke-width="2"/></svg>"##,
        );
        assert!(out.contains("newpath\n1 2 m\n5 2 l\n5 6 l\n1 1 2 2 3 3 c\ncp\n0 0 1 rgb 2 w s\n"));
    }

    #[test]
    fn test_fill_and_stroke() {
        let out = eps(r#"<svg><polygon points="0,0 1,0 1,1" fill="red" stroke="black"/></svg>"#);
        assert!(out.contains("cp\ngs 1 0 0 rgb f gr\n0 0 0 rgb 1 w s\n"));
    }

    #[test]
    fn test_rect_by_level() {
        let svg = r#"<svg><rect x="1" y="2" width="3" height="4" fill="white" stroke="black"/></svg>"#;
        let out = eps(svg);
        assert!(out.contains("1 1 1 rgb 1 2 3 4 rectfill\n"));
        assert!(out.contains("0 0 0 rgb 1 w 1 2 3 4 rectstroke\n"));

        let opts = EpsOptions {
            ps_level: 1,
            ..Default::default()
        };
        let out = write_eps(&SvgDocument::parse(svg).unwrap(), &opts).unwrap();
        assert!(!out.contains("rectfill"));
        assert!(out.contains("newpath 1 2 m 4 2 l 4 6 l 1 6 l cp\n"));
    }

    #[test]
    fn test_circle_and_line() {
        let out = eps(r#"<svg><circle cx="5" cy="5" r="2"/><line x1="0" y1="0" x2="3" y2="4" stroke="red"/></svg>"#);
        assert!(out.contains("newpath 5 5 2 0 360 arc cp\n0 0 0 rgb f\n"));
        assert!(out.contains("newpath 0 0 m 3 4 l\n1 0 0 rgb 1 w s\n"));
    }

    #[test]
    fn test_text_escaping() {
        let out = eps(r#"<svg><text x="10" y="20" font-family="Open Sans">f(x) = \y</text></svg>"#);
        assert!(out.contains("/Open-Sans findfont 12 scalefont setfont\n"));
        assert!(out.contains(r"(f\(x\) = \\y) show"));
        assert!(out.contains("gs 10 20 translate 1 -1 scale 0 0 m"));
    }

    #[test]
    fn test_escape_non_ascii() {
        assert_eq!(escape_ps("é"), r"\351");
        assert_eq!(escape_ps("a\u{7}b"), r"a\007b");
        assert_eq!(escape_ps("漢"), "?");
    }

    #[test]
    fn test_first_transform_only() {
        assert_eq!(
            transform_to_ps("translate(10, 20)").as_deref(),
            Some("10 20 translate")
        );
        assert_eq!(transform_to_ps("scale(2)").as_deref(), Some("2 2 scale"));
        assert_eq!(transform_to_ps("rotate(45 5 5)").as_deref(), Some("45 rotate"));
        assert_eq!(
            transform_to_ps("scale(3) translate(1)").as_deref(),
            Some("1 0 translate")
        );
        assert_eq!(transform_to_ps("matrix(1 0 0 1 0 0)"), None);
    }

    #[test]
    fn test_element_wrapped_with_transform() {
        let out = eps(r#"<svg><rect width="1" height="1" transform="translate(5,6)"/></svg>"#);
        assert!(out.contains("gsave\n5 6 translate\n0 0 0 rgb 0 0 1 1 rectfill\ngrestore\n"));
    }

    #[test]
    fn test_options() {
        let opts = EpsOptions {
            title: Some("Logo".into()),
            creation_date: Some("2024-01-01".into()),
            color_mode: ColorMode::Gray,
            ..Default::default()
        };
        let doc = SvgDocument::parse(r#"<svg><rect width="1" height="1"/></svg>"#).unwrap();
        let out = write_eps(&doc, &opts).unwrap();
        assert!(out.contains("%%Title: Logo\n%%CreationDate: 2024-01-01\n"));
        assert!(out.contains("0 setgray 0 0 1 1 rectfill"));

        let bad = EpsOptions {
            ps_level: 4,
            ..Default::default()
        };
        assert_eq!(bad.validate().unwrap_err().code(), "INVALID_OPTIONS");
    }
}
