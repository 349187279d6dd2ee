//! Document-level scanning: root dimensions and element extraction.

use std::sync::LazyLock;

use geoconv_core::{ConvertError, Result};
use regex::Regex;
use tracing::{debug, trace};

use crate::{Attributes, SvgElement};

static COMMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->|<defs\b.*?</defs>").expect("valid regex"));

static ROOT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<svg\b[^>]*>").expect("valid regex"));

static ELEMENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<(path|rect|circle|line|polyline|polygon|text)\b([^>]*)>").expect("valid regex")
});

static TEXT_END_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"</text\s*>").expect("valid regex"));

static INNER_TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));

/// The `viewBox` attribute of the root element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewBox {
    /// Minimum x.
    pub min_x: f64,
    /// Minimum y.
    pub min_y: f64,
    /// Width.
    pub width: f64,
    /// Height.
    pub height: f64,
}

impl ViewBox {
    /// Parse `min-x min-y width height`, separated by spaces or commas.
    pub fn parse(value: &str) -> Option<Self> {
        let parts: Vec<f64> = value
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|s| !s.is_empty())
            .map(str::parse)
            .collect::<std::result::Result<_, _>>()
            .ok()?;
        match parts[..] {
            [min_x, min_y, width, height] => Some(Self {
                min_x,
                min_y,
                width,
                height,
            }),
            _ => None,
        }
    }
}

/// Parsed SVG input.
#[derive(Debug, Clone, PartialEq)]
pub struct SvgDocument {
    /// Resolved width in user units.
    pub width: f64,
    /// Resolved height in user units.
    pub height: f64,
    /// Root `viewBox`, if present.
    pub view_box: Option<ViewBox>,
    /// Drawable elements in document order.
    pub elements: Vec<SvgElement>,
}

impl SvgDocument {
    /// Size used when neither `width`/`height` nor `viewBox` is given.
    pub const DEFAULT_SIZE: f64 = 100.0;

    /// Scan SVG text.
    ///
    /// Fails with `SVG_INVALID` when the text has neither an `<svg` nor an
    /// `<?xml` marker. Dimensions come from the `viewBox` and are overridden
    /// by absolute `width`/`height` attributes.
    pub fn parse(text: &str) -> Result<Self> {
        if !text.contains("<svg") && !text.contains("<?xml") {
            return Err(ConvertError::validation(
                "SVG_INVALID",
                "Invalid SVG file: missing <svg> or <?xml> marker",
            ));
        }
        let text = COMMENT_RE.replace_all(text, "");

        let root = ROOT_RE
            .find(&text)
            .map(|m| Attributes::parse(m.as_str()))
            .unwrap_or_default();
        let view_box = root.get("viewBox").and_then(ViewBox::parse);
        let (mut width, mut height) = view_box
            .map(|vb| (vb.width, vb.height))
            .unwrap_or((Self::DEFAULT_SIZE, Self::DEFAULT_SIZE));
        if let Some(w) = root.length("width") {
            width = w;
        }
        if let Some(h) = root.length("height") {
            height = h;
        }

        let mut elements = Vec::new();
        for cap in ELEMENT_RE.captures_iter(&text) {
            let tag = &cap[1];
            let raw = &cap[2];
            let attrs = Attributes::parse(raw);
            let content = if tag == "text" && !raw.trim_end().ends_with('/') {
                let start = cap.get(0).map_or(0, |m| m.end());
                TEXT_END_RE.find_at(&text, start).map(|end| {
                    let inner = &text[start..end.start()];
                    crate::unescape_xml(&INNER_TAG_RE.replace_all(inner, ""))
                })
            } else {
                None
            };
            match SvgElement::from_tag(tag, &attrs, content) {
                Some(el) => {
                    trace!(tag, "svg element");
                    elements.push(el);
                }
                None => debug!(tag, "skipping element without usable geometry"),
            }
        }

        Ok(Self {
            width,
            height,
            view_box,
            elements,
        })
    }

    /// Count of elements per tag, in first-seen order.
    pub fn tag_counts(&self) -> Vec<(&'static str, usize)> {
        let mut counts: Vec<(&'static str, usize)> = Vec::new();
        for el in &self.elements {
            match counts.iter_mut().find(|(t, _)| *t == el.tag()) {
                Some(entry) => entry.1 += 1,
                None => counts.push((el.tag(), 1)),
            }
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PathCommand;
    use geoconv_math::Point2D;

    #[test]
    fn test_rejects_non_svg() {
        let err = SvgDocument::parse("hello world").unwrap_err();
        assert_eq!(err.code(), "SVG_INVALID");
    }

    #[test]
    fn test_dimensions_default_viewbox_and_override() {
        let doc = SvgDocument::parse("<svg></svg>").unwrap();
        assert_eq!((doc.width, doc.height), (100.0, 100.0));

        let doc = SvgDocument::parse(r#"<svg viewBox="10 10 200 50"></svg>"#).unwrap();
        assert_eq!((doc.width, doc.height), (200.0, 50.0));
        assert_eq!(doc.view_box.unwrap().min_x, 10.0);

        let doc =
            SvgDocument::parse(r#"<svg viewBox="0 0 200 50" width="10mm" height="100%"></svg>"#)
                .unwrap();
        assert!((doc.width - 35.43307).abs() < 1e-9);
        assert_eq!(doc.height, 50.0);
    }

    #[test]
    fn test_elements_in_document_order() {
        let svg = r##"<?xml version="1.0"?>
<svg xmlns="http://www.w3.org/2000/svg" width="50" height="50">
  <!-- <rect width="9" height="9"/> -->
  <defs><path id="p" d="M0 0 L1 1"/></defs>
  <circle cx="5" cy="5" r="2" fill="#ff0000"/>
  <path d="M 0 0 L 10 0 L 10 10 Z" stroke="blue"/>
  <text x="1" y="2" font-size="8">a &lt; <tspan>b</tspan></text>
  <line x1="0" y1="0" x2="3" y2="4"/>
  <polygon points="0,0 1,0 1,1"/>
</svg>"##;
        let doc = SvgDocument::parse(svg).unwrap();
        let tags: Vec<_> = doc.elements.iter().map(|e| e.tag()).collect();
        assert_eq!(tags, vec!["circle", "path", "text", "line", "polygon"]);

        match &doc.elements[1] {
            SvgElement::Path { data, style } => {
                assert_eq!(data.commands[0], PathCommand::MoveTo(Point2D::ORIGIN));
                assert_eq!(style.stroke.as_deref(), Some("blue"));
            }
            other => panic!("expected path, got {:?}", other),
        }
        match &doc.elements[2] {
            SvgElement::Text { content, font_size, .. } => {
                assert_eq!(content, "a < b");
                assert_eq!(*font_size, 8.0);
            }
            other => panic!("expected text, got {:?}", other),
        }
        assert_eq!(doc.tag_counts()[0], ("circle", 1));
    }

    #[test]
    fn test_self_closing_text_has_no_content() {
        let doc = SvgDocument::parse(r#"<svg><text x="1"/><text>(x)</text></svg>"#).unwrap();
        assert_eq!(doc.elements.len(), 2);
        match (&doc.elements[0], &doc.elements[1]) {
            (SvgElement::Text { content: a, .. }, SvgElement::Text { content: b, .. }) => {
                assert_eq!(a, "");
                assert_eq!(b, "(x)");
            }
            other => panic!("expected two texts, got {:?}", other),
        }
    }

    #[test]
    fn test_viewbox_parse() {
        assert_eq!(
            ViewBox::parse("0,0, 10 20"),
            Some(ViewBox {
                min_x: 0.0,
                min_y: 0.0,
                width: 10.0,
                height: 20.0
            })
        );
        assert_eq!(ViewBox::parse("0 0 10"), None);
        assert_eq!(ViewBox::parse("a b c d"), None);
    }
}
