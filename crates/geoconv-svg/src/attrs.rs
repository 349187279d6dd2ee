//! Attribute extraction from a raw tag.

use std::sync::LazyLock;

use regex::Regex;

static ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([A-Za-z_:][\w:.-]*)\s*=\s*(?:"([^"]*)"|'([^']*)')"#).expect("valid regex")
});

/// Presentation properties that may also appear in a `style` attribute.
const STYLE_PROPERTIES: &[&str] = &[
    "fill",
    "stroke",
    "stroke-width",
    "font-size",
    "font-family",
    "opacity",
];

/// Attributes of one element, in source order.
///
/// Declarations inside `style="..."` override the matching presentation
/// attributes, as in CSS.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attributes {
    entries: Vec<(String, String)>,
}

impl Attributes {
    /// Parse the attribute section of a tag.
    pub fn parse(tag: &str) -> Self {
        let mut attrs = Self::default();
        for cap in ATTR_RE.captures_iter(tag) {
            let name = cap[1].to_string();
            let value = cap
                .get(2)
                .or_else(|| cap.get(3))
                .map(|m| crate::unescape_xml(m.as_str()))
                .unwrap_or_default();
            attrs.set(name, value);
        }
        if let Some(style) = attrs.get("style").map(str::to_string) {
            for decl in style.split(';') {
                if let Some((key, value)) = decl.split_once(':') {
                    let key = key.trim();
                    if STYLE_PROPERTIES.contains(&key) {
                        attrs.set(key.to_string(), value.trim().to_string());
                    }
                }
            }
        }
        attrs
    }

    fn set(&mut self, name: String, value: String) {
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Raw value of an attribute.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Attribute parsed as a length in user units.
    pub fn length(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(crate::parse_length)
    }

    /// Attribute parsed as a length, or `default` when absent or invalid.
    pub fn length_or(&self, name: &str, default: f64) -> f64 {
        self.length(name).unwrap_or(default)
    }

    /// Number of attributes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the tag had no attributes.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quotes_and_hyphenated_names() {
        let attrs = Attributes::parse(r##"<path d="M 0 0" stroke-width='2.5' xlink:href="#a"/>"##);
        assert_eq!(attrs.get("d"), Some("M 0 0"));
        assert_eq!(attrs.length("stroke-width"), Some(2.5));
        assert_eq!(attrs.get("xlink:href"), Some("#a"));
        assert_eq!(attrs.len(), 3);
    }

    #[test]
    fn test_style_overrides_presentation_attribute() {
        let attrs = Attributes::parse(r#"<rect fill="red" style="fill: #00ff00; stroke:blue; cursor:pointer"/>"#);
        assert_eq!(attrs.get("fill"), Some("#00ff00"));
        assert_eq!(attrs.get("stroke"), Some("blue"));
        assert_eq!(attrs.get("cursor"), None);
    }

    #[test]
    fn test_entities_and_defaults() {
        let attrs = Attributes::parse(r#"<text font-family="A &amp; B" x="">"#);
        assert_eq!(attrs.get("font-family"), Some("A & B"));
        assert_eq!(attrs.length_or("x", 4.0), 4.0);
        assert_eq!(attrs.length_or("y", 0.0), 0.0);
    }
}
