//! Length attribute parsing.

/// Parse an SVG length into user units (pixels at 90 dpi).
///
/// Supported suffixes: none/`px` (1), `pt` (1.25), `pc` (15), `mm`
/// (3.543307), `cm` (35.43307), `in` (90). Percentages and unknown units
/// return `None` so callers can fall back to the viewBox.
pub fn parse_length(value: &str) -> Option<f64> {
    let value = value.trim();
    let split = value
        .find(|c: char| !(c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E')))
        .unwrap_or(value.len());
    let (number, unit) = value.split_at(split);
    let number: f64 = number.parse().ok()?;
    let factor = match unit.trim() {
        "" | "px" => 1.0,
        "pt" => 1.25,
        "pc" => 15.0,
        "mm" => 3.543307,
        "cm" => 35.43307,
        "in" => 90.0,
        _ => return None,
    };
    Some(number * factor)
}
