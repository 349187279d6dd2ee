//! Number formatting shared by the text emitters.

/// Format a coordinate for SVG/PostScript output.
///
/// Rounds to six decimals, trims trailing zeros and never prints `-0`.
/// Integral values print without a fractional part (`10`, not `10.0`).
pub fn num(v: f64) -> String {
    if !v.is_finite() {
        return "0".to_string();
    }
    let rounded = (v * 1e6).round() / 1e6;
    if rounded == 0.0 {
        return "0".to_string();
    }
    let s = format!("{:.6}", rounded);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    s.to_string()
}
