//! Fill and stroke color values.

/// An opaque 8-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rgb {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

impl Rgb {
    /// Black.
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);

    /// Create a color from channels.
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Resolve a paint value.
    ///
    /// `none`, `transparent` and empty values mean "do not paint" and give
    /// `None`. Hex (`#rgb`, `#rrggbb`), `rgb(r, g, b)` and a small named
    /// table are recognized; anything else falls back to black.
    pub fn parse_paint(value: &str) -> Option<Rgb> {
        let value = value.trim();
        if value.is_empty()
            || value.eq_ignore_ascii_case("none")
            || value.eq_ignore_ascii_case("transparent")
        {
            return None;
        }
        Some(Self::parse_color(value).unwrap_or(Rgb::BLACK))
    }

    /// Parse a concrete color, `None` if unrecognized.
    pub fn parse_color(value: &str) -> Option<Rgb> {
        let value = value.trim();
        if let Some(hex) = value.strip_prefix('#') {
            return Self::parse_hex(hex);
        }
        if let Some(args) = value
            .strip_prefix("rgb(")
            .and_then(|rest| rest.strip_suffix(')'))
        {
            let channels: Vec<u8> = args
                .split(',')
                .filter_map(|c| c.trim().parse::<f64>().ok())
                .map(|c| c.clamp(0.0, 255.0).round() as u8)
                .collect();
            return match channels[..] {
                [r, g, b] => Some(Rgb::new(r, g, b)),
                _ => None,
            };
        }
        let named = match value.to_ascii_lowercase().as_str() {
            "black" => Rgb::new(0, 0, 0),
            "white" => Rgb::new(255, 255, 255),
            "red" => Rgb::new(255, 0, 0),
            "green" => Rgb::new(0, 255, 0),
            "blue" => Rgb::new(0, 0, 255),
            "yellow" => Rgb::new(255, 255, 0),
            "cyan" => Rgb::new(0, 255, 255),
            "magenta" => Rgb::new(255, 0, 255),
            _ => return None,
        };
        Some(named)
    }

    fn parse_hex(hex: &str) -> Option<Rgb> {
        let digit = |i: usize| u8::from_str_radix(hex.get(i..i + 1)?, 16).ok();
        let pair = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
        match hex.len() {
            3 => Some(Rgb::new(digit(0)? * 17, digit(1)? * 17, digit(2)? * 17)),
            6 => Some(Rgb::new(pair(0)?, pair(2)?, pair(4)?)),
            _ => None,
        }
    }

    /// `#rrggbb` form.
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Channels scaled to `0.0..=1.0`.
    pub fn unit(&self) -> [f64; 3] {
        [
            f64::from(self.r) / 255.0,
            f64::from(self.g) / 255.0,
            f64::from(self.b) / 255.0,
        ]
    }

    /// Rec. 601 luma in `0.0..=1.0`.
    pub fn luminance(&self) -> f64 {
        let [r, g, b] = self.unit();
        0.299 * r + 0.587 * g + 0.114 * b
    }
}
