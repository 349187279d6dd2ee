//! Path data (`d` attribute) tokenizer and command model.

use std::sync::LazyLock;

use geoconv_math::{cubic_point, BoundingBox2D, Point2D};
use regex::Regex;
use tracing::debug;

static TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[MmLlHhVvCcSsQqTtAaZz]|[-+]?(?:\d+\.?\d*|\.\d+)(?:[eE][-+]?\d+)?")
        .expect("valid regex")
});

/// One absolute path command.
///
/// Relative commands are resolved against the current point while parsing,
/// so consumers only ever see absolute coordinates. Each source command maps
/// to exactly one variant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathCommand {
    /// `M`: start a new subpath.
    MoveTo(Point2D),
    /// `L`: straight line.
    LineTo(Point2D),
    /// `H`: horizontal line to absolute x.
    HorizontalTo(f64),
    /// `V`: vertical line to absolute y.
    VerticalTo(f64),
    /// `C`: cubic Bezier.
    CubicTo {
        /// First control point.
        c1: Point2D,
        /// Second control point.
        c2: Point2D,
        /// End point.
        end: Point2D,
    },
    /// `Z`: close the current subpath.
    Close,
    /// `A`, `Q`, `S` or `T`: recognized but not converted.
    Unsupported {
        /// Source command letter (uppercase).
        command: char,
        /// End point, so the current point stays correct.
        end: Point2D,
    },
}

/// A parsed `d` attribute.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PathData {
    /// Commands in source order.
    pub commands: Vec<PathCommand>,
}

/// A flattened subpath: a polyline plus whether it was closed with `Z`.
#[derive(Debug, Clone, PartialEq)]
pub struct Subpath {
    /// Points in order; a closing `Z` does not repeat the first point.
    pub points: Vec<Point2D>,
    /// True when the subpath ended with `Z`.
    pub closed: bool,
}

fn arity(command: char) -> usize {
    match command.to_ascii_uppercase() {
        'M' | 'L' | 'T' => 2,
        'H' | 'V' => 1,
        'C' => 6,
        'S' | 'Q' => 4,
        'A' => 7,
        _ => 0,
    }
}

impl PathData {
    /// Tokenize and resolve path data.
    ///
    /// Never fails: numbers before the first command and incomplete
    /// argument groups are dropped. Extra coordinate pairs after `M`
    /// continue as implicit `L`, as the SVG grammar requires.
    pub fn parse(d: &str) -> Self {
        let mut runs: Vec<(char, Vec<f64>)> = Vec::new();
        for token in TOKEN_RE.find_iter(d) {
            let text = token.as_str();
            let mut chars = text.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) if c.is_ascii_alphabetic() => runs.push((c, Vec::new())),
                _ => match (runs.last_mut(), text.parse::<f64>()) {
                    (Some((_, args)), Ok(v)) => args.push(v),
                    (None, _) => debug!(token = text, "path number before first command"),
                    (_, Err(_)) => debug!(token = text, "unparseable path number"),
                },
            }
        }

        let mut resolver = Resolver::default();
        for (command, args) in runs {
            let n = arity(command);
            if n == 0 {
                resolver.close();
                continue;
            }
            if args.len() % n != 0 {
                debug!(%command, count = args.len(), "dropping incomplete path arguments");
            }
            for (i, chunk) in args.chunks_exact(n).enumerate() {
                let command = match command {
                    'M' if i > 0 => 'L',
                    'm' if i > 0 => 'l',
                    c => c,
                };
                resolver.push(command, chunk);
            }
        }
        PathData {
            commands: resolver.commands,
        }
    }

    /// True when no commands were recognized.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Flatten into polylines.
    ///
    /// Cubic segments are sampled into `curve_segments` straight pieces
    /// (at least one). Unsupported commands contribute their end point.
    pub fn subpaths(&self, curve_segments: usize) -> Vec<Subpath> {
        let segments = curve_segments.max(1);
        let mut out = Vec::new();
        let mut current: Vec<Point2D> = Vec::new();
        let mut cursor = Point2D::ORIGIN;

        let flush = |points: &mut Vec<Point2D>, closed: bool, out: &mut Vec<Subpath>| {
            if !points.is_empty() {
                out.push(Subpath {
                    points: std::mem::take(points),
                    closed,
                });
            }
        };

        for cmd in &self.commands {
            match *cmd {
                PathCommand::MoveTo(p) => {
                    flush(&mut current, false, &mut out);
                    current.push(p);
                    cursor = p;
                }
                PathCommand::Close => {
                    let start = current.first().copied();
                    flush(&mut current, true, &mut out);
                    if let Some(start) = start {
                        cursor = start;
                    }
                }
                PathCommand::CubicTo { c1, c2, end } => {
                    if current.is_empty() {
                        current.push(cursor);
                    }
                    let p0 = cursor;
                    for step in 1..=segments {
                        let t = step as f64 / segments as f64;
                        current.push(cubic_point(&p0, &c1, &c2, &end, t));
                    }
                    cursor = end;
                }
                _ => {
                    let p = cmd.end_point(cursor);
                    if current.is_empty() {
                        current.push(cursor);
                    }
                    current.push(p);
                    cursor = p;
                }
            }
        }
        flush(&mut current, false, &mut out);
        out
    }

    /// Bounding box over end and control points.
    pub fn bounds(&self) -> BoundingBox2D {
        let mut bbox = BoundingBox2D::empty();
        let mut cursor = Point2D::ORIGIN;
        let mut start = Point2D::ORIGIN;
        for cmd in &self.commands {
            if let PathCommand::CubicTo { c1, c2, .. } = cmd {
                bbox.include_point(c1);
                bbox.include_point(c2);
            }
            cursor = match cmd {
                PathCommand::MoveTo(p) => {
                    start = *p;
                    *p
                }
                PathCommand::Close => start,
                other => other.end_point(cursor),
            };
            bbox.include_point(&cursor);
        }
        bbox
    }
}

impl PathCommand {
    /// Absolute end point of this command given the current point.
    pub fn end_point(&self, cursor: Point2D) -> Point2D {
        match *self {
            PathCommand::MoveTo(p) | PathCommand::LineTo(p) => p,
            PathCommand::HorizontalTo(x) => Point2D::new(x, cursor.y),
            PathCommand::VerticalTo(y) => Point2D::new(cursor.x, y),
            PathCommand::CubicTo { end, .. } | PathCommand::Unsupported { end, .. } => end,
            PathCommand::Close => cursor,
        }
    }
}

/// Tracks the current point and subpath start while resolving commands.
#[derive(Default)]
struct Resolver {
    commands: Vec<PathCommand>,
    cursor: Point2D,
    start: Point2D,
}

impl Resolver {
    fn point(&self, relative: bool, x: f64, y: f64) -> Point2D {
        if relative {
            self.cursor.offset(x, y)
        } else {
            Point2D::new(x, y)
        }
    }

    fn push(&mut self, command: char, a: &[f64]) {
        let rel = command.is_ascii_lowercase();
        let cmd = match command.to_ascii_uppercase() {
            'M' => {
                let p = self.point(rel, a[0], a[1]);
                self.start = p;
                PathCommand::MoveTo(p)
            }
            'L' => PathCommand::LineTo(self.point(rel, a[0], a[1])),
            'H' => PathCommand::HorizontalTo(if rel { self.cursor.x + a[0] } else { a[0] }),
            'V' => PathCommand::VerticalTo(if rel { self.cursor.y + a[0] } else { a[0] }),
            'C' => PathCommand::CubicTo {
                c1: self.point(rel, a[0], a[1]),
                c2: self.point(rel, a[2], a[3]),
                end: self.point(rel, a[4], a[5]),
            },
            other => {
                let end = self.point(rel, a[a.len() - 2], a[a.len() - 1]);
                debug!(command = %other, "unsupported path command");
                PathCommand::Unsupported {
                    command: other,
                    end,
                }
            }
        };
        self.cursor = cmd.end_point(self.cursor);
        self.commands.push(cmd);
    }

    fn close(&mut self) {
        self.commands.push(PathCommand::Close);
        self.cursor = self.start;
    }
}

/// Parse a `points` attribute (`x1,y1 x2,y2 ...`) into points.
///
/// A trailing odd coordinate is ignored.
pub fn parse_points(value: &str) -> Vec<Point2D> {
    let numbers: Vec<f64> = TOKEN_RE
        .find_iter(value)
        .filter_map(|m| m.as_str().parse().ok())
        .collect();
    numbers
        .chunks_exact(2)
        .map(|c| Point2D::new(c[0], c[1]))
        .collect()
}
