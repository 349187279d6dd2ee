//! A PostScript interpreter for the drawing subset.
//!
//! Paths are accumulated in output (SVG) space: the base CTM maps
//! PostScript page coordinates onto a Y-down canvas whose origin is the
//! bounding box's upper-left corner, so everything painted can be written
//! out without another transform.

use std::collections::{BTreeSet, HashMap};

use geoconv_core::fmt::num;
use geoconv_math::Point2D;
use geoconv_svg::Rgb;
use nalgebra::{Matrix3, Vector3};
use tracing::{debug, trace};

use crate::Token;

const MAX_CALL_DEPTH: usize = 32;
const MAX_OPERATIONS: usize = 5_000_000;
const MAX_ARC_SEGMENTS: usize = 4096;

/// Something that ended up on the page.
#[derive(Debug, Clone, PartialEq)]
pub enum Painted {
    /// A filled or stroked path, `d` in SVG path syntax.
    Path {
        /// SVG path data.
        d: String,
        /// Fill color for `fill`/`rectfill`.
        fill: Option<Rgb>,
        /// Stroke color and width for `stroke`/`rectstroke`.
        stroke: Option<(Rgb, f64)>,
    },
    /// A `show`.
    Text {
        /// Baseline origin.
        position: Point2D,
        /// Decoded string.
        content: String,
        /// Font size in output units.
        font_size: f64,
        /// PostScript font name.
        font_family: String,
        /// Fill color.
        color: Rgb,
    },
}

#[derive(Debug, Clone, PartialEq)]
enum Operand {
    Number(f64),
    Name(String),
    String(String),
    Proc(Vec<Token>),
    Array(Vec<Operand>),
    Font { name: String, size: f64 },
    Mark,
}

#[derive(Debug, Clone, Copy)]
enum Segment {
    Move(Point2D),
    Line(Point2D),
    Curve(Point2D, Point2D, Point2D),
    Close,
}

#[derive(Debug, Clone)]
struct GraphicsState {
    ctm: Matrix3<f64>,
    color: Rgb,
    line_width: f64,
    font: Option<(String, f64)>,
    path: Vec<Segment>,
    current: Option<Point2D>,
    start: Option<Point2D>,
}

fn transform(m: &Matrix3<f64>, x: f64, y: f64) -> Point2D {
    let v = m * Vector3::new(x, y, 1.0);
    Point2D::new(v.x, v.y)
}

fn transform_delta(m: &Matrix3<f64>, dx: f64, dy: f64) -> (f64, f64) {
    let v = m * Vector3::new(dx, dy, 0.0);
    (v.x, v.y)
}

/// Uniform scale of the linear part, used for widths and font sizes.
fn scale_factor(m: &Matrix3<f64>) -> f64 {
    (m[(0, 0)] * m[(1, 1)] - m[(0, 1)] * m[(1, 0)]).abs().sqrt()
}

fn unit_to_channel(v: f64) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

fn builtin_alias(name: &str) -> &str {
    match name {
        "m" => "moveto",
        "l" => "lineto",
        "c" => "curveto",
        "cp" => "closepath",
        "f" => "fill",
        "s" => "stroke",
        "gs" => "gsave",
        "gr" => "grestore",
        "rgb" => "setrgbcolor",
        "w" => "setlinewidth",
        other => other,
    }
}

/// Executes tokens against an operand stack and graphics state.
///
/// Errors that would abort a real interpreter (stack underflow, type
/// mismatch, no current point) skip the offending operator instead.
/// Unknown operators are recorded and otherwise ignored.
#[derive(Debug)]
pub struct Interpreter {
    stack: Vec<Operand>,
    state: GraphicsState,
    saved: Vec<GraphicsState>,
    dict: HashMap<String, Operand>,
    painted: Vec<Painted>,
    unknown: BTreeSet<String>,
    arc_segments_per_turn: usize,
    depth: usize,
    operations: usize,
}

impl Interpreter {
    /// Interpreter for a page whose bounding box starts at `(llx, lly)`
    /// and is `height` units tall.
    pub fn new(llx: f64, lly: f64, height: f64) -> Self {
        #[rustfmt::skip]
        let base = Matrix3::new(
            1.0, 0.0, -llx,
            0.0, -1.0, height + lly,
            0.0, 0.0, 1.0,
        );
        Self {
            stack: Vec::new(),
            state: GraphicsState {
                ctm: base,
                color: Rgb::BLACK,
                line_width: 1.0,
                font: None,
                path: Vec::new(),
                current: None,
                start: None,
            },
            saved: Vec::new(),
            dict: HashMap::new(),
            painted: Vec::new(),
            unknown: BTreeSet::new(),
            arc_segments_per_turn: 72,
            depth: 0,
            operations: 0,
        }
    }

    /// Initial line width in user units.
    pub fn with_line_width(mut self, width: f64) -> Self {
        self.state.line_width = width;
        self
    }

    /// Straight segments used for a full `arc` turn.
    pub fn with_arc_segments(mut self, per_turn: usize) -> Self {
        self.arc_segments_per_turn = per_turn.max(4);
        self
    }

    /// Execute a token stream.
    pub fn run(&mut self, tokens: &[Token]) {
        for token in tokens {
            if self.operations >= MAX_OPERATIONS {
                debug!("operation budget exhausted, stopping");
                return;
            }
            self.operations += 1;
            match token {
                Token::Number(v) => self.stack.push(Operand::Number(*v)),
                Token::Literal(name) => self.stack.push(Operand::Name(name.clone())),
                Token::String(s) => self.stack.push(Operand::String(s.clone())),
                Token::Proc(body) => self.stack.push(Operand::Proc(body.clone())),
                Token::Name(name) => self.call(name),
            }
        }
    }

    /// Operators seen but not understood, sorted.
    pub fn unknown_operators(&self) -> impl Iterator<Item = &str> {
        self.unknown.iter().map(String::as_str)
    }

    /// Everything painted so far, in paint order.
    pub fn painted(&self) -> &[Painted] {
        &self.painted
    }

    /// Consume the interpreter, returning what was painted.
    pub fn finish(self) -> Vec<Painted> {
        self.painted
    }

    fn call(&mut self, name: &str) {
        match self.dict.get(name).cloned() {
            Some(Operand::Proc(body)) => {
                if self.depth >= MAX_CALL_DEPTH {
                    debug!(name, "procedure nesting too deep, skipping call");
                    return;
                }
                self.depth += 1;
                self.run(&body);
                self.depth -= 1;
            }
            Some(value) => self.stack.push(value),
            None => {
                let op = builtin_alias(name);
                if !self.operator(op) {
                    trace!(name, "unknown operator");
                    self.unknown.insert(name.to_string());
                }
            }
        }
    }

    fn pop(&mut self) -> Option<Operand> {
        self.stack.pop()
    }

    fn pop_numbers<const N: usize>(&mut self, op: &str) -> Option<[f64; N]> {
        let len = self.stack.len();
        if len < N {
            debug!(op, "stack underflow");
            return None;
        }
        let mut out = [0.0; N];
        for (slot, operand) in out.iter_mut().zip(&self.stack[len - N..]) {
            match operand {
                Operand::Number(v) => *slot = *v,
                _ => {
                    debug!(op, "expected numeric operands");
                    return None;
                }
            }
        }
        self.stack.truncate(len - N);
        Some(out)
    }

    fn concat(&mut self, m: Matrix3<f64>) {
        self.state.ctm *= m;
    }

    fn point(&self, x: f64, y: f64) -> Point2D {
        transform(&self.state.ctm, x, y)
    }

    fn move_to(&mut self, p: Point2D) {
        self.state.path.push(Segment::Move(p));
        self.state.current = Some(p);
        self.state.start = Some(p);
    }

    fn line_to(&mut self, p: Point2D) {
        self.state.path.push(Segment::Line(p));
        self.state.current = Some(p);
    }

    fn current_or_skip(&self, op: &str) -> Option<Point2D> {
        if self.state.current.is_none() {
            debug!(op, "no current point");
        }
        self.state.current
    }

    fn new_path(&mut self) {
        self.state.path.clear();
        self.state.current = None;
        self.state.start = None;
    }

    fn path_data(segments: &[Segment]) -> Option<String> {
        if !segments
            .iter()
            .any(|s| matches!(s, Segment::Line(_) | Segment::Curve(..)))
        {
            return None;
        }
        let parts: Vec<String> = segments
            .iter()
            .map(|s| match s {
                Segment::Move(p) => format!("M {} {}", num(p.x), num(p.y)),
                Segment::Line(p) => format!("L {} {}", num(p.x), num(p.y)),
                Segment::Curve(a, b, c) => format!(
                    "C {} {} {} {} {} {}",
                    num(a.x),
                    num(a.y),
                    num(b.x),
                    num(b.y),
                    num(c.x),
                    num(c.y)
                ),
                Segment::Close => "Z".to_string(),
            })
            .collect();
        Some(parts.join(" "))
    }

    fn stroke_width(&self) -> f64 {
        self.state.line_width * scale_factor(&self.state.ctm)
    }

    fn paint(&mut self, segments: &[Segment], fill: bool) {
        let Some(d) = Self::path_data(segments) else {
            return;
        };
        let painted = if fill {
            Painted::Path {
                d,
                fill: Some(self.state.color),
                stroke: None,
            }
        } else {
            Painted::Path {
                d,
                fill: None,
                stroke: Some((self.state.color, self.stroke_width())),
            }
        };
        self.painted.push(painted);
    }

    fn paint_current(&mut self, fill: bool) {
        let segments = std::mem::take(&mut self.state.path);
        self.paint(&segments, fill);
        self.new_path();
    }

    fn rect(&mut self, [x, y, w, h]: [f64; 4], fill: bool) {
        let corners = [
            self.point(x, y),
            self.point(x + w, y),
            self.point(x + w, y + h),
            self.point(x, y + h),
        ];
        let segments = [
            Segment::Move(corners[0]),
            Segment::Line(corners[1]),
            Segment::Line(corners[2]),
            Segment::Line(corners[3]),
            Segment::Close,
        ];
        self.paint(&segments, fill);
    }

    fn arc(&mut self, [x, y, r, a1, a2]: [f64; 5], clockwise: bool) {
        let sweep = if clockwise {
            if a2 <= a1 {
                a1 - a2
            } else {
                (a1 - a2).rem_euclid(360.0)
            }
        } else if a2 >= a1 {
            a2 - a1
        } else {
            (a2 - a1).rem_euclid(360.0)
        };
        let signed = if clockwise { -sweep } else { sweep };
        let steps = ((sweep / 360.0) * self.arc_segments_per_turn as f64)
            .ceil()
            .clamp(1.0, MAX_ARC_SEGMENTS as f64) as usize;
        for i in 0..=steps {
            let angle = (a1 + signed * i as f64 / steps as f64).to_radians();
            let p = self.point(x + r * angle.cos(), y + r * angle.sin());
            if i == 0 && self.state.current.is_none() {
                self.move_to(p);
            } else {
                self.line_to(p);
            }
        }
    }

    fn set_color(&mut self, color: Rgb) {
        self.state.color = color;
    }

    fn show(&mut self, content: String) {
        let Some(position) = self.current_or_skip("show") else {
            return;
        };
        let (family, size) = self
            .state
            .font
            .clone()
            .unwrap_or_else(|| ("Helvetica".to_string(), 12.0));
        self.painted.push(Painted::Text {
            position,
            content,
            font_size: size * scale_factor(&self.state.ctm),
            font_family: family,
            color: self.state.color,
        });
    }

    /// Execute one operator by name. Returns false when it is unknown.
    fn operator(&mut self, op: &str) -> bool {
        match op {
            // Stack and dictionary.
            "[" | "<<" | "mark" => self.stack.push(Operand::Mark),
            "]" => {
                let items: Vec<Operand> =
                    match self.stack.iter().rposition(|o| *o == Operand::Mark) {
                        Some(start) => self.stack.drain(start..).skip(1).collect(),
                        None => self.stack.drain(..).collect(),
                    };
                self.stack.push(Operand::Array(items));
            }
            ">>" => {
                if let Some(start) = self.stack.iter().rposition(|o| *o == Operand::Mark) {
                    self.stack.truncate(start);
                }
            }
            "def" => {
                let value = self.pop();
                match (self.pop(), value) {
                    (Some(Operand::Name(key)), Some(value)) => {
                        self.dict.insert(key, value);
                    }
                    _ => debug!("def without a literal key"),
                }
            }
            "bind" => {}
            "pop" => {
                self.pop();
            }
            "dup" => {
                if let Some(top) = self.stack.last().cloned() {
                    self.stack.push(top);
                }
            }
            "exch" => {
                let len = self.stack.len();
                if len >= 2 {
                    self.stack.swap(len - 1, len - 2);
                }
            }
            "currentpoint" => {
                let user = self.state.current.and_then(|p| {
                    let inv = self.state.ctm.try_inverse()?;
                    Some(transform(&inv, p.x, p.y))
                });
                match user {
                    Some(p) => {
                        self.stack.push(Operand::Number(p.x));
                        self.stack.push(Operand::Number(p.y));
                    }
                    None => debug!("currentpoint without a current point"),
                }
            }

            // Path construction.
            "newpath" => self.new_path(),
            "moveto" => {
                if let Some([x, y]) = self.pop_numbers("moveto") {
                    let p = self.point(x, y);
                    self.move_to(p);
                }
            }
            "rmoveto" => {
                if let Some([dx, dy]) = self.pop_numbers("rmoveto") {
                    if let Some(cur) = self.current_or_skip("rmoveto") {
                        let (dx, dy) = transform_delta(&self.state.ctm, dx, dy);
                        self.move_to(cur.offset(dx, dy));
                    }
                }
            }
            "lineto" => {
                if let Some([x, y]) = self.pop_numbers("lineto") {
                    if self.current_or_skip("lineto").is_some() {
                        let p = self.point(x, y);
                        self.line_to(p);
                    }
                }
            }
            "rlineto" => {
                if let Some([dx, dy]) = self.pop_numbers("rlineto") {
                    if let Some(cur) = self.current_or_skip("rlineto") {
                        let (dx, dy) = transform_delta(&self.state.ctm, dx, dy);
                        self.line_to(cur.offset(dx, dy));
                    }
                }
            }
            "curveto" => {
                if let Some([x1, y1, x2, y2, x3, y3]) = self.pop_numbers("curveto") {
                    if self.current_or_skip("curveto").is_some() {
                        let end = self.point(x3, y3);
                        let seg = Segment::Curve(self.point(x1, y1), self.point(x2, y2), end);
                        self.state.path.push(seg);
                        self.state.current = Some(end);
                    }
                }
            }
            "rcurveto" => {
                if let Some([x1, y1, x2, y2, x3, y3]) = self.pop_numbers("rcurveto") {
                    if let Some(cur) = self.current_or_skip("rcurveto") {
                        let m = self.state.ctm;
                        let rel = |dx, dy| {
                            let (dx, dy) = transform_delta(&m, dx, dy);
                            cur.offset(dx, dy)
                        };
                        let end = rel(x3, y3);
                        self.state
                            .path
                            .push(Segment::Curve(rel(x1, y1), rel(x2, y2), end));
                        self.state.current = Some(end);
                    }
                }
            }
            "closepath" => {
                if self.state.current.is_some() {
                    self.state.path.push(Segment::Close);
                    self.state.current = self.state.start;
                }
            }
            "arc" | "arcn" => {
                if let Some(args) = self.pop_numbers("arc") {
                    self.arc(args, op == "arcn");
                }
            }

            // Painting.
            "fill" | "eofill" => self.paint_current(true),
            "stroke" => self.paint_current(false),
            "rectfill" => {
                if let Some(args) = self.pop_numbers("rectfill") {
                    self.rect(args, true);
                }
            }
            "rectstroke" => {
                if let Some(args) = self.pop_numbers("rectstroke") {
                    self.rect(args, false);
                }
            }

            // Graphics state.
            "gsave" => self.saved.push(self.state.clone()),
            "grestore" => {
                if let Some(state) = self.saved.pop() {
                    self.state = state;
                }
            }
            "save" => {
                self.saved.push(self.state.clone());
                self.stack.push(Operand::Mark);
            }
            "restore" => {
                self.pop();
                if let Some(state) = self.saved.pop() {
                    self.state = state;
                }
            }
            "translate" => {
                if let Some([tx, ty]) = self.pop_numbers("translate") {
                    self.concat(Matrix3::new_translation(&nalgebra::Vector2::new(tx, ty)));
                }
            }
            "scale" => {
                if let Some([sx, sy]) = self.pop_numbers("scale") {
                    self.concat(Matrix3::new_nonuniform_scaling(&nalgebra::Vector2::new(
                        sx, sy,
                    )));
                }
            }
            "rotate" => {
                if let Some([angle]) = self.pop_numbers("rotate") {
                    self.concat(Matrix3::new_rotation(angle.to_radians()));
                }
            }
            "concat" => match self.pop() {
                Some(Operand::Array(items)) if items.len() == 6 => {
                    let v: Vec<f64> = items
                        .iter()
                        .filter_map(|o| match o {
                            Operand::Number(n) => Some(*n),
                            _ => None,
                        })
                        .collect();
                    if let [a, b, c, d, e, f] = v[..] {
                        #[rustfmt::skip]
                        let m = Matrix3::new(
                            a, c, e,
                            b, d, f,
                            0.0, 0.0, 1.0,
                        );
                        self.concat(m);
                    }
                }
                _ => debug!("concat expects a six-number array"),
            },
            "setrgbcolor" => {
                if let Some([r, g, b]) = self.pop_numbers("setrgbcolor") {
                    self.set_color(Rgb::new(
                        unit_to_channel(r),
                        unit_to_channel(g),
                        unit_to_channel(b),
                    ));
                }
            }
            "setcmykcolor" => {
                if let Some([c, m, y, k]) = self.pop_numbers("setcmykcolor") {
                    let k = k.clamp(0.0, 1.0);
                    let channel = |v: f64| unit_to_channel((1.0 - v.clamp(0.0, 1.0)) * (1.0 - k));
                    self.set_color(Rgb::new(channel(c), channel(m), channel(y)));
                }
            }
            "setgray" => {
                if let Some([g]) = self.pop_numbers("setgray") {
                    let v = unit_to_channel(g);
                    self.set_color(Rgb::new(v, v, v));
                }
            }
            "setlinewidth" => {
                if let Some([w]) = self.pop_numbers("setlinewidth") {
                    self.state.line_width = w.abs();
                }
            }
            "setlinecap" | "setlinejoin" | "setmiterlimit" | "setflat" => {
                self.pop();
            }
            "setdash" => {
                self.pop();
                self.pop();
            }
            "clip" | "eoclip" | "showpage" | "initclip" => {}

            // Text.
            "findfont" => match self.pop() {
                Some(Operand::Name(name)) => self.stack.push(Operand::Font { name, size: 1.0 }),
                _ => debug!("findfont expects a font name"),
            },
            "scalefont" => {
                if let Some([s]) = self.pop_numbers("scalefont") {
                    match self.pop() {
                        Some(Operand::Font { name, size }) => self.stack.push(Operand::Font {
                            name,
                            size: size * s,
                        }),
                        _ => debug!("scalefont expects a font"),
                    }
                }
            }
            "setfont" => match self.pop() {
                Some(Operand::Font { name, size }) => self.state.font = Some((name, size)),
                _ => debug!("setfont expects a font"),
            },
            "selectfont" => {
                if let Some([size]) = self.pop_numbers("selectfont") {
                    match self.pop() {
                        Some(Operand::Name(name)) => self.state.font = Some((name, size)),
                        _ => debug!("selectfont expects a font name"),
                    }
                }
            }
            "show" => match self.pop() {
                Some(Operand::String(s)) => self.show(s),
                _ => debug!("show expects a string"),
            },

            _ => return false,
        }
        true
    }
}
