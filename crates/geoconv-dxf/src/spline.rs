//! SPLINE to SVG path approximation.
//!
//! The control polygon is rendered as a chain of cubic Bezier segments.
//! Knots, weights and degree are ignored, so the result only approximates
//! the NURBS curve a CAD viewer would draw. It passes through the first
//! control point and every third one after it.

use std::fmt::{self, Write};

use geoconv_core::fmt::num;
use geoconv_math::{elevate_quadratic, Point2D};

use crate::Spline;

fn pt(p: &Point2D) -> String {
    format!("{} {}", num(p.x), num(p.y))
}

/// SVG path data approximating `spline`. Empty with fewer than two
/// control points; a closed spline ends with `Z`.
///
/// - two points: a straight line
/// - three points: a quadratic elevated to one cubic
/// - more: cubic segments over consecutive control-point triples, with a
///   shortened final segment when the count does not divide evenly
pub fn spline_path(spline: &Spline) -> Result<String, fmt::Error> {
    let cp = &spline.control_points;
    let n = cp.len();
    if n < 2 {
        return Ok(String::new());
    }
    let mut d = String::new();
    write!(d, "M {}", pt(&cp[0]))?;
    if n == 3 {
        let (c1, c2) = elevate_quadratic(&cp[0], &cp[1], &cp[2]);
        write!(d, " C {} {} {}", pt(&c1), pt(&c2), pt(&cp[2]))?;
    } else {
        let mut i = 0;
        while i + 1 < n {
            if i + 3 < n {
                write!(d, " C {} {} {}", pt(&cp[i + 1]), pt(&cp[i + 2]), pt(&cp[i + 3]))?;
            } else if i + 2 < n {
                write!(d, " C {} {} {}", pt(&cp[i + 1]), pt(&cp[i + 2]), pt(&cp[i + 2]))?;
            } else {
                write!(d, " L {}", pt(&cp[i + 1]))?;
            }
            i += 3;
        }
    }
    if spline.closed {
        d.push_str(" Z");
    }
    Ok(d)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spline(points: &[(f64, f64)]) -> Spline {
        Spline {
            degree: 3,
            control_points: points.iter().map(|&(x, y)| Point2D::new(x, y)).collect(),
            knots: Vec::new(),
            weights: Vec::new(),
            closed: false,
        }
    }

    #[test]
    fn test_degenerate_counts() {
        assert_eq!(spline_path(&spline(&[])).unwrap(), "");
        assert_eq!(spline_path(&spline(&[(1.0, 1.0)])).unwrap(), "");
        assert_eq!(spline_path(&spline(&[(0.0, 0.0), (5.0, 5.0)])).unwrap(), "M 0 0 L 5 5");
    }

    #[test]
    fn test_three_points_elevated() {
        let d = spline_path(&spline(&[(0.0, 0.0), (3.0, 3.0), (6.0, 0.0)])).unwrap();
        assert_eq!(d, "M 0 0 C 2 2 4 2 6 0");
    }

    #[test]
    fn test_four_points_single_cubic() {
        let d = spline_path(&spline(&[(0.0, 0.0), (1.0, 1.0), (2.0, 1.0), (3.0, 0.0)])).unwrap();
        assert_eq!(d, "M 0 0 C 1 1 2 1 3 0");
    }

    #[test]
    fn test_closed_in_every_branch() {
        let closed = |points: &[(f64, f64)]| {
            let mut s = spline(points);
            s.closed = true;
            spline_path(&s).unwrap()
        };
        assert_eq!(closed(&[(0.0, 0.0), (5.0, 5.0)]), "M 0 0 L 5 5 Z");
        assert_eq!(closed(&[(0.0, 0.0), (3.0, 3.0), (6.0, 0.0)]), "M 0 0 C 2 2 4 2 6 0 Z");
        assert_eq!(
            closed(&[(0.0, 0.0), (1.0, 1.0), (2.0, 1.0), (3.0, 0.0)]),
            "M 0 0 C 1 1 2 1 3 0 Z"
        );
    }

    #[test]
    fn test_remainders() {
        // Five points: one full cubic then a line to the last point.
        let d = spline_path(&spline(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0), (3.0, 0.0), (4.0, 0.0)])).unwrap();
        assert_eq!(d, "M 0 0 C 1 0 2 0 3 0 L 4 0");
        // Six points: the second cubic repeats its last control point.
        let d = spline_path(&spline(&[
            (0.0, 0.0),
            (1.0, 0.0),
            (2.0, 0.0),
            (3.0, 0.0),
            (4.0, 0.0),
            (5.0, 0.0),
        ])).unwrap();
        assert_eq!(d, "M 0 0 C 1 0 2 0 3 0 C 4 0 5 0 5 0");
    }
}
