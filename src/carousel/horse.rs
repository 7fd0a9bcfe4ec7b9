//! The horse silhouette.
//!
//! The outline is authored in a 150×150 design space and mapped into scene
//! units with `x * SCALE.0 + OFFSET.0`, `y * SCALE.1 + OFFSET.1`.

use crate::data_structures::path::Path;

pub const SCALE: (f32, f32) = (0.03, 0.03);
pub const OFFSET: (f32, f32) = (0.0, -4.0);

/// Curve samples per segment when the outline is filled.
pub const CURVE_SEGMENTS: usize = 12;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Command {
    MoveTo(f32, f32),
    LineTo(f32, f32),
    /// Control point, end point.
    QuadTo(f32, f32, f32, f32),
    /// Two control points, end point.
    CubicTo(f32, f32, f32, f32, f32, f32),
}

use Command::*;

#[rustfmt::skip]
pub const OUTLINE: &[Command] = &[
    MoveTo(64.0, 136.0),
    LineTo(82.0, 136.0),
    LineTo(81.0, 92.0),
    QuadTo(93.0, 108.0, 99.0, 90.0),
    LineTo(104.0, 88.0),
    CubicTo(126.0, 93.0, 106.0, 83.0, 134.0, 89.0),
    CubicTo(146.0, 88.0, 139.0, 62.0, 119.0, 65.0),
    LineTo(116.0, 54.0),
    CubicTo(126.0, 53.0, 130.0, 31.0, 117.0, 32.0),
    CubicTo(104.0, 14.0, 88.0, 45.0, 95.0, 47.0),
    QuadTo(85.0, 49.0, 81.0, 53.0),
    LineTo(81.0, 32.0),
    CubicTo(86.0, 18.0, 93.0, 12.0, 72.0, 12.0),
    CubicTo(52.0, 12.0, 65.0, 25.0, 65.0, 31.0),
    LineTo(65.0, 50.0),
    LineTo(60.0, 51.0),
    QuadTo(70.0, 34.0, 50.0, 34.0),
    QuadTo(44.0, 34.0, 40.0, 37.0),
    CubicTo(24.0, 37.0, 6.0, 66.0, 34.0, 69.0),
    LineTo(33.0, 85.0),
    CubicTo(4.0, 75.0, 15.0, 106.0, 22.0, 108.0),
    QuadTo(21.0, 116.0, 25.0, 119.0),
    QuadTo(29.0, 128.0, 38.0, 125.0),
    QuadTo(56.0, 126.0, 59.0, 115.0),
    LineTo(66.0, 109.0),
    LineTo(66.0, 136.0),
];

fn x(v: f32) -> f32 {
    v * SCALE.0 + OFFSET.0
}

fn y(v: f32) -> f32 {
    v * SCALE.1 + OFFSET.1
}

/// Builds the scaled outline path from [`OUTLINE`].
pub fn outline() -> Path {
    let mut path = Path::new();
    for command in OUTLINE {
        match *command {
            MoveTo(px, py) => path.move_to(x(px), y(py)),
            LineTo(px, py) => path.line_to(x(px), y(py)),
            QuadTo(cx, cy, px, py) => path.quadratic_curve_to(x(cx), y(cy), x(px), y(py)),
            CubicTo(c1x, c1y, c2x, c2y, px, py) => {
                path.bezier_curve_to(x(c1x), y(c1y), x(c2x), y(c2y), x(px), y(py))
            }
        };
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn outline_starts_at_scaled_first_point() {
        let path = outline();
        let first = path.curves()[0].point_at(0.0);
        assert_relative_eq!(first.x, 64.0 * 0.03, epsilon = 1e-6);
        assert_relative_eq!(first.y, 136.0 * 0.03 - 4.0, epsilon = 1e-6);
        assert_eq!(path.curves().len(), OUTLINE.len() - 1);
    }

    #[test]
    fn outline_stays_inside_design_box() {
        for point in outline().points(CURVE_SEGMENTS) {
            assert!((0.0..=150.0 * 0.03).contains(&point.x), "{point:?}");
            assert!((-4.0..=150.0 * 0.03 - 4.0).contains(&point.y), "{point:?}");
        }
    }
}
