//! 2D outlines used to author flat and extruded geometry.
//!
//! A [`Path`] is an ordered list of [`Curve`] segments (lines, quadratic and cubic
//! Béziers, circular arcs) that is flattened into a polyline with
//! [`Path::points`]. A [`Shape`] is a closed outer path with optional holes and is
//! the input to [`Geometry::shape`](crate::data_structures::geometry::Geometry::shape)
//! and [`Geometry::extrude`](crate::data_structures::geometry::Geometry::extrude).

use std::f32::consts::TAU;

use cgmath::Point2;

/// One segment of a [`Path`].
#[derive(Clone, Debug, PartialEq)]
pub enum Curve {
    Line {
        from: Point2<f32>,
        to: Point2<f32>,
    },
    Quadratic {
        from: Point2<f32>,
        control: Point2<f32>,
        to: Point2<f32>,
    },
    Cubic {
        from: Point2<f32>,
        control1: Point2<f32>,
        control2: Point2<f32>,
        to: Point2<f32>,
    },
    Arc {
        center: Point2<f32>,
        radius: f32,
        start_angle: f32,
        end_angle: f32,
        clockwise: bool,
    },
}

impl Curve {
    /// Point on the curve for `t` in `[0, 1]`.
    pub fn point_at(&self, t: f32) -> Point2<f32> {
        match *self {
            Curve::Line { from, to } => Point2::new(
                from.x + (to.x - from.x) * t,
                from.y + (to.y - from.y) * t,
            ),
            Curve::Quadratic { from, control, to } => Point2::new(
                quadratic_bezier(t, from.x, control.x, to.x),
                quadratic_bezier(t, from.y, control.y, to.y),
            ),
            Curve::Cubic {
                from,
                control1,
                control2,
                to,
            } => Point2::new(
                cubic_bezier(t, from.x, control1.x, control2.x, to.x),
                cubic_bezier(t, from.y, control1.y, control2.y, to.y),
            ),
            Curve::Arc {
                center,
                radius,
                start_angle,
                end_angle,
                clockwise,
            } => {
                let angle = start_angle + t * arc_sweep(start_angle, end_angle, clockwise);
                Point2::new(
                    center.x + radius * angle.cos(),
                    center.y + radius * angle.sin(),
                )
            }
        }
    }

    /// Number of sub-segments the curve is flattened into.
    ///
    /// Straight lines never need more than one.
    fn resolution(&self, divisions: usize) -> usize {
        match self {
            Curve::Line { .. } => 1,
            _ => divisions.max(1),
        }
    }
}

/// Signed sweep of an arc, normalised like a canvas `arc()` call: a full circle in
/// either direction stays a full circle.
fn arc_sweep(start: f32, end: f32, clockwise: bool) -> f32 {
    let mut delta = end - start;
    let same_points = delta.abs() < f32::EPSILON;
    while delta < 0.0 {
        delta += TAU;
    }
    while delta > TAU {
        delta -= TAU;
    }
    if delta < f32::EPSILON {
        delta = if same_points { 0.0 } else { TAU };
    }
    if clockwise && !same_points {
        delta = if delta == TAU { -TAU } else { delta - TAU };
    }
    delta
}

fn quadratic_bezier(t: f32, p0: f32, p1: f32, p2: f32) -> f32 {
    let k = 1.0 - t;
    k * k * p0 + 2.0 * k * t * p1 + t * t * p2
}

fn cubic_bezier(t: f32, p0: f32, p1: f32, p2: f32, p3: f32) -> f32 {
    let k = 1.0 - t;
    k * k * k * p0 + 3.0 * k * k * t * p1 + 3.0 * k * t * t * p2 + t * t * t * p3
}

/// A pen-style 2D path.
///
/// Drawing commands append curves starting at the current pen position, so the
/// commands read like the outline they describe:
///
/// ```
/// use carousel::data_structures::path::Path;
///
/// let mut path = Path::new();
/// path.move_to(0.0, 0.0)
///     .line_to(1.0, 0.0)
///     .quadratic_curve_to(1.5, 0.5, 1.0, 1.0);
/// assert_eq!(path.curves().len(), 2);
/// ```
#[derive(Clone, Debug)]
pub struct Path {
    curves: Vec<Curve>,
    current: Point2<f32>,
}

impl Default for Path {
    fn default() -> Self {
        Self::new()
    }
}

impl Path {
    pub fn new() -> Self {
        Self {
            curves: Vec::new(),
            current: Point2::new(0.0, 0.0),
        }
    }

    pub fn curves(&self) -> &[Curve] {
        &self.curves
    }

    pub fn current_point(&self) -> Point2<f32> {
        self.current
    }

    pub fn move_to(&mut self, x: f32, y: f32) -> &mut Self {
        self.current = Point2::new(x, y);
        self
    }

    pub fn line_to(&mut self, x: f32, y: f32) -> &mut Self {
        let to = Point2::new(x, y);
        self.curves.push(Curve::Line {
            from: self.current,
            to,
        });
        self.current = to;
        self
    }

    pub fn quadratic_curve_to(&mut self, cx: f32, cy: f32, x: f32, y: f32) -> &mut Self {
        let to = Point2::new(x, y);
        self.curves.push(Curve::Quadratic {
            from: self.current,
            control: Point2::new(cx, cy),
            to,
        });
        self.current = to;
        self
    }

    pub fn bezier_curve_to(
        &mut self,
        c1x: f32,
        c1y: f32,
        c2x: f32,
        c2y: f32,
        x: f32,
        y: f32,
    ) -> &mut Self {
        let to = Point2::new(x, y);
        self.curves.push(Curve::Cubic {
            from: self.current,
            control1: Point2::new(c1x, c1y),
            control2: Point2::new(c2x, c2y),
            to,
        });
        self.current = to;
        self
    }

    /// Circular arc around an absolute centre.
    ///
    /// If the path already has segments and the arc does not start at the pen
    /// position, a connecting line is inserted first.
    pub fn absarc(
        &mut self,
        cx: f32,
        cy: f32,
        radius: f32,
        start_angle: f32,
        end_angle: f32,
        clockwise: bool,
    ) -> &mut Self {
        let arc = Curve::Arc {
            center: Point2::new(cx, cy),
            radius,
            start_angle,
            end_angle,
            clockwise,
        };
        let first = arc.point_at(0.0);
        if !self.curves.is_empty() && first != self.current {
            self.line_to(first.x, first.y);
        }
        self.current = arc.point_at(1.0);
        self.curves.push(arc);
        self
    }

    /// Flatten the path into a polyline.
    ///
    /// Every curved segment is sampled `divisions` times; consecutive duplicate
    /// points (segment joints) are emitted once.
    pub fn points(&self, divisions: usize) -> Vec<Point2<f32>> {
        let mut points: Vec<Point2<f32>> = Vec::new();
        for curve in &self.curves {
            let resolution = curve.resolution(divisions);
            for step in 0..=resolution {
                let point = curve.point_at(step as f32 / resolution as f32);
                if points.last() == Some(&point) {
                    continue;
                }
                points.push(point);
            }
        }
        points
    }
}

/// A closed outline with optional holes.
#[derive(Clone, Debug, Default)]
pub struct Shape {
    pub outline: Path,
    pub holes: Vec<Path>,
}

impl Shape {
    pub fn new(outline: Path) -> Self {
        Self {
            outline,
            holes: Vec::new(),
        }
    }

    pub fn with_hole(mut self, hole: Path) -> Self {
        self.holes.push(hole);
        self
    }

    /// Flattened outline and holes.
    pub fn extract_points(&self, divisions: usize) -> (Vec<Point2<f32>>, Vec<Vec<Point2<f32>>>) {
        (
            self.outline.points(divisions),
            self.holes.iter().map(|hole| hole.points(divisions)).collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f32::consts::PI;

    #[test]
    fn default_path_starts_empty_at_origin() {
        let path = Path::default();
        assert!(path.curves().is_empty());
        assert_eq!(path.current_point(), Point2::new(0.0, 0.0));
        assert!(Shape::default().outline.curves().is_empty());
    }

    #[test]
    fn lines_are_not_subdivided() {
        let mut path = Path::new();
        path.move_to(0.0, 0.0).line_to(1.0, 0.0).line_to(1.0, 1.0);
        let points = path.points(12);
        assert_eq!(
            points,
            vec![
                Point2::new(0.0, 0.0),
                Point2::new(1.0, 0.0),
                Point2::new(1.0, 1.0)
            ]
        );
    }

    #[test]
    fn bezier_endpoints_are_exact() {
        let mut path = Path::new();
        path.move_to(0.0, 0.0)
            .bezier_curve_to(1.0, 2.0, 3.0, 2.0, 4.0, 0.0);
        let points = path.points(8);
        assert_eq!(points.len(), 9);
        assert_eq!(points[0], Point2::new(0.0, 0.0));
        assert_eq!(points[8], Point2::new(4.0, 0.0));
        // symmetric control polygon peaks at 3/4 of the control height
        assert_relative_eq!(points[4].y, 1.5, epsilon = 1e-5);
    }

    #[test]
    fn clockwise_full_circle_runs_backwards() {
        let arc = Curve::Arc {
            center: Point2::new(0.0, 0.0),
            radius: 1.0,
            start_angle: 0.0,
            end_angle: 2.0 * PI,
            clockwise: true,
        };
        let quarter = arc.point_at(0.25);
        assert_relative_eq!(quarter.x, 0.0, epsilon = 1e-5);
        assert_relative_eq!(quarter.y, -1.0, epsilon = 1e-5);

        let ccw = Curve::Arc {
            center: Point2::new(0.0, 0.0),
            radius: 1.0,
            start_angle: 0.0,
            end_angle: 2.0 * PI,
            clockwise: false,
        };
        assert_relative_eq!(ccw.point_at(0.25).y, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn absarc_from_pen_position_adds_no_connector() {
        let mut path = Path::new();
        path.move_to(20.0, 10.0)
            .absarc(10.0, 10.0, 10.0, 0.0, 2.0 * PI, false);
        assert_eq!(path.curves().len(), 1);
        let points = path.points(60);
        // closed arc: last point coincides with the first one
        assert_eq!(points.len(), 61);
        assert_relative_eq!(points[60].x, points[0].x, epsilon = 1e-4);
    }
}
