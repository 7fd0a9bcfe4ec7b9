//! Polygon triangulation for shape filling.
//!
//! Winding helpers plus a thin layer over `earcutr`, which clips ears from the
//! outline after bridging every hole into it.

use cgmath::Point2;

/// Signed area of a closed contour; positive for counter-clockwise winding.
pub fn area(contour: &[Point2<f32>]) -> f32 {
    let n = contour.len();
    if n < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    let mut p = n - 1;
    for q in 0..n {
        sum += contour[p].x * contour[q].y - contour[q].x * contour[p].y;
        p = q;
    }
    sum * 0.5
}

pub fn is_clockwise(contour: &[Point2<f32>]) -> bool {
    area(contour) < 0.0
}

/// Drops a closing point that repeats the first one.
pub fn remove_duplicate_end(points: &mut Vec<Point2<f32>>) {
    if points.len() > 2 && points.first() == points.last() {
        points.pop();
    }
}

/// Triangulates `contour` with `holes`.
///
/// Returned indices address the concatenation of `contour` followed by every hole
/// in order. A polygon the triangulator rejects yields no triangles.
pub fn triangulate(contour: &[Point2<f32>], holes: &[Vec<Point2<f32>>]) -> Vec<[usize; 3]> {
    let mut coords: Vec<f64> = Vec::with_capacity(2 * contour.len());
    let mut hole_starts = Vec::with_capacity(holes.len());
    coords.extend(contour.iter().flat_map(|p| [p.x as f64, p.y as f64]));
    for hole in holes {
        hole_starts.push(coords.len() / 2);
        coords.extend(hole.iter().flat_map(|p| [p.x as f64, p.y as f64]));
    }

    match earcutr::earcut(&coords, &hole_starts, 2) {
        Ok(indices) => indices
            .chunks_exact(3)
            .map(|t| [t[0], t[1], t[2]])
            .collect(),
        Err(err) => {
            log::warn!("could not triangulate a {}-point polygon: {err:?}", coords.len() / 2);
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn triangle_area_sum(points: &[Point2<f32>], triangles: &[[usize; 3]]) -> f32 {
        triangles
            .iter()
            .map(|t| area(&[points[t[0]], points[t[1]], points[t[2]]]).abs())
            .sum()
    }

    #[test]
    fn square_becomes_two_triangles() {
        let square = vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(0.0, 1.0),
        ];
        let triangles = triangulate(&square, &[]);
        assert_eq!(triangles.len(), 2);
        assert_relative_eq!(triangle_area_sum(&square, &triangles), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn concave_polygon_is_fully_covered() {
        // an "L"
        let l_shape = vec![
            Point2::new(0.0, 0.0),
            Point2::new(2.0, 0.0),
            Point2::new(2.0, 1.0),
            Point2::new(1.0, 1.0),
            Point2::new(1.0, 2.0),
            Point2::new(0.0, 2.0),
        ];
        let triangles = triangulate(&l_shape, &[]);
        assert_eq!(triangles.len(), 4);
        assert_relative_eq!(triangle_area_sum(&l_shape, &triangles), 3.0, epsilon = 1e-6);
    }

    #[test]
    fn hole_area_is_excluded() {
        let outer = vec![
            Point2::new(0.0, 0.0),
            Point2::new(4.0, 0.0),
            Point2::new(4.0, 4.0),
            Point2::new(0.0, 4.0),
        ];
        let hole = vec![
            Point2::new(1.0, 1.0),
            Point2::new(1.0, 3.0),
            Point2::new(3.0, 3.0),
            Point2::new(3.0, 1.0),
        ];
        let triangles = triangulate(&outer, &[hole.clone()]);
        let all: Vec<_> = outer.iter().chain(hole.iter()).copied().collect();
        assert_eq!(triangles.len(), 8);
        assert_relative_eq!(triangle_area_sum(&all, &triangles), 12.0, epsilon = 1e-5);
    }

    #[test]
    fn winding_helpers_agree() {
        let ccw = vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(0.0, 1.0),
        ];
        assert_relative_eq!(area(&ccw), 0.5);
        assert!(!is_clockwise(&ccw));
        let cw: Vec<_> = ccw.into_iter().rev().collect();
        assert!(is_clockwise(&cw));
    }

    #[test]
    fn collinear_points_do_not_add_area() {
        // midpoints on the bottom and right edges
        let square = vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(2.0, 0.0),
            Point2::new(2.0, 1.0),
            Point2::new(2.0, 2.0),
            Point2::new(0.0, 2.0),
        ];
        let triangles = triangulate(&square, &[]);
        assert!(!triangles.is_empty());
        assert_relative_eq!(triangle_area_sum(&square, &triangles), 4.0, epsilon = 1e-6);
        for t in &triangles {
            assert!(area(&[square[t[0]], square[t[1]], square[t[2]]]).abs() > 0.0);
        }
    }

    #[test]
    fn two_holes_are_both_excluded() {
        let outer = vec![
            Point2::new(0.0, 0.0),
            Point2::new(6.0, 0.0),
            Point2::new(6.0, 3.0),
            Point2::new(0.0, 3.0),
        ];
        let left = vec![
            Point2::new(1.0, 1.0),
            Point2::new(1.0, 2.0),
            Point2::new(2.0, 2.0),
            Point2::new(2.0, 1.0),
        ];
        let right = vec![
            Point2::new(4.0, 1.0),
            Point2::new(4.0, 2.0),
            Point2::new(5.0, 2.0),
            Point2::new(5.0, 1.0),
        ];
        let triangles = triangulate(&outer, &[left.clone(), right.clone()]);
        let all: Vec<_> = outer.iter().chain(&left).chain(&right).copied().collect();
        assert_relative_eq!(triangle_area_sum(&all, &triangles), 16.0, epsilon = 1e-5);
    }
}
