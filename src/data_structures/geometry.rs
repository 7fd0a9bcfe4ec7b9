//! CPU-side procedural geometry.
//!
//! A [`Geometry`] is plain vertex and index data plus material groups. It is
//! built once by the scene builder, uploaded by
//! [`Model`](crate::data_structures::model::Model) and never mutated
//! afterwards. The generators follow the conventions of the common web 3D
//! primitives: Y is up, cylinders and lathes sweep around Y starting at +Z, flat
//! shapes lie in the XY plane facing +Z and use their XY coordinates as UVs.

use std::{f32::consts::TAU, ops::Range};

use cgmath::{InnerSpace, Point2, Point3, Vector3};

use crate::data_structures::{
    model::ModelVertex,
    path::Shape,
    triangulate::{self, remove_duplicate_end},
};

/// Index of a geometry in the scene's geometry table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GeometryId(pub usize);

/// A range of indices drawn with one material.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GeometryGroup {
    pub start: u32,
    /// Index count; `u32::MAX` extends the group to the end of the index buffer.
    pub count: u32,
    pub material_index: usize,
}

/// Axis-aligned bounds of a geometry.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub min: Point3<f32>,
    pub max: Point3<f32>,
}

impl BoundingBox {
    pub fn center(&self) -> Point3<f32> {
        Point3::new(
            (self.min.x + self.max.x) * 0.5,
            (self.min.y + self.max.y) * 0.5,
            (self.min.z + self.max.z) * 0.5,
        )
    }

    pub fn size(&self) -> Vector3<f32> {
        self.max - self.min
    }
}

#[derive(Clone, Debug, Default)]
pub struct Geometry {
    pub name: String,
    pub vertices: Vec<ModelVertex>,
    pub indices: Vec<u32>,
    pub groups: Vec<GeometryGroup>,
}

impl Geometry {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn clear_groups(&mut self) {
        self.groups.clear();
    }

    pub fn add_group(&mut self, start: u32, count: u32, material_index: usize) {
        self.groups.push(GeometryGroup {
            start,
            count,
            material_index,
        });
    }

    /// Index ranges and their material slots, clamped to the index buffer.
    ///
    /// A geometry without groups is drawn in one piece with material 0.
    pub fn draw_groups(&self) -> Vec<(Range<u32>, usize)> {
        let len = self.indices.len() as u32;
        if self.groups.is_empty() {
            return vec![(0..len, 0)];
        }
        self.groups
            .iter()
            .map(|group| {
                let start = group.start.min(len);
                let end = group.start.saturating_add(group.count).min(len);
                (start..end, group.material_index)
            })
            .collect()
    }

    /// Number of material slots a mesh using this geometry has to provide.
    pub fn material_slots(&self) -> usize {
        self.groups
            .iter()
            .map(|group| group.material_index + 1)
            .max()
            .unwrap_or(1)
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn bounding_box(&self) -> Option<BoundingBox> {
        let first = self.vertices.first()?;
        let mut min = Point3::from(first.position);
        let mut max = min;
        for vertex in &self.vertices[1..] {
            let [x, y, z] = vertex.position;
            min = Point3::new(min.x.min(x), min.y.min(y), min.z.min(z));
            max = Point3::new(max.x.max(x), max.y.max(y), max.z.max(z));
        }
        Some(BoundingBox { min, max })
    }

    pub fn translate(&mut self, offset: Vector3<f32>) {
        for vertex in &mut self.vertices {
            vertex.position[0] += offset.x;
            vertex.position[1] += offset.y;
            vertex.position[2] += offset.z;
        }
    }

    /// Moves the geometry so that its bounding box is centred on the origin.
    pub fn center(&mut self) {
        if let Some(bounds) = self.bounding_box() {
            let center = bounds.center();
            self.translate(Vector3::new(-center.x, -center.y, -center.z));
        }
    }

    /// Smooth normals averaged over the faces sharing each vertex.
    pub fn compute_vertex_normals(&mut self) {
        let mut normals = vec![Vector3::new(0.0f32, 0.0, 0.0); self.vertices.len()];
        for tri in self.indices.chunks_exact(3) {
            let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
            let pa = Vector3::from(self.vertices[a].position);
            let pb = Vector3::from(self.vertices[b].position);
            let pc = Vector3::from(self.vertices[c].position);
            let face = (pc - pb).cross(pa - pb);
            normals[a] += face;
            normals[b] += face;
            normals[c] += face;
        }
        for (vertex, normal) in self.vertices.iter_mut().zip(normals) {
            if normal.magnitude2() > 0.0 {
                vertex.normal = normal.normalize().into();
            }
        }
    }

    /// Cylinder (or truncated cone) around the Y axis, centred on the origin.
    ///
    /// Groups: 0 = side, 1 = top cap, 2 = bottom cap (caps only when not
    /// `open_ended`).
    pub fn cylinder(
        radius_top: f32,
        radius_bottom: f32,
        height: f32,
        radial_segments: u32,
        height_segments: u32,
        open_ended: bool,
    ) -> Self {
        let radial_segments = radial_segments.max(3);
        let height_segments = height_segments.max(1);
        let half_height = height / 2.0;
        let slope = (radius_bottom - radius_top) / height;

        let mut geometry = Geometry::new("cylinder");
        let mut grid = Vec::with_capacity(height_segments as usize + 1);
        for y in 0..=height_segments {
            let v = y as f32 / height_segments as f32;
            let radius = v * (radius_bottom - radius_top) + radius_top;
            let mut row = Vec::with_capacity(radial_segments as usize + 1);
            for x in 0..=radial_segments {
                let u = x as f32 / radial_segments as f32;
                let theta = u * TAU;
                let (sin, cos) = theta.sin_cos();
                let normal = Vector3::new(sin, slope, cos).normalize();
                row.push(geometry.vertices.len() as u32);
                geometry.vertices.push(ModelVertex {
                    position: [radius * sin, -v * height + half_height, radius * cos],
                    tex_coords: [u, 1.0 - v],
                    normal: normal.into(),
                });
            }
            grid.push(row);
        }
        for x in 0..radial_segments as usize {
            for y in 0..height_segments as usize {
                let a = grid[y][x];
                let b = grid[y + 1][x];
                let c = grid[y + 1][x + 1];
                let d = grid[y][x + 1];
                geometry.indices.extend_from_slice(&[a, b, d, b, c, d]);
            }
        }
        geometry.add_group(0, geometry.indices.len() as u32, 0);

        if !open_ended {
            if radius_top > 0.0 {
                geometry.push_cylinder_cap(true, radius_top, half_height, radial_segments);
            }
            if radius_bottom > 0.0 {
                geometry.push_cylinder_cap(false, radius_bottom, half_height, radial_segments);
            }
        }
        geometry
    }

    fn push_cylinder_cap(&mut self, top: bool, radius: f32, half_height: f32, radial_segments: u32) {
        let group_start = self.indices.len() as u32;
        let sign = if top { 1.0 } else { -1.0 };
        let y = half_height * sign;

        let center_start = self.vertices.len() as u32;
        for _ in 0..radial_segments {
            self.vertices.push(ModelVertex {
                position: [0.0, y, 0.0],
                tex_coords: [0.5, 0.5],
                normal: [0.0, sign, 0.0],
            });
        }
        let rim_start = self.vertices.len() as u32;
        for x in 0..=radial_segments {
            let theta = x as f32 / radial_segments as f32 * TAU;
            let (sin, cos) = theta.sin_cos();
            self.vertices.push(ModelVertex {
                position: [radius * sin, y, radius * cos],
                tex_coords: [cos * 0.5 + 0.5, sin * 0.5 * sign + 0.5],
                normal: [0.0, sign, 0.0],
            });
        }
        for x in 0..radial_segments {
            let c = center_start + x;
            let i = rim_start + x;
            if top {
                self.indices.extend_from_slice(&[i, i + 1, c]);
            } else {
                self.indices.extend_from_slice(&[i + 1, i, c]);
            }
        }
        let count = self.indices.len() as u32 - group_start;
        self.add_group(group_start, count, if top { 1 } else { 2 });
    }

    /// Flat circle sector in the XY plane facing +Z.
    pub fn circle(radius: f32, segments: u32, theta_start: f32, theta_length: f32) -> Self {
        let segments = segments.max(3);
        let mut geometry = Geometry::new("circle");
        geometry.vertices.push(ModelVertex {
            position: [0.0, 0.0, 0.0],
            tex_coords: [0.5, 0.5],
            normal: [0.0, 0.0, 1.0],
        });
        for s in 0..=segments {
            let angle = theta_start + s as f32 / segments as f32 * theta_length;
            let (x, y) = (radius * angle.cos(), radius * angle.sin());
            geometry.vertices.push(ModelVertex {
                position: [x, y, 0.0],
                tex_coords: [(x / radius + 1.0) / 2.0, (y / radius + 1.0) / 2.0],
                normal: [0.0, 0.0, 1.0],
            });
        }
        for i in 1..=segments {
            geometry.indices.extend_from_slice(&[i, i + 1, 0]);
        }
        geometry
    }

    /// Surface of revolution: `profile` (x = radius, y = height) swept around Y.
    pub fn lathe(profile: &[Point2<f32>], segments: u32, phi_start: f32, phi_length: f32) -> Self {
        let segments = segments.max(1);
        let phi_length = phi_length.clamp(0.0, TAU);
        let rows = profile.len();
        let mut geometry = Geometry::new("lathe");
        if rows < 2 {
            return geometry;
        }

        for i in 0..=segments {
            let phi = phi_start + i as f32 / segments as f32 * phi_length;
            let (sin, cos) = phi.sin_cos();
            for (j, point) in profile.iter().enumerate() {
                geometry.vertices.push(ModelVertex {
                    position: [point.x * sin, point.y, point.x * cos],
                    tex_coords: [i as f32 / segments as f32, j as f32 / (rows - 1) as f32],
                    normal: [0.0; 3],
                });
            }
        }
        let rows = rows as u32;
        for i in 0..segments {
            for j in 0..rows - 1 {
                let a = j + i * rows;
                let b = a + rows;
                let c = a + rows + 1;
                let d = a + 1;
                geometry.indices.extend_from_slice(&[a, b, d, c, d, b]);
            }
        }
        geometry.compute_vertex_normals();

        // the first and last ring overlap on a full sweep; share their normals
        if (phi_length - TAU).abs() < 1e-6 {
            let last_ring = (segments * rows) as usize;
            for j in 0..rows as usize {
                let first = Vector3::from(geometry.vertices[j].normal);
                let last = Vector3::from(geometry.vertices[last_ring + j].normal);
                let sum = first + last;
                if sum.magnitude2() > 0.0 {
                    let shared: [f32; 3] = sum.normalize().into();
                    geometry.vertices[j].normal = shared;
                    geometry.vertices[last_ring + j].normal = shared;
                }
            }
        }
        geometry
    }

    /// Flat filled shape in the XY plane facing +Z; UVs equal XY.
    pub fn shape(shape: &Shape, curve_segments: usize) -> Self {
        let (points, triangles) = triangulate_shape(shape, curve_segments);
        let mut geometry = Geometry::new("shape");
        geometry.vertices = points
            .iter()
            .map(|p| ModelVertex {
                position: [p.x, p.y, 0.0],
                tex_coords: [p.x, p.y],
                normal: [0.0, 0.0, 1.0],
            })
            .collect();
        geometry.indices = triangles
            .iter()
            .flat_map(|t| t.iter().map(|&i| i as u32))
            .collect();
        geometry
    }

    /// Extrudes `shape` from z = 0 to z = `depth` without bevel.
    ///
    /// Groups: 0 = both caps, 1 = side walls (outline and holes).
    pub fn extrude(shape: &Shape, depth: f32, curve_segments: usize) -> Self {
        let (contour, holes) = oriented_contours(shape, curve_segments);
        let points: Vec<Point2<f32>> = contour
            .iter()
            .chain(holes.iter().flatten())
            .copied()
            .collect();
        let triangles = ccw_triangles(&points, triangulate::triangulate(&contour, &holes));

        let mut geometry = Geometry::new("extrusion");
        // caps: bottom faces -Z, top faces +Z
        for (z, normal_z) in [(0.0, -1.0), (depth, 1.0)] {
            for tri in &triangles {
                let order = if normal_z < 0.0 {
                    [tri[2], tri[1], tri[0]]
                } else {
                    *tri
                };
                for i in order {
                    let p = points[i];
                    geometry.indices.push(geometry.vertices.len() as u32);
                    geometry.vertices.push(ModelVertex {
                        position: [p.x, p.y, z],
                        tex_coords: [p.x, p.y],
                        normal: [0.0, 0.0, normal_z],
                    });
                }
            }
        }
        let caps = geometry.indices.len() as u32;
        geometry.add_group(0, caps, 0);

        for ring in std::iter::once(&contour).chain(holes.iter()) {
            geometry.push_side_walls(ring, depth);
        }
        let sides = geometry.indices.len() as u32 - caps;
        geometry.add_group(caps, sides, 1);
        geometry
    }

    /// One quad per edge of a closed ring. Outline rings run counter-clockwise
    /// and hole rings clockwise, so the right-hand side of each edge faces away
    /// from the solid.
    fn push_side_walls(&mut self, ring: &[Point2<f32>], depth: f32) {
        let n = ring.len();
        for i in 0..n {
            let p0 = ring[i];
            let p1 = ring[(i + 1) % n];
            let quad = [
                Point3::new(p0.x, p0.y, 0.0),
                Point3::new(p1.x, p1.y, 0.0),
                Point3::new(p1.x, p1.y, depth),
                Point3::new(p0.x, p0.y, depth),
            ];
            let normal = Vector3::new(p1.y - p0.y, p0.x - p1.x, 0.0);
            let normal: [f32; 3] = if normal.magnitude2() > 0.0 {
                normal.normalize().into()
            } else {
                [0.0, 0.0, 0.0]
            };
            let uvs = side_wall_uvs(&quad);
            let base = self.vertices.len() as u32;
            for (corner, uv) in quad.iter().zip(uvs) {
                self.vertices.push(ModelVertex {
                    position: [corner.x, corner.y, corner.z],
                    tex_coords: uv,
                    normal,
                });
            }
            self.indices
                .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }
    }
}

/// Projects a side wall onto whichever of X or Y varies more along the edge.
fn side_wall_uvs(quad: &[Point3<f32>; 4]) -> [[f32; 2]; 4] {
    let (a, b) = (quad[0], quad[1]);
    let along_x = (a.y - b.y).abs() < (a.x - b.x).abs();
    quad.map(|p| {
        let u = if along_x { p.x } else { p.y };
        [u, 1.0 - p.z]
    })
}

/// Flattened outline (counter-clockwise) and holes (clockwise), closing
/// duplicates removed.
fn oriented_contours(
    shape: &Shape,
    curve_segments: usize,
) -> (Vec<Point2<f32>>, Vec<Vec<Point2<f32>>>) {
    let (mut contour, mut holes) = shape.extract_points(curve_segments);
    remove_duplicate_end(&mut contour);
    if triangulate::is_clockwise(&contour) {
        contour.reverse();
    }
    for hole in &mut holes {
        remove_duplicate_end(hole);
        if !triangulate::is_clockwise(hole) {
            hole.reverse();
        }
    }
    (contour, holes)
}

/// Triangulated shape: all points (outline then holes) and triangles wound
/// counter-clockwise in XY.
pub fn triangulate_shape(shape: &Shape, curve_segments: usize) -> (Vec<Point2<f32>>, Vec<[usize; 3]>) {
    let (contour, holes) = oriented_contours(shape, curve_segments);
    let triangles = triangulate::triangulate(&contour, &holes);
    let points: Vec<Point2<f32>> = contour
        .into_iter()
        .chain(holes.into_iter().flatten())
        .collect();
    let triangles = ccw_triangles(&points, triangles);
    (points, triangles)
}

fn ccw_triangles(points: &[Point2<f32>], triangles: Vec<[usize; 3]>) -> Vec<[usize; 3]> {
    triangles
        .into_iter()
        .map(|[a, b, c]| {
            if triangulate::area(&[points[a], points[b], points[c]]) < 0.0 {
                [a, c, b]
            } else {
                [a, b, c]
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_structures::path::Path;
    use approx::assert_relative_eq;
    use std::f32::consts::PI;

    #[test]
    fn open_cylinder_has_only_a_side() {
        let geometry = Geometry::cylinder(4.0, 4.0, 10.0, 8, 1, true);
        assert_eq!(geometry.vertices.len(), 2 * 9);
        assert_eq!(geometry.triangle_count(), 16);
        assert_eq!(geometry.groups.len(), 1);
        let bounds = geometry.bounding_box().unwrap();
        assert_relative_eq!(bounds.min.y, -5.0);
        assert_relative_eq!(bounds.max.y, 5.0);
        assert_relative_eq!(bounds.max.x, 4.0, epsilon = 1e-5);
    }

    #[test]
    fn closed_cylinder_has_cap_groups() {
        let geometry = Geometry::cylinder(1.0, 1.0, 2.0, 6, 1, false);
        let materials: Vec<_> = geometry.groups.iter().map(|g| g.material_index).collect();
        assert_eq!(materials, vec![0, 1, 2]);
        assert_eq!(geometry.material_slots(), 3);
    }

    #[test]
    fn unbounded_groups_are_clamped() {
        let mut geometry = Geometry::cylinder(4.0, 4.0, 10.0, 8, 1, true);
        geometry.clear_groups();
        geometry.add_group(0, u32::MAX, 0);
        geometry.add_group(0, u32::MAX, 1);
        let len = geometry.indices.len() as u32;
        assert_eq!(geometry.draw_groups(), vec![(0..len, 0), (0..len, 1)]);
        assert_eq!(geometry.material_slots(), 2);
    }

    #[test]
    fn lathe_sweeps_full_circle() {
        let profile = [Point2::new(0.0, 0.0), Point2::new(10.0, -5.0)];
        let geometry = Geometry::lathe(&profile, 18, 0.0, 2.0 * PI);
        assert_eq!(geometry.vertices.len(), 19 * 2);
        assert_eq!(geometry.triangle_count(), 18 * 2);
        let bounds = geometry.bounding_box().unwrap();
        assert_relative_eq!(bounds.max.y, 0.0);
        assert_relative_eq!(bounds.min.y, -5.0);
        assert_relative_eq!(bounds.max.z, 10.0, epsilon = 1e-4);
    }

    #[test]
    fn circle_sector_is_lower_half() {
        let geometry = Geometry::circle(2.0, 24, PI, PI);
        assert_eq!(geometry.vertices.len(), 26);
        assert_eq!(geometry.triangle_count(), 24);
        let bounds = geometry.bounding_box().unwrap();
        assert_relative_eq!(bounds.max.y, 0.0, epsilon = 1e-5);
        assert_relative_eq!(bounds.min.y, -2.0, epsilon = 1e-5);
    }

    #[test]
    fn shape_triangles_face_forward() {
        let mut outline = Path::new();
        outline
            .move_to(0.0, 0.0)
            .line_to(0.0, 2.0)
            .line_to(2.0, 2.0)
            .line_to(2.0, 0.0);
        let geometry = Geometry::shape(&Shape::new(outline), 12);
        assert_eq!(geometry.triangle_count(), 2);
        for tri in geometry.indices.chunks_exact(3) {
            let p = |i: u32| Point2::new(
                geometry.vertices[i as usize].position[0],
                geometry.vertices[i as usize].position[1],
            );
            assert!(triangulate::area(&[p(tri[0]), p(tri[1]), p(tri[2])]) > 0.0);
        }
    }

    #[test]
    fn extruded_square_has_outward_walls() {
        let mut outline = Path::new();
        outline
            .move_to(-1.0, -1.0)
            .line_to(1.0, -1.0)
            .line_to(1.0, 1.0)
            .line_to(-1.0, 1.0);
        let geometry = Geometry::extrude(&Shape::new(outline), 1.0, 12);
        let (caps, _) = geometry.draw_groups()[0].clone();
        let (sides, material) = geometry.draw_groups()[1].clone();
        assert_eq!(material, 1);
        assert_eq!(caps.len(), 2 * 2 * 3);
        assert_eq!(sides.len(), 4 * 2 * 3);
        for i in sides {
            let vertex = geometry.vertices[geometry.indices[i as usize] as usize];
            let position = Vector3::from(vertex.position);
            let normal = Vector3::from(vertex.normal);
            // outward: normal points the same way as the wall's offset from the axis
            assert!(normal.dot(Vector3::new(position.x, position.y, 0.0)) > 0.0);
        }
    }

    #[test]
    fn center_moves_bounds_to_origin() {
        let mut geometry = Geometry::circle(1.0, 8, 0.0, 2.0 * PI);
        geometry.translate(Vector3::new(3.0, -2.0, 1.0));
        geometry.center();
        let center = geometry.bounding_box().unwrap().center();
        assert_relative_eq!(center.x, 0.0, epsilon = 1e-5);
        assert_relative_eq!(center.y, 0.0, epsilon = 1e-5);
        assert_relative_eq!(center.z, 0.0, epsilon = 1e-5);
    }
}
