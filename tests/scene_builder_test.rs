use approx::assert_relative_eq;
use carousel::{
    carousel::{
        builder::{BuiltScene, SceneBuilder, floor_shape, garland_radius},
        horse,
    },
    data_structures::{
        batch::plan_batches,
        geometry::triangulate_shape,
        material::{Color, Side},
        path::Shape,
        scene_graph::{NodeId, SceneGraph},
        triangulate::area,
    },
};
use cgmath::{Deg, Point2, Rad};

fn build() -> BuiltScene {
    SceneBuilder::new().build().expect("carousel scene builds")
}

fn y_degrees(graph: &SceneGraph, id: NodeId) -> f32 {
    Deg::from(graph.node(id).unwrap().rotation.y).0
}

fn only_child(graph: &SceneGraph, id: NodeId) -> NodeId {
    let children = graph.node(id).unwrap().children();
    assert_eq!(children.len(), 1);
    children[0]
}

#[test]
fn eighteen_garlands_evenly_around_the_hat() {
    let BuiltScene { scene, nodes } = build();
    let graph = &scene.graph;
    let holders: Vec<NodeId> = graph
        .node(nodes.hat)
        .unwrap()
        .children()
        .iter()
        .copied()
        .filter(|&id| graph.node(id).unwrap().mesh.is_none())
        .collect();
    assert_eq!(holders.len(), 18);

    let mut gaps = 0.0;
    for (i, &holder) in holders.iter().enumerate() {
        assert_relative_eq!(y_degrees(graph, holder), 20.0 * i as f32, epsilon = 1e-3);
        if i > 0 {
            gaps += y_degrees(graph, holder) - y_degrees(graph, holders[i - 1]);
        }

        let garland = graph.node(only_child(graph, holder)).unwrap();
        assert_relative_eq!(garland.position.x, 1.71);
        assert_relative_eq!(garland.position.y, -5.0);
        assert_relative_eq!(garland.position.z, 9.7);
        assert_relative_eq!(Deg::from(garland.rotation.y).0, 190.0, epsilon = 1e-3);

        let material = scene.material(garland.mesh.as_ref().unwrap().materials[0]).unwrap();
        let expected = if i % 2 == 0 { "#dfabaf" } else { "#ffffff" };
        assert_eq!(material.color, Color::from_hex(expected).unwrap());
        assert_eq!(material.side, Side::Double);
        assert!(material.map.is_some());
    }
    gaps += 360.0 - y_degrees(graph, holders[17]);
    assert_relative_eq!(gaps, 360.0, epsilon = 1e-3);
}

#[test]
fn garland_radius_is_about_1_7365() {
    assert_relative_eq!(garland_radius(18, 10.0), 1.7365, epsilon = 1e-4);
}

#[test]
fn horses_split_seven_and_seven_by_parity() {
    let BuiltScene { scene, nodes } = build();
    let graph = &scene.graph;
    let step = 360.0 / 14.0;

    for (group, first, z) in [(nodes.horses1, 1, 8.0), (nodes.horses2, 0, 9.0)] {
        assert_eq!(graph.node(group).unwrap().parent(), Some(nodes.horses));
        let holders = graph.node(group).unwrap().children();
        assert_eq!(holders.len(), 7);
        for (k, &holder) in holders.iter().enumerate() {
            let i = first + 2 * k;
            assert_relative_eq!(y_degrees(graph, holder), step * i as f32, epsilon = 1e-3);
            let horse = graph.node(only_child(graph, holder)).unwrap();
            assert_eq!(horse.position.z, z);
        }
    }
}

#[test]
fn all_horses_share_one_instanced_draw() {
    let BuiltScene { scene, .. } = build();
    let plans = plan_batches(&scene.graph);
    let horse = scene
        .geometries
        .iter()
        .position(|geometry| geometry.name == "horse")
        .unwrap();
    let horse_batches: Vec<_> = plans.iter().filter(|plan| plan.geometry.0 == horse).collect();
    assert_eq!(horse_batches.len(), 1);
    assert_eq!(horse_batches[0].nodes.len(), 14);

    let garland = scene
        .geometries
        .iter()
        .position(|geometry| geometry.name == "garland")
        .unwrap();
    let garland_sizes: Vec<usize> = plans
        .iter()
        .filter(|plan| plan.geometry.0 == garland)
        .map(|plan| plan.nodes.len())
        .collect();
    assert_eq!(garland_sizes, vec![9, 9]);
}

#[test]
fn floor_is_a_centred_ring() {
    let BuiltScene { scene, nodes } = build();
    let floor = scene
        .geometries
        .iter()
        .find(|geometry| geometry.name == "floor")
        .unwrap();
    let bounds = floor.bounding_box().unwrap();
    let center = bounds.center();
    assert_relative_eq!(center.x, 0.0, epsilon = 1e-4);
    assert_relative_eq!(center.y, 0.0, epsilon = 1e-4);
    assert_relative_eq!(center.z, 0.0, epsilon = 1e-4);
    let size = bounds.size();
    assert_relative_eq!(size.x, 20.0, epsilon = 1e-3);
    assert_relative_eq!(size.y, 20.0, epsilon = 1e-3);
    assert_relative_eq!(size.z, 1.0, epsilon = 1e-5);

    // Nothing may sit inside the hole.
    for vertex in &floor.vertices {
        let [x, y, _] = vertex.position;
        assert!((x * x + y * y).sqrt() >= 5.0 - 1e-3);
    }

    let graph = &scene.graph;
    let mesh = graph.node(only_child(graph, nodes.floor)).unwrap();
    assert_relative_eq!(Deg::from(mesh.rotation.x).0, 90.0, epsilon = 1e-3);
    assert_eq!(mesh.position.y, -4.3);
    let materials = &mesh.mesh.as_ref().unwrap().materials;
    assert!(scene.material(materials[0]).unwrap().flat_shading);
    assert!(!scene.material(materials[1]).unwrap().flat_shading);
}

fn covered_area(points: &[Point2<f32>], triangles: &[[usize; 3]]) -> f32 {
    triangles
        .iter()
        .map(|t| area(&[points[t[0]], points[t[1]], points[t[2]]]))
        .sum()
}

#[test]
fn horse_silhouette_is_fully_filled() {
    let (points, triangles) = triangulate_shape(&Shape::new(horse::outline()), horse::CURVE_SEGMENTS);
    assert!(!triangles.is_empty());
    let outline_area = area(&points).abs();
    assert_relative_eq!(outline_area, 7.4307, epsilon = 1e-3);
    assert_relative_eq!(covered_area(&points, &triangles), outline_area, epsilon = 1e-4);
}

#[test]
fn floor_ring_fill_leaves_the_hole_open() {
    let (points, triangles) = triangulate_shape(&floor_shape(), 60);
    // 60-gon areas: n/2 * sin(2pi/n) * (R^2 - r^2)
    let n = 60.0_f32;
    let expected = n / 2.0 * (2.0 * std::f32::consts::PI / n).sin() * (100.0 - 25.0);
    assert_relative_eq!(expected, 235.189, epsilon = 1e-2);
    assert_relative_eq!(covered_area(&points, &triangles), expected, epsilon = 1e-2);
}

#[test]
fn core_overlays_windows_on_its_wall() {
    let BuiltScene { scene, nodes } = build();
    let graph = &scene.graph;
    assert_eq!(graph.node(nodes.core).unwrap().parent(), Some(graph.root()));

    let mesh = graph.node(only_child(graph, nodes.core)).unwrap();
    let mesh = mesh.mesh.as_ref().unwrap();
    let geometry = scene.geometry(mesh.geometry).unwrap();
    let groups = geometry.draw_groups();
    let full = 0..geometry.indices.len() as u32;
    assert_eq!(groups, vec![(full.clone(), 0), (full, 1)]);

    let wall = scene.material(mesh.materials[0]).unwrap();
    let windows = scene.material(mesh.materials[1]).unwrap();
    assert!(!wall.transparent && wall.flat_shading);
    assert!(windows.transparent && windows.map.is_some());
    assert_eq!(windows.roughness, 1.0);
}

#[test]
fn every_mesh_casts_and_receives_shadows() {
    let BuiltScene { scene, .. } = build();
    let meshes: Vec<_> = scene.graph.meshes().collect();
    assert_eq!(meshes.len(), 1 + 1 + 18 + 14 + 1);
    assert!(
        meshes
            .iter()
            .all(|(_, mesh)| mesh.cast_shadow && mesh.receive_shadow)
    );
}

#[test]
fn camera_and_lights_are_configured() {
    let BuiltScene { scene, .. } = build();
    assert_eq!(scene.camera.position, cgmath::Point3::new(0.0, 15.0, 35.0));
    assert_eq!(scene.camera.fovy, Deg(75.0));

    let lights = scene.lights;
    assert_relative_eq!(lights.hemisphere.intensity, 0.3);
    assert!(lights.point.cast_shadow && lights.spot.cast_shadow);
    assert_relative_eq!(Rad::from(Deg(30.0)).0, lights.spot.angle.0);
    assert_eq!(lights.shadow.map_size, 2048);
    assert_eq!(scene.textures.len(), 5);
}
