//! Builds the carousel scene: camera, lights and the carousel assembly.
//!
//! ```text
//! root
//! ├── core ── core mesh (wall + window overlay)
//! └── carousel                      rotated by the animator
//!     ├── hat ── hat mesh, 18 garland holders ── garland mesh
//!     ├── horses
//!     │   ├── horses1 ── 7 holders ── horse mesh (z = 8)
//!     │   └── horses2 ── 7 holders ── horse mesh (z = 9)
//!     └── floor ── floor mesh
//! ```

use std::f32::consts::PI;

use cgmath::{Deg, Point2, Point3, Rad, Vector3};

use crate::{
    camera::CameraSettings,
    carousel::{assets, horse},
    data_structures::{
        geometry::Geometry,
        material::{Color, MaterialDesc, MaterialId, Side},
        path::{Path, Shape},
        scene::Scene,
        scene_graph::{Node, NodeId},
    },
    error::SceneError,
    pipelines::{
        light::{HemisphereLight, LightRig, PointLight, SpotLight},
        shadow::ShadowSettings,
    },
};

pub const HAT_SEGMENTS: u32 = 18;
pub const HAT_RADIUS: f32 = 10.0;
pub const HAT_HEIGHT: f32 = 5.0;
pub const GARLAND_SEGMENTS: u32 = 24;
pub const HORSE_COUNT: usize = 14;
pub const FLOOR_OUTER_RADIUS: f32 = 10.0;
pub const FLOOR_INNER_RADIUS: f32 = 5.0;
pub const FLOOR_HEIGHT: f32 = 1.0;
pub const FLOOR_CURVE_SEGMENTS: usize = 60;

/// Handles of the nodes the animator and tests need.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CarouselNodes {
    pub core: NodeId,
    pub carousel: NodeId,
    pub hat: NodeId,
    pub horses: NodeId,
    pub horses1: NodeId,
    pub horses2: NodeId,
    pub floor: NodeId,
}

#[derive(Clone, Debug)]
pub struct BuiltScene {
    pub scene: Scene,
    pub nodes: CarouselNodes,
}

/// Radius of one garland flag: half the hat's angular step, normalised by the
/// hat radius and blown up by 100.
pub fn garland_radius(segments: u32, hat_radius: f32) -> f32 {
    let half_step = Rad::from(Deg(360.0 / segments as f32 / 2.0));
    half_step.0.sin() / hat_radius * 100.0
}

fn hex(color: &str) -> Result<Color, SceneError> {
    Ok(Color::from_hex(color)?)
}

#[derive(Debug, Default)]
pub struct SceneBuilder {
    scene: Scene,
}

impl SceneBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn build(mut self) -> Result<BuiltScene, SceneError> {
        self.scene.camera = CameraSettings::default();
        self.scene.lights = lights()?;

        let root = self.scene.graph.root();
        let carousel = self.scene.graph.add_node(root, "carousel")?;
        let core = self.core(root)?;
        let hat = self.hat(carousel)?;
        let (horses, horses1, horses2) = self.horses(carousel)?;
        let floor = self.floor(carousel)?;

        self.scene.graph.update_world_transforms();
        Ok(BuiltScene {
            scene: self.scene,
            nodes: CarouselNodes {
                core,
                carousel,
                hat,
                horses,
                horses1,
                horses2,
                floor,
            },
        })
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, SceneError> {
        self.scene
            .graph
            .node_mut(id)
            .ok_or(SceneError::UnknownNode(id.0))
    }

    /// Eight-sided open tube: an opaque wall with the window texture blended
    /// over the very same faces.
    fn core(&mut self, root: NodeId) -> Result<NodeId, SceneError> {
        let core = self.scene.graph.add_node(root, "core")?;

        let window = self.scene.add_texture(assets::WINDOW, assets::window());
        let mut geometry = Geometry::cylinder(4.0, 4.0, 10.0, 8, 1, true);
        geometry.name = "core".to_string();
        geometry.clear_groups();
        geometry.add_group(0, u32::MAX, 0);
        geometry.add_group(0, u32::MAX, 1);
        let geometry = self.scene.add_geometry(geometry);

        let wall = self.scene.add_material(
            MaterialDesc::new("core wall")
                .color(hex("#dbd3d3")?)
                .metalness(0.2)
                .roughness(0.5)
                .flat_shading(true),
        );
        let windows = self.scene.add_material(
            MaterialDesc::new("core windows")
                .map(window)
                .transparent(true)
                .roughness(1.0),
        );
        self.scene
            .add_mesh(core, "core mesh", geometry, &[wall, windows])?;
        Ok(core)
    }

    fn hat(&mut self, carousel: NodeId) -> Result<NodeId, SceneError> {
        let hat = self.scene.graph.add_node(carousel, "hat")?;
        self.node_mut(hat)?.position = Vector3::new(0.0, 10.0, 0.0);

        let map = self.scene.add_texture(assets::HAT, assets::hat());
        let profile = [Point2::new(0.0, 0.0), Point2::new(HAT_RADIUS, -HAT_HEIGHT)];
        let mut geometry = Geometry::lathe(&profile, HAT_SEGMENTS, 0.0, 2.0 * PI);
        geometry.name = "hat".to_string();
        let geometry = self.scene.add_geometry(geometry);
        let material = self.scene.add_material(
            MaterialDesc::new("hat")
                .side(Side::Double)
                .map(map)
                .metalness(0.2)
                .roughness(0.5)
                .flat_shading(true),
        );
        self.scene.add_mesh(hat, "hat mesh", geometry, &[material])?;

        self.garlands(hat)?;
        Ok(hat)
    }

    fn garlands(&mut self, hat: NodeId) -> Result<(), SceneError> {
        let map = self.scene.add_texture(assets::GARLAND, assets::garland());
        let mut geometry = Geometry::circle(
            garland_radius(HAT_SEGMENTS, HAT_RADIUS),
            GARLAND_SEGMENTS,
            PI,
            PI,
        );
        geometry.name = "garland".to_string();
        let geometry = self.scene.add_geometry(geometry);

        let garland = |name: &str, color: Color| {
            MaterialDesc::new(name)
                .color(color)
                .map(map)
                .side(Side::Double)
                .metalness(0.2)
                .roughness(0.5)
                .flat_shading(true)
        };
        let even: MaterialId = self
            .scene
            .add_material(garland("garland pink", hex("#dfabaf")?));
        let odd: MaterialId = self
            .scene
            .add_material(garland("garland white", hex("#fff")?));

        for i in 0..HAT_SEGMENTS {
            let holder = self
                .scene
                .graph
                .add_node(hat, &format!("garland holder {i}"))?;
            self.node_mut(holder)?.rotation.y =
                Deg(360.0 / HAT_SEGMENTS as f32 * i as f32).into();

            let material = if i % 2 == 1 { odd } else { even };
            let mesh = self
                .scene
                .add_mesh(holder, &format!("garland {i}"), geometry, &[material])?;
            let node = self.node_mut(mesh)?;
            node.position = Vector3::new(1.71, -5.0, 9.7);
            node.rotation.y = Deg(190.0).into();
        }
        Ok(())
    }

    /// Fourteen horses on one ring, alternating between two bobbing groups.
    fn horses(&mut self, carousel: NodeId) -> Result<(NodeId, NodeId, NodeId), SceneError> {
        let horses = self.scene.graph.add_node(carousel, "horses")?;
        let horses1 = self.scene.graph.add_node(horses, "horses1")?;
        let horses2 = self.scene.graph.add_node(horses, "horses2")?;

        let map = self.scene.add_texture(assets::HORSE, assets::horse());
        let mut geometry = Geometry::shape(&Shape::new(horse::outline()), horse::CURVE_SEGMENTS);
        geometry.name = "horse".to_string();
        let geometry = self.scene.add_geometry(geometry);
        let material = self.scene.add_material(
            MaterialDesc::new("horse")
                .map(map)
                .side(Side::Double)
                .transparent(true)
                .metalness(0.0)
                .roughness(0.0)
                .flat_shading(true),
        );

        for i in 0..HORSE_COUNT {
            let (group, z) = if i % 2 == 1 {
                (horses1, 8.0)
            } else {
                (horses2, 9.0)
            };
            let holder = self
                .scene
                .graph
                .add_node(group, &format!("horse holder {i}"))?;
            self.node_mut(holder)?.rotation.y = Deg(360.0 / HORSE_COUNT as f32 * i as f32).into();
            let mesh = self
                .scene
                .add_mesh(holder, &format!("horse {i}"), geometry, &[material])?;
            self.node_mut(mesh)?.position.z = z;
        }
        Ok((horses, horses1, horses2))
    }

    /// Ring shaped platform: a disc with a hole, extruded and laid flat.
    fn floor(&mut self, carousel: NodeId) -> Result<NodeId, SceneError> {
        let floor = self.scene.graph.add_node(carousel, "floor")?;

        let map = self.scene.add_texture(assets::FLOOR, assets::floor());
        let mut geometry = Geometry::extrude(&floor_shape(), FLOOR_HEIGHT, FLOOR_CURVE_SEGMENTS);
        geometry.name = "floor".to_string();
        geometry.center();
        let geometry = self.scene.add_geometry(geometry);

        let top = self.scene.add_material(
            MaterialDesc::new("floor top")
                .map(map)
                .metalness(0.2)
                .roughness(0.5)
                .flat_shading(true),
        );
        let edge = self.scene.add_material(
            MaterialDesc::new("floor edge")
                .color(hex("#dbd3d3")?)
                .metalness(0.2)
                .roughness(0.5)
                .flat_shading(false),
        );
        let mesh = self
            .scene
            .add_mesh(floor, "floor mesh", geometry, &[top, edge])?;
        let node = self.node_mut(mesh)?;
        node.rotation.x = Deg(90.0).into();
        node.position = Vector3::new(0.0, -4.3, 0.0);
        Ok(floor)
    }
}

/// Outer circle with a clockwise hole, both centred on `(R, R)`.
pub fn floor_shape() -> Shape {
    let (outer, inner) = (FLOOR_OUTER_RADIUS, FLOOR_INNER_RADIUS);
    let mut outline = Path::new();
    outline
        .move_to(outer * 2.0, outer)
        .absarc(outer, outer, outer, 0.0, 2.0 * PI, false);
    let mut hole = Path::new();
    hole.move_to(outer + inner, outer)
        .absarc(outer, outer, inner, 0.0, 2.0 * PI, true);
    Shape::new(outline).with_hole(hole)
}

fn lights() -> Result<LightRig, SceneError> {
    Ok(LightRig {
        hemisphere: HemisphereLight {
            sky: hex("#b0d8f5")?,
            ground: hex("#ffdec1")?,
            intensity: 0.3,
        },
        point: PointLight {
            color: hex("#ffffff")?,
            intensity: 0.5,
            position: Point3::new(0.0, 15.0, 35.0),
            cast_shadow: true,
        },
        spot: SpotLight {
            color: hex("#e070bb")?,
            intensity: 0.5,
            position: Point3::new(0.0, 30.0, 8.0),
            target: Point3::new(0.0, 0.0, 0.0),
            angle: Deg(30.0).into(),
            penumbra: 0.2,
            cast_shadow: true,
        },
        shadow: ShadowSettings::default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn garland_radius_matches_hat_step() {
        assert_relative_eq!(garland_radius(18, 10.0), 1.7364818, epsilon = 1e-5);
    }

    #[test]
    fn build_succeeds_and_places_hat() {
        let built = SceneBuilder::new().build().unwrap();
        let hat = built.scene.graph.node(built.nodes.hat).unwrap();
        assert_eq!(hat.position, Vector3::new(0.0, 10.0, 0.0));
        assert_eq!(hat.parent(), Some(built.nodes.carousel));
    }

    #[test]
    fn core_stays_outside_the_rotating_assembly() {
        let built = SceneBuilder::new().build().unwrap();
        let graph = &built.scene.graph;
        assert_eq!(graph.node(built.nodes.core).unwrap().parent(), Some(graph.root()));
        assert!(!graph.descendants(built.nodes.carousel).contains(&built.nodes.core));
    }
}
