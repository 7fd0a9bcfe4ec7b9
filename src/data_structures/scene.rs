//! A complete, GPU-free scene description.
//!
//! A [`Scene`] bundles the scene graph with the shared resource tables it
//! references (geometries, materials, texture requests), the light rig and the
//! initial camera. It is produced once and then handed to
//! [`Model::new`](crate::data_structures::model::Model::new) for upload.

use crate::{
    camera::CameraSettings,
    data_structures::{
        geometry::{Geometry, GeometryId},
        material::{MaterialDesc, MaterialId},
        scene_graph::{MeshRef, NodeId, SceneGraph},
        texture::{TextureId, TextureSettings},
    },
    error::SceneError,
    pipelines::light::LightRig,
};

/// An image to load asynchronously into a texture slot.
#[derive(Clone, Debug, PartialEq)]
pub struct TextureRequest {
    pub path: String,
    pub settings: TextureSettings,
}

#[derive(Clone, Debug, Default)]
pub struct Scene {
    pub graph: SceneGraph,
    pub geometries: Vec<Geometry>,
    pub materials: Vec<MaterialDesc>,
    pub textures: Vec<TextureRequest>,
    pub lights: LightRig,
    pub camera: CameraSettings,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_geometry(&mut self, geometry: Geometry) -> GeometryId {
        self.geometries.push(geometry);
        GeometryId(self.geometries.len() - 1)
    }

    pub fn add_material(&mut self, material: MaterialDesc) -> MaterialId {
        self.materials.push(material);
        MaterialId(self.materials.len() - 1)
    }

    pub fn add_texture(&mut self, path: &str, settings: TextureSettings) -> TextureId {
        self.textures.push(TextureRequest {
            path: path.to_string(),
            settings,
        });
        TextureId(self.textures.len() - 1)
    }

    /// Adds a shadow casting and receiving mesh node below `parent`.
    ///
    /// The material list must provide a material for every group of the
    /// geometry.
    pub fn add_mesh(
        &mut self,
        parent: NodeId,
        name: &str,
        geometry: GeometryId,
        materials: &[MaterialId],
    ) -> Result<NodeId, SceneError> {
        let required = self
            .geometries
            .get(geometry.0)
            .ok_or(SceneError::UnknownGeometry(geometry.0))?
            .material_slots();
        if let Some(unknown) = materials.iter().find(|m| m.0 >= self.materials.len()) {
            return Err(SceneError::UnknownMaterial(unknown.0));
        }
        if materials.len() < required {
            return Err(SceneError::MaterialGroupMismatch {
                mesh: name.to_string(),
                required,
                provided: materials.len(),
            });
        }
        self.graph.add_mesh_node(
            parent,
            name,
            MeshRef {
                geometry,
                materials: materials.to_vec(),
                cast_shadow: true,
                receive_shadow: true,
            },
        )
    }

    pub fn geometry(&self, id: GeometryId) -> Option<&Geometry> {
        self.geometries.get(id.0)
    }

    pub fn material(&self, id: MaterialId) -> Option<&MaterialDesc> {
        self.materials.get(id.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    #[test]
    fn multi_group_mesh_needs_every_material() {
        let mut scene = Scene::new();
        let mut core = Geometry::cylinder(4.0, 4.0, 10.0, 8, 1, true);
        core.clear_groups();
        core.add_group(0, u32::MAX, 0);
        core.add_group(0, u32::MAX, 1);
        let core = scene.add_geometry(core);
        let solid = scene.add_material(MaterialDesc::new("solid"));
        let root = scene.graph.root();

        let err = scene.add_mesh(root, "core", core, &[solid]).unwrap_err();
        assert_eq!(
            err,
            SceneError::MaterialGroupMismatch {
                mesh: "core".to_string(),
                required: 2,
                provided: 1
            }
        );

        let windows = scene.add_material(MaterialDesc::new("windows"));
        assert!(scene.add_mesh(root, "core", core, &[solid, windows]).is_ok());
    }

    #[test]
    fn unknown_references_are_rejected() {
        let mut scene = Scene::new();
        let root = scene.graph.root();
        assert_eq!(
            scene.add_mesh(root, "ghost", GeometryId(3), &[]),
            Err(SceneError::UnknownGeometry(3))
        );
        let disc = scene.add_geometry(Geometry::circle(1.0, 8, 0.0, 2.0 * PI));
        assert_eq!(
            scene.add_mesh(root, "disc", disc, &[MaterialId(0)]),
            Err(SceneError::UnknownMaterial(0))
        );
    }
}
