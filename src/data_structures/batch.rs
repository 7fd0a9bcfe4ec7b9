use wgpu::util::DeviceExt;

use crate::data_structures::{
    geometry::GeometryId,
    instance::InstanceRaw,
    material::MaterialId,
    scene_graph::{NodeId, SceneGraph},
};

/**
 * Mesh nodes that share geometry, materials and shadow flags are drawn as one
 * instanced draw per material group.
 *
 * `BatchPlan` is the GPU-free grouping, `MeshBatch` adds the instance buffer.
 */
#[derive(Clone, Debug, PartialEq)]
pub struct BatchPlan {
    pub geometry: GeometryId,
    pub materials: Vec<MaterialId>,
    pub cast_shadow: bool,
    pub receive_shadow: bool,
    pub nodes: Vec<NodeId>,
}

/// Groups the mesh nodes of `graph` by what they are drawn with, keeping the
/// order in which each combination first appears.
pub fn plan_batches(graph: &SceneGraph) -> Vec<BatchPlan> {
    let mut plans: Vec<BatchPlan> = Vec::new();
    for (id, mesh) in graph.meshes() {
        let existing = plans.iter_mut().find(|plan| {
            plan.geometry == mesh.geometry
                && plan.materials == mesh.materials
                && plan.cast_shadow == mesh.cast_shadow
                && plan.receive_shadow == mesh.receive_shadow
        });
        match existing {
            Some(plan) => plan.nodes.push(id),
            None => plans.push(BatchPlan {
                geometry: mesh.geometry,
                materials: mesh.materials.clone(),
                cast_shadow: mesh.cast_shadow,
                receive_shadow: mesh.receive_shadow,
                nodes: vec![id],
            }),
        }
    }
    plans
}

pub struct MeshBatch {
    pub geometry: GeometryId,
    pub materials: Vec<MaterialId>,
    pub cast_shadow: bool,
    pub receive_shadow: bool,
    pub nodes: Vec<NodeId>,
    pub instance_buffer: wgpu::Buffer,
}

impl MeshBatch {
    pub fn new(device: &wgpu::Device, plan: BatchPlan, graph: &SceneGraph) -> Self {
        let instance_data = instance_data(&plan.nodes, plan.receive_shadow, graph);
        let instance_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Instance Buffer"),
            contents: bytemuck::cast_slice(&instance_data),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        });
        Self {
            geometry: plan.geometry,
            materials: plan.materials,
            cast_shadow: plan.cast_shadow,
            receive_shadow: plan.receive_shadow,
            nodes: plan.nodes,
            instance_buffer,
        }
    }

    pub fn write_instances(&self, queue: &wgpu::Queue, graph: &SceneGraph) {
        let instance_data = instance_data(&self.nodes, self.receive_shadow, graph);
        queue.write_buffer(
            &self.instance_buffer,
            0,
            bytemuck::cast_slice(&instance_data),
        );
    }
}

fn instance_data(nodes: &[NodeId], receive_shadow: bool, graph: &SceneGraph) -> Vec<InstanceRaw> {
    nodes
        .iter()
        .map(|id| match graph.world_transform(*id) {
            Some(world) => world.to_raw(receive_shadow),
            None => {
                log::warn!("batched node {} is not part of the scene graph", id.0);
                bytemuck::Zeroable::zeroed()
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_structures::scene_graph::MeshRef;

    fn mesh(geometry: usize, materials: &[usize]) -> MeshRef {
        MeshRef {
            geometry: GeometryId(geometry),
            materials: materials.iter().copied().map(MaterialId).collect(),
            cast_shadow: true,
            receive_shadow: true,
        }
    }

    #[test]
    fn same_geometry_and_materials_share_a_batch() {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let a = graph.add_mesh_node(root, "a", mesh(0, &[0])).unwrap();
        let b = graph.add_mesh_node(root, "b", mesh(0, &[1])).unwrap();
        let c = graph.add_mesh_node(root, "c", mesh(0, &[0])).unwrap();
        graph.add_node(root, "empty").unwrap();

        let plans = plan_batches(&graph);
        assert_eq!(plans.len(), 2);
        assert_eq!(plans[0].nodes, vec![a, c]);
        assert_eq!(plans[1].nodes, vec![b]);
    }
}
