//! Scene graph and hierarchical scene organization.
//!
//! The graph is an arena of [`Node`]s addressed by [`NodeId`]. Every node has a
//! local transform (position, XYZ Euler rotation, scale) and may reference a mesh.
//! Parents own their children exclusively, so the graph is always a tree rooted
//! at [`SceneGraph::root`]. World transforms are cached on the nodes and
//! refreshed with [`SceneGraph::update_world_transforms`].

use cgmath::{Euler, Rad, Vector3};

use crate::{
    data_structures::{
        geometry::GeometryId, instance::Instance, material::MaterialId,
    },
    error::SceneError,
};

/// Handle of a node in a [`SceneGraph`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

/// Renderable part of a node: shared geometry and one material per group.
#[derive(Clone, Debug, PartialEq)]
pub struct MeshRef {
    pub geometry: GeometryId,
    pub materials: Vec<MaterialId>,
    pub cast_shadow: bool,
    pub receive_shadow: bool,
}

#[derive(Clone, Debug)]
pub struct Node {
    pub name: String,
    pub position: Vector3<f32>,
    pub rotation: Euler<Rad<f32>>,
    pub scale: Vector3<f32>,
    pub mesh: Option<MeshRef>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    world: Instance,
}

impl Node {
    fn new(name: &str, parent: Option<NodeId>) -> Self {
        Self {
            name: name.to_string(),
            position: Vector3::new(0.0, 0.0, 0.0),
            rotation: Euler::new(Rad(0.0), Rad(0.0), Rad(0.0)),
            scale: Vector3::new(1.0, 1.0, 1.0),
            mesh: None,
            parent,
            children: Vec::new(),
            world: Instance::new(),
        }
    }

    pub fn local_transform(&self) -> Instance {
        Instance::from_euler(self.position, self.rotation, self.scale)
    }

    /// World transform as of the last [`SceneGraph::update_world_transforms`].
    pub fn world_transform(&self) -> &Instance {
        &self.world
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

#[derive(Clone, Debug)]
pub struct SceneGraph {
    nodes: Vec<Node>,
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneGraph {
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::new("root", None)],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0)
    }

    /// Appends an empty transform node below `parent`.
    pub fn add_node(&mut self, parent: NodeId, name: &str) -> Result<NodeId, SceneError> {
        if parent.0 >= self.nodes.len() {
            return Err(SceneError::UnknownNode(parent.0));
        }
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::new(name, Some(parent)));
        self.nodes[parent.0].children.push(id);
        Ok(id)
    }

    /// Appends a mesh node below `parent`. Callers validate the material count
    /// against the geometry (see [`Scene::add_mesh`](crate::data_structures::scene::Scene::add_mesh)).
    pub fn add_mesh_node(
        &mut self,
        parent: NodeId,
        name: &str,
        mesh: MeshRef,
    ) -> Result<NodeId, SceneError> {
        let id = self.add_node(parent, name)?;
        self.nodes[id.0].mesh = Some(mesh);
        Ok(id)
    }

    /// First node with the given name in insertion order.
    pub fn find(&self, name: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .position(|node| node.name == name)
            .map(NodeId)
    }

    /// All nodes below `id`, depth first, excluding `id` itself.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = match self.node(id) {
            Some(node) => node.children.iter().rev().copied().collect(),
            None => return out,
        };
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.nodes[next.0].children.iter().rev().copied());
        }
        out
    }

    /// Mesh nodes in insertion order.
    pub fn meshes(&self) -> impl Iterator<Item = (NodeId, &MeshRef)> {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(idx, node)| node.mesh.as_ref().map(|mesh| (NodeId(idx), mesh)))
    }

    pub fn world_transform(&self, id: NodeId) -> Option<&Instance> {
        self.node(id).map(Node::world_transform)
    }

    /// Recomputes the cached world transform of every node as
    /// `parent.world * local`.
    pub fn update_world_transforms(&mut self) {
        let mut stack = vec![(self.root(), Instance::new())];
        while let Some((id, parent_world)) = stack.pop() {
            let Some(node) = self.nodes.get_mut(id.0) else {
                log::warn!("scene graph references missing node {}", id.0);
                continue;
            };
            node.world = parent_world * node.local_transform();
            let world = node.world;
            stack.extend(node.children.iter().map(|child| (*child, world)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn new_graph_only_has_root() {
        let graph = SceneGraph::new();
        assert_eq!(graph.len(), 1);
        assert!(graph.node(graph.root()).unwrap().parent().is_none());
    }

    #[test]
    fn unknown_parent_is_rejected() {
        let mut graph = SceneGraph::new();
        assert_eq!(
            graph.add_node(NodeId(7), "orphan"),
            Err(SceneError::UnknownNode(7))
        );
    }

    #[test]
    fn world_transform_composes_ancestors() {
        let mut graph = SceneGraph::new();
        let spinner = graph.add_node(graph.root(), "spinner").unwrap();
        let lift = graph.add_node(spinner, "lift").unwrap();
        let rider = graph.add_node(lift, "rider").unwrap();
        graph.node_mut(spinner).unwrap().rotation.y = Rad(FRAC_PI_2);
        graph.node_mut(lift).unwrap().position.y = 0.5;
        graph.node_mut(rider).unwrap().position.z = 8.0;

        graph.update_world_transforms();

        let world = graph.world_transform(rider).unwrap();
        assert_relative_eq!(world.position.x, 8.0, epsilon = 1e-5);
        assert_relative_eq!(world.position.y, 0.5, epsilon = 1e-5);
        assert_relative_eq!(world.position.z, 0.0, epsilon = 1e-5);
    }

    #[test]
    fn descendants_are_depth_first() {
        let mut graph = SceneGraph::new();
        let a = graph.add_node(graph.root(), "a").unwrap();
        let b = graph.add_node(a, "b").unwrap();
        let c = graph.add_node(graph.root(), "c").unwrap();
        assert_eq!(graph.descendants(graph.root()), vec![a, b, c]);
        assert_eq!(graph.find("c"), Some(c));
    }
}
