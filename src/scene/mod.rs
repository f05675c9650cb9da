//! Scene management
//!
//! The scene is an arena of nodes. Nodes own a local [`Transform`], an
//! ordered list of children and at most one renderable. Meshes and materials
//! are registered once and shared by id, so many nodes can draw the same
//! geometry with different transforms.

mod camera;
mod transform;

pub use camera::*;
pub use transform::*;

use crate::resources::{Material, Mesh};
use glam::Mat4;
use thiserror::Error;

/// Index of a node in a [`SceneGraph`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Index of a registered mesh
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshId(usize);

impl MeshId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Index of a registered material
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MaterialId(usize);

impl MaterialId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Scene graph misuse
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SceneError {
    #[error("Unknown node {0:?}")]
    UnknownNode(NodeId),
    #[error("Node {0:?} already has a parent")]
    AlreadyParented(NodeId),
    #[error("Attaching {child:?} under {parent:?} would create a cycle")]
    Cycle { parent: NodeId, child: NodeId },
}

/// Geometry and material drawn at a node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Renderable {
    pub mesh: MeshId,
    pub material: MaterialId,
}

#[derive(Debug, Clone)]
pub struct Node {
    pub name: String,
    pub transform: Transform,
    pub renderable: Option<Renderable>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn is_group(&self) -> bool {
        self.renderable.is_none()
    }
}

/// One renderable node resolved to world space
#[derive(Debug, Clone, Copy)]
pub struct DrawItem {
    pub node: NodeId,
    pub world: Mat4,
    pub renderable: Renderable,
}

/// Arena-backed scene graph
#[derive(Debug, Default)]
pub struct SceneGraph {
    nodes: Vec<Node>,
    roots: Vec<NodeId>,
    meshes: Vec<Mesh>,
    materials: Vec<Material>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_mesh(&mut self, mesh: Mesh) -> MeshId {
        self.meshes.push(mesh);
        MeshId(self.meshes.len() - 1)
    }

    pub fn add_material(&mut self, material: Material) -> MaterialId {
        self.materials.push(material);
        MaterialId(self.materials.len() - 1)
    }

    pub fn meshes(&self) -> &[Mesh] {
        &self.meshes
    }

    pub fn materials(&self) -> &[Material] {
        &self.materials
    }

    pub fn mesh(&self, id: MeshId) -> Option<&Mesh> {
        self.meshes.get(id.0)
    }

    pub fn material(&self, id: MaterialId) -> Option<&Material> {
        self.materials.get(id.0)
    }

    /// Create a detached node with no renderable
    pub fn add_group(&mut self, name: &str, transform: Transform) -> NodeId {
        self.push_node(name, transform, None)
    }

    /// Create a detached node drawing `mesh` with `material`
    pub fn add_mesh_node(
        &mut self,
        name: &str,
        transform: Transform,
        mesh: MeshId,
        material: MaterialId,
    ) -> NodeId {
        self.push_node(name, transform, Some(Renderable { mesh, material }))
    }

    fn push_node(&mut self, name: &str, transform: Transform, renderable: Option<Renderable>) -> NodeId {
        self.nodes.push(Node {
            name: name.to_string(),
            transform,
            renderable,
            parent: None,
            children: Vec::new(),
        });
        NodeId(self.nodes.len() - 1)
    }

    /// Append a detached node to the top level of the scene
    pub fn add_root(&mut self, node: NodeId) -> Result<(), SceneError> {
        let entry = self.nodes.get(node.0).ok_or(SceneError::UnknownNode(node))?;
        if entry.parent.is_some() || self.roots.contains(&node) {
            return Err(SceneError::AlreadyParented(node));
        }
        self.roots.push(node);
        Ok(())
    }

    /// Append `child` to the children of `parent`
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), SceneError> {
        if parent.0 >= self.nodes.len() {
            return Err(SceneError::UnknownNode(parent));
        }
        let entry = self.nodes.get(child.0).ok_or(SceneError::UnknownNode(child))?;
        if entry.parent.is_some() || self.roots.contains(&child) {
            return Err(SceneError::AlreadyParented(child));
        }

        // Walk up from the new parent; meeting the child means a loop
        let mut cursor = Some(parent);
        while let Some(id) = cursor {
            if id == child {
                return Err(SceneError::Cycle { parent, child });
            }
            cursor = self.nodes[id.0].parent;
        }

        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
        Ok(())
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn transform(&self, id: NodeId) -> Option<&Transform> {
        self.nodes.get(id.0).map(|node| &node.transform)
    }

    pub fn transform_mut(&mut self, id: NodeId) -> Option<&mut Transform> {
        self.nodes.get_mut(id.0).map(|node| &mut node.transform)
    }

    /// First node with the given name, in creation order
    pub fn find(&self, name: &str) -> Option<NodeId> {
        self.nodes.iter().position(|n| n.name == name).map(NodeId)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn renderable_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.renderable.is_some()).count()
    }

    /// World matrix of a node, composed through its ancestors
    pub fn world_matrix(&self, id: NodeId) -> Option<Mat4> {
        let mut node = self.nodes.get(id.0)?;
        let mut world = node.transform.matrix();
        while let Some(parent) = node.parent {
            node = &self.nodes[parent.0];
            world = node.transform.matrix() * world;
        }
        Some(world)
    }

    /// Renderable nodes reachable from the roots, in depth-first order
    pub fn draw_list(&self) -> Vec<DrawItem> {
        let mut items = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<(NodeId, Mat4)> = self
            .roots
            .iter()
            .rev()
            .map(|&id| (id, Mat4::IDENTITY))
            .collect();

        while let Some((id, parent_world)) = stack.pop() {
            let node = &self.nodes[id.0];
            let world = parent_world * node.transform.matrix();

            if let Some(renderable) = node.renderable {
                items.push(DrawItem {
                    node: id,
                    world,
                    renderable,
                });
            }

            stack.extend(node.children.iter().rev().map(|&child| (child, world)));
        }

        items
    }
}
