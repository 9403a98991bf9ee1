//! Engine-agnostic scene tree produced by one import.

use serde::Serialize;

use crate::material::MaterialKey;
use crate::math::Transform;

pub mod builder;
pub mod mesh;

pub use builder::SceneBuilder;
pub use mesh::{extract_mesh, generate_normals};

/// Triangle geometry of one source mesh, in the target axis convention.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MeshSection {
    pub name: String,
    pub vertices: Vec<[f32; 3]>,
    /// Same length as `vertices`.
    pub normals: Vec<[f32; 3]>,
    /// Same length as `vertices`; zero-filled when the source has no UVs.
    pub uvs: Vec<[f32; 2]>,
    /// Empty, or the same length as `vertices`.
    pub tangents: Vec<[f32; 3]>,
    pub bitangents: Vec<[f32; 3]>,
    /// Triangle list; every index is below `vertices.len()`.
    pub indices: Vec<u32>,
    /// Handle into the owning model's material cache.
    pub material: Option<MaterialKey>,
}

impl MeshSection {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Check the per-vertex and index invariants.
    pub fn is_consistent(&self) -> bool {
        let n = self.vertices.len();
        self.normals.len() == n
            && self.uvs.len() == n
            && (self.tangents.is_empty() || self.tangents.len() == n)
            && (self.bitangents.is_empty() || self.bitangents.len() == n)
            && self.indices.len() % 3 == 0
            && self.indices.iter().all(|&i| (i as usize) < n)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SceneNode {
    pub name: String,
    pub transform: Transform,
    pub children: Vec<SceneNode>,
    pub sections: Vec<MeshSection>,
}

impl SceneNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transform: Transform::identity(),
            children: Vec::new(),
            sections: Vec::new(),
        }
    }

    /// Levels in the deepest branch; a leaf has depth 1.
    pub fn depth(&self) -> usize {
        let mut max_depth = 0;
        let mut stack = vec![(self, 1usize)];
        while let Some((node, depth)) = stack.pop() {
            max_depth = max_depth.max(depth);
            stack.extend(node.children.iter().map(|c| (c, depth + 1)));
        }
        max_depth
    }

    pub fn node_count(&self) -> usize {
        self.iter().count()
    }

    /// Depth-first pre-order walk starting at this node.
    pub fn iter(&self) -> NodeIter<'_> {
        NodeIter { stack: vec![self] }
    }

    /// First node with this exact name, depth-first.
    pub fn find(&self, name: &str) -> Option<&SceneNode> {
        self.iter().find(|n| n.name == name)
    }
}

// Dropping a deep tree through the derived glue would recurse once per level.
impl Drop for SceneNode {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.children);
        }
    }
}

pub struct NodeIter<'a> {
    stack: Vec<&'a SceneNode>,
}

impl<'a> Iterator for NodeIter<'a> {
    type Item = &'a SceneNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}
