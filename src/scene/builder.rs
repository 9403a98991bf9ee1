use super::{extract_mesh, SceneNode};
use crate::config::ImportOptions;
use crate::material::{MaterialKey, MaterialResolver};
use crate::math::{convert_matrix, Transform};
use crate::source::{SourceNode, SourceScene};

/// Walks a source node tree into a [`SceneNode`] tree.
///
/// The walk is depth-first with an explicit stack, so deeply nested inputs
/// cannot exhaust the call stack. Children keep their source order and
/// materials are resolved in pre-order, once per source material.
pub struct SceneBuilder<'s, 'r> {
    scene: &'s SourceScene,
    resolver: &'r mut MaterialResolver<'s>,
    unit_scale: f32,
    generate_normals: bool,
    sanitized_transforms: usize,
}

struct Frame<'s> {
    source: &'s SourceNode,
    node: SceneNode,
    next_child: usize,
}

impl<'s, 'r> SceneBuilder<'s, 'r> {
    pub fn new(
        scene: &'s SourceScene,
        resolver: &'r mut MaterialResolver<'s>,
        options: &ImportOptions,
    ) -> Self {
        Self {
            scene,
            resolver,
            unit_scale: scene.format.unit_scale(options),
            generate_normals: options.generate_normals,
            sanitized_transforms: 0,
        }
    }

    /// Number of node transforms replaced with identity so far.
    pub fn sanitized_transforms(&self) -> usize {
        self.sanitized_transforms
    }

    pub fn build(&mut self, root: &'s SourceNode) -> SceneNode {
        let root_node = self.convert_node(root);
        let mut stack = vec![Frame {
            source: root,
            node: root_node,
            next_child: 0,
        }];
        let mut finished = None;

        while let Some(frame) = stack.last_mut() {
            let source = frame.source;
            if let Some(child) = source.children.get(frame.next_child) {
                frame.next_child += 1;
                let node = self.convert_node(child);
                stack.push(Frame {
                    source: child,
                    node,
                    next_child: 0,
                });
                continue;
            }

            let Some(done) = stack.pop() else {
                break;
            };
            match stack.last_mut() {
                Some(parent) => parent.node.children.push(done.node),
                None => finished = Some(done.node),
            }
        }

        finished.unwrap_or_else(|| SceneNode::new(root.name.clone()))
    }

    fn convert_node(&mut self, source: &SourceNode) -> SceneNode {
        let mut transform = convert_matrix(&source.transform, self.unit_scale);
        if !transform.is_finite() {
            log::warn!("node '{}' has a non-finite transform, using identity", source.name);
            transform = Transform::identity();
            self.sanitized_transforms += 1;
        }

        let mut node = SceneNode::new(source.name.clone());
        node.transform = transform;

        for &mesh_index in &source.mesh_indices {
            let Some(mesh) = self.scene.meshes.get(mesh_index) else {
                log::warn!(
                    "node '{}' references missing mesh {}, skipping",
                    source.name,
                    mesh_index
                );
                continue;
            };

            let mut section = extract_mesh(mesh, self.generate_normals);
            if let Some(material_index) = mesh.material_index {
                let key = MaterialKey(material_index);
                if self.resolver.resolve(key).is_some() {
                    section.material = Some(key);
                }
            }
            node.sections.push(section);
        }
        node
    }
}
