//! Import orchestration: parse once, build the tree, keep the material cache.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;

use crate::config::ImportOptions;
use crate::error::{ImportError, Result};
use crate::material::{MaterialCache, MaterialKey, MaterialResolver, ResolvedMaterial};
use crate::scene::{MeshSection, NodeIter, SceneBuilder, SceneNode};
use crate::source::{load_source_scene, SourceFormat, SourceScene};

pub const DEFAULT_MODEL_ID: &str = "DefaultModelID";

/// One imported model: the scene tree plus the materials its sections use.
#[derive(Debug, Clone)]
pub struct Model {
    root: SceneNode,
    materials: MaterialCache,
    source_file_path: PathBuf,
    model_name: String,
    model_id: String,
    format: SourceFormat,
}

impl Model {
    pub fn root(&self) -> &SceneNode {
        &self.root
    }

    pub fn source_file_path(&self) -> &Path {
        &self.source_file_path
    }

    /// File stem of the source file.
    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    pub fn set_model_id(&mut self, model_id: impl Into<String>) {
        self.model_id = model_id.into();
    }

    pub fn format(&self) -> SourceFormat {
        self.format
    }

    /// First node with this name, depth-first from the root.
    pub fn find_node(&self, name: &str) -> Option<&SceneNode> {
        self.root.find(name)
    }

    /// All nodes in depth-first pre-order.
    pub fn nodes(&self) -> NodeIter<'_> {
        self.root.iter()
    }

    pub fn materials(&self) -> &MaterialCache {
        &self.materials
    }

    pub fn material(&self, key: MaterialKey) -> Option<&Arc<ResolvedMaterial>> {
        self.materials.get(key)
    }

    pub fn material_for(&self, section: &MeshSection) -> Option<&Arc<ResolvedMaterial>> {
        section.material.and_then(|key| self.materials.get(key))
    }

    pub fn stats(&self) -> ModelStats {
        let mut stats = ModelStats {
            materials: self.materials.len(),
            ..Default::default()
        };
        for node in self.nodes() {
            stats.nodes += 1;
            for section in &node.sections {
                stats.mesh_sections += 1;
                stats.vertices += section.vertex_count();
                stats.triangles += section.triangle_count();
            }
        }
        stats.depth = self.root.depth();

        let mut textures = HashSet::new();
        for (_, material) in self.materials.iter() {
            for texture in material.textures.values() {
                textures.insert(Arc::as_ptr(texture));
            }
        }
        stats.textures = textures.len();
        stats
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ModelStats {
    pub nodes: usize,
    pub depth: usize,
    pub mesh_sections: usize,
    pub vertices: usize,
    pub triangles: usize,
    pub materials: usize,
    /// Distinct decoded textures across all materials.
    pub textures: usize,
}

impl fmt::Display for ModelStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} nodes (depth {}), {} sections, {} vertices, {} triangles, {} materials, {} textures",
            self.nodes,
            self.depth,
            self.mesh_sections,
            self.vertices,
            self.triangles,
            self.materials,
            self.textures
        )
    }
}

/// Entry point for hosts: turns a model file into a [`Model`].
#[derive(Debug, Clone, Default)]
pub struct ModelImporter {
    options: ImportOptions,
}

impl ModelImporter {
    pub fn new(options: ImportOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ImportOptions {
        &self.options
    }

    /// Parse and convert a model file. Only whole-import failures are
    /// errors; everything below that degrades and is logged.
    pub fn import(&self, path: &Path) -> Result<Model> {
        let result = std::fs::metadata(path)
            .map_err(|e| ImportError::io(path, e))
            .and_then(|_| load_source_scene(path, &self.options))
            .and_then(|scene| self.from_source(scene, path));
        if let Err(e) = &result {
            log::error!("import of {} failed: {}", path.display(), e);
        }
        result
    }

    /// Convert an already parsed scene. `path` names the source file; its
    /// folder is the base for texture lookups.
    pub fn from_source(&self, scene: SourceScene, path: &Path) -> Result<Model> {
        let root = scene
            .root
            .as_ref()
            .ok_or_else(|| ImportError::MissingRoot(path.to_path_buf()))?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new(""));

        let mut resolver = MaterialResolver::new(&scene, base_dir, &self.options);
        let root_node = SceneBuilder::new(&scene, &mut resolver, &self.options).build(root);
        let materials = resolver.into_cache();

        let model = Model {
            root: root_node,
            materials,
            source_file_path: path.to_path_buf(),
            model_name: path
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_default(),
            model_id: DEFAULT_MODEL_ID.to_string(),
            format: scene.format,
        };
        log::info!("imported {}: {}", path.display(), model.stats());
        Ok(model)
    }
}
