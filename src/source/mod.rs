//! Read-only model of a parsed foreign scene.
//!
//! Parser front-ends (glTF via the `gltf` crate, OBJ via `tobj`) fill these
//! types; hosts with their own parser can build a [`SourceScene`] directly.
//! Everything downstream (scene graph, materials, textures) reads only from
//! here.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::ImportOptions;
use crate::error::{ImportError, Result};

pub mod gltf_loader;
pub mod obj_loader;

/// File formats recognised by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceFormat {
    Gltf,
    Glb,
    Obj,
    Fbx,
    Collada,
    ThreeDs,
    Stl,
    Other,
}

impl SourceFormat {
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "gltf" => SourceFormat::Gltf,
            "glb" => SourceFormat::Glb,
            "obj" => SourceFormat::Obj,
            "fbx" => SourceFormat::Fbx,
            "dae" => SourceFormat::Collada,
            "3ds" => SourceFormat::ThreeDs,
            "stl" => SourceFormat::Stl,
            _ => SourceFormat::Other,
        }
    }

    /// glTF/GLB are Y-up; everything else is treated as Z-up.
    pub fn is_y_up(&self) -> bool {
        matches!(self, SourceFormat::Gltf | SourceFormat::Glb)
    }

    /// Scale applied to node transforms to reach centimetres.
    pub fn unit_scale(&self, options: &ImportOptions) -> f32 {
        if self.is_y_up() {
            options.gltf_unit_scale
        } else {
            1.0
        }
    }
}

/// Texture slot semantics as scene-parsing libraries report them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TextureSemantic {
    Diffuse,
    BaseColor,
    Normals,
    Height,
    Specular,
    Metalness,
    AmbientOcclusion,
    Lightmap,
    Emissive,
    DiffuseRoughness,
    Opacity,
}

/// Texture data stored inside the model file.
#[derive(Debug, Clone, Default)]
pub struct EmbeddedTexture {
    /// Pixel width, or the byte length of `data` when `height == 0`.
    pub width: u32,
    /// 0 marks `data` as a compressed image file (PNG, JPG, ...).
    pub height: u32,
    pub data: Vec<u8>,
    /// File extension hint such as "png", when the source knows it.
    pub format_hint: Option<String>,
    pub filename: Option<String>,
}

impl EmbeddedTexture {
    pub fn compressed(data: Vec<u8>, format_hint: Option<String>) -> Self {
        Self {
            width: data.len() as u32,
            height: 0,
            data,
            format_hint,
            filename: None,
        }
    }

    pub fn is_compressed(&self) -> bool {
        self.height == 0
    }
}

#[derive(Debug, Clone, Default)]
pub struct SourceMaterial {
    pub name: String,
    pub diffuse_color: Option<[f32; 3]>,
    pub specular_color: Option<[f32; 3]>,
    pub emissive_color: Option<[f32; 3]>,
    pub metallic: Option<f32>,
    pub roughness: Option<f32>,
    pub opacity: Option<f32>,
    pub ambient_occlusion: Option<f32>,
    /// Texture references per semantic, in bind order. `*N` points into
    /// [`SourceScene::embedded_textures`].
    pub textures: BTreeMap<TextureSemantic, Vec<String>>,
}

impl SourceMaterial {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn add_texture(&mut self, semantic: TextureSemantic, reference: impl Into<String>) {
        self.textures.entry(semantic).or_default().push(reference.into());
    }

    /// First bound texture of a semantic, if any.
    pub fn texture(&self, semantic: TextureSemantic) -> Option<&str> {
        self.textures
            .get(&semantic)
            .and_then(|refs| refs.first())
            .map(String::as_str)
    }
}

#[derive(Debug, Clone, Default)]
pub struct SourceMesh {
    pub name: String,
    pub positions: Vec<[f32; 3]>,
    /// Empty when the source has no normals.
    pub normals: Vec<[f32; 3]>,
    pub uvs: Option<Vec<[f32; 2]>>,
    pub tangents: Vec<[f32; 3]>,
    pub bitangents: Vec<[f32; 3]>,
    /// One polygon per entry; any arity.
    pub faces: Vec<Vec<u32>>,
    pub material_index: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct SourceNode {
    pub name: String,
    /// Column-major local matrix.
    pub transform: [[f32; 4]; 4],
    pub mesh_indices: Vec<usize>,
    pub children: Vec<SourceNode>,
}

impl SourceNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transform: crate::math::IDENTITY_MATRIX,
            mesh_indices: Vec::new(),
            children: Vec::new(),
        }
    }
}

impl Drop for SourceNode {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.children);
        }
    }
}

#[derive(Debug, Clone)]
pub struct SourceScene {
    pub format: SourceFormat,
    pub root: Option<SourceNode>,
    pub meshes: Vec<SourceMesh>,
    pub materials: Vec<SourceMaterial>,
    pub embedded_textures: Vec<EmbeddedTexture>,
}

impl SourceScene {
    pub fn new(format: SourceFormat) -> Self {
        Self {
            format,
            root: None,
            meshes: Vec::new(),
            materials: Vec::new(),
            embedded_textures: Vec::new(),
        }
    }

    /// Look up an embedded texture by reference.
    ///
    /// `*N` indexes the embedded list; anything else is matched against the
    /// embedded textures' file names (compared without directories).
    pub fn embedded_texture(&self, reference: &str) -> Option<&EmbeddedTexture> {
        if let Some(index) = reference.strip_prefix('*') {
            return index
                .parse::<usize>()
                .ok()
                .and_then(|i| self.embedded_textures.get(i));
        }
        let wanted = file_name_of(reference);
        self.embedded_textures.iter().find(|tex| {
            tex.filename
                .as_deref()
                .is_some_and(|f| file_name_of(f).eq_ignore_ascii_case(wanted))
        })
    }
}

fn file_name_of(reference: &str) -> &str {
    reference.rsplit(['/', '\\']).next().unwrap_or(reference)
}

/// Parse a model file into a [`SourceScene`], dispatching on the extension.
pub fn load_source_scene(path: &Path, options: &ImportOptions) -> Result<SourceScene> {
    match SourceFormat::from_path(path) {
        SourceFormat::Gltf | SourceFormat::Glb => gltf_loader::load_gltf_scene(path, options),
        SourceFormat::Obj => obj_loader::load_obj_scene(path, options),
        _ => Err(ImportError::UnsupportedFormat(
            path.extension()
                .map(|e| e.to_string_lossy().to_string())
                .unwrap_or_else(|| path.display().to_string()),
        )),
    }
}
