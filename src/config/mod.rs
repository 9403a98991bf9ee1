use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

pub mod attachments;

/// Knobs applied while loading and converting one model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportOptions {
    /// Split polygons into triangles while parsing. Faces that are still not
    /// triangles afterwards are dropped during mesh extraction.
    pub triangulate: bool,
    /// Flip the V texture coordinate (`v' = 1 - v`).
    pub flip_uvs: bool,
    /// Compute smooth normals for meshes that carry none.
    pub generate_normals: bool,
    /// Uniform scale applied to node transforms of metre-based formats (glTF/GLB).
    pub gltf_unit_scale: f32,
    /// Look for external textures anywhere under the model's folder before
    /// falling back to the literal relative path.
    pub recursive_texture_search: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            triangulate: true,
            flip_uvs: true,
            generate_normals: true,
            gltf_unit_scale: 100.0,
            recursive_texture_search: true,
        }
    }
}

impl ImportOptions {
    pub fn from_json_str(json: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: &Path) -> anyhow::Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read import options {}", path.display()))?;
        Self::from_json_str(&json)
            .with_context(|| format!("Failed to parse import options {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_post_processing_flags() {
        let opts = ImportOptions::default();
        assert!(opts.triangulate);
        assert!(opts.flip_uvs);
        assert!(opts.generate_normals);
        assert!(opts.recursive_texture_search);
        assert!((opts.gltf_unit_scale - 100.0).abs() < f32::EPSILON);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let opts = ImportOptions::from_json_str(r#"{ "flip_uvs": false, "gltf_unit_scale": 1.0 }"#)
            .unwrap();
        assert!(!opts.flip_uvs);
        assert!(opts.triangulate);
        assert!((opts.gltf_unit_scale - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn options_file_roundtrip() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("options.json");
        let opts = ImportOptions {
            triangulate: false,
            ..Default::default()
        };
        std::fs::write(&path, serde_json::to_string(&opts).unwrap()).unwrap();
        assert_eq!(ImportOptions::from_json_file(&path).unwrap(), opts);
    }

    #[test]
    fn missing_options_file_is_an_error() {
        let tmp = tempfile::TempDir::new().unwrap();
        assert!(ImportOptions::from_json_file(&tmp.path().join("nope.json")).is_err());
    }
}
