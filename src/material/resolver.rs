use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::{MaterialCache, MaterialKey, ResolvedMaterial, TextureChannel};
use crate::config::ImportOptions;
use crate::source::SourceScene;
use crate::texture::{self, locate, ColorSpace, DecodedTexture};

/// Maps source materials onto [`ResolvedMaterial`]s for one scene.
///
/// Each source material is resolved at most once; later requests return the
/// cached `Arc`. Decoded textures are shared between materials that reference
/// the same texture in the same colour space. Not re-entrant: one resolver
/// per import.
pub struct MaterialResolver<'a> {
    scene: &'a SourceScene,
    base_dir: PathBuf,
    recursive_search: bool,
    cache: MaterialCache,
    textures: HashMap<(String, ColorSpace), Option<Arc<DecodedTexture>>>,
    resolved_count: usize,
}

impl<'a> MaterialResolver<'a> {
    pub fn new(scene: &'a SourceScene, base_dir: impl Into<PathBuf>, options: &ImportOptions) -> Self {
        Self {
            scene,
            base_dir: base_dir.into(),
            recursive_search: options.recursive_texture_search,
            cache: MaterialCache::default(),
            textures: HashMap::new(),
            resolved_count: 0,
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Resolve a source material, consulting the cache first.
    ///
    /// `None` when the key does not name a material of the scene; the host is
    /// expected to substitute its own default material.
    pub fn resolve(&mut self, key: MaterialKey) -> Option<Arc<ResolvedMaterial>> {
        if let Some(hit) = self.cache.get(key) {
            return Some(Arc::clone(hit));
        }

        let scene = self.scene;
        let Some(source) = scene.materials.get(key.0) else {
            log::warn!(
                "material index {} out of range ({} materials), leaving section without material",
                key.0,
                scene.materials.len()
            );
            return None;
        };

        let mut resolved = ResolvedMaterial {
            name: source.name.clone(),
            base_color: source.diffuse_color,
            metallic: source.metallic,
            roughness: source.roughness,
            opacity: source.opacity,
            ambient_occlusion: source.ambient_occlusion,
            emissive: source.emissive_color,
            specular: source.specular_color,
            textures: Default::default(),
        };

        for channel in TextureChannel::ALL {
            let Some(reference) = channel
                .semantics()
                .iter()
                .find_map(|semantic| source.texture(*semantic))
            else {
                continue;
            };

            match self.load_texture(reference, channel.color_space()) {
                Some(tex) => {
                    resolved.textures.insert(channel, tex);
                }
                None => log::warn!(
                    "material '{}': {} texture '{}' unavailable, using fallback",
                    source.name,
                    channel.name(),
                    reference
                ),
            }
        }

        log::debug!(
            "resolved material '{}' ({} textures)",
            resolved.name,
            resolved.textures.len()
        );
        self.resolved_count += 1;
        Some(self.cache.insert(key, resolved))
    }

    /// Number of cache misses so far, i.e. materials actually built.
    pub fn resolved_count(&self) -> usize {
        self.resolved_count
    }

    pub fn cache(&self) -> &MaterialCache {
        &self.cache
    }

    pub fn into_cache(self) -> MaterialCache {
        self.cache
    }

    fn load_texture(&mut self, reference: &str, color_space: ColorSpace) -> Option<Arc<DecodedTexture>> {
        let key = (reference.to_string(), color_space);
        if let Some(cached) = self.textures.get(&key) {
            return cached.clone();
        }

        let decoded = self.decode_reference(reference, color_space).map(Arc::new);
        self.textures.insert(key, decoded.clone());
        decoded
    }

    fn decode_reference(&self, reference: &str, color_space: ColorSpace) -> Option<DecodedTexture> {
        if reference.starts_with('*') {
            let blob = self.scene.embedded_texture(reference)?;
            return texture::decode_embedded(blob, color_space);
        }

        if let Some(path) = locate::resolve_texture_path(&self.base_dir, reference, self.recursive_search) {
            return texture::decode_image_file(&path, color_space);
        }

        // Some exporters embed textures but keep the original file name as reference.
        let blob = self.scene.embedded_texture(reference)?;
        log::debug!("texture '{}' resolved to an embedded blob", reference);
        texture::decode_embedded(blob, color_space)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{EmbeddedTexture, SourceFormat, SourceMaterial, TextureSemantic};
    use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;
    use tempfile::TempDir;

    fn png(width: u32, height: u32) -> Vec<u8> {
        let mut out = Vec::new();
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, Rgba([9, 8, 7, 255])))
            .write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
            .unwrap();
        out
    }

    fn scene_with(materials: Vec<SourceMaterial>) -> SourceScene {
        let mut scene = SourceScene::new(SourceFormat::Obj);
        scene.materials = materials;
        scene
    }

    #[test]
    fn second_resolve_hits_cache() {
        let scene = scene_with(vec![SourceMaterial::new("a")]);
        let tmp = TempDir::new().unwrap();
        let mut resolver = MaterialResolver::new(&scene, tmp.path(), &ImportOptions::default());

        let first = resolver.resolve(MaterialKey(0)).unwrap();
        let second = resolver.resolve(MaterialKey(0)).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(resolver.resolved_count(), 1);
    }

    #[test]
    fn diffuse_colour_without_textures() {
        let mut mat = SourceMaterial::new("red");
        mat.diffuse_color = Some([1.0, 0.0, 0.0]);
        let scene = scene_with(vec![mat]);
        let tmp = TempDir::new().unwrap();
        let mut resolver = MaterialResolver::new(&scene, tmp.path(), &ImportOptions::default());

        let resolved = resolver.resolve(MaterialKey(0)).unwrap();
        assert_eq!(resolved.base_color, Some([1.0, 0.0, 0.0]));
        assert!(resolved.texture(TextureChannel::BaseColor).is_none());
        assert_eq!(resolved.metallic_or_default(), 0.0);
    }

    #[test]
    fn out_of_range_material_is_none() {
        let scene = scene_with(Vec::new());
        let mut resolver = MaterialResolver::new(&scene, ".", &ImportOptions::default());
        assert!(resolver.resolve(MaterialKey(4)).is_none());
        assert!(resolver.cache().is_empty());
    }

    #[test]
    fn shared_texture_is_decoded_once() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir_all(tmp.path().join("maps")).unwrap();
        std::fs::write(tmp.path().join("maps/Shared.png"), png(2, 2)).unwrap();

        let mut a = SourceMaterial::new("a");
        a.add_texture(TextureSemantic::Diffuse, "C:\\export\\shared.png");
        let mut b = SourceMaterial::new("b");
        b.add_texture(TextureSemantic::BaseColor, "C:\\export\\shared.png");
        b.add_texture(TextureSemantic::Normals, "C:\\export\\shared.png");
        let scene = scene_with(vec![a, b]);
        let mut resolver = MaterialResolver::new(&scene, tmp.path(), &ImportOptions::default());

        let ra = resolver.resolve(MaterialKey(0)).unwrap();
        let rb = resolver.resolve(MaterialKey(1)).unwrap();
        let ta = ra.texture(TextureChannel::BaseColor).unwrap();
        let tb = rb.texture(TextureChannel::BaseColor).unwrap();
        assert!(Arc::ptr_eq(ta, tb));
        assert_eq!(ta.color_space(), ColorSpace::Srgb);

        let normal = rb.texture(TextureChannel::Normal).unwrap();
        assert!(!Arc::ptr_eq(ta, normal));
        assert_eq!(normal.color_space(), ColorSpace::Linear);
    }

    #[test]
    fn embedded_marker_decodes_in_memory() {
        let mut mat = SourceMaterial::new("emb");
        mat.add_texture(TextureSemantic::Emissive, "*0");
        let mut scene = scene_with(vec![mat]);
        scene
            .embedded_textures
            .push(EmbeddedTexture::compressed(png(3, 5), Some("png".into())));
        let mut resolver = MaterialResolver::new(&scene, ".", &ImportOptions::default());

        let resolved = resolver.resolve(MaterialKey(0)).unwrap();
        let tex = resolved.texture(TextureChannel::Emissive).unwrap();
        assert_eq!((tex.width(), tex.height()), (3, 5));
        assert_eq!(tex.color_space(), ColorSpace::Linear);
    }

    #[test]
    fn missing_texture_leaves_channel_unset() {
        let tmp = TempDir::new().unwrap();
        let mut mat = SourceMaterial::new("m");
        mat.roughness = Some(0.8);
        mat.add_texture(TextureSemantic::DiffuseRoughness, "rough.png");
        mat.add_texture(TextureSemantic::Opacity, "*7");
        let scene = scene_with(vec![mat]);
        let mut resolver = MaterialResolver::new(&scene, tmp.path(), &ImportOptions::default());

        let resolved = resolver.resolve(MaterialKey(0)).unwrap();
        assert!(resolved.textures.is_empty());
        assert_eq!(resolved.roughness, Some(0.8));
    }

    #[test]
    fn embedded_fallback_by_file_name() {
        let tmp = TempDir::new().unwrap();
        let mut mat = SourceMaterial::new("m");
        mat.add_texture(TextureSemantic::Specular, "textures/gloss.png");
        let mut scene = scene_with(vec![mat]);
        let mut blob = EmbeddedTexture::compressed(png(1, 1), None);
        blob.filename = Some("gloss.png".into());
        scene.embedded_textures.push(blob);
        let mut resolver = MaterialResolver::new(&scene, tmp.path(), &ImportOptions::default());

        let resolved = resolver.resolve(MaterialKey(0)).unwrap();
        assert!(resolved.texture(TextureChannel::Specular).is_some());
    }
}
