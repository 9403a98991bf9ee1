//! Resolved materials and the per-model material cache.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;

use crate::source::TextureSemantic;
use crate::texture::{ColorSpace, DecodedTexture};

pub mod resolver;

pub use resolver::MaterialResolver;

pub const DEFAULT_BASE_COLOR: [f32; 3] = [1.0, 1.0, 1.0];
pub const DEFAULT_METALLIC: f32 = 0.0;
pub const DEFAULT_ROUGHNESS: f32 = 0.5;
pub const DEFAULT_OPACITY: f32 = 1.0;

/// Target material parameter slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum TextureChannel {
    BaseColor,
    Normal,
    Specular,
    Metallic,
    AmbientOcclusion,
    Emissive,
    Roughness,
    Opacity,
}

impl TextureChannel {
    pub const ALL: [TextureChannel; 8] = [
        TextureChannel::BaseColor,
        TextureChannel::Normal,
        TextureChannel::Specular,
        TextureChannel::Metallic,
        TextureChannel::AmbientOcclusion,
        TextureChannel::Emissive,
        TextureChannel::Roughness,
        TextureChannel::Opacity,
    ];

    /// Source semantics feeding this channel, in priority order.
    pub fn semantics(&self) -> &'static [TextureSemantic] {
        match self {
            TextureChannel::BaseColor => &[TextureSemantic::Diffuse, TextureSemantic::BaseColor],
            TextureChannel::Normal => &[TextureSemantic::Normals, TextureSemantic::Height],
            TextureChannel::Specular => &[TextureSemantic::Specular],
            TextureChannel::Metallic => &[TextureSemantic::Metalness],
            TextureChannel::AmbientOcclusion => {
                &[TextureSemantic::AmbientOcclusion, TextureSemantic::Lightmap]
            }
            TextureChannel::Emissive => &[TextureSemantic::Emissive],
            TextureChannel::Roughness => &[TextureSemantic::DiffuseRoughness],
            TextureChannel::Opacity => &[TextureSemantic::Opacity],
        }
    }

    /// Only base colour carries colour data; everything else is sampled raw.
    pub fn color_space(&self) -> ColorSpace {
        match self {
            TextureChannel::BaseColor => ColorSpace::Srgb,
            _ => ColorSpace::Linear,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            TextureChannel::BaseColor => "BaseColor",
            TextureChannel::Normal => "Normal",
            TextureChannel::Specular => "Specular",
            TextureChannel::Metallic => "Metallic",
            TextureChannel::AmbientOcclusion => "AO",
            TextureChannel::Emissive => "Emissive",
            TextureChannel::Roughness => "Roughness",
            TextureChannel::Opacity => "Opacity",
        }
    }
}

/// Identity of a source material within one scene (its index).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct MaterialKey(pub usize);

/// A source material mapped onto the fixed target parameter set. Unset
/// fields mean the source did not provide a value; the `*_or_default`
/// accessors apply the fallbacks.
#[derive(Debug, Clone, Default)]
pub struct ResolvedMaterial {
    pub name: String,
    pub base_color: Option<[f32; 3]>,
    pub metallic: Option<f32>,
    pub roughness: Option<f32>,
    pub opacity: Option<f32>,
    pub ambient_occlusion: Option<f32>,
    pub emissive: Option<[f32; 3]>,
    pub specular: Option<[f32; 3]>,
    pub textures: BTreeMap<TextureChannel, Arc<DecodedTexture>>,
}

impl ResolvedMaterial {
    pub fn base_color_or_default(&self) -> [f32; 3] {
        self.base_color.unwrap_or(DEFAULT_BASE_COLOR)
    }

    pub fn metallic_or_default(&self) -> f32 {
        self.metallic.unwrap_or(DEFAULT_METALLIC)
    }

    pub fn roughness_or_default(&self) -> f32 {
        self.roughness.unwrap_or(DEFAULT_ROUGHNESS)
    }

    pub fn opacity_or_default(&self) -> f32 {
        self.opacity.unwrap_or(DEFAULT_OPACITY)
    }

    pub fn texture(&self, channel: TextureChannel) -> Option<&Arc<DecodedTexture>> {
        self.textures.get(&channel)
    }
}

/// Resolved materials of one model, keyed by source material identity.
#[derive(Debug, Clone, Default)]
pub struct MaterialCache {
    entries: BTreeMap<MaterialKey, Arc<ResolvedMaterial>>,
}

impl MaterialCache {
    pub fn get(&self, key: MaterialKey) -> Option<&Arc<ResolvedMaterial>> {
        self.entries.get(&key)
    }

    /// Store a material and hand back the shared reference kept by the cache.
    pub fn insert(&mut self, key: MaterialKey, material: ResolvedMaterial) -> Arc<ResolvedMaterial> {
        let shared = Arc::new(material);
        self.entries.insert(key, Arc::clone(&shared));
        shared
    }

    pub fn contains(&self, key: MaterialKey) -> bool {
        self.entries.contains_key(&key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (MaterialKey, &Arc<ResolvedMaterial>)> {
        self.entries.iter().map(|(k, v)| (*k, v))
    }
}
