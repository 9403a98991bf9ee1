// Common test utilities: fixture writers for model and texture files.
#![allow(dead_code)]

use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use base64::prelude::BASE64_STANDARD;
use base64::Engine;
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use scene_import_lib::{MeshSection, Model};
use serde_json::{json, Map, Value};

/// Write `contents` under `dir`, creating parent folders.
pub fn write_file(dir: &Path, relative: &str, contents: &[u8]) -> PathBuf {
    let path = dir.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, contents).unwrap();
    path
}

/// Encode a solid-colour RGBA image as PNG.
pub fn png_bytes(width: u32, height: u32, rgba: [u8; 4]) -> Vec<u8> {
    let mut out = Vec::new();
    DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, Rgba(rgba)))
        .write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
        .unwrap();
    out
}

fn push_u32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_le_bytes());
}

/// Uncompressed 32-bit BGRA DDS with `mip_count` levels. Level `n` is filled
/// with the BGRA pixel `[n * 10, 0, 200, 255]`. `drop_tail` bytes are cut off
/// the end of the file.
pub fn dds_bgra_bytes(width: u32, height: u32, mip_count: u32, drop_tail: usize) -> Vec<u8> {
    let mut out = b"DDS ".to_vec();
    let mip_flag = if mip_count > 1 { 0x2_0000 } else { 0 };
    push_u32(&mut out, 124); // header size
    push_u32(&mut out, 0x1 | 0x2 | 0x4 | 0x1000 | mip_flag);
    push_u32(&mut out, height);
    push_u32(&mut out, width);
    push_u32(&mut out, width * 4); // pitch
    push_u32(&mut out, 0); // depth
    push_u32(&mut out, mip_count);
    for _ in 0..11 {
        push_u32(&mut out, 0);
    }
    // pixel format
    push_u32(&mut out, 32);
    push_u32(&mut out, 0x40 | 0x1); // RGB | ALPHAPIXELS
    push_u32(&mut out, 0);
    push_u32(&mut out, 32);
    push_u32(&mut out, 0x00ff_0000);
    push_u32(&mut out, 0x0000_ff00);
    push_u32(&mut out, 0x0000_00ff);
    push_u32(&mut out, 0xff00_0000);
    // caps, caps2, caps3, caps4, reserved2
    push_u32(&mut out, 0x1000);
    for _ in 0..4 {
        push_u32(&mut out, 0);
    }
    assert_eq!(out.len(), 128);

    for level in 0..mip_count {
        let w = (width >> level).max(1);
        let h = (height >> level).max(1);
        for _ in 0..w * h {
            out.extend_from_slice(&[(level * 10) as u8, 0, 200, 255]);
        }
    }
    out.truncate(out.len() - drop_tail);
    out
}

// ============================================================================
// glTF fixtures
// ============================================================================

/// One shared triangle buffer; every mesh is that triangle with its own
/// material. Images are embedded PNG data URIs, texture `i` uses image `i`.
pub struct GltfFixture {
    pub nodes: Value,
    pub roots: Vec<usize>,
    pub mesh_materials: Vec<Option<usize>>,
    pub materials: Value,
    pub embedded_pngs: Vec<(u32, u32)>,
}

impl Default for GltfFixture {
    fn default() -> Self {
        Self {
            nodes: json!([]),
            roots: Vec::new(),
            mesh_materials: Vec::new(),
            materials: json!([]),
            embedded_pngs: Vec::new(),
        }
    }
}

fn triangle_buffer() -> Vec<u8> {
    let mut data = Vec::with_capacity(80);
    for v in [[0.0f32, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]] {
        for c in v {
            data.extend_from_slice(&c.to_le_bytes());
        }
    }
    for _ in 0..3 {
        for c in [0.0f32, 0.0, 1.0] {
            data.extend_from_slice(&c.to_le_bytes());
        }
    }
    for i in [0u16, 1, 2] {
        data.extend_from_slice(&i.to_le_bytes());
    }
    data.extend_from_slice(&[0, 0]);
    data
}

pub fn write_gltf(dir: &Path, file_name: &str, fixture: &GltfFixture) -> PathBuf {
    let buffer = triangle_buffer();
    let mut doc = Map::new();
    doc.insert("asset".into(), json!({ "version": "2.0" }));
    doc.insert(
        "buffers".into(),
        json!([{
            "byteLength": buffer.len(),
            "uri": format!("data:application/octet-stream;base64,{}", BASE64_STANDARD.encode(&buffer)),
        }]),
    );
    doc.insert(
        "bufferViews".into(),
        json!([
            { "buffer": 0, "byteOffset": 0, "byteLength": 36, "target": 34962 },
            { "buffer": 0, "byteOffset": 36, "byteLength": 36, "target": 34962 },
            { "buffer": 0, "byteOffset": 72, "byteLength": 6, "target": 34963 },
        ]),
    );
    doc.insert(
        "accessors".into(),
        json!([
            { "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
              "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0] },
            { "bufferView": 1, "componentType": 5126, "count": 3, "type": "VEC3" },
            { "bufferView": 2, "componentType": 5123, "count": 3, "type": "SCALAR" },
        ]),
    );

    if !fixture.mesh_materials.is_empty() {
        let meshes: Vec<Value> = fixture
            .mesh_materials
            .iter()
            .map(|material| {
                let mut primitive = json!({
                    "attributes": { "POSITION": 0, "NORMAL": 1 },
                    "indices": 2,
                });
                if let Some(m) = material {
                    primitive["material"] = json!(m);
                }
                json!({ "primitives": [primitive] })
            })
            .collect();
        doc.insert("meshes".into(), Value::Array(meshes));
    }

    if fixture.materials.as_array().is_some_and(|m| !m.is_empty()) {
        doc.insert("materials".into(), fixture.materials.clone());
    }

    if !fixture.embedded_pngs.is_empty() {
        let images: Vec<Value> = fixture
            .embedded_pngs
            .iter()
            .map(|&(w, h)| {
                json!({
                    "uri": format!("data:image/png;base64,{}", BASE64_STANDARD.encode(png_bytes(w, h, [255, 0, 0, 255])))
                })
            })
            .collect();
        let textures: Vec<Value> = (0..images.len()).map(|i| json!({ "source": i })).collect();
        doc.insert("images".into(), Value::Array(images));
        doc.insert("textures".into(), Value::Array(textures));
    }

    if fixture.nodes.as_array().is_some_and(|n| !n.is_empty()) {
        doc.insert("nodes".into(), fixture.nodes.clone());
        doc.insert("scenes".into(), json!([{ "nodes": fixture.roots }]));
        doc.insert("scene".into(), json!(0));
    }

    let text = serde_json::to_string_pretty(&Value::Object(doc)).unwrap();
    write_file(dir, file_name, text.as_bytes())
}

// ============================================================================
// Assertions
// ============================================================================

/// Per-section invariants every imported mesh must satisfy.
pub fn assert_section_invariants(section: &MeshSection) {
    let n = section.vertices.len();
    assert_eq!(section.normals.len(), n, "normals length in '{}'", section.name);
    assert_eq!(section.uvs.len(), n, "uvs length in '{}'", section.name);
    assert_eq!(section.indices.len() % 3, 0, "index count in '{}'", section.name);
    assert!(
        section.indices.iter().all(|&i| (i as usize) < n),
        "index out of range in '{}'",
        section.name
    );
}

pub fn assert_model_invariants(model: &Model) {
    for node in model.nodes() {
        assert!(node.transform.is_finite(), "non-finite transform on '{}'", node.name);
        for section in &node.sections {
            assert_section_invariants(section);
        }
    }
}
