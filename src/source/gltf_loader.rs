//! glTF / GLB front-end.
//!
//! Every primitive becomes its own [`SourceMesh`]; nodes reference the
//! flattened primitive list. Images living in buffer views or `data:` URIs
//! become embedded textures referenced as `*N`.

use std::collections::HashSet;
use std::path::Path;

use base64::prelude::BASE64_STANDARD;
use base64::Engine;
use cgmath::Vector3;

use super::{
    EmbeddedTexture, SourceFormat, SourceMaterial, SourceMesh, SourceNode, SourceScene,
    TextureSemantic,
};
use crate::config::ImportOptions;
use crate::error::Result;

/// Name of the synthetic node wrapping several scene roots.
pub const SYNTHETIC_ROOT_NAME: &str = "ROOT";

pub fn load_gltf_scene(path: &Path, options: &ImportOptions) -> Result<SourceScene> {
    let ::gltf::Gltf { document, blob } = ::gltf::Gltf::open(path)?;
    let buffers = ::gltf::import_buffers(&document, path.parent(), blob)?;

    let mut scene = SourceScene::new(SourceFormat::from_path(path));

    let image_refs = collect_images(&document, &buffers, &mut scene);
    scene.materials = document
        .materials()
        .map(|m| convert_material(&m, &image_refs))
        .collect();

    // glTF mesh index → indices of its primitives in `scene.meshes`
    let mut mesh_primitives: Vec<Vec<usize>> = Vec::with_capacity(document.meshes().len());
    for mesh in document.meshes() {
        let mut prim_indices = Vec::new();
        for primitive in mesh.primitives() {
            let source_mesh = read_primitive(&mesh, &primitive, &buffers, options);
            prim_indices.push(scene.meshes.len());
            scene.meshes.push(source_mesh);
        }
        mesh_primitives.push(prim_indices);
    }

    let gltf_scene = document
        .default_scene()
        .or_else(|| document.scenes().next());

    if let Some(gltf_scene) = gltf_scene {
        let mut visited = HashSet::new();
        let mut roots: Vec<SourceNode> = gltf_scene
            .nodes()
            .filter_map(|n| convert_node(n, &mesh_primitives, &mut visited))
            .collect();

        scene.root = match roots.len() {
            0 => None,
            1 => roots.pop(),
            _ => {
                let mut root = SourceNode::new(SYNTHETIC_ROOT_NAME);
                root.children = roots;
                Some(root)
            }
        };
    }

    log::debug!(
        "glTF {}: {} meshes, {} materials, {} embedded textures",
        path.display(),
        scene.meshes.len(),
        scene.materials.len(),
        scene.embedded_textures.len()
    );

    Ok(scene)
}

/// Register every image and return its texture reference, indexed like
/// `document.images()`.
fn collect_images(
    document: &::gltf::Document,
    buffers: &[::gltf::buffer::Data],
    scene: &mut SourceScene,
) -> Vec<String> {
    let mut refs = Vec::with_capacity(document.images().len());

    for image in document.images() {
        let embedded = match image.source() {
            ::gltf::image::Source::View { view, mime_type } => {
                let buf = &buffers[view.buffer().index()].0;
                let start = view.offset();
                let end = start + view.length();
                match buf.get(start..end) {
                    Some(bytes) => Some(EmbeddedTexture::compressed(
                        bytes.to_vec(),
                        extension_for_mime(mime_type),
                    )),
                    None => {
                        log::warn!("image {} points outside its buffer", image.index());
                        Some(EmbeddedTexture::default())
                    }
                }
            }
            ::gltf::image::Source::Uri { uri, mime_type } => {
                if uri.starts_with("data:") {
                    let data = decode_data_uri(uri).unwrap_or_else(|| {
                        log::warn!("image {} has an undecodable data URI", image.index());
                        Vec::new()
                    });
                    let hint = mime_type
                        .and_then(extension_for_mime)
                        .or_else(|| data_uri_mime(uri).and_then(extension_for_mime));
                    Some(EmbeddedTexture::compressed(data, hint))
                } else {
                    refs.push(uri.replace("%20", " "));
                    None
                }
            }
        };

        if let Some(mut tex) = embedded {
            tex.filename = image.name().map(str::to_string);
            refs.push(format!("*{}", scene.embedded_textures.len()));
            scene.embedded_textures.push(tex);
        }
    }

    refs
}

fn extension_for_mime(mime: &str) -> Option<String> {
    mime.split('/').last().map(|ext| match ext {
        "jpeg" => "jpg".to_string(),
        other => other.to_string(),
    })
}

fn data_uri_mime(uri: &str) -> Option<&str> {
    uri.strip_prefix("data:")?.split([';', ',']).next()
}

fn decode_data_uri(uri: &str) -> Option<Vec<u8>> {
    let (header, payload) = uri.split_once(',')?;
    if header.ends_with(";base64") {
        BASE64_STANDARD.decode(payload).ok()
    } else {
        Some(payload.as_bytes().to_vec())
    }
}

fn convert_material(material: &::gltf::Material, image_refs: &[String]) -> SourceMaterial {
    let name = material
        .name()
        .map(str::to_string)
        .unwrap_or_else(|| format!("material_{}", material.index().unwrap_or(0)));
    let mut out = SourceMaterial::new(name);

    let pbr = material.pbr_metallic_roughness();
    let base = pbr.base_color_factor();
    out.diffuse_color = Some([base[0], base[1], base[2]]);
    out.metallic = Some(pbr.metallic_factor());
    out.roughness = Some(pbr.roughness_factor());
    out.emissive_color = Some(material.emissive_factor());
    out.opacity = match material.alpha_mode() {
        ::gltf::material::AlphaMode::Opaque => None,
        _ => Some(base[3]),
    };

    let image_ref = |texture: ::gltf::Texture| image_refs.get(texture.source().index()).cloned();

    if let Some(info) = pbr.base_color_texture() {
        if let Some(r) = image_ref(info.texture()) {
            out.add_texture(TextureSemantic::BaseColor, r);
        }
    }
    if let Some(info) = pbr.metallic_roughness_texture() {
        if let Some(r) = image_ref(info.texture()) {
            out.add_texture(TextureSemantic::Metalness, r.clone());
            out.add_texture(TextureSemantic::DiffuseRoughness, r);
        }
    }
    if let Some(normal) = material.normal_texture() {
        if let Some(r) = image_ref(normal.texture()) {
            out.add_texture(TextureSemantic::Normals, r);
        }
    }
    if let Some(occlusion) = material.occlusion_texture() {
        out.ambient_occlusion = Some(occlusion.strength());
        if let Some(r) = image_ref(occlusion.texture()) {
            out.add_texture(TextureSemantic::AmbientOcclusion, r);
        }
    }
    if let Some(info) = material.emissive_texture() {
        if let Some(r) = image_ref(info.texture()) {
            out.add_texture(TextureSemantic::Emissive, r);
        }
    }

    out
}

fn read_primitive(
    mesh: &::gltf::Mesh,
    primitive: &::gltf::Primitive,
    buffers: &[::gltf::buffer::Data],
    options: &ImportOptions,
) -> SourceMesh {
    let reader = primitive.reader(|buffer| Some(buffers[buffer.index()].0.as_slice()));

    let positions: Vec<[f32; 3]> = reader
        .read_positions()
        .map(|iter| iter.collect())
        .unwrap_or_default();
    let normals: Vec<[f32; 3]> = reader
        .read_normals()
        .map(|iter| iter.collect())
        .unwrap_or_default();
    let uvs: Option<Vec<[f32; 2]>> = reader.read_tex_coords(0).map(|tc| {
        tc.into_f32()
            .map(|[u, v]| if options.flip_uvs { [u, 1.0 - v] } else { [u, v] })
            .collect()
    });

    let mut tangents = Vec::new();
    let mut bitangents = Vec::new();
    if let Some(iter) = reader.read_tangents() {
        let raw: Vec<[f32; 4]> = iter.collect();
        if raw.len() == normals.len() {
            for (t, n) in raw.iter().zip(&normals) {
                let tangent = Vector3::new(t[0], t[1], t[2]);
                let bitangent = Vector3::from(*n).cross(tangent) * t[3];
                tangents.push([t[0], t[1], t[2]]);
                bitangents.push(bitangent.into());
            }
        }
    }

    let indices: Vec<u32> = match reader.read_indices() {
        Some(indices) => indices.into_u32().collect(),
        None => (0..positions.len() as u32).collect(),
    };

    let name = mesh
        .name()
        .map(|n| format!("{}_{}", n, primitive.index()))
        .unwrap_or_else(|| format!("mesh_{}_{}", mesh.index(), primitive.index()));

    SourceMesh {
        name,
        positions,
        normals,
        uvs,
        tangents,
        bitangents,
        faces: faces_for_mode(primitive.mode(), &indices),
        material_index: primitive.material().index(),
    }
}

/// Group an index stream into polygons. Strips and fans expand to triangles;
/// lines and points keep their 2- and 1-index arity.
pub fn faces_for_mode(mode: ::gltf::mesh::Mode, indices: &[u32]) -> Vec<Vec<u32>> {
    use ::gltf::mesh::Mode;

    match mode {
        Mode::Triangles => indices.chunks_exact(3).map(|c| c.to_vec()).collect(),
        Mode::TriangleStrip => indices
            .windows(3)
            .enumerate()
            .map(|(i, w)| {
                if i % 2 == 0 {
                    vec![w[0], w[1], w[2]]
                } else {
                    vec![w[1], w[0], w[2]]
                }
            })
            .collect(),
        Mode::TriangleFan => match indices.split_first() {
            Some((&first, rest)) => rest.windows(2).map(|w| vec![first, w[0], w[1]]).collect(),
            None => Vec::new(),
        },
        Mode::Lines => indices.chunks_exact(2).map(|c| c.to_vec()).collect(),
        Mode::LineStrip => indices.windows(2).map(|w| w.to_vec()).collect(),
        Mode::LineLoop => {
            let mut faces: Vec<Vec<u32>> = indices.windows(2).map(|w| w.to_vec()).collect();
            if let (Some(&first), Some(&last)) = (indices.first(), indices.last()) {
                if indices.len() > 2 {
                    faces.push(vec![last, first]);
                }
            }
            faces
        }
        Mode::Points => indices.iter().map(|&i| vec![i]).collect(),
    }
}

struct NodeFrame<'a> {
    node: SourceNode,
    children: ::gltf::scene::iter::Children<'a>,
}

/// Convert one scene root and its subtree, depth-first with an explicit
/// stack. A node reached a second time is skipped with its subtree.
fn convert_node<'a>(
    root: ::gltf::Node<'a>,
    mesh_primitives: &[Vec<usize>],
    visited: &mut HashSet<usize>,
) -> Option<SourceNode> {
    let mut stack = vec![NodeFrame {
        node: convert_single_node(&root, mesh_primitives, visited)?,
        children: root.children(),
    }];

    while let Some(frame) = stack.last_mut() {
        if let Some(child) = frame.children.next() {
            if let Some(node) = convert_single_node(&child, mesh_primitives, visited) {
                stack.push(NodeFrame {
                    node,
                    children: child.children(),
                });
            }
            continue;
        }

        let done = stack.pop()?;
        match stack.last_mut() {
            Some(parent) => parent.node.children.push(done.node),
            None => return Some(done.node),
        }
    }
    None
}

fn convert_single_node(
    node: &::gltf::Node,
    mesh_primitives: &[Vec<usize>],
    visited: &mut HashSet<usize>,
) -> Option<SourceNode> {
    if !visited.insert(node.index()) {
        log::warn!("glTF node {} is referenced more than once, skipping", node.index());
        return None;
    }

    let mut out = SourceNode::new(
        node.name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("node_{}", node.index())),
    );
    out.transform = node.transform().matrix();
    if let Some(mesh) = node.mesh() {
        out.mesh_indices = mesh_primitives
            .get(mesh.index())
            .cloned()
            .unwrap_or_default();
    }
    Some(out)
}
