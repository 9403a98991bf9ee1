//! Wavefront OBJ front-end built on `tobj`.
//!
//! OBJ has no node hierarchy: the root is named after the file and every
//! object becomes an identity child holding one mesh.

use std::path::Path;

use super::{SourceFormat, SourceMaterial, SourceMesh, SourceNode, SourceScene, TextureSemantic};
use crate::config::ImportOptions;
use crate::error::Result;

pub fn load_obj_scene(path: &Path, options: &ImportOptions) -> Result<SourceScene> {
    let load_options = tobj::LoadOptions {
        single_index: true,
        triangulate: options.triangulate,
        ..Default::default()
    };
    let (models, materials) = tobj::load_obj(path, &load_options)?;

    let mut scene = SourceScene::new(SourceFormat::Obj);
    scene.materials = match materials {
        Ok(materials) => materials.iter().map(convert_material).collect(),
        Err(e) => {
            log::warn!("no usable MTL for {}: {}", path.display(), e);
            Vec::new()
        }
    };

    let root_name = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "obj".to_string());
    let mut root = SourceNode::new(root_name);

    for (idx, model) in models.iter().enumerate() {
        let mesh_index = scene.meshes.len();
        scene.meshes.push(convert_mesh(&model.name, &model.mesh, options));

        let name = if model.name.is_empty() {
            format!("object_{}", idx)
        } else {
            model.name.clone()
        };
        let mut child = SourceNode::new(name);
        child.mesh_indices.push(mesh_index);
        root.children.push(child);
    }

    scene.root = Some(root);
    Ok(scene)
}

fn convert_mesh(name: &str, mesh: &tobj::Mesh, options: &ImportOptions) -> SourceMesh {
    let positions: Vec<[f32; 3]> = mesh
        .positions
        .chunks_exact(3)
        .map(|p| [p[0], p[1], p[2]])
        .collect();

    let normals: Vec<[f32; 3]> = if mesh.normals.len() == mesh.positions.len() {
        mesh.normals.chunks_exact(3).map(|n| [n[0], n[1], n[2]]).collect()
    } else {
        Vec::new()
    };

    let uvs = (!mesh.texcoords.is_empty() && mesh.texcoords.len() / 2 == positions.len()).then(|| {
        mesh.texcoords
            .chunks_exact(2)
            .map(|t| if options.flip_uvs { [t[0], 1.0 - t[1]] } else { [t[0], t[1]] })
            .collect()
    });

    SourceMesh {
        name: name.to_string(),
        positions,
        normals,
        uvs,
        tangents: Vec::new(),
        bitangents: Vec::new(),
        faces: split_faces(&mesh.indices, &mesh.face_arities),
        material_index: mesh.material_id,
    }
}

/// Rebuild polygons from tobj's flat index list. An empty arity list means
/// every face is a triangle.
pub fn split_faces(indices: &[u32], face_arities: &[u32]) -> Vec<Vec<u32>> {
    if face_arities.is_empty() {
        return indices.chunks_exact(3).map(|c| c.to_vec()).collect();
    }

    let mut faces = Vec::with_capacity(face_arities.len());
    let mut offset = 0usize;
    for &arity in face_arities {
        let end = offset + arity as usize;
        match indices.get(offset..end) {
            Some(face) => faces.push(face.to_vec()),
            None => break,
        }
        offset = end;
    }
    faces
}

fn convert_material(material: &tobj::Material) -> SourceMaterial {
    let mut out = SourceMaterial::new(material.name.clone());
    let params = &material.unknown_param;

    out.diffuse_color = material.diffuse;
    out.specular_color = material.specular;
    out.opacity = material.dissolve;
    out.emissive_color = material.emissive;
    out.metallic = parse_scalar(params.get("Pm"));
    out.roughness = parse_scalar(params.get("Pr"));

    let bind = |out: &mut SourceMaterial, semantic, tex: Option<&String>| {
        if let Some(tex) = tex.filter(|t| !t.is_empty()) {
            out.add_texture(semantic, texture_path(tex));
        }
    };
    bind(&mut out, TextureSemantic::Diffuse, material.diffuse_texture.as_ref());
    bind(&mut out, TextureSemantic::Specular, material.specular_texture.as_ref());
    bind(&mut out, TextureSemantic::Height, material.normal_texture.as_ref());
    bind(&mut out, TextureSemantic::Opacity, material.dissolve_texture.as_ref());
    bind(&mut out, TextureSemantic::Normals, params.get("norm"));
    bind(&mut out, TextureSemantic::Emissive, params.get("map_Ke"));
    bind(&mut out, TextureSemantic::Metalness, params.get("map_Pm"));
    bind(&mut out, TextureSemantic::DiffuseRoughness, params.get("map_Pr"));
    bind(&mut out, TextureSemantic::AmbientOcclusion, params.get("map_ao"));

    out
}

/// MTL texture statements may carry options (`-bm 0.5 bump.png`); the file
/// name is the last token.
fn texture_path(statement: &str) -> String {
    statement
        .split_whitespace()
        .last()
        .unwrap_or(statement)
        .to_string()
}

fn parse_scalar(value: Option<&String>) -> Option<f32> {
    value?.trim().parse().ok()
}
