use cgmath::{InnerSpace, Vector3};

use super::MeshSection;
use crate::math::remap_axes;
use crate::source::SourceMesh;

/// Normal assigned to vertices no non-degenerate triangle touches (target up).
const FALLBACK_NORMAL: [f32; 3] = [0.0, 0.0, 1.0];

/// Convert one source mesh into a [`MeshSection`].
///
/// Positions, normals, tangents and bitangents get the Y/Z swap. Only faces
/// with exactly three in-range indices are kept; anything else is dropped.
/// The section's material handle is left for the caller to fill in.
pub fn extract_mesh(mesh: &SourceMesh, generate_missing_normals: bool) -> MeshSection {
    let vertex_count = mesh.positions.len();
    let vertices: Vec<[f32; 3]> = mesh.positions.iter().map(|p| remap(*p)).collect();

    let mut indices = Vec::with_capacity(mesh.faces.len() * 3);
    let mut dropped = 0usize;
    for face in &mesh.faces {
        if face.len() == 3 && face.iter().all(|&i| (i as usize) < vertex_count) {
            indices.extend_from_slice(face);
        } else {
            dropped += 1;
        }
    }
    if dropped > 0 {
        log::debug!(
            "mesh '{}': dropped {} non-triangle or out-of-range faces",
            mesh.name,
            dropped
        );
    }

    let normals = if mesh.normals.len() == vertex_count {
        mesh.normals.iter().map(|n| remap(*n)).collect()
    } else if generate_missing_normals {
        generate_normals(&vertices, &indices)
    } else {
        vec![[0.0; 3]; vertex_count]
    };

    let uvs = match &mesh.uvs {
        Some(uvs) if uvs.len() == vertex_count => uvs.clone(),
        Some(uvs) => {
            log::warn!(
                "mesh '{}': {} UVs for {} vertices, zero-filling",
                mesh.name,
                uvs.len(),
                vertex_count
            );
            vec![[0.0; 2]; vertex_count]
        }
        None => vec![[0.0; 2]; vertex_count],
    };

    let per_vertex = |data: &[[f32; 3]]| -> Vec<[f32; 3]> {
        if data.len() == vertex_count {
            data.iter().map(|v| remap(*v)).collect()
        } else {
            Vec::new()
        }
    };

    MeshSection {
        name: mesh.name.clone(),
        vertices,
        normals,
        uvs,
        tangents: per_vertex(&mesh.tangents),
        bitangents: per_vertex(&mesh.bitangents),
        indices,
        material: None,
    }
}

fn remap(v: [f32; 3]) -> [f32; 3] {
    let r = remap_axes(v);
    [r.x, r.y, r.z]
}

/// Smooth vertex normals: each triangle adds its unnormalised face normal
/// (so larger faces weigh more) to its three corners.
pub fn generate_normals(vertices: &[[f32; 3]], indices: &[u32]) -> Vec<[f32; 3]> {
    let mut accum = vec![Vector3::new(0.0f32, 0.0, 0.0); vertices.len()];

    for tri in indices.chunks_exact(3) {
        let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        let (Some(pa), Some(pb), Some(pc)) = (vertices.get(a), vertices.get(b), vertices.get(c)) else {
            continue;
        };
        let pa = Vector3::from(*pa);
        let face = (Vector3::from(*pb) - pa).cross(Vector3::from(*pc) - pa);
        accum[a] += face;
        accum[b] += face;
        accum[c] += face;
    }

    accum
        .into_iter()
        .map(|n| {
            let len = n.magnitude();
            if len > f32::EPSILON && len.is_finite() {
                let n = n / len;
                [n.x, n.y, n.z]
            } else {
                FALLBACK_NORMAL
            }
        })
        .collect()
}
