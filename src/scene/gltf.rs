//! glTF-backed import collaborator.
//!
//! Builds a [`SceneGraph`] from a glTF/GLB file. Cameras, lights, skins and
//! animation tracks are dropped, multi-primitive meshes are split into one
//! [`SceneMesh`] per primitive, missing normals are generated from face
//! geometry and bitangents are derived from the tangent handedness. Local
//! node transforms are converted to the row-major convention the rest of
//! the pipeline expects.

use std::path::Path;

use cgmath::{InnerSpace, Vector2, Vector3, Zero};
use log::{debug, warn};
use thiserror::Error;

use super::{SceneFace, SceneGraph, SceneMaterial, SceneMesh, SceneNode};

#[derive(Debug, Error)]
pub enum ImportError {
    /// The import library could not produce a scene; carries its diagnostic.
    /// This is the only fatal error of the whole load pipeline.
    #[error("model import produced no scene: {0}")]
    NoScene(String),
}

pub fn import_scene(path: &Path) -> Result<SceneGraph, ImportError> {
    let (document, buffers, _images) =
        ::gltf::import(path).map_err(|e| ImportError::NoScene(e.to_string()))?;

    // Flatten mesh primitives: one SceneMesh per primitive, with a range
    // table so nodes can map their single glTF mesh index to all of them.
    let mut meshes = Vec::new();
    let mut mesh_ranges: Vec<Vec<usize>> = vec![Vec::new(); document.meshes().len()];

    for mesh in document.meshes() {
        for primitive in mesh.primitives() {
            let converted = convert_primitive(&mesh, &primitive, &buffers);
            if let Some(converted) = converted {
                mesh_ranges[mesh.index()].push(meshes.len());
                meshes.push(converted);
            }
        }
    }

    let materials = document
        .materials()
        .filter(|m| m.index().is_some())
        .map(convert_material)
        .collect();

    let scene = document
        .default_scene()
        .or_else(|| document.scenes().next())
        .ok_or_else(|| ImportError::NoScene("file contains no scene".to_string()))?;

    let mut roots: Vec<SceneNode> = scene
        .nodes()
        .map(|n| convert_node(&n, &mesh_ranges))
        .collect();

    let root = match roots.len() {
        0 => return Err(ImportError::NoScene("scene contains no nodes".to_string())),
        1 => roots.remove(0),
        _ => {
            // several top-level nodes; synthesize a single root above them
            debug!("scene has {} top-level nodes, synthesizing root", roots.len());
            let mut root = SceneNode::new("");
            root.children = roots;
            root
        }
    };

    Ok(SceneGraph {
        root,
        meshes,
        materials,
    })
}

fn convert_node(node: &::gltf::Node, mesh_ranges: &[Vec<usize>]) -> SceneNode {
    // glTF matrices are column-major; the pipeline wants row-major
    let cols = node.transform().matrix();
    let mut transform = [[0.0f32; 4]; 4];
    for (c, col) in cols.iter().enumerate() {
        for (r, v) in col.iter().enumerate() {
            transform[r][c] = *v;
        }
    }

    SceneNode {
        name: node.name().unwrap_or("").to_string(),
        transform,
        mesh_indices: node
            .mesh()
            .map(|m| mesh_ranges[m.index()].clone())
            .unwrap_or_default(),
        children: node
            .children()
            .map(|c| convert_node(&c, mesh_ranges))
            .collect(),
    }
}

fn convert_primitive(
    mesh: &::gltf::Mesh,
    primitive: &::gltf::Primitive,
    buffers: &[::gltf::buffer::Data],
) -> Option<SceneMesh> {
    use ::gltf::mesh::Mode;

    let reader = primitive.reader(|b| buffers.get(b.index()).map(|d| d.0.as_slice()));

    let positions: Vec<Vector3<f32>> = reader
        .read_positions()?
        .map(|p| Vector3::new(p[0], p[1], p[2]))
        .collect();

    let indices: Vec<u32> = match reader.read_indices() {
        Some(read) => read.into_u32().collect(),
        None => (0..positions.len() as u32).collect(),
    };

    let verts_per_face = match primitive.mode() {
        Mode::Triangles => 3,
        Mode::Lines => 2,
        mode => {
            warn!(
                "mesh '{}': unsupported primitive mode {:?}, skipping",
                mesh.name().unwrap_or(""),
                mode
            );
            return None;
        }
    };

    let faces = indices
        .chunks_exact(verts_per_face)
        .map(|chunk| SceneFace {
            indices: chunk.to_vec(),
        })
        .collect::<Vec<_>>();

    let normals: Vec<Vector3<f32>> = match reader.read_normals() {
        Some(read) => read.map(|n| Vector3::new(n[0], n[1], n[2])).collect(),
        None => generate_smooth_normals(&positions, &faces),
    };

    let (tangents, bitangents) = match reader.read_tangents() {
        Some(read) => {
            let raw: Vec<[f32; 4]> = read.collect();
            let tangents: Vec<Vector3<f32>> =
                raw.iter().map(|t| Vector3::new(t[0], t[1], t[2])).collect();
            let bitangents = tangents
                .iter()
                .zip(normals.iter())
                .zip(raw.iter())
                .map(|((t, n), raw)| n.cross(*t) * raw[3])
                .collect();
            (tangents, bitangents)
        }
        None => (Vec::new(), Vec::new()),
    };

    let mut tex_coords: [Vec<Vector2<f32>>; super::MAX_TEXCOORD_CHANNELS] = Default::default();
    for (channel, out) in tex_coords.iter_mut().enumerate() {
        if let Some(read) = reader.read_tex_coords(channel as u32) {
            *out = read
                .into_f32()
                .map(|uv| Vector2::new(uv[0], uv[1]))
                .collect();
        }
    }

    Some(SceneMesh {
        name: mesh.name().unwrap_or("").to_string(),
        positions,
        normals,
        tangents,
        bitangents,
        tex_coords,
        faces,
    })
}

fn convert_material(material: ::gltf::Material) -> SceneMaterial {
    let pbr = material.pbr_metallic_roughness();

    SceneMaterial {
        name: material.name().unwrap_or("").to_string(),
        diffuse_texture: pbr
            .base_color_texture()
            .map(|info| texture_reference(&info.texture()))
            .unwrap_or_default(),
        unknown_texture: pbr
            .metallic_roughness_texture()
            .map(|info| texture_reference(&info.texture()))
            .unwrap_or_default(),
        // glTF carries no specular texture in its core material model
        specular_texture: String::new(),
    }
}

/// A material's texture reference as a file name: the image URI when the
/// image is external, else whatever name the texture or image carries.
fn texture_reference(texture: &::gltf::Texture) -> String {
    match texture.source().source() {
        ::gltf::image::Source::Uri { uri, .. } => uri.to_string(),
        ::gltf::image::Source::View { .. } => texture
            .name()
            .or_else(|| texture.source().name())
            .unwrap_or("")
            .to_string(),
    }
}

/// Area-weighted smooth normals for meshes imported without any.
fn generate_smooth_normals(positions: &[Vector3<f32>], faces: &[SceneFace]) -> Vec<Vector3<f32>> {
    let mut normals = vec![Vector3::zero(); positions.len()];

    for face in faces {
        if face.indices.len() != 3 {
            continue;
        }
        let (i0, i1, i2) = (
            face.indices[0] as usize,
            face.indices[1] as usize,
            face.indices[2] as usize,
        );
        if i0 >= positions.len() || i1 >= positions.len() || i2 >= positions.len() {
            continue;
        }
        let face_normal = (positions[i1] - positions[i0]).cross(positions[i2] - positions[i0]);
        normals[i0] += face_normal;
        normals[i1] += face_normal;
        normals[i2] += face_normal;
    }

    for n in normals.iter_mut() {
        if !n.is_zero() {
            *n = n.normalize();
        }
    }

    normals
}
