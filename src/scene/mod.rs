//! Read-only scene-graph data model produced by the import collaborator.
//!
//! The structures mirror what a generic asset-import library hands back
//! after post-processing: a node tree with row-major local transforms, a
//! flat mesh array referenced by index from the nodes, and a material array
//! carrying texture file references. The importer is expected to have
//! triangulated and split mixed-primitive meshes already; faces that still
//! carry an index count other than three are tolerated downstream but never
//! rendered.

pub mod gltf;

use cgmath::{Vector2, Vector3};

pub use gltf::{import_scene, ImportError};

/// Texture-coordinate channels carried per vertex.
pub const MAX_TEXCOORD_CHANNELS: usize = 2;

#[derive(Debug, Clone)]
pub struct SceneGraph {
    pub root: SceneNode,
    pub meshes: Vec<SceneMesh>,
    pub materials: Vec<SceneMaterial>,
}

impl SceneGraph {
    pub fn num_nodes(&self) -> usize {
        fn count(node: &SceneNode) -> usize {
            1 + node.children.iter().map(count).sum::<usize>()
        }
        count(&self.root)
    }
}

/// One node of the imported hierarchy. `transform` is the node's local
/// transform in the import library's row-major convention.
#[derive(Debug, Clone)]
pub struct SceneNode {
    pub name: String,
    pub transform: [[f32; 4]; 4],
    pub mesh_indices: Vec<usize>,
    pub children: Vec<SceneNode>,
}

impl SceneNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transform: IDENTITY_ROWS,
            mesh_indices: Vec::new(),
            children: Vec::new(),
        }
    }
}

pub const IDENTITY_ROWS: [[f32; 4]; 4] = [
    [1.0, 0.0, 0.0, 0.0],
    [0.0, 1.0, 0.0, 0.0],
    [0.0, 0.0, 1.0, 0.0],
    [0.0, 0.0, 0.0, 1.0],
];

/// A single-primitive mesh. Attribute vectors are either empty or exactly
/// `positions.len()` long; [`SceneFace`] indices address into them.
#[derive(Debug, Clone, Default)]
pub struct SceneMesh {
    pub name: String,
    pub positions: Vec<Vector3<f32>>,
    pub normals: Vec<Vector3<f32>>,
    pub tangents: Vec<Vector3<f32>>,
    pub bitangents: Vec<Vector3<f32>>,
    pub tex_coords: [Vec<Vector2<f32>>; MAX_TEXCOORD_CHANNELS],
    pub faces: Vec<SceneFace>,
}

impl SceneMesh {
    pub fn has_normals(&self) -> bool {
        self.normals.len() == self.positions.len() && !self.positions.is_empty()
    }

    pub fn has_tangents(&self) -> bool {
        !self.positions.is_empty()
            && self.tangents.len() == self.positions.len()
            && self.bitangents.len() == self.positions.len()
    }

    pub fn has_tex_coords(&self, channel: usize) -> bool {
        channel < MAX_TEXCOORD_CHANNELS
            && !self.positions.is_empty()
            && self.tex_coords[channel].len() == self.positions.len()
    }
}

#[derive(Debug, Clone)]
pub struct SceneFace {
    pub indices: Vec<u32>,
}

/// Texture references of an imported material. Empty strings mean the
/// material does not carry that slot.
#[derive(Debug, Clone, Default)]
pub struct SceneMaterial {
    pub name: String,
    pub diffuse_texture: String,
    pub unknown_texture: String,
    pub specular_texture: String,
}
