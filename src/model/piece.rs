use cgmath::{Matrix4, SquareMatrix, Vector3, Zero};

use super::vertex::ModelVertex;
use super::{AxisMappingType, CollisionVolume, DEF_MAX_EXTENT, DEF_MIN_EXTENT};

/// Index of a piece inside the model's arena.
pub type PieceIndex = usize;

/// A named node of the engine's model hierarchy.
///
/// Pieces are built into a flat arena during the recursive load pass with
/// the declared parent recorded by name only; the hierarchy link pass then
/// resolves `parent`/`children` to arena indices. After linking, a piece is
/// immutable except for the derived fields filled by the dimension pass
/// (`goffset`, `collision_volume`).
#[derive(Debug, Clone)]
pub struct Piece {
    pub name: String,
    /// Declared parent by name; empty only for the root piece. May dangle
    /// when the overlay points at a piece that does not exist.
    pub parent_name: String,
    pub parent: Option<PieceIndex>,
    pub children: Vec<PieceIndex>,

    pub vertices: Vec<ModelVertex>,
    /// Triangle vertex indices into `vertices`; always a multiple of three.
    pub vertex_draw_indices: Vec<u32>,
    pub has_tex_coord2: bool,
    /// No contributing meshes, or all of their faces were degenerate.
    pub is_empty: bool,

    /// Baked rotation composed with the resolved uniform scale. Translation
    /// is deliberately kept out and carried in `offset` so downstream
    /// consumers can reinterpret it through the axis mapping.
    pub scale_rot_matrix: Matrix4<f32>,
    /// Local translation, before hierarchy accumulation.
    pub offset: Vector3<f32>,
    /// Translation accumulated through all ancestors; filled by the
    /// dimension pass.
    pub goffset: Vector3<f32>,
    pub axis_map_type: AxisMappingType,
    /// Per-axis rotation sign corrections for downstream animation.
    pub rot_signs: Vector3<f32>,
    /// Unit scale and an identity composed transform; lets the renderer
    /// skip the matrix multiply.
    pub is_identity: bool,

    /// Local extents gathered from contributing meshes. Kept at the
    /// sentinel values when the piece has no geometry.
    pub mins: Vector3<f32>,
    pub maxs: Vector3<f32>,
    pub collision_volume: Option<CollisionVolume>,
}

impl Piece {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent_name: String::new(),
            parent: None,
            children: Vec::new(),
            vertices: Vec::new(),
            vertex_draw_indices: Vec::new(),
            has_tex_coord2: false,
            is_empty: true,
            scale_rot_matrix: Matrix4::identity(),
            offset: Vector3::zero(),
            goffset: Vector3::zero(),
            axis_map_type: AxisMappingType::default(),
            rot_signs: Vector3::new(-1.0, -1.0, 1.0),
            is_identity: false,
            mins: Vector3::new(DEF_MIN_EXTENT, DEF_MIN_EXTENT, DEF_MIN_EXTENT),
            maxs: Vector3::new(DEF_MAX_EXTENT, DEF_MAX_EXTENT, DEF_MAX_EXTENT),
            collision_volume: None,
        }
    }

    /// Vertex data as bytes, ready for buffer upload.
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Index data as bytes, ready for buffer upload.
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertex_draw_indices)
    }
}
