//! The engine-native model representation: a name-indexed arena of pieces
//! linked into a tree, plus model-wide bounding metrics and texture slots.

pub mod piece;
pub mod vertex;

use std::collections::HashMap;

use cgmath::Vector3;

use crate::scene::SceneGraph;

pub use piece::{Piece, PieceIndex};
pub use vertex::ModelVertex;

/// Extent sentinels: large enough that any real vertex replaces them, and
/// never zero so genuine extents are not clipped by a default.
pub const DEF_MIN_EXTENT: f32 = 10000.0;
pub const DEF_MAX_EXTENT: f32 = -10000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelType {
    /// Built from an imported scene graph.
    Imported,
}

/// How piece-local axes map onto engine axes at draw/script time. Purely a
/// downstream hint; the loader only resolves and stores it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum AxisMappingType {
    Xyz = 0,
    Zxy = 1,
    Yzx = 2,
    #[default]
    Xzy = 3,
    Zyx = 4,
    Yxz = 5,
}

impl AxisMappingType {
    pub fn from_index(index: i64) -> Option<Self> {
        match index {
            0 => Some(Self::Xyz),
            1 => Some(Self::Zxy),
            2 => Some(Self::Yzx),
            3 => Some(Self::Xzy),
            4 => Some(Self::Zyx),
            5 => Some(Self::Yxz),
            _ => None,
        }
    }
}

/// Axis-aligned box collision volume attached to a piece.
#[derive(Debug, Clone, PartialEq)]
pub struct CollisionVolume {
    /// Full side lengths, from the piece's local extents span.
    pub scales: Vector3<f32>,
    /// Box center relative to the piece's global offset.
    pub offset: Vector3<f32>,
}

impl CollisionVolume {
    pub fn new_box(scales: Vector3<f32>, offset: Vector3<f32>) -> Self {
        Self { scales, offset }
    }
}

/// Per-mesh extents cache computed once up front and read-only afterwards;
/// only consulted while pieces are built.
#[derive(Debug, Clone, Copy)]
pub struct MeshMinMax {
    pub mins: Vector3<f32>,
    pub maxs: Vector3<f32>,
}

/// Aggregate root produced by a single synchronous load. Owns the imported
/// scene graph and every piece for its whole lifetime; piece parent/child
/// links are arena indices into `pieces` and never outlive the model.
#[derive(Debug)]
pub struct Model {
    pub name: String,
    pub model_type: ModelType,
    pub scene: SceneGraph,

    pub(crate) pieces: Vec<Piece>,
    pub(crate) piece_map: HashMap<String, PieceIndex>,
    pub(crate) root_piece: Option<PieceIndex>,

    pub tex1: String,
    pub tex2: String,
    pub flip_tex_y: bool,
    pub invert_tex_alpha: bool,

    pub mins: Vector3<f32>,
    pub maxs: Vector3<f32>,
    pub radius: f32,
    pub height: f32,
    pub rel_mid_pos: Vector3<f32>,
    pub draw_radius: f32,

    pub(crate) mesh_minmax: Vec<MeshMinMax>,
}

impl Model {
    pub fn new(name: impl Into<String>, scene: SceneGraph) -> Self {
        Self {
            name: name.into(),
            model_type: ModelType::Imported,
            scene,
            pieces: Vec::new(),
            piece_map: HashMap::new(),
            root_piece: None,
            tex1: String::new(),
            tex2: String::new(),
            flip_tex_y: true,
            invert_tex_alpha: true,
            mins: Vector3::new(DEF_MIN_EXTENT, DEF_MIN_EXTENT, DEF_MIN_EXTENT),
            maxs: Vector3::new(DEF_MAX_EXTENT, DEF_MAX_EXTENT, DEF_MAX_EXTENT),
            radius: 0.0,
            height: 0.0,
            rel_mid_pos: Vector3::new(0.0, 0.0, 0.0),
            draw_radius: 0.0,
            mesh_minmax: Vec::new(),
        }
    }

    pub fn num_pieces(&self) -> usize {
        self.pieces.len()
    }

    pub fn pieces(&self) -> &[Piece] {
        &self.pieces
    }

    pub fn find_piece(&self, name: &str) -> Option<PieceIndex> {
        self.piece_map.get(name).copied()
    }

    pub fn piece(&self, name: &str) -> Option<&Piece> {
        self.find_piece(name).map(|i| &self.pieces[i])
    }

    pub fn piece_at(&self, index: PieceIndex) -> &Piece {
        &self.pieces[index]
    }

    pub fn root_piece(&self) -> Option<&Piece> {
        self.root_piece.map(|i| &self.pieces[i])
    }

    /// Number of parent links from a piece up to the root; `None` when the
    /// chain never reaches the root (unlinked piece or corrupt hierarchy).
    pub fn depth_to_root(&self, index: PieceIndex) -> Option<usize> {
        let mut depth = 0;
        let mut current = index;
        // bounded by the arena size, so a cycle cannot loop forever
        for _ in 0..=self.pieces.len() {
            if Some(current) == self.root_piece {
                return Some(depth);
            }
            current = self.pieces[current].parent?;
            depth += 1;
        }
        None
    }
}
