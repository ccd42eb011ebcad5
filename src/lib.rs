//! Model importer that converts an externally authored scene graph (node
//! hierarchy, meshes, materials) into the engine's native model
//! representation: a tree of named "pieces" with baked transforms, per-piece
//! vertex/index buffers, collision volumes and aggregate bounding metrics.
//!
//! The usual entry point is [`parser::AssParser::load`], which imports a
//! model file, merges the optional per-model metadata overlay and returns a
//! fully linked [`model::Model`]. Loading is a single synchronous pass; the
//! returned model owns the imported scene graph and all of its pieces.

pub mod math;
pub mod meta;
pub mod model;
pub mod parser;
pub mod scene;
pub mod vfs;

pub use model::{Model, Piece};
pub use parser::AssParser;
