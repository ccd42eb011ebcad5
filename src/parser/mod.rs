//! Model import entry point.
//!
//! Loading is a fixed synchronous sequence: metadata overlay, scene import
//! (the only fatal step), per-mesh extents, texture resolution, piece
//! construction, hierarchy linking, then the derived model metrics. The
//! model is built privately and only handed out once the whole sequence
//! has completed.

mod hierarchy;
mod pieces;
mod textures;

use std::path::Path;

use anyhow::Context;
use cgmath::{Vector3, Zero};
use log::{debug, info};

use crate::math;
use crate::meta::ModelMeta;
use crate::model::{MeshMinMax, Model, DEF_MAX_EXTENT, DEF_MIN_EXTENT};
use crate::scene::{self, SceneGraph};
use crate::vfs::{StdVfs, Vfs};

use hierarchy::SentinelOverrides;
use pieces::BuiltPieces;

pub struct AssParser;

impl AssParser {
    /// Load a model from a scene file on disk.
    pub fn load(model_file_path: &str) -> anyhow::Result<Model> {
        Self::load_with(model_file_path, &StdVfs)
    }

    /// Load with an explicit filesystem collaborator; the metadata overlay
    /// and texture resolution go through it.
    pub fn load_with(model_file_path: &str, vfs: &dyn Vfs) -> anyhow::Result<Model> {
        info!("loading model: {model_file_path}");

        let meta = ModelMeta::load(model_file_path, vfs);

        let scene = scene::import_scene(Path::new(model_file_path))
            .with_context(|| format!("importing model file '{model_file_path}'"))?;

        Ok(Self::load_from_scene(model_file_path, scene, &meta, vfs))
    }

    /// Build a model from an already-imported scene graph. Past the import
    /// itself nothing is fatal; degraded input yields a degraded model.
    pub fn load_from_scene(
        model_file_path: &str,
        scene: SceneGraph,
        meta: &ModelMeta,
        vfs: &dyn Vfs,
    ) -> Model {
        info!(
            "processing scene for model: {model_file_path} ({} nodes / {} meshes / {} materials)",
            scene.num_nodes(),
            scene.meshes.len(),
            scene.materials.len()
        );

        let mut model = Model::new(model_file_path, scene);
        model.mesh_minmax = calculate_per_mesh_minmax(&model.scene);

        let texture_info = textures::find_textures(&model.scene, meta, model_file_path, vfs);
        textures::apply_textures(&mut model, texture_info);

        info!("loading pieces from root node '{}'", model.scene.root.name);
        let BuiltPieces {
            pieces,
            piece_map,
            height_from_node,
            radius_from_node,
            mid_pos_from_node,
        } = pieces::build_pieces(&model.scene, &model.mesh_minmax, meta);
        model.pieces = pieces;
        model.piece_map = piece_map;

        hierarchy::build_piece_hierarchy(&mut model);
        hierarchy::calculate_model_properties(
            &mut model,
            meta,
            &SentinelOverrides {
                height: height_from_node,
                radius: radius_from_node,
                mid_pos: mid_pos_from_node,
            },
        );

        debug!(
            "model {}: numPieces {}, radius {:.3}, height {:.3}, drawRadius {:.3}, \
             mins ({:.3},{:.3},{:.3}), maxs ({:.3},{:.3},{:.3})",
            model.name,
            model.num_pieces(),
            model.radius,
            model.height,
            model.draw_radius,
            model.mins.x,
            model.mins.y,
            model.mins.z,
            model.maxs.x,
            model.maxs.y,
            model.maxs.z
        );
        info!("model {} imported", model.name);

        model
    }
}

/// Extents of every scene mesh, computed once so pieces referencing the
/// same mesh do not refold its vertices. Meshes without vertices get zero
/// extents instead of the fold sentinels.
pub(crate) fn calculate_per_mesh_minmax(scene: &SceneGraph) -> Vec<MeshMinMax> {
    scene
        .meshes
        .iter()
        .map(|mesh| {
            let mut mins = Vector3::new(DEF_MIN_EXTENT, DEF_MIN_EXTENT, DEF_MIN_EXTENT);
            let mut maxs = Vector3::new(DEF_MAX_EXTENT, DEF_MAX_EXTENT, DEF_MAX_EXTENT);
            for position in &mesh.positions {
                mins = math::vec_min(mins, *position);
                maxs = math::vec_max(maxs, *position);
            }
            if mesh.positions.is_empty() {
                mins = Vector3::zero();
                maxs = Vector3::zero();
            }
            MeshMinMax { mins, maxs }
        })
        .collect()
}
