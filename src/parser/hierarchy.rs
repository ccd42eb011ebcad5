//! Hierarchy linking and the derived model-wide metrics.
//!
//! Linking resolves each piece's declared parent name to arena indices.
//! Bad references never abort a load: a dangling parent demotes the piece
//! to a child of the root, and a duplicate root is logged and ignored.

use cgmath::{InnerSpace, Vector3, Zero};
use log::{debug, error};

use crate::math;
use crate::meta::ModelMeta;
use crate::model::{CollisionVolume, Model, DEF_MAX_EXTENT, DEF_MIN_EXTENT};

/// Model-wide scalars claimed by sentinel nodes during the piece build.
/// Consulted only when the overlay leaves the matching key unset.
pub(crate) struct SentinelOverrides {
    pub height: Option<f32>,
    pub radius: Option<f32>,
    pub mid_pos: Option<Vector3<f32>>,
}

pub(crate) fn build_piece_hierarchy(model: &mut Model) {
    for index in 0..model.pieces.len() {
        let name = model.pieces[index].name.clone();
        let parent_name = model.pieces[index].parent_name.clone();

        if name == "root" {
            model.pieces[index].parent = None;
            if model.root_piece.is_some() {
                error!("multiple pieces named 'root', keeping the first");
            } else {
                model.root_piece = Some(index);
            }
            continue;
        }

        if !parent_name.is_empty() {
            if let Some(parent_index) = model.piece_map.get(&parent_name).copied() {
                model.pieces[index].parent = Some(parent_index);
                model.pieces[parent_index].children.push(index);
            } else {
                error!(
                    "missing piece '{parent_name}' declared as parent of '{name}', \
                     attaching to the root"
                );
                attach_to_root(model, index);
            }
            continue;
        }

        debug!("piece '{name}' declares no parent, attaching to the root");
        attach_to_root(model, index);
    }
}

fn attach_to_root(model: &mut Model, index: usize) {
    if let Some(root_index) = model.piece_map.get("root").copied() {
        model.pieces[index].parent = Some(root_index);
        model.pieces[root_index].children.push(index);
    } else {
        error!("missing root piece");
    }
}

/// Walk the linked tree accumulating global offsets, fold every piece's
/// extents into the model bounds and fit a box collision volume per piece.
/// Iterative on an explicit worklist, so scene depth cannot overflow the
/// stack.
fn calculate_model_dimensions(model: &mut Model) {
    let Some(root_index) = model.root_piece else {
        return;
    };

    let mut worklist: Vec<(usize, Vector3<f32>)> = vec![(root_index, Vector3::zero())];

    while let Some((index, parent_goffset)) = worklist.pop() {
        let piece = &mut model.pieces[index];

        piece.goffset = math::apply_transform(&piece.scale_rot_matrix, piece.offset) + parent_goffset;

        // empty pieces still carry sentinel extents; folding them in is
        // harmless since the sentinels lose against any real geometry
        let global_mins = piece.goffset + piece.mins;
        let global_maxs = piece.goffset + piece.maxs;
        // box centered at the local-extents midpoint, relative to goffset
        piece.collision_volume = Some(CollisionVolume::new_box(
            piece.maxs - piece.mins,
            ((piece.maxs - piece.goffset) + (piece.mins - piece.goffset)) * 0.5,
        ));

        let goffset = piece.goffset;
        let children = piece.children.clone();

        model.mins = math::vec_min(model.mins, global_mins);
        model.maxs = math::vec_max(model.maxs, global_maxs);

        for child in children {
            worklist.push((child, goffset));
        }
    }
}

/// Final model scalars: overlay keys win, then sentinel-node values, then
/// values computed from the accumulated bounds.
pub(crate) fn calculate_model_properties(
    model: &mut Model,
    meta: &ModelMeta,
    sentinels: &SentinelOverrides,
) {
    calculate_model_dimensions(model);

    let mut mid_pos = sentinels.mid_pos.unwrap_or(Vector3::zero());
    // vertical center always comes from the computed bounds
    mid_pos.y = (model.maxs.y - model.mins.y) * 0.5;

    let computed_radius = sentinels.radius.unwrap_or_else(|| {
        math::vec_max(math::vec_abs(model.maxs), math::vec_abs(model.mins)).magnitude()
    });
    let computed_height = sentinels.height.unwrap_or(model.maxs.z);

    model.radius = meta.radius.unwrap_or(computed_radius);
    model.height = meta.height.unwrap_or(computed_height);
    model.rel_mid_pos = meta.midpos_vec().unwrap_or(mid_pos);

    model.mins = meta.mins_vec().unwrap_or(model.mins);
    model.maxs = meta.maxs_vec().unwrap_or(model.maxs);

    model.draw_radius = model.radius;
}
