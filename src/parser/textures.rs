//! Best-effort texture resolution for the two model texture slots.
//!
//! Each slot is filled by the first non-empty candidate in a fixed fallback
//! chain: material references, then overlay keys, then naming conventions
//! on disk. An unresolved slot stays empty; the consumer treats that as
//! "no texture".

use log::{debug, info};

use crate::meta::ModelMeta;
use crate::model::Model;
use crate::scene::SceneGraph;
use crate::vfs::{self, Vfs};

/// Directory searched for convention-named unit textures.
const UNIT_TEXTURES_DIR: &str = "unittextures/";

#[derive(Debug, Default)]
pub(crate) struct TextureInfo {
    pub tex1: String,
    pub tex2: String,
    pub flip_tex_y: bool,
    pub invert_tex_alpha: bool,
}

pub(crate) fn find_textures(
    scene: &SceneGraph,
    meta: &ModelMeta,
    model_file_path: &str,
    vfs: &dyn Vfs,
) -> TextureInfo {
    let model_path = vfs::directory(model_file_path);
    let model_name = vfs::basename(model_file_path);

    let mut info = TextureInfo {
        flip_tex_y: meta.flip_textures.unwrap_or(true),
        invert_tex_alpha: meta.invert_team_color.unwrap_or(true),
        ..Default::default()
    };

    // 1. the first material's references, in slot-1 preference order
    if let Some(material) = scene.materials.first() {
        for candidate in [
            &material.diffuse_texture,
            &material.unknown_texture,
            &material.specular_texture,
        ] {
            // only a non-empty reference can fill the slot
            if info.tex1.is_empty() && !candidate.is_empty() {
                info.tex1 = candidate.clone();
            }
        }
    }

    // 2. explicit overlay keys override any material-derived candidate
    if let Some(tex1) = meta.tex1.as_ref().filter(|t| !t.is_empty()) {
        info.tex1 = tex1.clone();
    }
    if let Some(tex2) = meta.tex2.as_ref().filter(|t| !t.is_empty()) {
        info.tex2 = tex2.clone();
    }

    // 3. naming convention: unittextures/<modelname>.* and <modelname>2.*
    if info.tex1.is_empty() {
        info.tex1 = find_texture_by_pattern(vfs, UNIT_TEXTURES_DIR, &format!("{model_name}.*"));
    }
    if info.tex2.is_empty() {
        info.tex2 = find_texture_by_pattern(vfs, UNIT_TEXTURES_DIR, &format!("{model_name}2.*"));
    }

    // 4. a file literally named diffuse.* beside the model, slot 1 only
    if info.tex1.is_empty() {
        info.tex1 = find_texture_by_pattern(vfs, &model_path, "diffuse.*");
    }

    info.tex1 = normalize_path(vfs, &model_path, info.tex1);
    info.tex2 = normalize_path(vfs, &model_path, info.tex2);
    info
}

pub(crate) fn apply_textures(model: &mut Model, info: TextureInfo) {
    info!(
        "loading textures. tex1: '{}' tex2: '{}'",
        info.tex1, info.tex2
    );
    model.tex1 = info.tex1;
    model.tex2 = info.tex2;
    model.flip_tex_y = info.flip_tex_y;
    model.invert_tex_alpha = info.invert_tex_alpha;
}

fn find_texture_by_pattern(vfs: &dyn Vfs, dir: &str, pattern: &str) -> String {
    let found = vfs.find_files(dir, pattern);
    match found.into_iter().next() {
        Some(path) => {
            debug!("texture search '{dir}{pattern}' matched '{path}'");
            path
        }
        None => String::new(),
    }
}

/// A resolved reference may be relative to somewhere other than the cwd;
/// keep it if it exists at face value, otherwise try the unit-texture
/// directory and the model's own directory. Unresolvable paths are kept
/// as-is for the consumer to report.
fn normalize_path(vfs: &dyn Vfs, model_path: &str, tex: String) -> String {
    if tex.is_empty() || vfs.file_exists(&tex) {
        return tex;
    }

    let in_unit_textures = format!("{UNIT_TEXTURES_DIR}{tex}");
    if vfs.file_exists(&in_unit_textures) {
        return in_unit_textures;
    }

    let beside_model = format!("{model_path}{tex}");
    if vfs.file_exists(&beside_model) {
        return beside_model;
    }

    debug!("texture '{tex}' not found on disk, leaving unresolved");
    tex
}
