//! Per-model metadata overlay.
//!
//! Authors can override computed model values without touching the source
//! asset by placing a JSON table next to it: `<model-file>.json`, or
//! `<dir>/<basename>.json` as a fallback. Every recognized key is declared
//! here with its type and default; unknown keys are logged instead of being
//! silently dropped. A missing or unparseable overlay is never fatal; the
//! empty overlay applies and every lookup falls back to its default.

use std::collections::HashMap;

use cgmath::Vector3;
use log::{info, warn};
use serde::Deserialize;
use serde_json::Value;

use crate::vfs::{self, Vfs};

/// Model-wide keys recognized at the overlay root.
const MODEL_KEYS: &[&str] = &[
    "pieces",
    "radius",
    "height",
    "midpos",
    "mins",
    "maxs",
    "tex1",
    "tex2",
    "fliptextures",
    "invertteamcolor",
];

/// Keys recognized inside a per-piece sub-table.
const PIECE_KEYS: &[&str] = &[
    "offset", "offsetx", "offsety", "offsetz", //
    "rotate", "rotatex", "rotatey", "rotatez", //
    "scale", "scalex", "scaley", "scalez", //
    "axisMapType", "axisRotSigns", "parent",
];

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct ModelMeta {
    pub radius: Option<f32>,
    pub height: Option<f32>,
    pub midpos: Option<[f32; 3]>,
    pub mins: Option<[f32; 3]>,
    pub maxs: Option<[f32; 3]>,
    pub tex1: Option<String>,
    pub tex2: Option<String>,
    #[serde(rename = "fliptextures")]
    pub flip_textures: Option<bool>,
    #[serde(rename = "invertteamcolor")]
    pub invert_team_color: Option<bool>,
    pub pieces: HashMap<String, PieceMeta>,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct PieceMeta {
    pub offset: Option<[f32; 3]>,
    pub offsetx: Option<f32>,
    pub offsety: Option<f32>,
    pub offsetz: Option<f32>,
    pub rotate: Option<[f32; 3]>,
    pub rotatex: Option<f32>,
    pub rotatey: Option<f32>,
    pub rotatez: Option<f32>,
    pub scale: Option<[f32; 3]>,
    pub scalex: Option<f32>,
    pub scaley: Option<f32>,
    pub scalez: Option<f32>,
    #[serde(rename = "axisMapType")]
    pub axis_map_type: Option<i64>,
    #[serde(rename = "axisRotSigns")]
    pub axis_rot_signs: Option<[f32; 3]>,
    pub parent: Option<String>,
}

impl ModelMeta {
    /// Load the overlay for a model file, trying `<path>.json` first and
    /// `<dir>/<basename>.json` second. Absence or a parse failure yields
    /// the empty overlay.
    pub fn load(model_file_path: &str, vfs: &dyn Vfs) -> ModelMeta {
        let mut meta_file_name = format!("{model_file_path}.json");

        if !vfs.file_exists(&meta_file_name) {
            // try again without the model file extension
            meta_file_name = format!(
                "{}{}.json",
                vfs::directory(model_file_path),
                vfs::basename(model_file_path)
            );
        }
        if !vfs.file_exists(&meta_file_name) {
            info!("no meta-file '{meta_file_name}', using defaults");
            return ModelMeta::default();
        }

        match vfs.read_to_string(&meta_file_name) {
            Ok(text) => match ModelMeta::from_json_str(&text) {
                Ok(meta) => {
                    info!("found valid model metadata in '{meta_file_name}'");
                    meta
                }
                Err(e) => {
                    warn!("'{meta_file_name}': {e}, using defaults");
                    ModelMeta::default()
                }
            },
            Err(e) => {
                warn!("'{meta_file_name}': {e}, using defaults");
                ModelMeta::default()
            }
        }
    }

    pub fn from_json_str(text: &str) -> anyhow::Result<ModelMeta> {
        let value: Value = serde_json::from_str(text)?;
        warn_unknown_keys(&value);
        Ok(serde_json::from_value(value)?)
    }

    /// The sub-table for a piece; absent tables act as all-defaults.
    pub fn piece(&self, name: &str) -> PieceMeta {
        self.pieces.get(name).cloned().unwrap_or_default()
    }

    pub fn midpos_vec(&self) -> Option<Vector3<f32>> {
        self.midpos.map(Vector3::from)
    }

    pub fn mins_vec(&self) -> Option<Vector3<f32>> {
        self.mins.map(Vector3::from)
    }

    pub fn maxs_vec(&self) -> Option<Vector3<f32>> {
        self.maxs.map(Vector3::from)
    }
}

impl PieceMeta {
    /// Offset override: the `offset` vector first, then per-component keys.
    pub fn resolved_offset(&self, default: Vector3<f32>) -> Vector3<f32> {
        let mut v = self.offset.map(Vector3::from).unwrap_or(default);
        v.x = self.offsetx.unwrap_or(v.x);
        v.y = self.offsety.unwrap_or(v.y);
        v.z = self.offsetz.unwrap_or(v.z);
        v
    }

    /// Rotation override in degrees. The baked import rotation is carried
    /// separately in the scale-rotation matrix, so the default here is
    /// deliberately zero rather than the decomposed import rotation.
    pub fn resolved_rotate(&self) -> Vector3<f32> {
        let mut v = self.rotate.map(Vector3::from).unwrap_or(Vector3::new(0.0, 0.0, 0.0));
        v.x = self.rotatex.unwrap_or(v.x);
        v.y = self.rotatey.unwrap_or(v.y);
        v.z = self.rotatez.unwrap_or(v.z);
        v
    }

    /// Scale override: the `scale` vector first, then per-component keys.
    pub fn resolved_scale(&self, default: Vector3<f32>) -> Vector3<f32> {
        let mut v = self.scale.map(Vector3::from).unwrap_or(default);
        v.x = self.scalex.unwrap_or(v.x);
        v.y = self.scaley.unwrap_or(v.y);
        v.z = self.scalez.unwrap_or(v.z);
        v
    }
}

fn warn_unknown_keys(value: &Value) {
    let Some(root) = value.as_object() else {
        return;
    };

    for key in root.keys() {
        if !MODEL_KEYS.contains(&key.as_str()) {
            warn!("metadata: unknown model key '{key}' ignored");
        }
    }

    let Some(pieces) = root.get("pieces").and_then(Value::as_object) else {
        return;
    };
    for (piece_name, table) in pieces {
        let Some(table) = table.as_object() else {
            warn!("metadata: piece entry '{piece_name}' is not a table");
            continue;
        };
        for key in table.keys() {
            if !PIECE_KEYS.contains(&key.as_str()) {
                warn!("metadata: unknown key '{key}' in piece '{piece_name}' ignored");
            }
        }
    }
}
