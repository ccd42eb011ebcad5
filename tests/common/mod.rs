#![allow(dead_code)]

//! Shared fixtures: an in-memory filesystem and scene-graph builders.

use std::collections::BTreeMap;
use std::io;

use assimport::scene::{SceneFace, SceneGraph, SceneMesh, SceneNode};
use assimport::vfs::Vfs;
use cgmath::Vector3;

/// In-memory file tree; values are file contents (empty for stand-ins).
#[derive(Default)]
pub struct MockVfs {
    files: BTreeMap<String, String>,
}

impl MockVfs {
    pub fn new(paths: &[&str]) -> Self {
        Self {
            files: paths.iter().map(|p| (p.to_string(), String::new())).collect(),
        }
    }

    pub fn with_file(mut self, path: &str, contents: &str) -> Self {
        self.files.insert(path.to_string(), contents.to_string());
        self
    }
}

impl Vfs for MockVfs {
    fn file_exists(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }

    fn find_files(&self, dir: &str, pattern: &str) -> Vec<String> {
        self.files
            .keys()
            .filter(|path| {
                path.strip_prefix(dir)
                    .is_some_and(|rest| !rest.contains('/') && name_matches(rest, pattern))
            })
            .cloned()
            .collect()
    }

    fn read_to_string(&self, path: &str) -> io::Result<String> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, path.to_string()))
    }
}

fn name_matches(name: &str, pattern: &str) -> bool {
    if let Some(stem) = pattern.strip_suffix(".*") {
        match name.rsplit_once('.') {
            Some((name_stem, _)) => name_stem.eq_ignore_ascii_case(stem),
            None => name.eq_ignore_ascii_case(stem),
        }
    } else {
        name.eq_ignore_ascii_case(pattern)
    }
}

pub fn node(name: &str) -> SceneNode {
    SceneNode::new(name)
}

pub fn node_at(name: &str, translation: [f32; 3]) -> SceneNode {
    let mut node = SceneNode::new(name);
    node.transform[0][3] = translation[0];
    node.transform[1][3] = translation[1];
    node.transform[2][3] = translation[2];
    node
}

pub fn scene(root: SceneNode) -> SceneGraph {
    SceneGraph {
        root,
        meshes: vec![],
        materials: vec![],
    }
}

/// A unit right triangle in the XY plane.
pub fn triangle_mesh(name: &str) -> SceneMesh {
    SceneMesh {
        name: name.to_string(),
        positions: vec![
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(0.0, 1.0, 0.0),
        ],
        faces: vec![SceneFace {
            indices: vec![0, 1, 2],
        }],
        ..Default::default()
    }
}
