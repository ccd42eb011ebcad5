//! Filesystem collaborator.
//!
//! The loader only needs three read-only operations: an existence check, a
//! `stem.*` search inside a directory, and reading a text file. They are
//! behind a trait so the texture resolver and metadata loader can be tested
//! against a virtual file tree.

use std::fs;
use std::io;
use std::path::Path;

pub trait Vfs {
    fn file_exists(&self, path: &str) -> bool;

    /// Files inside `dir` whose name matches `pattern`. Only the `stem.*`
    /// form (any extension) and exact file names are understood; matching
    /// is case-insensitive. Returned paths include `dir`, sorted for
    /// deterministic results.
    fn find_files(&self, dir: &str, pattern: &str) -> Vec<String>;

    fn read_to_string(&self, path: &str) -> io::Result<String>;
}

/// `std::fs`-backed implementation used by the real loader.
pub struct StdVfs;

impl Vfs for StdVfs {
    fn file_exists(&self, path: &str) -> bool {
        Path::new(path).is_file()
    }

    fn find_files(&self, dir: &str, pattern: &str) -> Vec<String> {
        let Ok(entries) = fs::read_dir(dir) else {
            return Vec::new();
        };

        let mut found: Vec<String> = entries
            .filter_map(|e| e.ok())
            .filter(|e| e.path().is_file())
            .filter_map(|e| e.file_name().into_string().ok())
            .filter(|name| name_matches(name, pattern))
            .map(|name| join(dir, &name))
            .collect();

        found.sort();
        found
    }

    fn read_to_string(&self, path: &str) -> io::Result<String> {
        fs::read_to_string(path)
    }
}

pub(crate) fn name_matches(name: &str, pattern: &str) -> bool {
    if let Some(stem) = pattern.strip_suffix(".*") {
        match name.rsplit_once('.') {
            Some((name_stem, _ext)) => name_stem.eq_ignore_ascii_case(stem),
            None => name.eq_ignore_ascii_case(stem),
        }
    } else {
        name.eq_ignore_ascii_case(pattern)
    }
}

fn join(dir: &str, name: &str) -> String {
    if dir.is_empty() || dir.ends_with('/') {
        format!("{dir}{name}")
    } else {
        format!("{dir}/{name}")
    }
}

/// Directory part of a path, with a trailing slash; empty for bare names.
pub fn directory(path: &str) -> String {
    match path.rfind('/') {
        Some(pos) => path[..=pos].to_string(),
        None => String::new(),
    }
}

/// File name without directory or extension.
pub fn basename(path: &str) -> String {
    let name = filename(path);
    match name.rsplit_once('.') {
        Some((stem, _)) => stem.to_string(),
        None => name,
    }
}

/// File name without the directory part.
pub fn filename(path: &str) -> String {
    match path.rfind('/') {
        Some(pos) => path[pos + 1..].to_string(),
        None => path.to_string(),
    }
}
