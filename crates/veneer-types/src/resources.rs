//! Resource access for skin packages.
//!
//! A skin is a directory: `skin.xml` at the root, module documents and
//! sprite images referenced by relative paths. The engine reads everything
//! through this trait so tests can run against an in-memory store and the
//! host can redirect skin roots wherever its mod loader keeps them.
//!
//! Paths are `/`-separated and relative to the store root.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use crate::error::{Result, SkinError};

/// Read-only access to a skin package's files.
pub trait Resources {
    /// Read a file's raw bytes.
    fn read(&self, path: &str) -> Result<Vec<u8>>;

    /// Read a file as UTF-8 text.
    fn read_to_string(&self, path: &str) -> Result<String> {
        let bytes = self.read(path)?;
        String::from_utf8(bytes)
            .map_err(|e| SkinError::Resource(format!("{path}: not valid UTF-8: {e}")))
    }

    /// Whether a file exists at `path`.
    fn exists(&self, path: &str) -> bool;

    /// Names of subdirectories directly under `path`.
    fn subdirs(&self, path: &str) -> Result<Vec<String>>;

    /// A monotonic-enough change stamp for `path` (mtime in milliseconds for
    /// the filesystem impl), or `None` when the file is absent.
    fn modified_stamp(&self, path: &str) -> Option<u64>;
}

/// Filesystem-backed resources rooted at a directory.
#[derive(Debug, Clone)]
pub struct DirResources {
    root: PathBuf,
}

impl DirResources {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        let mut out = self.root.clone();
        for part in path.split('/').filter(|p| !p.is_empty() && *p != ".") {
            out.push(part);
        }
        out
    }

    /// The root directory this store resolves against.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Resources for DirResources {
    fn read(&self, path: &str) -> Result<Vec<u8>> {
        let full = self.resolve(path);
        fs::read(&full).map_err(|e| SkinError::Resource(format!("{}: {e}", full.display())))
    }

    fn exists(&self, path: &str) -> bool {
        self.resolve(path).is_file()
    }

    fn subdirs(&self, path: &str) -> Result<Vec<String>> {
        let full = self.resolve(path);
        let mut names = Vec::new();
        let entries =
            fs::read_dir(&full).map_err(|e| SkinError::Resource(format!("{}: {e}", full.display())))?;
        for entry in entries {
            let entry = entry.map_err(|e| SkinError::Resource(format!("{}: {e}", full.display())))?;
            if entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        // read_dir order is platform-dependent; keep discovery deterministic.
        names.sort();
        Ok(names)
    }

    fn modified_stamp(&self, path: &str) -> Option<u64> {
        let meta = fs::metadata(self.resolve(path)).ok()?;
        let mtime = meta.modified().ok()?;
        let since = mtime.duration_since(UNIX_EPOCH).ok()?;
        Some(since.as_millis() as u64)
    }
}

/// Fully in-memory resources, for tests and embedded skins.
#[derive(Debug, Default)]
pub struct MemResources {
    files: BTreeMap<String, Vec<u8>>,
    stamps: BTreeMap<String, u64>,
    clock: u64,
}

impl MemResources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a file, bumping its change stamp.
    pub fn insert(&mut self, path: impl Into<String>, data: impl Into<Vec<u8>>) {
        let path = path.into();
        self.clock += 1;
        self.stamps.insert(path.clone(), self.clock);
        self.files.insert(path, data.into());
    }

    /// Bump a file's change stamp without altering its contents.
    pub fn touch(&mut self, path: &str) {
        if self.files.contains_key(path) {
            self.clock += 1;
            self.stamps.insert(path.to_string(), self.clock);
        }
    }

    /// Remove a file.
    pub fn remove(&mut self, path: &str) {
        self.files.remove(path);
        self.stamps.remove(path);
    }
}

impl Resources for MemResources {
    fn read(&self, path: &str) -> Result<Vec<u8>> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| SkinError::Resource(format!("{path}: no such file")))
    }

    fn exists(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }

    fn subdirs(&self, path: &str) -> Result<Vec<String>> {
        let prefix = if path.is_empty() || path == "." {
            String::new()
        } else {
            format!("{}/", path.trim_end_matches('/'))
        };
        let mut names: Vec<String> = Vec::new();
        for key in self.files.keys() {
            let Some(rest) = key.strip_prefix(&prefix) else {
                continue;
            };
            // A subdirectory is any first path segment with more path after it.
            if let Some((dir, _)) = rest.split_once('/') {
                if !dir.is_empty() && !names.iter().any(|n| n == dir) {
                    names.push(dir.to_string());
                }
            }
        }
        Ok(names)
    }

    fn modified_stamp(&self, path: &str) -> Option<u64> {
        self.stamps.get(path).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mem_read_roundtrip() {
        let mut res = MemResources::new();
        res.insert("skin.xml", b"<VeneerSkin/>".to_vec());
        assert_eq!(res.read("skin.xml").unwrap(), b"<VeneerSkin/>");
        assert_eq!(res.read_to_string("skin.xml").unwrap(), "<VeneerSkin/>");
    }

    #[test]
    fn mem_missing_file_errors() {
        let res = MemResources::new();
        assert!(res.read("nope.xml").is_err());
        assert!(!res.exists("nope.xml"));
    }

    #[test]
    fn mem_invalid_utf8_errors() {
        let mut res = MemResources::new();
        res.insert("bin", vec![0xFF, 0xFE, 0x00]);
        assert!(res.read_to_string("bin").is_err());
    }

    #[test]
    fn mem_stamp_advances_on_insert_and_touch() {
        let mut res = MemResources::new();
        res.insert("a.xml", b"one".to_vec());
        let first = res.modified_stamp("a.xml").unwrap();
        res.touch("a.xml");
        let second = res.modified_stamp("a.xml").unwrap();
        assert!(second > first);
        // Touching a missing file is a no-op.
        res.touch("ghost.xml");
        assert_eq!(res.modified_stamp("ghost.xml"), None);
    }

    #[test]
    fn mem_subdirs_lists_first_segments() {
        let mut res = MemResources::new();
        res.insert("skins/dark/skin.xml", b"x".to_vec());
        res.insert("skins/dark/menu.xml", b"x".to_vec());
        res.insert("skins/light/skin.xml", b"x".to_vec());
        res.insert("skins/readme.txt", b"x".to_vec());
        let dirs = res.subdirs("skins").unwrap();
        assert_eq!(dirs, vec!["dark".to_string(), "light".to_string()]);
    }

    #[test]
    fn mem_subdirs_at_root() {
        let mut res = MemResources::new();
        res.insert("dark/skin.xml", b"x".to_vec());
        res.insert("top.xml", b"x".to_vec());
        let dirs = res.subdirs("").unwrap();
        assert_eq!(dirs, vec!["dark".to_string()]);
    }

    #[test]
    fn dir_resources_resolve_skips_empty_segments() {
        let res = DirResources::new("/tmp/skins");
        assert_eq!(
            res.resolve("a//b/./c.png"),
            PathBuf::from("/tmp/skins/a/b/c.png")
        );
    }
}
