//! The archive container seam.
//!
//! The outer CHM container (directory listing, LZX-compressed sections) is a
//! stable, well-documented format this crate deliberately does not decode.
//! Everything above it only needs one capability: resolve an absolute
//! in-archive path to its raw bytes. [`Container`] is that seam; two
//! implementations are provided for embedders that already have the objects
//! out of the container.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::debug;

use super::error::{ChmError, Result};

/// A black-box byte-range reader keyed by internal object paths.
///
/// Paths are absolute, with a leading `/`, exactly as they appear in the
/// archive directory (`/#SYSTEM`, `/index.html`, ...).
pub trait Container {
    /// The raw bytes of the object at `path`, or `None` if the archive has
    /// no such object.
    fn resolve(&self, path: &str) -> Option<Vec<u8>>;

    /// Whether the archive has an object at `path`, without materializing
    /// its bytes. Implementations with a directory lookup should override
    /// the default.
    fn exists(&self, path: &str) -> bool {
        self.resolve(path).is_some()
    }

    /// All object paths in the archive, each with a leading `/`.
    fn enumerate(&self) -> Vec<String>;
}

/// An in-memory container: a map from path to bytes.
///
/// Used by the test suite and by embedders that extracted the archive with
/// an external container library.
#[derive(Debug, Default)]
pub struct MemoryContainer {
    objects: HashMap<String, Vec<u8>>,
}

impl MemoryContainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an object. A missing leading `/` is supplied.
    pub fn insert(&mut self, path: &str, bytes: impl Into<Vec<u8>>) {
        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{path}")
        };
        self.objects.insert(path, bytes.into());
    }
}

impl Container for MemoryContainer {
    fn resolve(&self, path: &str) -> Option<Vec<u8>> {
        self.objects.get(path).cloned()
    }

    fn exists(&self, path: &str) -> bool {
        self.objects.contains_key(path)
    }

    fn enumerate(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.objects.keys().cloned().collect();
        paths.sort();
        paths
    }
}

/// A container backed by an unpacked archive on disk: every file below the
/// root directory is an object, keyed by its `/`-separated relative path.
#[derive(Debug)]
pub struct DirContainer {
    root: PathBuf,
}

impl DirContainer {
    /// Open a directory holding an unpacked archive.
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(ChmError::LoadFailed(format!(
                "{} is not a directory",
                root.display()
            )));
        }
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    fn object_path(&self, path: &str) -> Option<PathBuf> {
        let relative = path.trim_start_matches('/');
        // Keep lookups inside the root.
        if relative.split('/').any(|part| part == "..") {
            return None;
        }
        Some(self.root.join(relative))
    }
}

impl Container for DirContainer {
    fn resolve(&self, path: &str) -> Option<Vec<u8>> {
        let file = self.object_path(path)?;
        match fs::read(&file) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                debug!("cannot read {}: {}", file.display(), e);
                None
            }
        }
    }

    fn exists(&self, path: &str) -> bool {
        self.object_path(path).is_some_and(|file| file.is_file())
    }

    fn enumerate(&self) -> Vec<String> {
        let mut paths = Vec::new();
        let mut pending = vec![self.root.clone()];
        while let Some(dir) = pending.pop() {
            let entries = match fs::read_dir(&dir) {
                Ok(entries) => entries,
                Err(e) => {
                    debug!("cannot list {}: {}", dir.display(), e);
                    continue;
                }
            };
            for entry in entries.flatten() {
                let path = entry.path();
                if path.is_dir() {
                    pending.push(path);
                } else if let Ok(relative) = path.strip_prefix(&self.root) {
                    let mut name = String::from("/");
                    name.push_str(&relative.to_string_lossy().replace('\\', "/"));
                    paths.push(name);
                }
            }
        }
        paths.sort();
        paths
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_container_normalizes_leading_slash() {
        let mut container = MemoryContainer::new();
        container.insert("page.html", b"hello".to_vec());
        container.insert("/#SYSTEM", b"sys".to_vec());
        assert_eq!(container.resolve("/page.html"), Some(b"hello".to_vec()));
        assert_eq!(container.resolve("page.html"), None);
        assert!(container.exists("/page.html"));
        assert!(!container.exists("/missing.html"));
        assert_eq!(
            container.enumerate(),
            vec!["/#SYSTEM".to_string(), "/page.html".to_string()]
        );
    }

    #[test]
    fn dir_container_rejects_parent_traversal() {
        let container = DirContainer {
            root: PathBuf::from("/tmp"),
        };
        assert_eq!(container.object_path("/a/../../etc/passwd"), None);
        assert!(container.object_path("/a/b.html").is_some());
        assert!(!container.exists("/a/../../etc/passwd"));
    }
}
