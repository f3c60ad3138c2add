//! Module trees handed to the analyzer
//!
//! A tree is the host's view of one source directory of a package: a flat
//! list of files with paths relative to the tree root, mounted at some prefix
//! inside the package's module namespace.

use crate::error::{AutoImportError, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// File extensions treated as scannable source modules
pub const SOURCE_EXTENSIONS: &[&str] = &["js", "mjs", "cjs", "jsx", "ts", "mts", "cts", "tsx"];

/// One source file in a tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeFile {
    /// Path relative to the tree root, `/` separated
    pub path: String,
    pub content: String,
}

/// Host tree-of-files abstraction
pub trait ModuleTree: Send + Sync {
    /// Prefix under the package namespace (`""` for the package root, `"tests"`...)
    fn mount(&self) -> &str;

    /// Human-readable description used in logs
    fn describe(&self) -> String;

    /// All source files, sorted by path
    fn files(&self) -> Result<Vec<TreeFile>>;
}

/// Whether a path has a source extension
pub fn is_source_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| SOURCE_EXTENSIONS.contains(&ext))
        && !path.to_string_lossy().ends_with(".d.ts")
}

/// A tree backed by a directory on disk
#[derive(Debug, Clone)]
pub struct FsTree {
    root: PathBuf,
    mount: String,
}

impl FsTree {
    pub fn new(root: impl Into<PathBuf>, mount: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            mount: normalize_mount(&mount.into()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ModuleTree for FsTree {
    fn mount(&self) -> &str {
        &self.mount
    }

    fn describe(&self) -> String {
        self.root.display().to_string()
    }

    fn files(&self) -> Result<Vec<TreeFile>> {
        if !self.root.is_dir() {
            tracing::debug!(root = %self.root.display(), "tree root missing, treating as empty");
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        let walker = WalkDir::new(&self.root)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.file_name() != "node_modules");

        for entry in walker {
            let entry = entry.map_err(|e| {
                let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| self.root.clone());
                AutoImportError::io_read_error(path, std::io::Error::other(e.to_string()))
            })?;

            if !entry.file_type().is_file() || !is_source_file(entry.path()) {
                continue;
            }

            let relative = entry
                .path()
                .strip_prefix(&self.root)
                .unwrap_or(entry.path())
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("/");

            let content = fs::read_to_string(entry.path())
                .map_err(|e| AutoImportError::io_read_error(entry.path(), e))?;

            files.push(TreeFile {
                path: relative,
                content,
            });
        }

        files.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(files)
    }
}

/// An in-memory tree, for embedding hosts and tests
#[derive(Debug, Clone, Default)]
pub struct MemoryTree {
    mount: String,
    files: BTreeMap<String, String>,
}

impl MemoryTree {
    pub fn new(mount: impl Into<String>) -> Self {
        Self {
            mount: normalize_mount(&mount.into()),
            files: BTreeMap::new(),
        }
    }

    /// Add or replace a file
    pub fn with_file(mut self, path: impl Into<String>, content: impl Into<String>) -> Self {
        self.insert(path, content);
        self
    }

    pub fn insert(&mut self, path: impl Into<String>, content: impl Into<String>) {
        self.files.insert(path.into(), content.into());
    }

    pub fn remove(&mut self, path: &str) -> Option<String> {
        self.files.remove(path)
    }
}

impl ModuleTree for MemoryTree {
    fn mount(&self) -> &str {
        &self.mount
    }

    fn describe(&self) -> String {
        format!("<memory:{}>", self.mount)
    }

    fn files(&self) -> Result<Vec<TreeFile>> {
        Ok(self
            .files
            .iter()
            .filter(|(path, _)| is_source_file(Path::new(path)))
            .map(|(path, content)| TreeFile {
                path: path.clone(),
                content: content.clone(),
            })
            .collect())
    }
}

/// Join a package name, a mount prefix and a tree-relative path into a
/// namespaced module path: `my-app/tests/unit/foo-test.js`
pub fn module_path(package_name: &str, mount: &str, relative: &str) -> String {
    let mut path = String::from(package_name);
    for part in [mount, relative] {
        if !part.is_empty() {
            path.push('/');
            path.push_str(part);
        }
    }
    path
}

fn normalize_mount(mount: &str) -> String {
    mount.trim_matches('/').to_string()
}
