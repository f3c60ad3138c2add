//! Module path resolution utilities
//!
//! Finds installed packages the way Node does (walking up `node_modules`
//! directories) and resolves a specifier's subpath to a concrete entry file
//! inside an installed package.

use crate::error::{AutoImportError, Result};
use crate::models::package::PackageDetails;
use crate::parsers::package_json::PackageJsonParser;
use dashmap::DashMap;
use lru::LruCache;
use parking_lot::Mutex;
use serde_json::Value;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Export conditions tried in order, for a browser build
const EXPORT_CONDITIONS: &[&str] = &["browser", "import", "module", "default", "require"];

/// Extensions tried when a path is given without one
const EXTENSIONS: &[&str] = &["js", "mjs", "cjs", "json", "ts"];

/// Index files tried for directories
const INDEX_FILES: &[&str] = &["index.js", "index.mjs", "index.cjs", "index.ts"];

const MANIFEST_CACHE_SIZE: usize = 256;

/// Path resolver with caching
#[derive(Debug, Clone)]
pub struct PathResolver {
    file_exists_cache: Arc<DashMap<PathBuf, bool>>,
    package_json_cache: Arc<Mutex<LruCache<PathBuf, PackageDetails>>>,
}

impl PathResolver {
    /// Create a new path resolver
    pub fn new() -> Self {
        let capacity = NonZeroUsize::new(MANIFEST_CACHE_SIZE).unwrap_or(NonZeroUsize::MIN);
        Self {
            file_exists_cache: Arc::new(DashMap::new()),
            package_json_cache: Arc::new(Mutex::new(LruCache::new(capacity))),
        }
    }

    /// Find the directory `package_name` is installed in, as seen from `from`
    ///
    /// Walks `from/node_modules`, then each parent's `node_modules`.
    pub fn find_installed(&self, package_name: &str, from: &Path) -> Option<PathBuf> {
        let mut current = Some(from);
        while let Some(dir) = current {
            let candidate = dir.join("node_modules").join(package_name);
            if self.check_file_exists(&candidate.join("package.json")) {
                return Some(candidate);
            }
            current = dir.parent();
        }
        None
    }

    /// Read a package manifest through the LRU cache
    pub fn manifest(&self, package_dir: &Path) -> Result<PackageDetails> {
        let path = package_dir.join("package.json");
        if let Some(cached) = self.package_json_cache.lock().get(&path) {
            return Ok(cached.clone());
        }

        let details = PackageJsonParser::parse_file(&path)?;
        self.package_json_cache.lock().put(path, details.clone());
        Ok(details)
    }

    /// Resolve `subpath` (or the package root when `None`) to an entry file
    ///
    /// A package with an `exports` map is only reachable through it. Without
    /// one, `module` and `main` are tried before index files.
    pub fn resolve_entry(
        &self,
        package_dir: &Path,
        details: &PackageDetails,
        subpath: Option<&str>,
    ) -> Result<Option<PathBuf>> {
        if let Some(exports) = &details.exports {
            return self.resolve_exports_field(exports, subpath, package_dir);
        }

        match subpath {
            Some(subpath) => Ok(self.resolve_file(&package_dir.join(subpath))),
            None => Ok(self.resolve_package_main(details, package_dir)),
        }
    }

    fn resolve_exports_field(
        &self,
        exports: &Value,
        subpath: Option<&str>,
        package_dir: &Path,
    ) -> Result<Option<PathBuf>> {
        let export_key = subpath
            .map(|s| format!("./{}", s))
            .unwrap_or_else(|| ".".to_string());

        let map = match exports {
            Value::Object(map) if map.keys().any(|k| k.starts_with('.')) => map,
            // Sugar: a string, array or condition object describes "." only
            other if subpath.is_none() => {
                return Ok(self.resolve_export_value(other, package_dir, None))
            }
            _ => return Ok(None),
        };

        if let Some(value) = map.get(&export_key) {
            return Ok(self.resolve_export_value(value, package_dir, None));
        }

        // Subpath patterns: "./features/*": "./src/features/*.js"
        let best = map
            .iter()
            .filter_map(|(key, value)| {
                let (prefix, suffix) = key.split_once('*')?;
                let rest = export_key.strip_prefix(prefix)?.strip_suffix(suffix)?;
                Some((prefix.len(), rest, value))
            })
            .max_by_key(|(prefix_len, _, _)| *prefix_len);

        match best {
            Some((_, wildcard, value)) => {
                Ok(self.resolve_export_value(value, package_dir, Some(wildcard)))
            }
            None => Err(AutoImportError::InvalidManifest {
                path: package_dir.join("package.json"),
                message: format!("'{}' is not exported by this package", export_key),
            }),
        }
    }

    fn resolve_export_value(
        &self,
        value: &Value,
        package_dir: &Path,
        wildcard: Option<&str>,
    ) -> Option<PathBuf> {
        match value {
            Value::String(target) => {
                let target = match wildcard {
                    Some(w) => target.replace('*', w),
                    None => target.clone(),
                };
                let resolved = package_dir.join(target.trim_start_matches("./"));
                self.check_file_exists(&resolved).then_some(resolved)
            }
            Value::Array(alternatives) => alternatives
                .iter()
                .find_map(|alt| self.resolve_export_value(alt, package_dir, wildcard)),
            Value::Object(conditions) => EXPORT_CONDITIONS.iter().find_map(|condition| {
                conditions
                    .get(*condition)
                    .and_then(|v| self.resolve_export_value(v, package_dir, wildcard))
            }),
            _ => None,
        }
    }

    fn resolve_package_main(
        &self,
        details: &PackageDetails,
        package_dir: &Path,
    ) -> Option<PathBuf> {
        [details.module.as_deref(), details.main.as_deref()]
            .into_iter()
            .flatten()
            .find_map(|field| self.resolve_file(&package_dir.join(field)))
            .or_else(|| self.resolve_directory(package_dir))
    }

    /// Exact file, then with extensions, then as a directory
    fn resolve_file(&self, candidate: &Path) -> Option<PathBuf> {
        if candidate.is_file() {
            return Some(candidate.to_path_buf());
        }

        let candidate_str = candidate.to_string_lossy();
        for ext in EXTENSIONS {
            let with_ext = PathBuf::from(format!("{}.{}", candidate_str, ext));
            if self.check_file_exists(&with_ext) {
                return Some(with_ext);
            }
        }

        if candidate.is_dir() {
            if let Ok(details) = self.manifest(candidate) {
                if let Some(found) = self.resolve_package_main(&details, candidate) {
                    return Some(found);
                }
            }
            return self.resolve_directory(candidate);
        }

        None
    }

    fn resolve_directory(&self, dir: &Path) -> Option<PathBuf> {
        INDEX_FILES
            .iter()
            .map(|index| dir.join(index))
            .find(|path| self.check_file_exists(path))
    }

    /// Check if file exists with caching
    fn check_file_exists(&self, path: &Path) -> bool {
        if let Some(cached) = self.file_exists_cache.get(path) {
            return *cached;
        }

        let exists = path.is_file();
        self.file_exists_cache.insert(path.to_path_buf(), exists);
        exists
    }
}

impl Default for PathResolver {
    fn default() -> Self {
        Self::new()
    }
}
