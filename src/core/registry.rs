//! Package registry
//!
//! Identifies the packages taking part in a build and builds each one's
//! dependency-resolution context from its manifest and `node_modules`.

use crate::error::{AutoImportError, Result};
use crate::models::package::{
    DependencyLookup, DependencyTable, InstalledDependency, Package, PackageDetails,
    PackageHandle, PackageId, PackageOptions, ResolutionContext,
};
use crate::parsers::package_json::PackageJsonParser;
use crate::utils::path_resolver::PathResolver;
use indexmap::IndexMap;
use parking_lot::RwLock;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Resolution context backed by a dependency table and the file system
#[derive(Debug)]
pub struct NodeResolutionContext {
    table: DependencyTable,
    resolver: PathResolver,
}

impl NodeResolutionContext {
    pub fn new(table: DependencyTable, resolver: PathResolver) -> Self {
        Self { table, resolver }
    }
}

impl ResolutionContext for NodeResolutionContext {
    fn dependency(&self, package_name: &str) -> DependencyLookup<'_> {
        self.table.lookup(package_name)
    }

    fn resolve_entry(
        &self,
        dependency: &InstalledDependency,
        subpath: Option<&str>,
    ) -> Result<Option<PathBuf>> {
        self.resolver
            .resolve_entry(&dependency.root, &dependency.manifest, subpath)
    }
}

/// Registry of source packages, one per canonical root
#[derive(Debug)]
pub struct PackageRegistry {
    packages: RwLock<IndexMap<PathBuf, Arc<Package>>>,
    resolver: PathResolver,
    host_managed_keyword: String,
}

impl PackageRegistry {
    pub fn new(host_managed_keyword: impl Into<String>) -> Self {
        Self {
            packages: RwLock::new(IndexMap::new()),
            resolver: PathResolver::new(),
            host_managed_keyword: host_managed_keyword.into(),
        }
    }

    /// Return the package rooted at `handle.root`, creating it on first lookup
    pub fn lookup(&self, handle: &PackageHandle) -> Result<Arc<Package>> {
        let root = canonical_root(&handle.root)?;

        if let Some(existing) = self.packages.read().get(&root) {
            return Ok(existing.clone());
        }

        let package = Arc::new(self.load(&root, handle)?);

        // Another thread may have loaded the same root in the meantime
        let mut packages = self.packages.write();
        let entry = packages.entry(root).or_insert(package);
        Ok(entry.clone())
    }

    pub fn primary(&self) -> Option<Arc<Package>> {
        self.packages
            .read()
            .values()
            .find(|p| p.is_primary())
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.packages.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.read().is_empty()
    }

    fn load(&self, root: &Path, handle: &PackageHandle) -> Result<Package> {
        let manifest_path = root.join("package.json");
        if !manifest_path.is_file() {
            return Err(AutoImportError::ManifestNotFound {
                path: root.to_path_buf(),
            });
        }

        let details = PackageJsonParser::parse_file(&manifest_path).map_err(|e| {
            AutoImportError::InvalidManifest {
                path: root.to_path_buf(),
                message: e.to_string(),
            }
        })?;
        if details.name.is_empty() {
            return Err(AutoImportError::InvalidManifest {
                path: root.to_path_buf(),
                message: "missing \"name\"".to_string(),
            });
        }

        let options = manifest_options(root, &details)?.merged_with(&handle.options);
        let table = self.dependency_table(root, &details, handle.is_primary)?;

        debug!(
            package = %details.name,
            root = %root.display(),
            installed = table.installed().count(),
            "registered package"
        );

        let id = PackageId {
            name: details.name.clone(),
            root: root.to_path_buf(),
        };
        let context = NodeResolutionContext::new(table, self.resolver.clone());
        Ok(Package::new(
            id,
            details.version,
            handle.is_primary,
            options,
            Box::new(context),
        ))
    }

    /// Declared dependencies and where they are installed
    ///
    /// The primary package also sees its devDependencies.
    fn dependency_table(
        &self,
        root: &Path,
        details: &PackageDetails,
        is_primary: bool,
    ) -> Result<DependencyTable> {
        let mut table = DependencyTable::new();

        let mut declared: Vec<(&String, &String)> = details.dependencies.iter().collect();
        declared.extend(details.peer_dependencies.iter());
        if is_primary {
            declared.extend(details.dev_dependencies.iter());
        }

        for (name, range) in declared {
            table.declare(name.clone(), range.clone());

            let Some(dep_root) = self.resolver.find_installed(name, root) else {
                debug!(package = %details.name, dependency = %name, "declared but not installed");
                continue;
            };
            let manifest = self.resolver.manifest(&dep_root)?;
            let host_managed = !self.host_managed_keyword.is_empty()
                && manifest.has_keyword(&self.host_managed_keyword);

            table.install(InstalledDependency {
                name: name.clone(),
                version: manifest.version.clone(),
                root: fs::canonicalize(&dep_root).unwrap_or(dep_root),
                host_managed,
                manifest,
            });
        }

        Ok(table)
    }
}

fn canonical_root(root: &Path) -> Result<PathBuf> {
    fs::canonicalize(root).map_err(|_| AutoImportError::ManifestNotFound {
        path: root.to_path_buf(),
    })
}

/// Options a package declares in its own `autoImport` manifest block
fn manifest_options(root: &Path, details: &PackageDetails) -> Result<PackageOptions> {
    let mut options = PackageOptions::default();
    let Some(block) = &details.auto_import else {
        return Ok(options);
    };

    let invalid = |message: String| AutoImportError::InvalidManifest {
        path: root.to_path_buf(),
        message,
    };

    if let Some(Value::Object(alias)) = block.get("alias") {
        for (from, to) in alias {
            let to = to
                .as_str()
                .ok_or_else(|| invalid(format!("autoImport.alias.{} must be a string", from)))?;
            options.alias.insert(from.clone(), to.to_string());
        }
    }

    if let Some(Value::Array(exclude)) = block.get("exclude") {
        for value in exclude {
            let raw = value
                .as_str()
                .ok_or_else(|| invalid("autoImport.exclude entries must be strings".to_string()))?;
            let pattern = glob::Pattern::new(raw)
                .map_err(|e| invalid(format!("autoImport.exclude '{}': {}", raw, e)))?;
            options.exclude.push(pattern);
        }
    }

    Ok(options)
}
