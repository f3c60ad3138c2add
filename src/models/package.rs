//! Package-related data structures
//!
//! A [`Package`] is one source package taking part in the build (the app or a
//! contributing addon) together with the dependency-resolution context that
//! decides which external module versions it can see.

use crate::error::Result;
use crate::utils::specifier::{is_external_specifier, split_package_specifier};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// The subset of package.json the pipeline needs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PackageDetails {
    pub name: String,
    pub version: String,
    pub main: Option<String>,
    pub module: Option<String>,
    pub browser: Option<serde_json::Value>,
    pub exports: Option<serde_json::Value>,
    pub keywords: Option<Vec<String>>,
    pub dependencies: IndexMap<String, String>,
    pub dev_dependencies: IndexMap<String, String>,
    pub peer_dependencies: IndexMap<String, String>,
    /// The `autoImport` options block, if the manifest has one
    pub auto_import: Option<serde_json::Value>,
}

impl PackageDetails {
    /// Whether the manifest lists `keyword`
    pub fn has_keyword(&self, keyword: &str) -> bool {
        self.keywords
            .as_ref()
            .is_some_and(|keywords| keywords.iter().any(|k| k == keyword))
    }
}

/// Identity of a package: its name plus canonical root
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PackageId {
    pub name: String,
    pub root: PathBuf,
}

impl fmt::Display for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// A dependency installed where the owning package can see it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstalledDependency {
    pub name: String,
    pub version: String,
    pub root: PathBuf,
    /// Integrated by the host itself rather than by us
    pub host_managed: bool,
    #[serde(skip)]
    pub manifest: PackageDetails,
}

/// Result of looking a package name up in a resolution context
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DependencyLookup<'a> {
    Found(&'a InstalledDependency),
    /// Declared in the manifest but missing from node_modules
    NotInstalled,
    /// Not declared at all
    Undeclared,
}

/// Dependency-resolution context of a package
///
/// `dependency` is an in-memory query and must not touch the file system;
/// `resolve_entry` may.
pub trait ResolutionContext: Send + Sync + fmt::Debug {
    /// Look up the installed dependency that supplies `package_name`
    fn dependency(&self, package_name: &str) -> DependencyLookup<'_>;

    /// Resolve the concrete entry file for `subpath` inside `dependency`
    fn resolve_entry(
        &self,
        dependency: &InstalledDependency,
        subpath: Option<&str>,
    ) -> Result<Option<PathBuf>>;
}

/// Dependency table built from a manifest and the installed packages
#[derive(Debug, Clone, Default)]
pub struct DependencyTable {
    declared: IndexMap<String, String>,
    installed: IndexMap<String, InstalledDependency>,
}

impl DependencyTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a declared dependency and its version range
    pub fn declare(&mut self, name: impl Into<String>, range: impl Into<String>) {
        self.declared.insert(name.into(), range.into());
    }

    /// Record where a declared dependency is installed
    pub fn install(&mut self, dependency: InstalledDependency) {
        self.installed.insert(dependency.name.clone(), dependency);
    }

    pub fn lookup(&self, package_name: &str) -> DependencyLookup<'_> {
        match self.installed.get(package_name) {
            Some(dep) => DependencyLookup::Found(dep),
            None if self.declared.contains_key(package_name) => DependencyLookup::NotInstalled,
            None => DependencyLookup::Undeclared,
        }
    }

    pub fn installed(&self) -> impl Iterator<Item = &InstalledDependency> {
        self.installed.values()
    }
}

/// Per-package options: aliases and excludes
#[derive(Debug, Clone, Default)]
pub struct PackageOptions {
    /// Prefix rewrites applied before resolution (`"a": "b"` makes `a/x` resolve as `b/x`)
    pub alias: IndexMap<String, String>,
    /// Specifiers (or package names) left for the host to handle
    pub exclude: Vec<glob::Pattern>,
}

impl PackageOptions {
    /// Merge `other` on top of `self`; aliases in `other` win
    pub fn merged_with(mut self, other: &PackageOptions) -> Self {
        for (from, to) in &other.alias {
            self.alias.insert(from.clone(), to.clone());
        }
        for pattern in &other.exclude {
            if !self.exclude.iter().any(|p| p.as_str() == pattern.as_str()) {
                self.exclude.push(pattern.clone());
            }
        }
        self
    }
}

/// Raw handle the host passes to the registry
#[derive(Debug, Clone)]
pub struct PackageHandle {
    pub root: PathBuf,
    pub is_primary: bool,
    pub options: PackageOptions,
}

impl PackageHandle {
    pub fn primary(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            is_primary: true,
            options: PackageOptions::default(),
        }
    }

    pub fn addon(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            is_primary: false,
            options: PackageOptions::default(),
        }
    }

    pub fn with_options(mut self, options: PackageOptions) -> Self {
        self.options = options;
        self
    }
}

/// A source package participating in the build
#[derive(Debug)]
pub struct Package {
    id: PackageId,
    version: String,
    is_primary: bool,
    options: PackageOptions,
    context: Box<dyn ResolutionContext>,
}

impl Package {
    pub fn new(
        id: PackageId,
        version: impl Into<String>,
        is_primary: bool,
        options: PackageOptions,
        context: Box<dyn ResolutionContext>,
    ) -> Self {
        Self {
            id,
            version: version.into(),
            is_primary,
            options,
            context,
        }
    }

    pub fn id(&self) -> &PackageId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.id.name
    }

    pub fn root(&self) -> &Path {
        &self.id.root
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn is_primary(&self) -> bool {
        self.is_primary
    }

    pub fn options(&self) -> &PackageOptions {
        &self.options
    }

    pub fn context(&self) -> &dyn ResolutionContext {
        self.context.as_ref()
    }

    /// Whether `specifier` refers outside this package's own module namespace
    pub fn is_external(&self, specifier: &str) -> bool {
        is_external_specifier(specifier, self.name())
    }

    /// Whether this package asked the host to handle `specifier`
    pub fn is_excluded(&self, specifier: &str) -> bool {
        let (name, _) = split_package_specifier(specifier);
        self.options
            .exclude
            .iter()
            .any(|pattern| pattern.matches(specifier) || pattern.matches(&name))
    }

    /// Apply this package's aliases to `specifier`
    ///
    /// The longest matching alias wins; an alias matches the whole specifier
    /// or a `/`-delimited prefix of it.
    pub fn apply_alias(&self, specifier: &str) -> String {
        let best = self
            .options
            .alias
            .iter()
            .filter(|(from, _)| {
                specifier == from.as_str()
                    || specifier
                        .strip_prefix(from.as_str())
                        .is_some_and(|rest| rest.starts_with('/'))
            })
            .max_by_key(|(from, _)| from.len());

        match best {
            Some((from, to)) => format!("{}{}", to, &specifier[from.len()..]),
            None => specifier.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct TableContext(DependencyTable);

    impl ResolutionContext for TableContext {
        fn dependency(&self, package_name: &str) -> DependencyLookup<'_> {
            self.0.lookup(package_name)
        }

        fn resolve_entry(
            &self,
            dependency: &InstalledDependency,
            _subpath: Option<&str>,
        ) -> Result<Option<PathBuf>> {
            Ok(Some(dependency.root.join("index.js")))
        }
    }

    fn package_with(options: PackageOptions) -> Package {
        let mut table = DependencyTable::new();
        table.declare("lodash", "^4.0.0");
        table.declare("missing", "^1.0.0");
        table.install(InstalledDependency {
            name: "lodash".to_string(),
            version: "4.17.21".to_string(),
            root: PathBuf::from("/app/node_modules/lodash"),
            host_managed: false,
            manifest: PackageDetails::default(),
        });

        Package::new(
            PackageId {
                name: "my-app".to_string(),
                root: PathBuf::from("/app"),
            },
            "1.0.0",
            true,
            options,
            Box::new(TableContext(table)),
        )
    }

    #[test]
    fn test_dependency_lookup() {
        let package = package_with(PackageOptions::default());
        assert!(matches!(
            package.context().dependency("lodash"),
            DependencyLookup::Found(dep) if dep.version == "4.17.21"
        ));
        assert_eq!(
            package.context().dependency("missing"),
            DependencyLookup::NotInstalled
        );
        assert_eq!(
            package.context().dependency("left-pad"),
            DependencyLookup::Undeclared
        );
    }

    #[test]
    fn test_alias_prefers_longest_match() {
        let mut alias = IndexMap::new();
        alias.insert("dayjs".to_string(), "dayjs-esm".to_string());
        alias.insert("dayjs/plugin".to_string(), "dayjs-plugins".to_string());
        let package = package_with(PackageOptions {
            alias,
            exclude: Vec::new(),
        });

        assert_eq!(package.apply_alias("dayjs"), "dayjs-esm");
        assert_eq!(package.apply_alias("dayjs/locale/de"), "dayjs-esm/locale/de");
        assert_eq!(package.apply_alias("dayjs/plugin/utc"), "dayjs-plugins/utc");
        assert_eq!(package.apply_alias("dayjsx"), "dayjsx");
    }

    #[test]
    fn test_exclude_matches_name_or_specifier() {
        let package = package_with(PackageOptions {
            alias: IndexMap::new(),
            exclude: vec![
                glob::Pattern::new("moment").unwrap(),
                glob::Pattern::new("@ember/*").unwrap(),
            ],
        });

        assert!(package.is_excluded("moment/locale/de"));
        assert!(package.is_excluded("@ember/object/computed"));
        assert!(!package.is_excluded("lodash"));
    }

    #[test]
    fn test_is_external() {
        let package = package_with(PackageOptions::default());
        assert!(package.is_external("lodash"));
        assert!(!package.is_external("my-app/utils/x"));
        assert!(!package.is_external("./x"));
    }
}
