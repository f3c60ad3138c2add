//! Splitter output: where each external specifier is carried

use crate::error::AutoImportError;
use crate::models::import::ImportStyle;
use crate::models::package::{InstalledDependency, Package, PackageId};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Assignments are keyed per requesting package, never merged across packages
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct AssignmentKey {
    pub specifier: String,
    pub package: PackageId,
}

/// How a bundle gets a specifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Carriage {
    /// This bundle carries its own copy in the given mode
    Carried(ImportStyle),
    /// Another bundle along the base chain carries it
    Shared { carrier: String },
}

impl Carriage {
    /// Mode this bundle carries the specifier in, if it carries it at all
    pub fn mode(&self) -> Option<ImportStyle> {
        match self {
            Carriage::Carried(mode) => Some(*mode),
            Carriage::Shared { .. } => None,
        }
    }
}

impl fmt::Display for Carriage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Carriage::Carried(mode) => write!(f, "{}", mode),
            Carriage::Shared { carrier } => write!(f, "shared:{}", carrier),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Placement {
    pub bundle: String,
    pub carriage: Carriage,
    /// Sorted, deduplicated consuming files in this bundle
    pub consumers: Vec<String>,
}

impl Placement {
    pub fn carries(&self) -> bool {
        self.carriage.mode().is_some()
    }
}

/// One specifier requested by one package, with its placements
#[derive(Debug, Clone)]
pub struct Assignment {
    pub key: AssignmentKey,
    /// Specifier after alias rewriting; what actually gets resolved
    pub target: String,
    pub dependency: InstalledDependency,
    /// Path inside the dependency (`get` for `lodash/get`)
    pub subpath: Option<String>,
    /// In bundle declaration order
    pub placements: Vec<Placement>,
    /// `file:line` of the first reference, for error attribution
    pub origin: String,
    pub package: Arc<Package>,
}

impl Assignment {
    /// Runtime module id: `<target>@<version>`
    pub fn module_id(&self) -> String {
        format!("{}@{}", self.target, self.dependency.version)
    }

    pub fn placement(&self, bundle: &str) -> Option<&Placement> {
        self.placements.iter().find(|p| p.bundle == bundle)
    }
}

impl PartialEq for Assignment {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
            && self.target == other.target
            && self.dependency == other.dependency
            && self.subpath == other.subpath
            && self.placements == other.placements
            && self.origin == other.origin
    }
}

impl Eq for Assignment {}

/// A specifier the requesting package cannot supply
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnresolvedImport {
    pub specifier: String,
    /// `file:line` of the first reference
    pub consuming_file: String,
    pub package: String,
    /// Every bundle that references the specifier
    pub bundles: Vec<String>,
    pub reason: String,
}

impl UnresolvedImport {
    pub fn to_error(&self) -> AutoImportError {
        AutoImportError::unresolved_import(
            &self.specifier,
            &self.consuming_file,
            &self.package,
            &self.reason,
        )
    }

    pub fn affects(&self, bundle: &str) -> bool {
        self.bundles.iter().any(|b| b == bundle)
    }
}

/// Why a specifier was left for the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    Excluded,
    HostManaged,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedSpecifier {
    pub specifier: String,
    pub package: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SplitResult {
    pub assignments: BTreeMap<AssignmentKey, Assignment>,
    pub unresolved: Vec<UnresolvedImport>,
    pub skipped: Vec<SkippedSpecifier>,
}

impl SplitResult {
    /// Assignments `bundle` carries, with the mode it carries them in
    pub fn carried_by<'a>(
        &'a self,
        bundle: &'a str,
    ) -> impl Iterator<Item = (&'a Assignment, ImportStyle)> + 'a {
        self.assignments.values().filter_map(move |assignment| {
            assignment
                .placement(bundle)
                .and_then(|p| p.carriage.mode())
                .map(|mode| (assignment, mode))
        })
    }

    /// Every assignment `bundle` references, carried or shared
    pub fn referenced_by<'a>(
        &'a self,
        bundle: &'a str,
    ) -> impl Iterator<Item = &'a Assignment> + 'a {
        self.assignments
            .values()
            .filter(move |assignment| assignment.placement(bundle).is_some())
    }

    /// First unresolved import that fails `bundle`
    pub fn unresolved_for(&self, bundle: &str) -> Option<&UnresolvedImport> {
        self.unresolved.iter().find(|u| u.affects(bundle))
    }

    pub fn placement_count(&self) -> usize {
        self.assignments.values().map(|a| a.placements.len()).sum()
    }
}
