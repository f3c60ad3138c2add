//! Data models and structures for auto-import

pub mod artifact;
pub mod assignment;
pub mod bundle;
pub mod config;
pub mod import;
pub mod package;

pub use artifact::{chunk_file_name, BuildArtifact, LazyChunk};
pub use assignment::{
    Assignment, AssignmentKey, Carriage, Placement, SkipReason,
    SkippedSpecifier, SplitResult, UnresolvedImport,
};
pub use bundle::{default_bundle_specs, Bundle, BundleConfig, BundleSpec};
pub use config::{OutputFormat, PartialSettings, Settings, TreeSpec};
pub use import::{ImportRecord, ImportStyle, RawImport};
pub use package::{
    DependencyLookup, DependencyTable, InstalledDependency, Package, PackageDetails,
    PackageHandle, PackageId, PackageOptions, ResolutionContext,
};
