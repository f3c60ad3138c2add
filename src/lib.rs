//! auto-import - places a host application's external package imports into bundles
//!
//! Source trees are scanned for imports of npm packages, every specifier is
//! resolved against the importing package's declared dependencies, and the
//! resulting assignments are bundled per entrypoint. Each bundle ends up with
//! an eager payload, lazily fetched chunks, and a loader shim registering them
//! with the host's module runtime.

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod models;
pub mod output;
pub mod parsers;
pub mod utils;

// Re-export commonly used types
pub use crate::core::{AutoImport, BuildOutput, BuildReport};
pub use error::{log_error, AutoImportError, ErrorSeverity, OptionExt, Result, ResultExt};
pub use models::{
    artifact::BuildArtifact,
    assignment::{Assignment, AssignmentKey, SplitResult},
    bundle::BundleSpec,
    config::Settings,
    package::PackageHandle,
};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
