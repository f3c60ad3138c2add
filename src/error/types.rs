//! Error types and definitions for auto-import
//!
//! Every failure is attributed to the smallest unit that failed (a package,
//! a source file, a specifier or a bundle) so the build can report exactly
//! which import caused it.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Error severity levels for different error types
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// Warning level errors - operation can continue
    Warning,
    /// Error level - the failing unit is dropped but sibling units still build
    Error,
    /// Critical level - the whole build aborts before emitting anything
    Critical,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorSeverity::Warning => write!(f, "WARNING"),
            ErrorSeverity::Error => write!(f, "ERROR"),
            ErrorSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// Main error type for auto-import operations
#[derive(Debug, Error)]
pub enum AutoImportError {
    /// Bad or missing bundle / environment configuration
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// A package root without a readable manifest
    #[error("Configuration error: package at {path} has no package.json")]
    ManifestNotFound { path: PathBuf },

    /// A package manifest that cannot be used as a resolution context
    #[error("Configuration error: invalid package.json in {path}: {message}")]
    InvalidManifest { path: PathBuf, message: String },

    /// Configuration file not found
    #[error("Configuration file not found at {path}")]
    ConfigNotFound { path: PathBuf },

    /// Configuration file read errors
    #[error("Error reading configuration file {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration file parse errors
    #[error("Error parsing configuration file {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// A source module that could not be parsed
    #[error("Parse error in {file} (package {package}): {message}")]
    Parse {
        file: String,
        package: String,
        message: String,
    },

    /// A specifier the owning package cannot supply
    #[error("Unresolved import '{specifier}' in {file} (package {package}): {reason}")]
    UnresolvedImport {
        specifier: String,
        file: String,
        package: String,
        reason: String,
    },

    /// The external transformation tool failed for a bundle
    #[error("Bundle '{bundle}' failed to compile: {diagnostic}")]
    BundleCompilation { bundle: String, diagnostic: String },

    /// Standard IO errors
    #[error("IO error: {source}")]
    Io {
        #[source]
        source: std::io::Error,
    },

    /// IO errors while reading a specific file
    #[error("Error reading {path}: {source}")]
    IoRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON parsing errors with file context
    #[error("JSON parsing error in {file}: {source}")]
    JsonParse {
        file: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// JSON serialization error
    #[error("JSON serialization error: {source}")]
    JsonSerialize {
        #[source]
        source: serde_json::Error,
    },

    /// CSV handling errors
    #[error("CSV error: {source}")]
    Csv {
        #[source]
        source: csv::Error,
    },

    /// Glob pattern errors
    #[error("Glob pattern error: {source}")]
    GlobPattern {
        #[source]
        source: glob::PatternError,
    },

    /// Output file write errors
    #[error("Error writing to output file {path}: {source}")]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Stdout write errors
    #[error("Error writing to stdout: {source}")]
    StdoutWrite {
        #[source]
        source: std::io::Error,
    },

    /// Cache error
    #[error("Cache error: {message}")]
    Cache { message: String },
}

impl AutoImportError {
    /// Get the severity level of this error
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            AutoImportError::Cache { .. } => ErrorSeverity::Warning,

            // Critical errors - the build never starts emitting
            AutoImportError::Configuration { .. } => ErrorSeverity::Critical,
            AutoImportError::ManifestNotFound { .. } => ErrorSeverity::Critical,
            AutoImportError::InvalidManifest { .. } => ErrorSeverity::Critical,
            AutoImportError::ConfigNotFound { .. } => ErrorSeverity::Critical,
            AutoImportError::ConfigRead { .. } => ErrorSeverity::Critical,
            AutoImportError::ConfigParse { .. } => ErrorSeverity::Critical,
            AutoImportError::StdoutWrite { .. } => ErrorSeverity::Critical,

            // Regular errors - the failing unit is dropped, siblings continue
            _ => ErrorSeverity::Error,
        }
    }

    /// Check if this is a critical error that should terminate the process
    pub fn is_critical(&self) -> bool {
        self.severity() == ErrorSeverity::Critical
    }

    /// Check if this error belongs to the configuration class
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            AutoImportError::Configuration { .. }
                | AutoImportError::ManifestNotFound { .. }
                | AutoImportError::InvalidManifest { .. }
                | AutoImportError::ConfigNotFound { .. }
                | AutoImportError::ConfigRead { .. }
                | AutoImportError::ConfigParse { .. }
        )
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            AutoImportError::UnresolvedImport {
                specifier,
                file,
                package,
                reason,
            } => {
                format!(
                    "'{}' imported from '{}' could not be resolved by package '{}': {}.",
                    specifier, file, package, reason
                )
            }
            AutoImportError::Parse { file, package, message } => {
                format!(
                    "Could not parse '{}' in package '{}': {}. Imports from this package were not bundled.",
                    file, package, message
                )
            }
            AutoImportError::BundleCompilation { bundle, diagnostic } => {
                format!(
                    "The transformer failed while building bundle '{}':\n{}",
                    bundle, diagnostic
                )
            }
            AutoImportError::ManifestNotFound { path } => {
                format!(
                    "No package.json found in '{}'. Every app and addon root needs a manifest.",
                    path.display()
                )
            }
            AutoImportError::ConfigNotFound { path } => {
                format!(
                    "Configuration file not found at '{}'. Create one with --init or pass options on the command line.",
                    path.display()
                )
            }
            // For other errors, use the standard Display implementation
            _ => self.to_string(),
        }
    }

    /// A hint for the user on how to fix the error, when there is an obvious one
    pub fn suggestion(&self) -> Option<String> {
        match self {
            AutoImportError::UnresolvedImport { specifier, package, .. } => {
                let (name, _) = crate::utils::specifier::split_package_specifier(specifier);
                Some(format!(
                    "Add '{}' to the dependencies of '{}' and install it",
                    name, package
                ))
            }
            AutoImportError::ManifestNotFound { .. } => {
                Some("Check the project_root and addons paths in your configuration".to_string())
            }
            AutoImportError::ConfigNotFound { .. } => {
                Some("Run `auto-import --init` to create .auto-import.toml".to_string())
            }
            _ => None,
        }
    }

    /// Create an IO error with context
    pub fn io_error(source: std::io::Error) -> Self {
        AutoImportError::Io { source }
    }

    /// Create an IO error for a specific file
    pub fn io_read_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AutoImportError::IoRead {
            path: path.into(),
            source,
        }
    }

    /// Create a JSON parse error with file context
    pub fn json_parse_error(file: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        AutoImportError::JsonParse {
            file: file.into(),
            source,
        }
    }

    /// Create a configuration error
    pub fn config_error(message: impl Into<String>) -> Self {
        AutoImportError::Configuration {
            message: message.into(),
        }
    }

    /// Create a parse error for a source file
    pub fn parse_error(
        file: impl Into<String>,
        package: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        AutoImportError::Parse {
            file: file.into(),
            package: package.into(),
            message: message.into(),
        }
    }

    /// Create an unresolved import error
    pub fn unresolved_import(
        specifier: impl Into<String>,
        file: impl Into<String>,
        package: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        AutoImportError::UnresolvedImport {
            specifier: specifier.into(),
            file: file.into(),
            package: package.into(),
            reason: reason.into(),
        }
    }

    /// Create a bundle compilation error
    pub fn bundle_compilation(bundle: impl Into<String>, diagnostic: impl Into<String>) -> Self {
        AutoImportError::BundleCompilation {
            bundle: bundle.into(),
            diagnostic: diagnostic.into(),
        }
    }
}

// Implement From for common error types
impl From<std::io::Error> for AutoImportError {
    fn from(err: std::io::Error) -> Self {
        AutoImportError::io_error(err)
    }
}

impl From<csv::Error> for AutoImportError {
    fn from(err: csv::Error) -> Self {
        AutoImportError::Csv { source: err }
    }
}

impl From<glob::PatternError> for AutoImportError {
    fn from(err: glob::PatternError) -> Self {
        AutoImportError::GlobPattern { source: err }
    }
}

impl From<serde_json::Error> for AutoImportError {
    fn from(err: serde_json::Error) -> Self {
        AutoImportError::JsonSerialize { source: err }
    }
}

/// Result type alias for auto-import operations
pub type Result<T> = std::result::Result<T, AutoImportError>;
