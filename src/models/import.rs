//! Import records produced by the analyzer

use crate::models::package::Package;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// How a specifier is pulled in by the consuming module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportStyle {
    /// Evaluated unconditionally when the module loads
    Eager,
    /// Requested on demand through `import()`
    Lazy,
}

impl fmt::Display for ImportStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportStyle::Eager => write!(f, "eager"),
            ImportStyle::Lazy => write!(f, "lazy"),
        }
    }
}

/// An import found in a source file, before any filtering
///
/// This is what the parser layer hands back before the record is tied to a
/// package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawImport {
    pub specifier: String,
    pub style: ImportStyle,
    pub line: usize,
}

/// One reference to an external specifier
#[derive(Debug, Clone)]
pub struct ImportRecord {
    pub specifier: String,
    /// Namespaced module path of the consuming file (`my-app/tests/foo-test.js`)
    pub consuming_file: String,
    pub package: Arc<Package>,
    pub style: ImportStyle,
    /// 1-based source line
    pub line: usize,
}

impl ImportRecord {
    /// `file:line` for error attribution
    pub fn location(&self) -> String {
        format!("{}:{}", self.consuming_file, self.line)
    }
}

impl PartialEq for ImportRecord {
    fn eq(&self, other: &Self) -> bool {
        self.specifier == other.specifier
            && self.consuming_file == other.consuming_file
            && self.package.id() == other.package.id()
            && self.style == other.style
            && self.line == other.line
    }
}

impl Eq for ImportRecord {}
