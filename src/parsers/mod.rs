//! Parsing functionality for package files
//!
//! Parsers for package.json manifests and for import detection in
//! JavaScript and TypeScript sources.

pub mod ast_parser;
pub mod import_detector;
pub mod package_json;

pub use ast_parser::ASTParser;
pub use import_detector::ImportDetector;
pub use package_json::PackageJsonParser;
