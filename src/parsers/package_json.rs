//! Package.json parsing functionality
//!
//! Extracts the fields the pipeline needs: identity, entry points,
//! keywords, dependency tables and the `autoImport` options block.

use crate::error::{AutoImportError, Result};
use crate::models::package::PackageDetails;
use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::path::Path;

/// Parser for package.json files
pub struct PackageJsonParser;

impl PackageJsonParser {
    /// Parse package.json content into PackageDetails
    pub fn parse(content: &str) -> Result<PackageDetails> {
        let json_value: Value = serde_json::from_str(content)
            .map_err(|e| AutoImportError::json_parse_error("package.json", e))?;

        let obj = match json_value {
            Value::Object(obj) => obj,
            _ => {
                return Err(AutoImportError::InvalidManifest {
                    path: "package.json".into(),
                    message: "Root value is not an object".into(),
                });
            }
        };

        Ok(PackageDetails {
            name: Self::extract_optional_string(&obj, "name").unwrap_or_default(),
            version: Self::extract_optional_string(&obj, "version").unwrap_or_default(),
            main: Self::extract_optional_string(&obj, "main"),
            module: Self::extract_optional_string(&obj, "module"),
            browser: obj.get("browser").cloned(),
            exports: obj.get("exports").cloned(),
            keywords: Self::extract_optional_string_array(&obj, "keywords"),
            dependencies: Self::extract_dependencies(&obj, "dependencies"),
            dev_dependencies: Self::extract_dependencies(&obj, "devDependencies"),
            peer_dependencies: Self::extract_dependencies(&obj, "peerDependencies"),
            auto_import: obj.get("autoImport").cloned(),
        })
    }

    /// Parse package.json file from a path
    ///
    /// Errors are rewritten to name the manifest that failed.
    pub fn parse_file(path: &Path) -> Result<PackageDetails> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AutoImportError::io_read_error(path, e))?;

        Self::parse(&content).map_err(|e| match e {
            AutoImportError::JsonParse { source, .. } => AutoImportError::JsonParse {
                file: path.to_path_buf(),
                source,
            },
            AutoImportError::InvalidManifest { message, .. } => AutoImportError::InvalidManifest {
                path: path.to_path_buf(),
                message,
            },
            _ => e,
        })
    }

    /// Extract a dependency map, keeping only string version ranges
    fn extract_dependencies(obj: &Map<String, Value>, field: &str) -> IndexMap<String, String> {
        let mut entries = IndexMap::new();

        if let Some(Value::Object(map)) = obj.get(field) {
            for (name, version) in map {
                if let Some(version_str) = version.as_str() {
                    entries.insert(name.clone(), version_str.to_string());
                }
            }
        }

        entries
    }

    /// Extract an optional string field from a JSON object
    fn extract_optional_string(obj: &Map<String, Value>, field: &str) -> Option<String> {
        match obj.get(field) {
            Some(Value::String(s)) => Some(s.clone()),
            _ => None,
        }
    }

    /// Extract an optional array of strings from a JSON object
    fn extract_optional_string_array(obj: &Map<String, Value>, field: &str) -> Option<Vec<String>> {
        match obj.get(field) {
            Some(Value::Array(arr)) => {
                let strings: Vec<String> = arr
                    .iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect();

                if strings.is_empty() {
                    None
                } else {
                    Some(strings)
                }
            }
            _ => None,
        }
    }
}
