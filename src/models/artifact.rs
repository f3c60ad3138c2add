//! Bundle artifacts produced by the bundler

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Prefix for lazily loaded chunk files
pub const CHUNK_DIR: &str = "assets";

/// Chunk file name for a chunk id: `assets/chunk.<id>.js`
pub fn chunk_file_name(chunk_id: &str) -> String {
    format!("{}/chunk.{}.js", CHUNK_DIR, chunk_id)
}

/// A separately loadable file holding one lazily used module
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LazyChunk {
    pub module_id: String,
    pub specifier: String,
    pub file_name: String,
    pub content: String,
}

/// Everything one bundle contributes to the build output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildArtifact {
    pub bundle: String,
    /// Content hash over every build input
    pub key: String,
    pub entrypoint: String,
    pub eager_payload: String,
    /// Module ids available synchronously
    pub eager_modules: Vec<String>,
    pub lazy_chunks: IndexMap<String, LazyChunk>,
}

impl BuildArtifact {
    /// Artifact for a bundle that carries nothing
    pub fn empty(
        bundle: impl Into<String>,
        entrypoint: impl Into<String>,
        key: impl Into<String>,
    ) -> Self {
        Self {
            bundle: bundle.into(),
            key: key.into(),
            entrypoint: entrypoint.into(),
            eager_payload: String::new(),
            eager_modules: Vec::new(),
            lazy_chunks: IndexMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.eager_modules.is_empty() && self.lazy_chunks.is_empty()
    }

    pub fn has_module(&self, module_id: &str) -> bool {
        self.eager_modules.iter().any(|m| m == module_id)
            || self.lazy_chunks.values().any(|c| c.module_id == module_id)
    }

    /// Whether any eager module or chunk comes from `specifier`
    pub fn mentions_specifier(&self, specifier: &str) -> bool {
        let prefix = format!("{}@", specifier);
        self.eager_modules.iter().any(|m| m.starts_with(&prefix))
            || self.lazy_chunks.values().any(|c| c.specifier == specifier)
    }
}
