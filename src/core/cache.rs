//! Artifact caching
//!
//! Built artifacts are keyed by a content hash over every build input, so a
//! cached entry is valid for as long as it exists. An optional disk layer
//! keeps artifacts across processes; disk problems are logged and otherwise
//! ignored.

use crate::error::{log_error, AutoImportError, Result};
use crate::models::artifact::BuildArtifact;
use dashmap::DashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Cache counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: usize,
    pub misses: usize,
}

impl CacheStats {
    /// Get the cache hit rate
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Thread-safe artifact cache
#[derive(Debug, Default)]
pub struct ArtifactCache {
    enabled: bool,
    memory: DashMap<String, Arc<BuildArtifact>>,
    disk_dir: Option<PathBuf>,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl ArtifactCache {
    pub fn new(enabled: bool, disk_dir: Option<PathBuf>) -> Self {
        Self {
            enabled,
            memory: DashMap::new(),
            disk_dir: if enabled { disk_dir } else { None },
            hits: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
        }
    }

    /// A cache that never stores anything
    pub fn disabled() -> Self {
        Self::new(false, None)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Look an artifact up by key, falling back to disk
    pub fn get(&self, key: &str) -> Option<Arc<BuildArtifact>> {
        if !self.enabled {
            return None;
        }

        if let Some(found) = self.memory.get(key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!(key, "artifact cache hit");
            return Some(found.clone());
        }

        if let Some(found) = self.load_from_disk(key) {
            let found = Arc::new(found);
            self.memory.insert(key.to_string(), found.clone());
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!(key, "artifact cache hit on disk");
            return Some(found);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        debug!(key, "artifact cache miss");
        None
    }

    /// Store an artifact under its own key
    ///
    /// Inserting the same key twice has no further effect.
    pub fn insert(&self, artifact: Arc<BuildArtifact>) {
        if !self.enabled || self.memory.contains_key(&artifact.key) {
            return;
        }

        if let Err(e) = self.persist(&artifact) {
            log_error(&e);
        }
        self.memory.insert(artifact.key.clone(), artifact);
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.memory.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    fn entry_path(dir: &Path, key: &str) -> PathBuf {
        dir.join(format!("{}.json", key))
    }

    fn load_from_disk(&self, key: &str) -> Option<BuildArtifact> {
        let dir = self.disk_dir.as_ref()?;
        let path = Self::entry_path(dir, key);
        let content = fs::read_to_string(&path).ok()?;

        match serde_json::from_str::<BuildArtifact>(&content) {
            Ok(artifact) if artifact.key == key => Some(artifact),
            Ok(_) => {
                warn!(path = %path.display(), "cached artifact has a different key, ignoring");
                None
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "unreadable cached artifact, ignoring");
                None
            }
        }
    }

    fn persist(&self, artifact: &BuildArtifact) -> Result<()> {
        let Some(dir) = &self.disk_dir else {
            return Ok(());
        };

        fs::create_dir_all(dir).map_err(|e| AutoImportError::Cache {
            message: format!("cannot create {}: {}", dir.display(), e),
        })?;
        let json = serde_json::to_string(artifact)?;
        let path = Self::entry_path(dir, &artifact.key);
        fs::write(&path, json).map_err(|e| AutoImportError::Cache {
            message: format!("cannot write {}: {}", path.display(), e),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn artifact(key: &str) -> Arc<BuildArtifact> {
        Arc::new(BuildArtifact::empty("app", "assets/vendor.js", key))
    }

    #[test]
    fn test_memory_hits_and_misses() {
        let cache = ArtifactCache::new(true, None);
        assert!(cache.get("k1").is_none());

        cache.insert(artifact("k1"));
        cache.insert(artifact("k1"));
        assert_eq!(cache.get("k1").unwrap().key, "k1");

        let stats = cache.stats();
        assert_eq!(stats, CacheStats { entries: 1, hits: 1, misses: 1 });
        assert_eq!(stats.hit_rate(), 0.5);
    }

    #[test]
    fn test_disabled_cache_stores_nothing() {
        let cache = ArtifactCache::disabled();
        cache.insert(artifact("k1"));
        assert!(cache.get("k1").is_none());
        assert_eq!(cache.stats().entries, 0);
    }

    #[test]
    fn test_disk_layer_survives_new_instance() {
        let dir = TempDir::new().unwrap();
        let first = ArtifactCache::new(true, Some(dir.path().to_path_buf()));
        first.insert(artifact("abc"));
        assert!(dir.path().join("abc.json").is_file());

        let second = ArtifactCache::new(true, Some(dir.path().to_path_buf()));
        assert_eq!(second.get("abc").unwrap().bundle, "app");
    }

    #[test]
    fn test_corrupt_disk_entry_is_a_miss() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("bad.json"), "{").unwrap();

        let cache = ArtifactCache::new(true, Some(dir.path().to_path_buf()));
        assert!(cache.get("bad").is_none());
        assert_eq!(cache.stats().misses, 1);
    }
}
