//! Bundle building
//!
//! Turns a [`SplitResult`] into one [`BuildArtifact`] per bundle. Every bundle
//! is built on its own: a failure in one never stops the others.

use crate::core::cache::ArtifactCache;
use crate::core::loader::{loader_shim, wrap_payload, Registration};
use crate::core::node::BuildNode;
use crate::core::parallel::parallel_process;
use crate::core::transform::{TransformModule, TransformRequest, Transformer};
use crate::error::{AutoImportError, OptionExt, Result};
use crate::models::artifact::{chunk_file_name, BuildArtifact, LazyChunk, CHUNK_DIR};
use crate::models::assignment::{Assignment, AssignmentKey, SplitResult, UnresolvedImport};
use crate::models::bundle::{Bundle, BundleConfig};
use crate::models::import::ImportStyle;
use crate::utils::hashing::{content_hash, ContentHasher};
use indexmap::IndexMap;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

/// Pattern that keeps chunk files out of host fingerprinting
pub const CHUNK_FINGERPRINT_EXCLUDE: &str = "assets/chunk.*.js";

/// Append the chunk pattern to a host's fingerprint exclude list, once
pub fn add_fingerprint_exclude(excludes: &mut Vec<String>) {
    if !excludes.iter().any(|e| e == CHUNK_FINGERPRINT_EXCLUDE) {
        excludes.push(CHUNK_FINGERPRINT_EXCLUDE.to_string());
    }
}

/// The entry file of an assignment, read from disk
#[derive(Debug, Clone)]
struct EntryFile {
    path: PathBuf,
    content: Arc<String>,
    hash: String,
}

type EntryResult = std::result::Result<EntryFile, UnresolvedImport>;
type EntryTable<'s> = BTreeMap<&'s AssignmentKey, EntryResult>;

/// One module a bundle carries, for one requesting package
#[derive(Debug, Clone)]
pub struct ResolvedModule {
    pub id: String,
    pub specifier: String,
    pub package: String,
    pub is_primary: bool,
    pub mode: ImportStyle,
    pub entry: PathBuf,
    pub content: Arc<String>,
    pub content_hash: String,
}

/// Building one bundle from its resolved modules
pub struct BundleJob<'a> {
    pub bundle: &'a Bundle,
    pub modules: Vec<ResolvedModule>,
    pub transformer: &'a dyn Transformer,
    pub public_asset_url: &'a str,
    pub environment: &'a str,
}

impl BundleJob<'_> {
    /// Chunk id: 16 hex digits over module id and content
    fn chunk_id(id: &str, content_hash: &str) -> String {
        let mut hasher = ContentHasher::new();
        hasher.field(id).field(content_hash);
        hasher.finish()[..16].to_string()
    }

    fn chunk_url(&self, file_name: &str) -> String {
        let relative = file_name
            .strip_prefix(CHUNK_DIR)
            .map(|rest| rest.trim_start_matches('/'))
            .unwrap_or(file_name);
        format!("{}{}", self.public_asset_url, relative)
    }

    /// Modules handed to the transformer, one per id; eager wins over lazy
    fn unique_modules(&self) -> Vec<TransformModule> {
        let mut unique: IndexMap<&str, TransformModule> = IndexMap::new();
        for module in &self.modules {
            let entry = unique.entry(module.id.as_str()).or_insert_with(|| TransformModule {
                id: module.id.clone(),
                specifier: module.specifier.clone(),
                mode: module.mode,
                entry: module.entry.clone(),
                source: module.content.as_ref().clone(),
            });
            if module.mode == ImportStyle::Eager {
                entry.mode = ImportStyle::Eager;
            }
        }
        unique.into_values().collect()
    }

    /// `scope` for every module; `alias` for each specifier's default owner
    fn registration(&self, chunk_urls: &BTreeMap<String, String>) -> Registration {
        let mut registration = Registration::new();

        for module in &self.modules {
            registration.scope(&module.package, &module.specifier, &module.id);
        }

        let mut owners: IndexMap<&str, &ResolvedModule> = IndexMap::new();
        for module in &self.modules {
            let owner = owners.entry(module.specifier.as_str()).or_insert(module);
            if module.is_primary && !owner.is_primary {
                *owner = module;
            }
        }
        for (specifier, owner) in owners {
            registration.alias(specifier, &owner.id);
        }

        for (id, url) in chunk_urls {
            registration.chunk(id, url);
        }
        registration
    }
}

impl BuildNode for BundleJob<'_> {
    type Output = BuildArtifact;

    fn cache_key(&self) -> String {
        let mut hasher = ContentHasher::new();
        hasher
            .field(&self.bundle.name)
            .field(self.transformer.name())
            .field(self.public_asset_url)
            .field(self.environment);
        for module in &self.modules {
            hasher
                .field(&module.mode.to_string())
                .field(&module.id)
                .field(&module.specifier)
                .field(&module.package)
                .field(if module.is_primary { "primary" } else { "addon" })
                .field(module.entry.to_string_lossy().as_bytes())
                .field(&module.content_hash);
        }
        hasher.finish()
    }

    fn compute(&self) -> Result<BuildArtifact> {
        let key = self.cache_key();
        if self.modules.is_empty() {
            return Ok(BuildArtifact::empty(&self.bundle.name, &self.bundle.entrypoint, key));
        }

        let request = TransformRequest {
            bundle: self.bundle.name.clone(),
            environment: self.environment.to_string(),
            modules: self.unique_modules(),
        };
        let output = self
            .transformer
            .transform(&request)
            .map_err(|diagnostic| {
                AutoImportError::bundle_compilation(&self.bundle.name, diagnostic)
            })?;

        let mut lazy_chunks = IndexMap::new();
        let mut chunk_urls = BTreeMap::new();
        for module in request.lazy() {
            let code = output.chunks.get(&module.id).ok_or_error(|| {
                AutoImportError::bundle_compilation(
                    &self.bundle.name,
                    format!("transformer produced no chunk for '{}'", module.id),
                )
            })?;

            let resolved = Self::chunk_id(&module.id, &content_hash(module.source.as_bytes()));
            let file_name = chunk_file_name(&resolved);
            chunk_urls.insert(module.id.clone(), self.chunk_url(&file_name));
            lazy_chunks.insert(
                resolved,
                LazyChunk {
                    module_id: module.id.clone(),
                    specifier: module.specifier.clone(),
                    file_name,
                    content: wrap_payload(code),
                },
            );
        }

        let registration = self.registration(&chunk_urls);
        let mut body = output.eager.trim_end().to_string();
        if !body.is_empty() {
            body.push('\n');
        }
        body.push_str(&registration.render());

        Ok(BuildArtifact {
            bundle: self.bundle.name.clone(),
            key,
            entrypoint: self.bundle.entrypoint.clone(),
            eager_payload: wrap_payload(&body),
            eager_modules: request.eager().map(|m| m.id.clone()).collect(),
            lazy_chunks,
        })
    }
}

/// How a bundle's artifact came about
#[derive(Debug, Clone)]
pub struct BuiltBundle {
    pub artifact: Arc<BuildArtifact>,
    pub cached: bool,
}

/// One file of the build output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFile {
    /// Path relative to the output directory
    pub path: String,
    pub contents: String,
}

/// Result of building every bundle
#[derive(Debug)]
pub struct BuildOutput {
    /// In bundle declaration order
    pub bundles: IndexMap<String, Result<BuiltBundle>>,
    pub loader: String,
}

impl BuildOutput {
    pub fn artifact(&self, bundle: &str) -> Option<&BuildArtifact> {
        match self.bundles.get(bundle) {
            Some(Ok(built)) => Some(built.artifact.as_ref()),
            _ => None,
        }
    }

    pub fn error(&self, bundle: &str) -> Option<&AutoImportError> {
        match self.bundles.get(bundle) {
            Some(Err(e)) => Some(e),
            _ => None,
        }
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &AutoImportError)> {
        self.bundles
            .iter()
            .filter_map(|(name, result)| result.as_ref().err().map(|e| (name.as_str(), e)))
    }

    pub fn is_success(&self) -> bool {
        self.bundles.values().all(|r| r.is_ok())
    }

    /// Files to emit for every successful bundle
    ///
    /// Each bundle gets `entrypoints/<bundle>/loader.js` and
    /// `entrypoints/<bundle>/auto-import.js` for the host to append to its
    /// entrypoint; lazy chunks land in `assets/`.
    pub fn files(&self) -> Vec<OutputFile> {
        let mut files = Vec::new();
        let mut chunk_paths = BTreeSet::new();

        for (name, result) in &self.bundles {
            let Ok(built) = result else { continue };
            files.push(OutputFile {
                path: format!("entrypoints/{}/loader.js", name),
                contents: self.loader.clone(),
            });
            files.push(OutputFile {
                path: format!("entrypoints/{}/auto-import.js", name),
                contents: built.artifact.eager_payload.clone(),
            });
            for chunk in built.artifact.lazy_chunks.values() {
                if chunk_paths.insert(chunk.file_name.clone()) {
                    files.push(OutputFile {
                        path: chunk.file_name.clone(),
                        contents: chunk.content.clone(),
                    });
                }
            }
        }

        files
    }
}

/// Builds every bundle of a split
pub struct Bundler<'a> {
    transformer: &'a dyn Transformer,
    cache: &'a ArtifactCache,
    public_asset_url: &'a str,
    environment: &'a str,
    parallel: bool,
}

impl<'a> Bundler<'a> {
    pub fn new(
        transformer: &'a dyn Transformer,
        cache: &'a ArtifactCache,
        public_asset_url: &'a str,
        environment: &'a str,
    ) -> Self {
        Self {
            transformer,
            cache,
            public_asset_url,
            environment,
            parallel: true,
        }
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn build(&self, split: &SplitResult, bundles: &BundleConfig) -> BuildOutput {
        let entries = self.read_entries(split);

        let targets: Vec<&Bundle> = bundles.iter().collect();
        let results = parallel_process(targets, self.parallel, |bundle| {
            (bundle.name.clone(), self.build_bundle(bundle, split, &entries))
        });

        BuildOutput {
            bundles: results.into_iter().collect(),
            loader: loader_shim(),
        }
    }

    /// Resolve and read the entry file of every carried assignment once
    fn read_entries<'s>(&self, split: &'s SplitResult) -> EntryTable<'s> {
        let carried: Vec<&Assignment> = split
            .assignments
            .values()
            .filter(|a| a.placements.iter().any(|p| p.carries()))
            .collect();

        parallel_process(carried, self.parallel, |assignment| {
            (&assignment.key, Self::read_entry(assignment))
        })
        .into_iter()
        .collect()
    }

    fn read_entry(assignment: &Assignment) -> EntryResult {
        let unresolved = |reason: String| UnresolvedImport {
            specifier: assignment.key.specifier.clone(),
            consuming_file: assignment.origin.clone(),
            package: assignment.key.package.name.clone(),
            bundles: assignment
                .placements
                .iter()
                .map(|p| p.bundle.clone())
                .collect(),
            reason,
        };

        let path = assignment
            .package
            .context()
            .resolve_entry(&assignment.dependency, assignment.subpath.as_deref())
            .map_err(|e| unresolved(e.to_string()))?
            .ok_or_else(|| {
                unresolved(format!(
                    "no entry file for '{}' in {}",
                    assignment.target,
                    assignment.dependency.root.display()
                ))
            })?;

        let content = fs::read_to_string(&path)
            .map_err(|e| unresolved(format!("cannot read {}: {}", path.display(), e)))?;

        Ok(EntryFile {
            hash: content_hash(content.as_bytes()),
            content: Arc::new(content),
            path,
        })
    }

    fn build_bundle(
        &self,
        bundle: &Bundle,
        split: &SplitResult,
        entries: &EntryTable<'_>,
    ) -> Result<BuiltBundle> {
        if let Some(unresolved) = split.unresolved_for(&bundle.name) {
            return Err(unresolved.to_error());
        }
        // A shared module with no entry fails its contributors along with its carrier
        for assignment in split.referenced_by(&bundle.name) {
            if let Some(Err(unresolved)) = entries.get(&assignment.key) {
                return Err(unresolved.to_error());
            }
        }

        let mut modules = Vec::new();
        for (assignment, mode) in split.carried_by(&bundle.name) {
            let Some(Ok(entry)) = entries.get(&assignment.key) else {
                continue;
            };
            modules.push(ResolvedModule {
                id: assignment.module_id(),
                specifier: assignment.key.specifier.clone(),
                package: assignment.key.package.name.clone(),
                is_primary: assignment.package.is_primary(),
                mode,
                entry: entry.path.clone(),
                content: entry.content.clone(),
                content_hash: entry.hash.clone(),
            });
        }

        let job = BundleJob {
            bundle,
            modules,
            transformer: self.transformer,
            public_asset_url: self.public_asset_url,
            environment: self.environment,
        };

        let key = job.cache_key();
        if let Some(artifact) = self.cache.get(&key) {
            debug!(bundle = %bundle.name, "reusing cached artifact");
            return Ok(BuiltBundle {
                artifact,
                cached: true,
            });
        }

        let artifact = Arc::new(job.compute()?);
        self.cache.insert(artifact.clone());
        info!(
            bundle = %bundle.name,
            eager = artifact.eager_modules.len(),
            chunks = artifact.lazy_chunks.len(),
            "built bundle"
        );
        Ok(BuiltBundle {
            artifact,
            cached: false,
        })
    }
}
