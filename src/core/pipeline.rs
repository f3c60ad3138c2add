//! Build orchestration
//!
//! [`AutoImport`] owns everything one host build needs: the package registry,
//! one analyzer per registered tree, the bundle configuration and the
//! artifact cache. The host drives it explicitly:
//!
//! 1. [`AutoImport::analyze`] once per package tree,
//! 2. [`AutoImport::build`] after every tree is registered,
//! 3. [`AutoImport::emit`] to write the successful bundles.
//!
//! A later `build` on the same instance rescans incrementally and reuses
//! cached artifacts for bundles whose inputs did not change.

use crate::core::analyzer::{Analyzer, ScanStats};
use crate::core::bundler::{BuildOutput, Bundler};
use crate::core::cache::{ArtifactCache, CacheStats};
use crate::core::parallel::parallel_for_each_mut;
use crate::core::registry::PackageRegistry;
use crate::core::splitter::Splitter;
use crate::core::transform::{CommandTransformer, PassthroughTransformer, Transformer};
use crate::error::{AutoImportError, ErrorSeverity, Result};
use crate::models::assignment::{SplitResult, UnresolvedImport};
use crate::models::bundle::BundleConfig;
use crate::models::config::Settings;
use crate::models::import::ImportRecord;
use crate::models::package::{PackageHandle, PackageId, PackageOptions};
use crate::parsers::ast_parser::ASTParser;
use crate::utils::tree::{FsTree, ModuleTree};
use glob::Pattern;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// One registered tree and the analyzer that scans it
struct TreeSlot {
    package: PackageId,
    label: String,
    tree: Box<dyn ModuleTree>,
    analyzer: Analyzer,
    records: Vec<ImportRecord>,
    failure: Option<AutoImportError>,
}

impl TreeSlot {
    fn scan(&mut self) {
        match self.analyzer.scan(self.tree.as_ref()) {
            Ok(records) => {
                self.records = records;
                self.failure = None;
            }
            Err(e) => {
                self.records.clear();
                self.failure = Some(e);
            }
        }
    }
}

/// Everything one build produced
#[derive(Debug)]
pub struct BuildReport {
    pub environment: String,
    /// Every configured bundle, in declaration order
    pub bundle_names: Vec<String>,
    pub split: SplitResult,
    /// `None` for a dry run
    pub output: Option<BuildOutput>,
    /// One per package tree that failed to parse; that package's records were withheld
    pub parse_failures: Vec<AutoImportError>,
    pub scan: ScanStats,
    pub cache: CacheStats,
}

impl BuildReport {
    pub fn unresolved(&self) -> &[UnresolvedImport] {
        &self.split.unresolved
    }

    /// Bundles that produced no artifact, in declaration order
    pub fn bundle_failures(&self) -> Vec<(&str, &AutoImportError)> {
        self.output
            .as_ref()
            .map(|output| output.failures().collect())
            .unwrap_or_default()
    }

    /// Every error of the build, parse failures first
    pub fn errors(&self) -> Vec<&AutoImportError> {
        let mut errors: Vec<&AutoImportError> = self.parse_failures.iter().collect();
        errors.extend(self.bundle_failures().into_iter().map(|(_, e)| e));
        errors
    }

    pub fn is_success(&self) -> bool {
        self.parse_failures.is_empty()
            && self.split.unresolved.is_empty()
            && self.output.as_ref().is_none_or(|output| output.is_success())
    }

    /// Worst severity among the errors, `None` on success
    pub fn severity(&self) -> Option<ErrorSeverity> {
        let worst = self.errors().into_iter().map(|e| e.severity()).max();
        match worst {
            None if !self.split.unresolved.is_empty() => Some(ErrorSeverity::Error),
            other => other,
        }
    }
}

/// One host build: registry, analyzers, bundles and cache
pub struct AutoImport {
    settings: Settings,
    bundles: BundleConfig,
    exclude: Vec<Pattern>,
    registry: PackageRegistry,
    parser: Arc<ASTParser>,
    cache: ArtifactCache,
    transformer: Box<dyn Transformer>,
    slots: Vec<TreeSlot>,
}

impl AutoImport {
    /// Validate the build-affecting settings and set up an empty build
    pub fn new(settings: Settings) -> Result<Self> {
        let bundles = BundleConfig::from_specs(&settings.bundles)?;
        let exclude = compile_globs(&settings.exclude)?;
        if !settings.public_asset_url.ends_with('/') {
            return Err(AutoImportError::config_error(format!(
                "public_asset_url '{}' must end with '/'",
                settings.public_asset_url
            )));
        }

        let transformer = transformer_for(&settings);
        let parser = Arc::new(ASTParser::new().with_require(settings.include_require));
        let cache = ArtifactCache::new(settings.cache_enabled, settings.cache_dir.clone());

        Ok(Self {
            registry: PackageRegistry::new(settings.host_managed_keyword.clone()),
            settings,
            bundles,
            exclude,
            parser,
            cache,
            transformer,
            slots: Vec::new(),
        })
    }

    /// Replace the transformer chosen from settings
    pub fn with_transformer(mut self, transformer: Box<dyn Transformer>) -> Self {
        self.transformer = transformer;
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn bundles(&self) -> &BundleConfig {
        &self.bundles
    }

    pub fn registry(&self) -> &PackageRegistry {
        &self.registry
    }

    pub fn cache(&self) -> &ArtifactCache {
        &self.cache
    }

    pub fn transformer_name(&self) -> &str {
        self.transformer.name()
    }

    /// Number of registered trees
    pub fn tree_count(&self) -> usize {
        self.slots.len()
    }

    /// Register a package tree for analysis
    ///
    /// Registering the same tree of the same package again replaces the tree
    /// but keeps the analyzer, so unchanged files are not parsed twice.
    pub fn analyze(&mut self, handle: &PackageHandle, tree: Box<dyn ModuleTree>) -> Result<()> {
        let package = self.registry.lookup(handle)?;
        let label = format!("{}:{}", tree.mount(), tree.describe());

        if let Some(slot) = self
            .slots
            .iter_mut()
            .find(|slot| &slot.package == package.id() && slot.label == label)
        {
            slot.tree = tree;
            return Ok(());
        }

        let analyzer =
            Analyzer::new(package.clone(), self.parser.clone(), self.settings.include_require)
                .with_parallel(self.settings.parallel);
        self.slots.push(TreeSlot {
            package: package.id().clone(),
            label,
            tree,
            analyzer,
            records: Vec::new(),
            failure: None,
        });
        Ok(())
    }

    /// Register the primary package and every addon with their configured trees
    pub fn analyze_project(&mut self) -> Result<()> {
        let root = self.settings.project_root.clone();
        let primary = PackageHandle::primary(&root).with_options(PackageOptions {
            alias: self.settings.alias.clone(),
            exclude: Vec::new(),
        });
        for spec in self.settings.app_trees.clone() {
            self.analyze(&primary, Box::new(FsTree::new(root.join(&spec.dir), spec.mount)))?;
        }

        for addon in self.settings.addons.clone() {
            let addon_root = resolve_from(&root, &addon);
            let handle = PackageHandle::addon(&addon_root);
            for spec in self.settings.addon_trees.clone() {
                self.analyze(
                    &handle,
                    Box::new(FsTree::new(addon_root.join(&spec.dir), spec.mount)),
                )?;
            }
        }
        Ok(())
    }

    /// Scan every tree and split, without bundling
    pub fn split_only(&mut self) -> BuildReport {
        let (split, parse_failures, scan) = self.scan_and_split();
        BuildReport {
            environment: self.settings.environment.clone(),
            bundle_names: self.bundles.names().map(str::to_string).collect(),
            split,
            output: None,
            parse_failures,
            scan,
            cache: self.cache.stats(),
        }
    }

    /// Scan, split and bundle
    pub fn build(&mut self) -> BuildReport {
        let (split, parse_failures, scan) = self.scan_and_split();

        let output = Bundler::new(
            self.transformer.as_ref(),
            &self.cache,
            &self.settings.public_asset_url,
            &self.settings.environment,
        )
        .with_parallel(self.settings.parallel)
        .build(&split, &self.bundles);

        let cache = self.cache.stats();
        info!(
            bundles = output.bundles.len(),
            failed = output.failures().count(),
            cache_hits = cache.hits,
            "build finished"
        );

        BuildReport {
            environment: self.settings.environment.clone(),
            bundle_names: self.bundles.names().map(str::to_string).collect(),
            split,
            output: Some(output),
            parse_failures,
            scan,
            cache,
        }
    }

    /// Write the successful bundles of `report` under the configured output directory
    pub fn emit(&self, report: &BuildReport) -> Result<Vec<PathBuf>> {
        let Some(output) = &report.output else {
            return Ok(Vec::new());
        };
        crate::output::writers::write_build_output(output, &self.settings.output_dir)
    }

    fn scan_and_split(&mut self) -> (SplitResult, Vec<AutoImportError>, ScanStats) {
        parallel_for_each_mut(&mut self.slots, self.settings.parallel, TreeSlot::scan);

        let failed: BTreeSet<&PackageId> = self
            .slots
            .iter()
            .filter(|slot| slot.failure.is_some())
            .map(|slot| &slot.package)
            .collect();

        let records: Vec<ImportRecord> = self
            .slots
            .iter()
            .filter(|slot| !failed.contains(&slot.package))
            .flat_map(|slot| slot.records.iter().cloned())
            .collect();

        let mut scan = ScanStats::default();
        for slot in &self.slots {
            let stats = slot.analyzer.stats();
            scan.files += stats.files;
            scan.parsed += stats.parsed;
            scan.reused += stats.reused;
        }

        info!(
            trees = self.slots.len(),
            files = scan.files,
            parsed = scan.parsed,
            records = records.len(),
            withheld_packages = failed.len(),
            "analysis finished"
        );

        let split = Splitter::new(&self.bundles, self.exclude.clone()).split(&records);
        info!(
            assignments = split.assignments.len(),
            placements = split.placement_count(),
            unresolved = split.unresolved.len(),
            skipped = split.skipped.len(),
            "split finished"
        );

        let parse_failures = self
            .slots
            .iter_mut()
            .filter_map(|slot| slot.failure.take())
            .collect();

        (split, parse_failures, scan)
    }
}

/// Transformer named by the settings: an external command, else passthrough
pub fn transformer_for(settings: &Settings) -> Box<dyn Transformer> {
    settings
        .transformer_command
        .as_deref()
        .and_then(CommandTransformer::from_argv)
        .map(|command| Box::new(command) as Box<dyn Transformer>)
        .unwrap_or_else(|| Box::new(PassthroughTransformer))
}

fn compile_globs(patterns: &[String]) -> Result<Vec<Pattern>> {
    patterns
        .iter()
        .map(|pattern| {
            Pattern::new(pattern).map_err(|e| {
                AutoImportError::config_error(format!("invalid exclude pattern '{}': {}", pattern, e))
            })
        })
        .collect()
}

fn resolve_from(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::bundle::BundleSpec;

    #[test]
    fn test_new_rejects_bad_settings() {
        let settings = Settings {
            public_asset_url: "/assets".to_string(),
            ..Settings::default()
        };
        assert!(AutoImport::new(settings).err().unwrap().is_critical());

        let settings = Settings {
            exclude: vec!["[".to_string()],
            ..Settings::default()
        };
        assert!(AutoImport::new(settings).err().unwrap().is_configuration());

        let settings = Settings {
            bundles: vec![BundleSpec::new("app", &["**"], "a.js").with_base("missing")],
            ..Settings::default()
        };
        assert!(AutoImport::new(settings).is_err());
    }

    #[test]
    fn test_transformer_selection() {
        assert_eq!(transformer_for(&Settings::default()).name(), "passthrough");

        let settings = Settings {
            transformer_command: Some(vec!["node".to_string(), "bundle.js".to_string()]),
            ..Settings::default()
        };
        assert_eq!(transformer_for(&settings).name(), "command:node bundle.js");

        let settings = Settings {
            transformer_command: Some(Vec::new()),
            ..Settings::default()
        };
        assert_eq!(transformer_for(&settings).name(), "passthrough");
    }

    #[test]
    fn test_empty_build_succeeds() {
        let mut auto_import = AutoImport::new(Settings::default()).unwrap();
        assert_eq!(auto_import.transformer_name(), "passthrough");
        assert_eq!(auto_import.tree_count(), 0);
        let report = auto_import.build();
        assert!(report.is_success());
        assert_eq!(report.severity(), None);
        let output = report.output.as_ref().unwrap();
        assert_eq!(output.bundles.len(), 2);
        assert!(output.artifact("app").unwrap().is_empty());
    }
}
