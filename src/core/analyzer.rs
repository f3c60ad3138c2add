//! Import analysis of package source trees
//!
//! An [`Analyzer`] scans one module tree of one package and produces the
//! external import records found in it. Parse results are cached per file by
//! content hash, so re-scanning an unchanged tree does no parsing at all.

use crate::core::node::BuildNode;
use crate::core::parallel::parallel_process;
use crate::error::Result;
use crate::models::import::{ImportRecord, RawImport};
use crate::models::package::Package;
use crate::parsers::ast_parser::ASTParser;
use crate::utils::hashing::ContentHasher;
use crate::utils::tree::{module_path, ModuleTree};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Parsing one source file
pub struct FileScan<'a> {
    parser: &'a ASTParser,
    include_require: bool,
    package: &'a str,
    module_path: String,
    content: &'a str,
}

impl BuildNode for FileScan<'_> {
    type Output = Arc<Vec<RawImport>>;

    fn cache_key(&self) -> String {
        let mut hasher = ContentHasher::new();
        hasher
            .field(if self.include_require { "require" } else { "esm" })
            .field(self.content);
        hasher.finish()
    }

    fn compute(&self) -> Result<Self::Output> {
        self.parser
            .parse_imports(&self.module_path, self.package, self.content)
            .map(Arc::new)
    }
}

#[derive(Debug, Clone)]
struct CachedFile {
    key: String,
    imports: Arc<Vec<RawImport>>,
}

/// Counters from the most recent scan
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
    pub files: usize,
    pub parsed: usize,
    pub reused: usize,
}

/// Incremental import scanner for one package tree
pub struct Analyzer {
    package: Arc<Package>,
    parser: Arc<ASTParser>,
    include_require: bool,
    parallel: bool,
    cache: HashMap<String, CachedFile>,
    stats: ScanStats,
}

impl Analyzer {
    pub fn new(package: Arc<Package>, parser: Arc<ASTParser>, include_require: bool) -> Self {
        Self {
            package,
            parser,
            include_require,
            parallel: true,
            cache: HashMap::new(),
            stats: ScanStats::default(),
        }
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn package(&self) -> &Arc<Package> {
        &self.package
    }

    pub fn stats(&self) -> ScanStats {
        self.stats
    }

    pub fn cached_files(&self) -> usize {
        self.cache.len()
    }

    /// Scan `tree` and return its external import records
    ///
    /// Records come out sorted by file path, then in source order. Any parse
    /// failure fails the whole scan.
    pub fn scan(&mut self, tree: &dyn ModuleTree) -> Result<Vec<ImportRecord>> {
        let files = tree.files()?;
        let package_name = self.package.name().to_string();

        let scans: Vec<FileScan<'_>> = files
            .iter()
            .map(|file| FileScan {
                parser: &self.parser,
                include_require: self.include_require,
                package: &package_name,
                module_path: module_path(&package_name, tree.mount(), &file.path),
                content: &file.content,
            })
            .collect();

        let mut fresh: HashMap<String, CachedFile> = HashMap::with_capacity(scans.len());
        let mut pending = Vec::new();
        for scan in &scans {
            let key = scan.cache_key();
            match self.cache.get(&scan.module_path) {
                Some(cached) if cached.key == key => {
                    debug!(file = %scan.module_path, "reusing parse result");
                    fresh.insert(scan.module_path.clone(), cached.clone());
                }
                _ => pending.push((scan, key)),
            }
        }

        let reused = fresh.len();
        let parsed = pending.len();

        let results = parallel_process(pending, self.parallel, |(scan, key)| {
            scan.compute().map(|imports| (scan.module_path.clone(), CachedFile { key, imports }))
        });

        // Files that left the tree are dropped here
        let mut first_error = None;
        for result in results {
            match result {
                Ok((path, cached)) => {
                    fresh.insert(path, cached);
                }
                Err(e) if first_error.is_none() => first_error = Some(e),
                Err(_) => {}
            }
        }
        self.cache = fresh;
        self.stats = ScanStats {
            files: scans.len(),
            parsed,
            reused,
        };

        if let Some(err) = first_error {
            return Err(err);
        }

        let mut records = Vec::new();
        for scan in &scans {
            let Some(cached) = self.cache.get(&scan.module_path) else { continue };
            for import in cached.imports.iter() {
                if !self.package.is_external(&import.specifier) {
                    continue;
                }
                records.push(ImportRecord {
                    specifier: import.specifier.clone(),
                    consuming_file: scan.module_path.clone(),
                    package: self.package.clone(),
                    style: import.style,
                    line: import.line,
                });
            }
        }

        debug!(
            package = %package_name,
            tree = %tree.describe(),
            files = self.stats.files,
            parsed,
            reused,
            records = records.len(),
            "scanned tree"
        );

        Ok(records)
    }
}
