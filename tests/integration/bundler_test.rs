//! Bundling through custom transformers

use super::fixtures::{project, settings, write};
use auto_import::core::bundler::{add_fingerprint_exclude, CHUNK_FINGERPRINT_EXCLUDE};
use auto_import::core::transform::{TransformOutput, TransformRequest, Transformer};
use auto_import::core::{ArtifactCache, AutoImport, Bundler, PassthroughTransformer};
use auto_import::error::AutoImportError;
use auto_import::Settings;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Fails every bundle named `broken`, passes the rest through
struct FailingTransformer {
    broken: &'static str,
    calls: Arc<AtomicUsize>,
}

impl Transformer for FailingTransformer {
    fn name(&self) -> &str {
        "failing"
    }

    fn transform(&self, request: &TransformRequest) -> Result<TransformOutput, String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if request.bundle == self.broken {
            return Err(format!("SyntaxError in {} modules", request.modules.len()));
        }
        PassthroughTransformer.transform(request)
    }
}

/// Returns eager code but forgets every chunk
struct ChunklessTransformer;

impl Transformer for ChunklessTransformer {
    fn name(&self) -> &str {
        "chunkless"
    }

    fn transform(&self, request: &TransformRequest) -> Result<TransformOutput, String> {
        Ok(TransformOutput {
            eager: request.eager().map(|m| format!("// {}", m.id)).collect(),
            chunks: Default::default(),
        })
    }
}

fn app_and_tests(root: &std::path::Path) {
    write(root, "app/app.js", "import _ from 'lodash';\n");
    write(root, "tests/setup.js", "import moment from 'moment';\n");
}

#[test]
fn test_transformer_failure_is_isolated_to_its_bundle() {
    let dir = project();
    app_and_tests(dir.path());

    let calls = Arc::new(AtomicUsize::new(0));
    let mut auto_import = AutoImport::new(settings(dir.path()))
        .unwrap()
        .with_transformer(Box::new(FailingTransformer {
            broken: "tests",
            calls: calls.clone(),
        }));
    auto_import.analyze_project().unwrap();
    let report = auto_import.build();

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert!(!report.is_success());

    let output = report.output.as_ref().unwrap();
    assert!(output.artifact("app").unwrap().has_module("lodash@4.17.21"));
    match output.error("tests").unwrap() {
        AutoImportError::BundleCompilation { bundle, diagnostic } => {
            assert_eq!(bundle, "tests");
            assert_eq!(diagnostic, "SyntaxError in 1 modules");
        }
        other => panic!("unexpected error: {other:?}"),
    }

    let failures = report.bundle_failures();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].0, "tests");

    let written = auto_import.emit(&report).unwrap();
    assert_eq!(written.len(), 2);
    assert!(!dir.path().join("dist/entrypoints/tests").exists());
}

#[test]
fn test_missing_chunk_is_a_compilation_error() {
    let dir = project();
    write(dir.path(), "app/app.js", "export const chart = () => import('chart.js');\n");

    let mut auto_import = AutoImport::new(settings(dir.path()))
        .unwrap()
        .with_transformer(Box::new(ChunklessTransformer));
    auto_import.analyze_project().unwrap();
    let report = auto_import.build();

    let err = report.output.as_ref().unwrap().error("app").unwrap();
    assert!(err.user_message().contains("no chunk for 'chart.js@4.4.0'"));
    // the empty tests bundle never reaches the transformer
    assert!(report.output.as_ref().unwrap().artifact("tests").unwrap().is_empty());
}

#[test]
fn test_shared_lazy_module_is_one_chunk_file() {
    let dir = project();
    write(dir.path(), "app/app.js", "export const chart = () => import('chart.js');\n");
    write(dir.path(), "tests/chart-test.js", "export const chart = () => import('chart.js');\n");

    let mut auto_import = AutoImport::new(settings(dir.path())).unwrap();
    auto_import.analyze_project().unwrap();
    let report = auto_import.build();
    let output = report.output.as_ref().unwrap();

    let app_chunk = output.artifact("app").unwrap().lazy_chunks.values().next().unwrap();
    let tests_chunk = output.artifact("tests").unwrap().lazy_chunks.values().next().unwrap();
    assert_eq!(app_chunk.file_name, tests_chunk.file_name);

    let chunk_files = output
        .files()
        .into_iter()
        .filter(|file| file.path.starts_with("assets/"))
        .count();
    assert_eq!(chunk_files, 1);
}

#[test]
fn test_key_covers_environment_and_asset_url() {
    let dir = project();
    app_and_tests(dir.path());

    let key = |settings: Settings| {
        let mut auto_import = AutoImport::new(settings).unwrap();
        auto_import.analyze_project().unwrap();
        let report = auto_import.build();
        report.output.as_ref().unwrap().artifact("app").unwrap().key.clone()
    };

    let development = key(settings(dir.path()));
    let production = key(Settings {
        environment: "production".to_string(),
        ..settings(dir.path())
    });
    let cdn = key(Settings {
        public_asset_url: "https://cdn.example.com/assets/".to_string(),
        ..settings(dir.path())
    });

    assert_ne!(development, production);
    assert_ne!(development, cdn);
    assert_ne!(production, cdn);
}

#[test]
fn test_chunk_urls_use_public_asset_url() {
    let dir = project();
    write(dir.path(), "app/app.js", "export const chart = () => import('chart.js');\n");

    let mut auto_import = AutoImport::new(Settings {
        public_asset_url: "https://cdn.example.com/static/".to_string(),
        ..settings(dir.path())
    })
    .unwrap();
    auto_import.analyze_project().unwrap();
    let report = auto_import.build();

    let app = report.output.as_ref().unwrap().artifact("app").unwrap();
    let chunk = app.lazy_chunks.values().next().unwrap();
    let file = chunk.file_name.trim_start_matches("assets/");
    assert!(app
        .eager_payload
        .contains(&format!("\"https://cdn.example.com/static/{}\"", file)));
}

#[test]
fn test_disk_cache_serves_a_fresh_process() {
    let dir = project();
    app_and_tests(dir.path());
    let cache_dir = dir.path().join(".cache");

    let cached_settings = || Settings {
        cache_enabled: true,
        cache_dir: Some(cache_dir.clone()),
        ..settings(dir.path())
    };

    let mut first = AutoImport::new(cached_settings()).unwrap();
    first.analyze_project().unwrap();
    let first_report = first.build();
    assert_eq!(first_report.cache.misses, 2);

    let mut second = AutoImport::new(cached_settings()).unwrap();
    second.analyze_project().unwrap();
    let second_report = second.build();
    assert_eq!(second_report.cache.hits, 2);
    assert!(second_report.output.as_ref().unwrap().bundles["app"].as_ref().unwrap().cached);
}

#[test]
fn test_bundler_without_a_pipeline() {
    let dir = project();
    app_and_tests(dir.path());

    let mut auto_import = AutoImport::new(settings(dir.path())).unwrap();
    auto_import.analyze_project().unwrap();
    let report = auto_import.split_only();

    let cache = ArtifactCache::disabled();
    let output = Bundler::new(&PassthroughTransformer, &cache, "/assets/", "test")
        .with_parallel(false)
        .build(&report.split, auto_import.bundles());

    assert!(output.is_success());
    assert_eq!(output.bundles.keys().collect::<Vec<_>>(), vec!["app", "tests"]);
    assert!(output.artifact("tests").unwrap().has_module("moment@2.29.4"));
}

#[test]
fn test_fingerprint_exclude_is_added_once() {
    let mut excludes = vec!["robots.txt".to_string()];
    add_fingerprint_exclude(&mut excludes);
    add_fingerprint_exclude(&mut excludes);
    assert_eq!(excludes, vec!["robots.txt".to_string(), CHUNK_FINGERPRINT_EXCLUDE.to_string()]);
    assert!(glob::Pattern::new(CHUNK_FINGERPRINT_EXCLUDE)
        .unwrap()
        .matches("assets/chunk.0123456789abcdef.js"));
}
