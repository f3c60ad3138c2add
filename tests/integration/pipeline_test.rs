//! End-to-end builds over projects on disk

use super::fixtures::{install, project, settings, shared_bundles, write};
use auto_import::core::{AutoImport, BuildReport};
use auto_import::Settings;
use auto_import::error::AutoImportError;
use auto_import::models::assignment::Carriage;
use auto_import::models::import::ImportStyle;
use std::fs;
use std::path::{Path, PathBuf};

fn build(root: &Path) -> (AutoImport, BuildReport) {
    let mut auto_import = AutoImport::new(settings(root)).unwrap();
    auto_import.analyze_project().unwrap();
    let report = auto_import.build();
    (auto_import, report)
}

#[test]
fn test_single_bundle_import_has_one_placement() {
    let dir = project();
    write(dir.path(), "node_modules/lodash/chunk.js", "module.exports = function chunk() {};\n");
    write(dir.path(), "app/app.js", "import chunk from 'lodash/chunk';\nchunk([1, 2], 1);\n");
    write(dir.path(), "app/lib/other.js", "import { get } from 'lodash/chunk';\n");

    let (_, report) = build(dir.path());
    assert!(report.is_success(), "{:?}", report.errors());

    let assignment = report
        .split
        .assignments
        .values()
        .find(|a| a.key.specifier == "lodash/chunk")
        .unwrap();
    assert_eq!(assignment.placements.len(), 1);
    assert_eq!(assignment.placements[0].bundle, "app");
    assert_eq!(assignment.placements[0].carriage, Carriage::Carried(ImportStyle::Eager));
    assert_eq!(
        assignment.placements[0].consumers,
        vec!["my-app/app.js".to_string(), "my-app/lib/other.js".to_string()]
    );
    assert_eq!(assignment.module_id(), "lodash/chunk@4.17.21");
    assert_eq!(assignment.origin, "my-app/app.js:1");
}

#[test]
fn test_eager_and_lazy_across_bundles() {
    let dir = project();
    write(dir.path(), "app/app.js", "import _ from 'lodash';\n");
    write(
        dir.path(),
        "tests/unit/app-test.js",
        "export async function setup() {\n  const _ = await import('lodash');\n  return _;\n}\n",
    );

    let (_, report) = build(dir.path());
    let output = report.output.as_ref().unwrap();

    let app = output.artifact("app").unwrap();
    assert_eq!(app.eager_modules, vec!["lodash@4.17.21".to_string()]);
    assert!(app.lazy_chunks.is_empty());

    let tests = output.artifact("tests").unwrap();
    assert!(tests.eager_modules.is_empty());
    let chunk = tests.lazy_chunks.values().next().unwrap();
    assert_eq!(chunk.module_id, "lodash@4.17.21");
    assert!(chunk.file_name.starts_with("assets/chunk."));
    assert!(tests.eager_payload.contains("loader.chunk(\"lodash@4.17.21\", \"/assets/chunk."));
}

#[test]
fn test_mode_is_never_downgraded_within_a_bundle() {
    let dir = project();
    write(dir.path(), "app/a.js", "export const later = () => import('chart.js');\n");
    write(dir.path(), "app/b.js", "import Chart from 'chart.js';\n");

    let (_, report) = build(dir.path());
    let app = report.output.as_ref().unwrap().artifact("app").unwrap();

    assert_eq!(app.eager_modules, vec!["chart.js@4.4.0".to_string()]);
    assert!(app.lazy_chunks.is_empty());
}

#[test]
fn test_test_only_import_stays_out_of_app() {
    let dir = project();
    write(dir.path(), "app/app.js", "import Chart from 'chart.js';\n");
    write(dir.path(), "tests/helpers/setup.js", "import _ from 'lodash';\n");

    let (_, report) = build(dir.path());
    let output = report.output.as_ref().unwrap();

    let app = output.artifact("app").unwrap();
    assert!(!app.mentions_specifier("lodash"));
    assert!(!app.eager_payload.contains("lodash"));

    let tests = output.artifact("tests").unwrap();
    assert!(tests.has_module("lodash@4.17.21"));
    assert!(!tests.mentions_specifier("chart.js"));
}

#[test]
fn test_unresolved_import_fails_only_its_bundles() {
    let dir = project();
    write(dir.path(), "app/app.js", "import _ from 'lodash';\nimport pad from 'left-pad';\n");
    write(dir.path(), "tests/setup.js", "import moment from 'moment';\n");

    let (auto_import, report) = build(dir.path());
    assert!(!report.is_success());
    assert_eq!(report.unresolved().len(), 1);

    let output = report.output.as_ref().unwrap();
    assert!(output.artifact("app").is_none());
    match output.error("app").unwrap() {
        AutoImportError::UnresolvedImport {
            specifier,
            file,
            package,
            ..
        } => {
            assert_eq!(specifier, "left-pad");
            assert_eq!(file, "my-app/app.js:2");
            assert_eq!(package, "my-app");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(output.error("app").unwrap().suggestion().unwrap().contains("left-pad"));

    // devDependencies of the app are resolvable
    assert!(output.artifact("tests").unwrap().has_module("moment@2.29.4"));

    let written = auto_import.emit(&report).unwrap();
    assert!(written.iter().all(|path| !path.to_string_lossy().contains("entrypoints/app")));
    assert!(dir.path().join("dist/entrypoints/tests/auto-import.js").is_file());
    assert!(!dir.path().join("dist/entrypoints/app").exists());
}

#[test]
fn test_declared_but_missing_dependency_is_unresolved() {
    let dir = project();
    fs::remove_dir_all(dir.path().join("node_modules/chart.js")).unwrap();
    write(dir.path(), "app/app.js", "import Chart from 'chart.js';\n");

    let (_, report) = build(dir.path());
    let unresolved = &report.unresolved()[0];
    assert_eq!(unresolved.specifier, "chart.js");
    assert!(unresolved.reason.contains("not installed"));
    assert_eq!(unresolved.bundles, vec!["app".to_string()]);
}

#[test]
fn test_parse_failure_withholds_the_package() {
    let dir = project();
    write(dir.path(), "app/app.js", "import _ from 'lodash';\n");
    write(dir.path(), "tests/broken.js", "import { from 'chart.js';\n");

    let (_, report) = build(dir.path());
    assert!(!report.is_success());
    assert_eq!(report.parse_failures.len(), 1);
    match &report.parse_failures[0] {
        AutoImportError::Parse { file, package, .. } => {
            assert_eq!(file, "my-app/tests/broken.js");
            assert_eq!(package, "my-app");
        }
        other => panic!("unexpected error: {other:?}"),
    }

    // Every record of my-app is withheld, the app tree's included
    assert!(report.split.assignments.is_empty());
    assert!(report.output.as_ref().unwrap().artifact("app").unwrap().is_empty());
}

#[test]
fn test_rebuild_hits_the_cache() {
    let dir = project();
    write(dir.path(), "app/app.js", "import _ from 'lodash';\n");

    let mut auto_import = AutoImport::new(Settings {
        cache_enabled: true,
        ..settings(dir.path())
    })
    .unwrap();
    auto_import.analyze_project().unwrap();

    let first = auto_import.build();
    let second = auto_import.build();

    let key = |report: &BuildReport| {
        report.output.as_ref().unwrap().artifact("app").unwrap().key.clone()
    };
    assert_eq!(key(&first), key(&second));

    let built = second.output.as_ref().unwrap().bundles["app"].as_ref().unwrap();
    assert!(built.cached);
    assert!(second.cache.hits >= 2);
    assert_eq!(second.scan.parsed, 0);
    assert_eq!(second.scan.reused, 1);
}

#[test]
fn test_new_dependency_version_changes_the_key() {
    let dir = project();
    write(dir.path(), "app/app.js", "import _ from 'lodash';\n");

    let (_, before) = build(dir.path());
    let (_, unchanged) = build(dir.path());
    install(dir.path(), "lodash", "4.17.22");
    let (_, after) = build(dir.path());

    let app = |report: &BuildReport| {
        report.output.as_ref().unwrap().artifact("app").unwrap().clone()
    };
    assert_eq!(app(&before).key, app(&unchanged).key);
    assert_ne!(app(&before).key, app(&after).key);
    assert_eq!(app(&after).eager_modules, vec!["lodash@4.17.22".to_string()]);
}

#[test]
fn test_base_bundle_carries_shared_dependency() {
    let dir = project();
    write(dir.path(), "app/app.js", "export const load = () => import('lodash');\n");
    write(dir.path(), "tests/setup.js", "import _ from 'lodash';\nimport moment from 'moment';\n");

    let mut auto_import = AutoImport::new(Settings {
        bundles: shared_bundles(),
        ..settings(dir.path())
    })
    .unwrap();
    auto_import.analyze_project().unwrap();
    let report = auto_import.build();
    assert!(report.is_success(), "{:?}", report.errors());

    let lodash = report
        .split
        .assignments
        .values()
        .find(|a| a.key.specifier == "lodash")
        .unwrap();
    assert_eq!(
        lodash.placement("app").unwrap().carriage,
        Carriage::Carried(ImportStyle::Eager)
    );
    assert_eq!(
        lodash.placement("tests").unwrap().carriage,
        Carriage::Shared {
            carrier: "app".to_string()
        }
    );

    let output = report.output.as_ref().unwrap();
    assert_eq!(output.artifact("app").unwrap().eager_modules, vec!["lodash@4.17.21".to_string()]);
    let tests = output.artifact("tests").unwrap();
    assert!(!tests.has_module("lodash@4.17.21"));
    assert!(tests.has_module("moment@2.29.4"));
}

#[test]
fn test_addon_resolves_its_own_versions() {
    let dir = project();
    let root = dir.path();
    write(root, "app/app.js", "import _ from 'lodash';\n");
    write(
        root,
        "lib/my-addon/package.json",
        r#"{"name":"my-addon","version":"0.1.0","dependencies":{"lodash":"^3.0.0"}}"#,
    );
    install(&root.join("lib/my-addon"), "lodash", "3.10.1");
    write(root, "lib/my-addon/addon/index.js", "import _ from 'lodash';\n");

    let mut auto_import = AutoImport::new(Settings {
        addons: vec![PathBuf::from("lib/my-addon")],
        ..settings(root)
    })
    .unwrap();
    auto_import.analyze_project().unwrap();
    assert_eq!(auto_import.registry().len(), 2);
    assert_eq!(auto_import.tree_count(), 3);

    let report = auto_import.build();
    assert!(report.is_success(), "{:?}", report.errors());
    assert_eq!(report.split.assignments.len(), 2);

    let app = report.output.as_ref().unwrap().artifact("app").unwrap();
    assert!(app.has_module("lodash@4.17.21"));
    assert!(app.has_module("lodash@3.10.1"));
    assert!(app
        .eager_payload
        .contains("loader.scope(\"my-addon\", \"lodash\", \"lodash@3.10.1\");"));
    // The app's own copy answers unscoped lookups
    assert!(app.eager_payload.contains("loader.alias(\"lodash\", \"lodash@4.17.21\");"));
}

#[test]
fn test_emit_writes_loader_payload_and_chunks() {
    let dir = project();
    write(
        dir.path(),
        "app/app.js",
        "import _ from 'lodash';\nexport const chart = () => import('chart.js');\n",
    );

    let (auto_import, report) = build(dir.path());
    let written = auto_import.emit(&report).unwrap();
    assert_eq!(written.len(), 5);

    let dist = dir.path().join("dist");
    let loader = fs::read_to_string(dist.join("entrypoints/app/loader.js")).unwrap();
    assert!(loader.contains("__auto_import_protocol_v1__"));
    assert_eq!(
        loader,
        fs::read_to_string(dist.join("entrypoints/tests/loader.js")).unwrap()
    );

    let chunk = report
        .output
        .as_ref()
        .unwrap()
        .artifact("app")
        .unwrap()
        .lazy_chunks
        .values()
        .next()
        .unwrap()
        .clone();
    let chunk_source = fs::read_to_string(dist.join(&chunk.file_name)).unwrap();
    assert!(chunk_source.contains("loader.define(\"chart.js@4.4.0\""));
    assert!(chunk_source.contains("module.exports = { name: 'chart.js'"));
}

#[test]
fn test_missing_shared_entry_fails_every_referencing_bundle() {
    let dir = project();
    let root = dir.path();
    write(
        root,
        "package.json",
        r#"{"name":"my-app","version":"1.0.0","dependencies":{"noentry":"*"}}"#,
    );
    write(
        root,
        "node_modules/noentry/package.json",
        r#"{"name":"noentry","version":"1.0.0","main":"missing.js"}"#,
    );
    write(root, "app/app.js", "import thing from 'noentry';\n");
    write(root, "tests/setup.js", "import thing from 'noentry';\n");

    let mut auto_import = AutoImport::new(Settings {
        bundles: shared_bundles(),
        ..settings(root)
    })
    .unwrap();
    auto_import.analyze_project().unwrap();
    let report = auto_import.build();
    assert!(!report.is_success());

    let noentry = report
        .split
        .assignments
        .values()
        .find(|a| a.key.specifier == "noentry")
        .unwrap();
    assert_eq!(
        noentry.placement("tests").unwrap().carriage,
        Carriage::Shared {
            carrier: "app".to_string()
        }
    );

    let output = report.output.as_ref().unwrap();
    for bundle in ["app", "tests"] {
        assert!(output.artifact(bundle).is_none(), "{} was built", bundle);
        match output.error(bundle).unwrap() {
            AutoImportError::UnresolvedImport { specifier, .. } => assert_eq!(specifier, "noentry"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    let written = auto_import.emit(&report).unwrap();
    assert!(written.is_empty());
    assert!(!root.join("dist/entrypoints/tests").exists());
}

#[test]
fn test_failed_rebuild_removes_stale_output() {
    let dir = project();
    let root = dir.path();
    write(
        root,
        "app/app.js",
        "import _ from 'lodash';\nexport const chart = () => import('chart.js');\n",
    );
    write(root, "tests/setup.js", "import moment from 'moment';\n");

    let (auto_import, report) = build(root);
    auto_import.emit(&report).unwrap();

    let dist = root.join("dist");
    let app = report.output.as_ref().unwrap().artifact("app").unwrap();
    let chunk = app.lazy_chunks.values().next().unwrap().file_name.clone();
    assert!(dist.join("entrypoints/app/auto-import.js").is_file());
    assert!(dist.join(&chunk).is_file());
    write(&dist, "assets/logo.svg", "<svg/>");

    write(root, "app/app.js", "import _ from 'lodash';\nimport pad from 'left-pad';\n");
    let (auto_import, report) = build(root);
    assert!(report.output.as_ref().unwrap().error("app").is_some());
    auto_import.emit(&report).unwrap();

    assert!(!dist.join("entrypoints/app").exists());
    assert!(!dist.join(&chunk).exists());
    assert!(dist.join("assets/logo.svg").is_file());
    assert!(dist.join("entrypoints/tests/auto-import.js").is_file());
}
