//! Splitter behavior over records produced by a real scan

use super::fixtures::{install, project, write};
use auto_import::core::{Analyzer, PackageRegistry, Splitter};
use auto_import::models::assignment::SkipReason;
use auto_import::models::bundle::{default_bundle_specs, BundleConfig};
use auto_import::models::import::ImportRecord;
use auto_import::models::package::PackageHandle;
use auto_import::parsers::ASTParser;
use auto_import::utils::tree::{FsTree, MemoryTree};
use std::sync::Arc;

fn records(root: &std::path::Path) -> Vec<ImportRecord> {
    let registry = PackageRegistry::new("ember-addon");
    let package = registry.lookup(&PackageHandle::primary(root)).unwrap();
    let parser = Arc::new(ASTParser::new());

    let mut records = Vec::new();
    for (dir, mount) in [("app", ""), ("tests", "tests")] {
        let mut analyzer = Analyzer::new(package.clone(), parser.clone(), false);
        records.extend(analyzer.scan(&FsTree::new(root.join(dir), mount)).unwrap());
    }
    records
}

fn mixed_project() -> tempfile::TempDir {
    let dir = project();
    let root = dir.path();
    write(
        root,
        "app/app.js",
        "import _ from 'lodash';\nimport Chart from 'chart.js';\nimport pad from 'left-pad';\n",
    );
    write(root, "app/routes/chart.js", "export default () => import('chart.js');\n");
    write(root, "app/utils/dates.js", "export const load = () => import('moment');\n");
    write(root, "tests/unit/dates-test.js", "import moment from 'moment';\nimport _ from 'lodash';\n");
    dir
}

#[test]
fn test_split_ignores_record_order() {
    let dir = mixed_project();
    let bundles = BundleConfig::from_specs(&default_bundle_specs()).unwrap();
    let splitter = Splitter::new(&bundles, Vec::new());

    let records = records(dir.path());
    assert!(records.len() >= 7);
    let expected = splitter.split(&records);

    let mut reversed = records.clone();
    reversed.reverse();
    assert_eq!(splitter.split(&reversed), expected);

    for shift in 1..records.len() {
        let mut rotated = records.clone();
        rotated.rotate_left(shift);
        assert_eq!(splitter.split(&rotated), expected);
    }

    // Odd positions first, then even
    let interleaved: Vec<ImportRecord> = records
        .iter()
        .skip(1)
        .step_by(2)
        .chain(records.iter().step_by(2))
        .cloned()
        .collect();
    assert_eq!(splitter.split(&interleaved), expected);
}

#[test]
fn test_split_of_mixed_project() {
    let dir = mixed_project();
    let bundles = BundleConfig::from_specs(&default_bundle_specs()).unwrap();
    let split = Splitter::new(&bundles, Vec::new()).split(&records(dir.path()));

    let placements = |specifier: &str| {
        split
            .assignments
            .values()
            .find(|a| a.key.specifier == specifier)
            .unwrap()
            .placements
            .iter()
            .map(|p| (p.bundle.clone(), p.carriage.to_string()))
            .collect::<Vec<_>>()
    };

    assert_eq!(placements("chart.js"), vec![("app".to_string(), "eager".to_string())]);
    assert_eq!(
        placements("moment"),
        vec![
            ("app".to_string(), "lazy".to_string()),
            ("tests".to_string(), "eager".to_string())
        ]
    );
    assert_eq!(
        placements("lodash"),
        vec![
            ("app".to_string(), "eager".to_string()),
            ("tests".to_string(), "eager".to_string())
        ]
    );

    assert_eq!(split.unresolved.len(), 1);
    assert_eq!(split.unresolved[0].specifier, "left-pad");
    assert_eq!(split.unresolved[0].consuming_file, "my-app/app.js:3");
}

#[test]
fn test_excluded_and_host_managed_are_skipped() {
    let dir = project();
    let root = dir.path();
    write(
        root,
        "package.json",
        r#"{"name":"my-app","version":"1.0.0","dependencies":{"lodash":"*","ember-data":"*","moment":"*"}}"#,
    );
    write(
        root,
        "node_modules/ember-data/package.json",
        r#"{"name":"ember-data","version":"5.3.0","keywords":["ember-addon"]}"#,
    );
    install(root, "moment", "2.29.4");

    let registry = PackageRegistry::new("ember-addon");
    let package = registry.lookup(&PackageHandle::primary(root)).unwrap();
    let mut analyzer = Analyzer::new(package, Arc::new(ASTParser::new()), false);
    let records = analyzer
        .scan(&MemoryTree::new("").with_file(
            "app.js",
            "import _ from 'lodash';\nimport Store from 'ember-data/store';\nimport 'moment/locale/fr';\n",
        ))
        .unwrap();

    let bundles = BundleConfig::from_specs(&default_bundle_specs()).unwrap();
    let exclude = vec![glob::Pattern::new("moment").unwrap()];
    let split = Splitter::new(&bundles, exclude).split(&records);

    assert_eq!(split.assignments.len(), 1);
    let skipped: Vec<(&str, SkipReason)> = split
        .skipped
        .iter()
        .map(|s| (s.specifier.as_str(), s.reason))
        .collect();
    assert_eq!(
        skipped,
        vec![
            ("ember-data/store", SkipReason::HostManaged),
            ("moment/locale/fr", SkipReason::Excluded)
        ]
    );
    assert!(split.unresolved.is_empty());
}
