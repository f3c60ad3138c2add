//! Command-line runs against projects on disk

use super::fixtures::{project, write};
use auto_import::cli::{Args, Command};
use clap::Parser;
use std::fs;
use std::path::Path;

fn command(root: &Path, extra: &[&str]) -> Command {
    let config = root.join("auto-import.toml");
    let out_dir = root.join("dist");
    let mut argv = vec![
        "auto-import".to_string(),
        "--path".to_string(),
        root.display().to_string(),
        "--config".to_string(),
        config.display().to_string(),
        "--out-dir".to_string(),
        out_dir.display().to_string(),
        "--no-progress".to_string(),
        "--no-colors".to_string(),
        "--no-cache".to_string(),
    ];
    argv.extend(extra.iter().map(|s| s.to_string()));
    Command::from_args(Args::parse_from(argv))
}

fn report(root: &Path) -> serde_json::Value {
    serde_json::from_str(&fs::read_to_string(root.join("report.json")).unwrap()).unwrap()
}

#[test]
fn test_build_writes_output_and_report() {
    let dir = project();
    let root = dir.path();
    write(root, "auto-import.toml", "environment = \"ci\"\nexclude = [\"moment\"]\n");
    write(root, "app/app.js", "import _ from 'lodash';\n");
    write(root, "tests/setup.js", "import moment from 'moment';\n");

    let report_path = root.join("report.json");
    let code = command(
        root,
        &["--output", "json", "--output-file", report_path.to_str().unwrap()],
    )
    .run();
    assert_eq!(code, 0);

    let report = report(root);
    assert_eq!(report["success"], true);
    assert_eq!(report["environment"], "ci");
    assert_eq!(report["skipped"][0]["specifier"], "moment");
    assert_eq!(report["skipped"][0]["reason"], "excluded");
    assert_eq!(report["bundles"][0]["eager"][0], "lodash@4.17.21");

    assert!(root.join("dist/entrypoints/app/auto-import.js").is_file());
    assert!(root.join("dist/entrypoints/app/loader.js").is_file());
}

#[test]
fn test_flags_override_the_config_file() {
    let dir = project();
    let root = dir.path();
    write(root, "auto-import.toml", "environment = \"ci\"\nexclude = [\"moment\"]\n");
    write(root, "tests/setup.js", "import moment from 'moment';\n");

    let report_path = root.join("report.json");
    let code = command(
        root,
        &[
            "--environment",
            "staging",
            "--exclude",
            "lodash",
            "--output",
            "json",
            "--output-file",
            report_path.to_str().unwrap(),
        ],
    )
    .run();
    assert_eq!(code, 0);

    let report = report(root);
    assert_eq!(report["environment"], "staging");
    assert!(report["skipped"].as_array().unwrap().is_empty());
    assert_eq!(report["bundles"][1]["eager"][0], "moment@2.29.4");
}

#[test]
fn test_unresolved_import_exits_with_error() {
    let dir = project();
    let root = dir.path();
    write(root, "auto-import.toml", "");
    write(root, "app/app.js", "import pad from 'left-pad';\n");

    let report_path = root.join("report.csv");
    let code = command(
        root,
        &["--output", "csv", "--output-file", report_path.to_str().unwrap()],
    )
    .run();
    assert_eq!(code, 1);
    assert!(!root.join("dist/entrypoints/app").exists());
    assert_eq!(
        fs::read_to_string(report_path).unwrap().trim(),
        "specifier,package,version,bundle,carriage,consumers"
    );
}

#[test]
fn test_dry_run_writes_no_bundles() {
    let dir = project();
    let root = dir.path();
    write(root, "auto-import.toml", "");
    write(root, "app/app.js", "export const chart = () => import('chart.js');\n");

    let report_path = root.join("report.json");
    let code = command(
        root,
        &["--dry-run", "--output", "json", "--output-file", report_path.to_str().unwrap()],
    )
    .run();
    assert_eq!(code, 0);
    assert!(!root.join("dist").exists());

    let report = report(root);
    assert_eq!(report["dry_run"], true);
    assert_eq!(report["bundles"][0]["status"], "planned");
    assert_eq!(report["bundles"][0]["lazy"][0], "chart.js@4.4.0");
}

#[test]
fn test_invalid_config_is_critical() {
    let dir = project();
    let root = dir.path();
    write(root, "auto-import.toml", "public_asset_url = \"/assets\"\n");

    assert_eq!(command(root, &["--quiet"]).run(), 2);

    write(root, "auto-import.toml", "bundles = [ not toml");
    assert_eq!(command(root, &["--quiet"]).run(), 2);
}
