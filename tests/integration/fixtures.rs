//! On-disk projects shared by the integration tests

use auto_import::models::bundle::BundleSpec;
use auto_import::models::config::Settings;
use std::fs;
use std::path::Path;
use tempfile::{tempdir, TempDir};

pub fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// Install `name@version` under `<root>/node_modules` with an `index.js` entry
pub fn install(root: &Path, name: &str, version: &str) {
    write(
        root,
        &format!("node_modules/{}/package.json", name),
        &format!(r#"{{"name":"{}","version":"{}","main":"index.js"}}"#, name, version),
    );
    write(
        root,
        &format!("node_modules/{}/index.js", name),
        &format!("module.exports = {{ name: '{}', version: '{}' }};\n", name, version),
    );
}

/// `my-app` depending on lodash, chart.js and moment, all installed.
///
/// Source trees are left for each test to add under `app/` and `tests/`.
pub fn project() -> TempDir {
    let dir = tempdir().unwrap();
    let root = dir.path();
    write(
        root,
        "package.json",
        r#"{
            "name": "my-app",
            "version": "1.0.0",
            "dependencies": { "lodash": "^4.17.0", "chart.js": "^4.0.0" },
            "devDependencies": { "moment": "^2.29.0" }
        }"#,
    );
    install(root, "lodash", "4.17.21");
    install(root, "chart.js", "4.4.0");
    install(root, "moment", "2.29.4");
    dir
}

/// Settings for a project root with caching off and default bundles
pub fn settings(root: &Path) -> Settings {
    Settings {
        project_root: root.to_path_buf(),
        cache_enabled: false,
        output_dir: root.join("dist"),
        ..Settings::default()
    }
}

/// `app` as the default bundle and `tests` based on it
pub fn shared_bundles() -> Vec<BundleSpec> {
    vec![
        BundleSpec::new("app", &["**"], "assets/vendor.js").as_default(),
        BundleSpec::new("tests", &["*/tests/**"], "assets/test-support.js").with_base("app"),
    ]
}
