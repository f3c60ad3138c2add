//! Configuration-related data structures

use crate::models::bundle::{default_bundle_specs, BundleSpec};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A source directory of a package and where it is mounted in the package namespace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeSpec {
    /// Directory relative to the package root
    pub dir: PathBuf,
    #[serde(default)]
    pub mount: String,
}

impl TreeSpec {
    pub fn new(dir: impl Into<PathBuf>, mount: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            mount: mount.into(),
        }
    }
}

/// Main configuration settings for auto-import
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Root of the primary application package
    pub project_root: PathBuf,

    /// Roots of contributing addon packages
    pub addons: Vec<PathBuf>,

    /// Source trees scanned in the primary package
    pub app_trees: Vec<TreeSpec>,

    /// Source trees scanned in every addon
    pub addon_trees: Vec<TreeSpec>,

    /// Output bundles, in declaration order
    pub bundles: Vec<BundleSpec>,

    /// Specifier globs left for the host to handle
    pub exclude: Vec<String>,

    /// Prefix rewrites applied to the primary package's specifiers
    pub alias: IndexMap<String, String>,

    /// Keyword marking dependencies the host integrates itself; empty disables the check
    pub host_managed_keyword: String,

    /// Whether `require('x')` counts as an eager import
    pub include_require: bool,

    /// URL prefix lazy chunks are fetched from
    pub public_asset_url: String,

    /// Directory build output is written to
    pub output_dir: PathBuf,

    /// Output format (text, json, csv)
    pub output_format: OutputFormat,

    /// Output file path (if not specified, output to stdout)
    pub output_file: Option<PathBuf>,

    /// Whether to reuse artifacts whose inputs did not change
    pub cache_enabled: bool,

    /// Directory for persisted artifacts
    pub cache_dir: Option<PathBuf>,

    /// Whether to use parallel processing
    pub parallel: bool,

    /// Whether to suppress non-essential output
    pub quiet: bool,

    /// Whether to show detailed progress and debug information
    pub verbose: bool,

    /// Whether to use colors in text output
    pub use_colors: bool,

    /// Whether to show progress spinners
    pub show_progress: bool,

    /// External transformer program and its arguments
    pub transformer_command: Option<Vec<String>>,

    /// Host build environment (`development`, `production`, `test`)
    pub environment: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            project_root: PathBuf::from("."),
            addons: Vec::new(),
            app_trees: vec![TreeSpec::new("app", ""), TreeSpec::new("tests", "tests")],
            addon_trees: vec![TreeSpec::new("addon", "")],
            bundles: default_bundle_specs(),
            exclude: Vec::new(),
            alias: IndexMap::new(),
            host_managed_keyword: "ember-addon".to_string(),
            include_require: false,
            public_asset_url: "/assets/".to_string(),
            output_dir: PathBuf::from("dist"),
            output_format: OutputFormat::Text,
            output_file: None,
            cache_enabled: true,
            cache_dir: None,
            parallel: true,
            quiet: false,
            verbose: false,
            use_colors: true,
            show_progress: true,
            transformer_command: None,
            environment: "development".to_string(),
        }
    }
}

/// Supported output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output for programmatic consumption
    Json,
    /// CSV output for spreadsheet analysis
    Csv,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            _ => Err(format!("Invalid output format: {}", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Csv => write!(f, "csv"),
        }
    }
}

/// Partial settings for configuration merging
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PartialSettings {
    pub project_root: Option<PathBuf>,
    pub addons: Option<Vec<PathBuf>>,
    pub app_trees: Option<Vec<TreeSpec>>,
    pub addon_trees: Option<Vec<TreeSpec>>,
    pub bundles: Option<Vec<BundleSpec>>,
    pub exclude: Option<Vec<String>>,
    pub alias: Option<IndexMap<String, String>>,
    pub host_managed_keyword: Option<String>,
    pub include_require: Option<bool>,
    pub public_asset_url: Option<String>,
    pub output_dir: Option<PathBuf>,
    pub output_format: Option<OutputFormat>,
    pub output_file: Option<PathBuf>,
    pub cache_enabled: Option<bool>,
    pub cache_dir: Option<PathBuf>,
    pub parallel: Option<bool>,
    pub quiet: Option<bool>,
    pub verbose: Option<bool>,
    pub use_colors: Option<bool>,
    pub show_progress: Option<bool>,
    pub transformer_command: Option<Vec<String>>,
    pub environment: Option<String>,
}

macro_rules! merge_fields {
    ($target:expr, $source:expr, $($field:ident),* $(,)?) => {
        $(
            if $source.$field.is_some() {
                $target.$field = $source.$field;
            }
        )*
    };
}

impl PartialSettings {
    /// Merge another PartialSettings into this one
    /// Fields from `other` take precedence over existing fields
    pub fn merge_from(&mut self, other: PartialSettings) {
        merge_fields!(
            self,
            other,
            project_root,
            addons,
            app_trees,
            addon_trees,
            bundles,
            exclude,
            alias,
            host_managed_keyword,
            include_require,
            public_asset_url,
            output_dir,
            output_format,
            output_file,
            cache_enabled,
            cache_dir,
            parallel,
            quiet,
            verbose,
            use_colors,
            show_progress,
            transformer_command,
            environment,
        );
    }

    /// Convert partial settings to full settings
    /// Uses defaults for any fields that are None
    pub fn to_settings(&self) -> Settings {
        let mut settings = Settings::default();
        let partial = self.clone();

        if let Some(project_root) = partial.project_root {
            settings.project_root = project_root;
        }
        if let Some(addons) = partial.addons {
            settings.addons = addons;
        }
        if let Some(app_trees) = partial.app_trees {
            settings.app_trees = app_trees;
        }
        if let Some(addon_trees) = partial.addon_trees {
            settings.addon_trees = addon_trees;
        }
        if let Some(bundles) = partial.bundles {
            settings.bundles = bundles;
        }
        if let Some(exclude) = partial.exclude {
            settings.exclude = exclude;
        }
        if let Some(alias) = partial.alias {
            settings.alias = alias;
        }
        if let Some(keyword) = partial.host_managed_keyword {
            settings.host_managed_keyword = keyword;
        }
        if let Some(include_require) = partial.include_require {
            settings.include_require = include_require;
        }
        if let Some(url) = partial.public_asset_url {
            settings.public_asset_url = url;
        }
        if let Some(output_dir) = partial.output_dir {
            settings.output_dir = output_dir;
        }
        if let Some(output_format) = partial.output_format {
            settings.output_format = output_format;
        }
        if partial.output_file.is_some() {
            settings.output_file = partial.output_file;
        }
        if let Some(cache_enabled) = partial.cache_enabled {
            settings.cache_enabled = cache_enabled;
        }
        if partial.cache_dir.is_some() {
            settings.cache_dir = partial.cache_dir;
        }
        if let Some(parallel) = partial.parallel {
            settings.parallel = parallel;
        }
        if let Some(quiet) = partial.quiet {
            settings.quiet = quiet;
        }
        if let Some(verbose) = partial.verbose {
            settings.verbose = verbose;
        }
        if let Some(use_colors) = partial.use_colors {
            settings.use_colors = use_colors;
        }
        if let Some(show_progress) = partial.show_progress {
            settings.show_progress = show_progress;
        }
        if partial.transformer_command.is_some() {
            settings.transformer_command = partial.transformer_command;
        }
        if let Some(environment) = partial.environment {
            settings.environment = environment;
        }

        settings
    }
}
