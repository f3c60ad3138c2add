//! Command-line argument parsing

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// auto-import - bundles the npm packages an application imports
#[derive(Parser, Debug)]
#[command(name = "auto-import")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Bundle the external packages imported by an app and its addons")]
#[command(long_about = "auto-import scans the source trees of an application and its addons for imports of \
npm packages, decides which output bundle carries each package (eagerly or as a lazily loaded chunk), \
and writes one payload per bundle for the host build to append to that bundle's entrypoint.")]
#[command(after_help = "EXAMPLES:

Basic Usage:
    # Build the app in the current directory
    auto-import

    # Build a specific app and one addon
    auto-import --path ./my-app --addon ../my-addon

    # Leave some packages to the host build
    auto-import --exclude 'moment' --exclude '@ember/*'

Reports:
    # See where every import would go without bundling anything
    auto-import --dry-run

    # Machine readable placement report
    auto-import --output json --output-file report.json

    # One CSV row per placement
    auto-import --output csv

Configuration:
    # Use a specific configuration file
    auto-import --config ./auto-import.toml

    # Create .auto-import.toml in the current directory
    auto-import --init
")]
pub struct Args {
    /// Root of the application package
    #[arg(short, long, value_name = "DIR", help = "Application root containing package.json (defaults to the current directory)")]
    pub path: Option<PathBuf>,

    /// Configuration file path
    #[arg(short, long, value_name = "FILE", help = "Path to configuration file (defaults to .auto-import.toml in the current directory)")]
    pub config: Option<PathBuf>,

    /// Directory build output is written to
    #[arg(long, value_name = "DIR", help = "Directory for entrypoint payloads and chunks (default: dist)")]
    pub out_dir: Option<PathBuf>,

    /// Report format (text, json, csv)
    #[arg(short, long, value_enum, help = "Report format: 'text' for humans, 'json' for tools, 'csv' for one row per placement")]
    pub output: Option<OutputFormat>,

    /// Report file path (stdout if not specified)
    #[arg(long, value_name = "FILE", help = "File to write the report to (uses stdout if not specified)")]
    pub output_file: Option<PathBuf>,

    /// Analyze and split only
    #[arg(long, help = "Report where every import would be placed without bundling or writing anything")]
    pub dry_run: bool,

    /// Addon package roots
    #[arg(long = "addon", value_name = "DIR", help = "Addon package contributing imports (can be specified multiple times)")]
    pub addons: Vec<PathBuf>,

    /// Specifiers left for the host
    #[arg(short, long, value_name = "GLOB", help = "Specifier or package glob left for the host build (can be specified multiple times)")]
    pub exclude: Vec<String>,

    /// Host build environment
    #[arg(long, value_name = "NAME", help = "Host build environment recorded in the report (default: development)")]
    pub environment: Option<String>,

    /// Disable artifact caching
    #[arg(long, help = "Rebuild every bundle even when its inputs did not change")]
    pub no_cache: bool,

    /// Custom cache directory path
    #[arg(long, value_name = "DIR", help = "Persist built artifacts in this directory between runs")]
    pub cache_dir: Option<PathBuf>,

    /// Disable parallel processing
    #[arg(long, help = "Disable parallel processing (analyzes and builds one unit at a time)")]
    pub no_parallel: bool,

    /// Disable progress spinners
    #[arg(long, help = "Disable progress spinners (useful for CI environments or when redirecting output)")]
    pub no_progress: bool,

    /// Disable colored output
    #[arg(long, help = "Disable colored output")]
    pub no_colors: bool,

    /// Suppress non-essential output
    #[arg(short, long, help = "Only print the one-line summary and errors")]
    pub quiet: bool,

    /// Show detailed information
    #[arg(short, long, help = "Show per-file detail and debug logging")]
    pub verbose: bool,

    /// Initialize a default configuration file
    #[arg(long, help = "Create a default configuration file (.auto-import.toml) in the current directory")]
    pub init: bool,
}

/// Output format options
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output for programmatic consumption
    Json,
    /// CSV output for spreadsheet analysis
    Csv,
}

impl Args {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Args::parse()
    }
}
