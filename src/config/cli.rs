//! Command-line argument configuration source

use std::path::PathBuf;

use super::ConfigSource;
use crate::cli::args::{Args, OutputFormat as CliOutputFormat};
use crate::error::Result;
use crate::models::config::{OutputFormat, PartialSettings};

/// Command-line argument configuration source
#[derive(Debug)]
pub struct CliConfig {
    args: CliArgs,
    name: String,
}

/// Flags that map onto settings
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    pub path: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub out_dir: Option<PathBuf>,
    pub output_format: Option<OutputFormat>,
    pub output_file: Option<PathBuf>,
    pub addons: Option<Vec<PathBuf>>,
    pub exclude: Option<Vec<String>>,
    pub environment: Option<String>,
    pub no_cache: bool,
    pub cache_dir: Option<PathBuf>,
    pub no_parallel: bool,
    pub no_progress: bool,
    pub no_colors: bool,
    pub quiet: bool,
    pub verbose: bool,
}

impl CliConfig {
    pub fn new(args: CliArgs) -> Self {
        Self {
            args,
            name: "command-line arguments".to_string(),
        }
    }

    /// Create a CLI configuration source from parsed flags
    pub fn from_args(args: &Args) -> Self {
        let non_empty = |values: &Vec<String>| (!values.is_empty()).then(|| values.clone());
        let cli_args = CliArgs {
            path: args.path.clone(),
            config: args.config.clone(),
            out_dir: args.out_dir.clone(),
            output_format: args.output.map(|format| match format {
                CliOutputFormat::Text => OutputFormat::Text,
                CliOutputFormat::Json => OutputFormat::Json,
                CliOutputFormat::Csv => OutputFormat::Csv,
            }),
            output_file: args.output_file.clone(),
            addons: (!args.addons.is_empty()).then(|| args.addons.clone()),
            exclude: non_empty(&args.exclude),
            environment: args.environment.clone(),
            no_cache: args.no_cache,
            cache_dir: args.cache_dir.clone(),
            no_parallel: args.no_parallel,
            no_progress: args.no_progress,
            no_colors: args.no_colors,
            quiet: args.quiet,
            verbose: args.verbose,
        };

        Self::new(cli_args)
    }

    pub fn args(&self) -> &CliArgs {
        &self.args
    }
}

impl ConfigSource for CliConfig {
    fn load(&self) -> Result<PartialSettings> {
        let args = &self.args;
        let mut settings = PartialSettings {
            project_root: args.path.clone(),
            output_dir: args.out_dir.clone(),
            output_format: args.output_format,
            output_file: args.output_file.clone(),
            addons: args.addons.clone(),
            exclude: args.exclude.clone(),
            environment: args.environment.clone(),
            cache_dir: args.cache_dir.clone(),
            ..Default::default()
        };

        // Boolean flags only ever switch a default off (or verbosity on)
        if args.no_cache {
            settings.cache_enabled = Some(false);
        }
        if args.no_parallel {
            settings.parallel = Some(false);
        }
        if args.no_progress {
            settings.show_progress = Some(false);
        }
        if args.no_colors {
            settings.use_colors = Some(false);
        }
        if args.quiet {
            settings.quiet = Some(true);
        }
        if args.verbose {
            settings.verbose = Some(true);
        }

        Ok(settings)
    }

    fn is_available(&self) -> bool {
        true
    }

    fn name(&self) -> &str {
        &self.name
    }
}
