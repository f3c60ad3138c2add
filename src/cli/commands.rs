//! Command implementations

use super::Args;
use crate::config::{load_config, CliConfig, ConfigSource, FileConfig};
use crate::core::pipeline::AutoImport;
use crate::error::{AutoImportError, ErrorSeverity, Result};
use crate::models::config::Settings;
use crate::output::{create_formatter, create_writer, ProgressReporter};
use ansi_term::Colour::Red;
use tracing::debug;

/// Available commands
#[derive(Debug)]
pub enum Command {
    /// Analyze, split and bundle
    Build(Args),
    /// Analyze and split only, then report the plan
    Plan(Args),
    /// Initialize a default configuration file
    Init,
}

impl Command {
    /// Create a command from parsed arguments
    pub fn from_args(args: Args) -> Self {
        if args.init {
            Command::Init
        } else if args.dry_run {
            Command::Plan(args)
        } else {
            Command::Build(args)
        }
    }

    fn args(&self) -> Option<&Args> {
        match self {
            Command::Build(args) | Command::Plan(args) => Some(args),
            Command::Init => None,
        }
    }

    /// Merge every configuration layer under the flags
    fn settings(args: &Args) -> Result<Settings> {
        load_config(CliConfig::from_args(args).args().clone())
    }

    /// Execute the command; the value is the process exit code
    pub fn execute(&self) -> Result<i32> {
        let Some(args) = self.args() else {
            return Self::init();
        };
        self.validate()?;

        let settings = Self::settings(args)?;
        debug!(?settings, "resolved settings");

        let progress =
            ProgressReporter::new(settings.quiet, settings.verbose, settings.show_progress);
        let mut auto_import = AutoImport::new(settings.clone())?;

        let stage = progress.stage("Registering packages");
        if let Err(err) = auto_import.analyze_project() {
            stage.fail("Registering packages failed");
            return Err(err);
        }
        stage.finish(&format!(
            "Registered {} packages ({} trees)",
            auto_import.registry().len(),
            auto_import.tree_count()
        ));

        let dry_run = matches!(self, Command::Plan(_));
        let stage = progress.stage(if dry_run { "Analyzing imports" } else { "Building bundles" });
        let report = if dry_run {
            auto_import.split_only()
        } else {
            auto_import.build()
        };
        if report.is_success() {
            stage.finish("Done");
        } else {
            stage.fail("Finished with errors");
        }

        if !dry_run {
            let written = auto_import.emit(&report)?;
            progress.print_verbose(&format!(
                "Wrote {} files to {}",
                written.len(),
                settings.output_dir.display()
            ));
        }

        let formatter = create_formatter(
            settings.output_format,
            settings.use_colors,
            settings.verbose,
            settings.quiet,
        );
        let writer = create_writer(settings.output_file.as_ref());
        writer.write(&formatter.format(&report)?)?;

        Ok(exit_code(report.severity()))
    }

    fn init() -> Result<i32> {
        let config = FileConfig::new();

        if config.is_available() {
            println!("Configuration file already exists at: {}", config.path().display());
            println!("To overwrite it, delete the file first and run this command again.");
            return Ok(0);
        }

        config.create_default()?;

        println!("Created default configuration file at: {}", config.path().display());
        println!("\nEdit it to declare your bundles, addons and excluded packages.");
        Ok(0)
    }

    /// Validate the command arguments
    pub fn validate(&self) -> Result<()> {
        let Some(args) = self.args() else {
            return Ok(());
        };

        if let Some(path) = &args.path {
            if !path.is_dir() {
                return Err(AutoImportError::config_error(format!(
                    "project root '{}' does not exist",
                    path.display()
                )));
            }
        }

        if let Some(config_path) = &args.config {
            if !config_path.exists() {
                return Err(AutoImportError::ConfigNotFound {
                    path: config_path.clone(),
                });
            }
        }

        Ok(())
    }

    /// Run the command and handle errors
    pub fn run(&self) -> i32 {
        match self.execute() {
            Ok(code) => code,
            Err(err) => {
                let colors = self.args().is_none_or(|args| !args.no_colors);
                let label = err.severity().to_string();
                let label = if colors { Red.bold().paint(label).to_string() } else { label };
                eprintln!("{}: {}", label, err.user_message());
                if let Some(suggestion) = err.suggestion() {
                    eprintln!("  hint: {}", suggestion);
                }
                exit_code(Some(err.severity()))
            }
        }
    }
}

/// Exit status for the worst severity seen
pub fn exit_code(severity: Option<ErrorSeverity>) -> i32 {
    match severity {
        None | Some(ErrorSeverity::Warning) => 0,
        Some(ErrorSeverity::Error) => 1,
        Some(ErrorSeverity::Critical) => 2,
    }
}
