//! Report formatting and build output writing

pub mod formatters;
pub mod progress;
pub mod writers;

pub use self::formatters::{BuildSummary, BundleStatus, BundleSummary};
pub use self::progress::{ProgressReporter, Stage};
pub use self::writers::{create_writer, write_build_output, FileWriter, OutputWriter, StdoutWriter};

use crate::core::pipeline::BuildReport;
use crate::error::Result;
use crate::models::config::OutputFormat;

/// Trait for different output formatters
pub trait Formatter {
    /// Format a build report into a string
    fn format(&self, report: &BuildReport) -> Result<String>;
}

/// Text formatter for human-readable output
pub struct TextFormatter {
    pub use_colors: bool,
    pub verbose: bool,
    pub quiet: bool,
}

impl TextFormatter {
    pub fn new(use_colors: bool, verbose: bool, quiet: bool) -> Self {
        Self {
            use_colors,
            verbose,
            quiet,
        }
    }
}

impl Formatter for TextFormatter {
    fn format(&self, report: &BuildReport) -> Result<String> {
        if self.quiet {
            return Ok(format!("{}\n", formatters::summary_line(report)));
        }
        Ok(formatters::format_report_text(
            report,
            self.use_colors,
            self.verbose,
        ))
    }
}

/// JSON formatter for machine-readable output
pub struct JsonFormatter {
    pub pretty: bool,
}

impl JsonFormatter {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }
}

impl Formatter for JsonFormatter {
    fn format(&self, report: &BuildReport) -> Result<String> {
        formatters::format_report_json(report, self.pretty)
    }
}

/// CSV formatter, one row per placement
#[derive(Default)]
pub struct CsvFormatter;

impl CsvFormatter {
    pub fn new() -> Self {
        Self
    }
}

impl Formatter for CsvFormatter {
    fn format(&self, report: &BuildReport) -> Result<String> {
        formatters::format_report_csv(report)
    }
}

/// Create a formatter based on the output format
pub fn create_formatter(
    format: OutputFormat,
    use_colors: bool,
    verbose: bool,
    quiet: bool,
) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Text => Box::new(TextFormatter::new(use_colors, verbose, quiet)),
        OutputFormat::Json => Box::new(JsonFormatter::new(true)),
        OutputFormat::Csv => Box::new(CsvFormatter::new()),
    }
}
