//! Output formatting functionality
//!
//! Text for people, JSON for tools and CSV with one row per placement.

use crate::core::pipeline::BuildReport;
use crate::error::{AutoImportError, ErrorSeverity, Result};
use crate::models::assignment::{Placement, SkippedSpecifier, UnresolvedImport};
use crate::models::import::ImportStyle;
use ansi_term::Colour::{Blue, Cyan, Green, Red, Yellow};
use ansi_term::Style;
use chrono::{DateTime, Utc};
use indexmap::IndexSet;
use serde::Serialize;

/// What happened to one bundle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BundleStatus {
    /// Computed in this build
    Built,
    /// Reused from the artifact cache
    Cached,
    /// No artifact; see the error
    Failed,
    /// Dry run: what the bundle would carry
    Planned,
}

impl std::fmt::Display for BundleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            BundleStatus::Built => "built",
            BundleStatus::Cached => "cached",
            BundleStatus::Failed => "failed",
            BundleStatus::Planned => "planned",
        };
        write!(f, "{}", label)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BundleSummary {
    pub name: String,
    pub status: BundleStatus,
    pub eager: Vec<String>,
    pub lazy: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AssignmentSummary {
    pub specifier: String,
    pub package: String,
    pub target: String,
    pub version: String,
    pub placements: Vec<Placement>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorSummary {
    pub severity: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl From<&AutoImportError> for ErrorSummary {
    fn from(err: &AutoImportError) -> Self {
        Self {
            severity: err.severity().to_string(),
            message: err.user_message(),
            suggestion: err.suggestion(),
        }
    }
}

/// Serializable view of a build report
#[derive(Debug, Clone, Serialize)]
pub struct BuildSummary {
    pub version: String,
    pub generated_at: DateTime<Utc>,
    pub environment: String,
    pub success: bool,
    pub dry_run: bool,
    pub files_scanned: usize,
    pub files_parsed: usize,
    pub cache_hits: usize,
    pub cache_misses: usize,
    pub bundles: Vec<BundleSummary>,
    pub assignments: Vec<AssignmentSummary>,
    pub unresolved: Vec<UnresolvedImport>,
    pub skipped: Vec<SkippedSpecifier>,
    pub errors: Vec<ErrorSummary>,
}

impl BuildSummary {
    pub fn from_report(report: &BuildReport) -> Self {
        Self {
            version: crate::VERSION.to_string(),
            generated_at: Utc::now(),
            environment: report.environment.clone(),
            success: report.is_success(),
            dry_run: report.output.is_none(),
            files_scanned: report.scan.files,
            files_parsed: report.scan.parsed,
            cache_hits: report.cache.hits,
            cache_misses: report.cache.misses,
            bundles: bundle_summaries(report),
            assignments: report
                .split
                .assignments
                .values()
                .map(|assignment| AssignmentSummary {
                    specifier: assignment.key.specifier.clone(),
                    package: assignment.key.package.name.clone(),
                    target: assignment.target.clone(),
                    version: assignment.dependency.version.clone(),
                    placements: assignment.placements.clone(),
                })
                .collect(),
            unresolved: report.split.unresolved.clone(),
            skipped: report.split.skipped.clone(),
            errors: report.errors().into_iter().map(ErrorSummary::from).collect(),
        }
    }
}

/// One summary per configured bundle, in declaration order
pub fn bundle_summaries(report: &BuildReport) -> Vec<BundleSummary> {
    report
        .bundle_names
        .iter()
        .map(|name| match &report.output {
            None => planned_bundle(report, name),
            Some(output) => match output.bundles.get(name) {
                Some(Ok(built)) => BundleSummary {
                    name: name.clone(),
                    status: if built.cached {
                        BundleStatus::Cached
                    } else {
                        BundleStatus::Built
                    },
                    eager: built.artifact.eager_modules.clone(),
                    lazy: built
                        .artifact
                        .lazy_chunks
                        .values()
                        .map(|chunk| chunk.module_id.clone())
                        .collect(),
                    error: None,
                },
                Some(Err(err)) => BundleSummary {
                    name: name.clone(),
                    status: BundleStatus::Failed,
                    eager: Vec::new(),
                    lazy: Vec::new(),
                    error: Some(err.user_message()),
                },
                None => planned_bundle(report, name),
            },
        })
        .collect()
}

fn planned_bundle(report: &BuildReport, name: &str) -> BundleSummary {
    let mut eager = IndexSet::new();
    let mut lazy = IndexSet::new();
    for (assignment, mode) in report.split.carried_by(name) {
        match mode {
            ImportStyle::Eager => eager.insert(assignment.module_id()),
            ImportStyle::Lazy => lazy.insert(assignment.module_id()),
        };
    }
    // A module eager for one package and lazy for another ships eagerly
    lazy.retain(|id| !eager.contains(id));

    BundleSummary {
        name: name.to_string(),
        status: BundleStatus::Planned,
        eager: eager.into_iter().collect(),
        lazy: lazy.into_iter().collect(),
        error: report
            .split
            .unresolved_for(name)
            .map(|unresolved| unresolved.to_error().user_message()),
    }
}

fn paint(use_colors: bool, style: Style, text: impl AsRef<str>) -> String {
    if use_colors {
        style.paint(text.as_ref()).to_string()
    } else {
        text.as_ref().to_string()
    }
}

fn severity_label(severity: ErrorSeverity, use_colors: bool) -> String {
    let style = match severity {
        ErrorSeverity::Warning => Yellow.normal(),
        ErrorSeverity::Error => Red.normal(),
        ErrorSeverity::Critical => Red.bold(),
    };
    paint(use_colors, style, severity.to_string())
}

/// Format a build report as text
pub fn format_report_text(report: &BuildReport, use_colors: bool, verbose: bool) -> String {
    let mut output = String::new();

    let title = if report.output.is_none() {
        "auto-import plan"
    } else {
        "auto-import build"
    };
    output.push_str(&format!(
        "{} ({})\n\n",
        paint(use_colors, Blue.bold(), title),
        report.environment
    ));

    output.push_str("Bundles:\n");
    for bundle in bundle_summaries(report) {
        let status_style = match bundle.status {
            BundleStatus::Built => Green.normal(),
            BundleStatus::Cached => Cyan.normal(),
            BundleStatus::Failed => Red.bold(),
            BundleStatus::Planned => Style::new().dimmed(),
        };
        output.push_str(&format!(
            "  {:<16} {:<8} {} eager, {} lazy\n",
            bundle.name,
            paint(use_colors, status_style, bundle.status.to_string()),
            bundle.eager.len(),
            bundle.lazy.len()
        ));
        for id in &bundle.eager {
            output.push_str(&format!("    eager  {}\n", id));
        }
        for id in &bundle.lazy {
            output.push_str(&format!("    lazy   {}\n", id));
        }
    }

    if verbose {
        output.push_str("\nPlacements:\n");
        for assignment in report.split.assignments.values() {
            output.push_str(&format!(
                "  {} ({}) -> {}@{}\n",
                assignment.key.specifier,
                assignment.key.package.name,
                assignment.target,
                assignment.dependency.version
            ));
            for placement in &assignment.placements {
                output.push_str(&format!(
                    "    {:<16} {:<14} {}\n",
                    placement.bundle,
                    placement.carriage.to_string(),
                    paint(use_colors, Style::new().dimmed(), placement.consumers.join(", "))
                ));
            }
        }

        if !report.split.skipped.is_empty() {
            output.push_str("\nLeft to the host:\n");
            for skipped in &report.split.skipped {
                output.push_str(&format!(
                    "  {} ({}): {:?}\n",
                    skipped.specifier, skipped.package, skipped.reason
                ));
            }
        }
    }

    let errors = report.errors();
    if !errors.is_empty() {
        output.push_str(&format!(
            "\n{}\n",
            paint(use_colors, Yellow.bold(), format!("Errors: {}", errors.len()))
        ));
        for err in errors {
            output.push_str(&format!(
                "  [{}] {}\n",
                severity_label(err.severity(), use_colors),
                err.user_message()
            ));
            if let Some(suggestion) = err.suggestion() {
                output.push_str(&format!("    hint: {}\n", suggestion));
            }
        }
    }

    output.push_str(&format!("\n{}\n", summary_line(report)));
    output
}

/// The one line printed in quiet mode and at the end of text output
pub fn summary_line(report: &BuildReport) -> String {
    let bundles = bundle_summaries(report);
    let failed = bundles
        .iter()
        .filter(|b| b.status == BundleStatus::Failed)
        .count();
    format!(
        "{} bundles, {} failed, {} specifiers placed, {} unresolved, {} files scanned ({} parsed)",
        bundles.len(),
        failed,
        report.split.assignments.len(),
        report.split.unresolved.len(),
        report.scan.files,
        report.scan.parsed
    )
}

/// Format a build report as JSON
pub fn format_report_json(report: &BuildReport, pretty: bool) -> Result<String> {
    let summary = BuildSummary::from_report(report);
    let result = if pretty {
        serde_json::to_string_pretty(&summary)
    } else {
        serde_json::to_string(&summary)
    };
    result.map_err(|e| AutoImportError::JsonSerialize { source: e })
}

/// Format a build report as CSV, one row per placement
pub fn format_report_csv(report: &BuildReport) -> Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);

    writer.write_record(["specifier", "package", "version", "bundle", "carriage", "consumers"])?;

    for assignment in report.split.assignments.values() {
        for placement in &assignment.placements {
            writer.write_record([
                assignment.key.specifier.as_str(),
                assignment.key.package.name.as_str(),
                assignment.dependency.version.as_str(),
                placement.bundle.as_str(),
                placement.carriage.to_string().as_str(),
                placement.consumers.join(";").as_str(),
            ])?;
        }
    }

    let data = writer
        .into_inner()
        .map_err(|e| AutoImportError::io_error(e.into_error()))?;
    String::from_utf8(data).map_err(|e| {
        AutoImportError::io_error(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    })
}
