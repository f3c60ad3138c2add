//! Progress reporting for the build stages
//!
//! Spinners are drawn on stderr and only when progress is enabled; quiet
//! mode turns them off entirely.

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::time::Duration;

/// Progress reporter for long-running operations
pub struct ProgressReporter {
    enabled: bool,
    verbose: bool,
    multi_progress: MultiProgress,
}

impl ProgressReporter {
    pub fn new(quiet: bool, verbose: bool, show_progress: bool) -> Self {
        Self {
            enabled: !quiet && show_progress,
            verbose,
            multi_progress: MultiProgress::new(),
        }
    }

    /// A reporter that never draws anything
    pub fn hidden() -> Self {
        Self::new(true, false, false)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Start a spinner for one stage
    pub fn stage(&self, message: &str) -> Stage {
        if !self.enabled {
            return Stage { spinner: None };
        }

        let spinner = self.multi_progress.add(ProgressBar::new_spinner());
        let style = ProgressStyle::default_spinner().template("{spinner:.green} {msg} [{elapsed}]");
        if let Ok(style) = style {
            spinner.set_style(style);
        }
        spinner.set_message(message.to_string());
        spinner.enable_steady_tick(Duration::from_millis(100));
        Stage {
            spinner: Some(spinner),
        }
    }

    /// Print a verbose message (only in verbose mode)
    pub fn print_verbose(&self, message: &str) {
        if self.verbose {
            let _ = self.multi_progress.println(message);
        }
    }
}

/// A running stage; finishing it leaves its final message on screen
pub struct Stage {
    spinner: Option<ProgressBar>,
}

impl Stage {
    pub fn finish(self, message: &str) {
        if let Some(spinner) = self.spinner {
            spinner.finish_with_message(message.to_string());
        }
    }

    pub fn fail(self, message: &str) {
        if let Some(spinner) = self.spinner {
            spinner.abandon_with_message(message.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quiet_disables_spinners() {
        assert!(!ProgressReporter::hidden().is_enabled());
        assert!(!ProgressReporter::new(true, true, true).is_enabled());
        assert!(!ProgressReporter::new(false, false, false).is_enabled());
        assert!(ProgressReporter::new(false, false, true).is_enabled());

        // Hidden stages finish silently
        let reporter = ProgressReporter::hidden();
        reporter.stage("Analyzing imports").finish("done");
        reporter.stage("Building bundles").fail("failed");
    }
}
