//! Validation of fully merged settings

use std::path::Path;

use crate::error::{AutoImportError, Result, ResultExt};
use crate::models::bundle::BundleConfig;
use crate::models::config::Settings;

/// Settings validator for ensuring configuration is valid
pub struct SettingsValidator;

impl SettingsValidator {
    /// Validate settings and return errors if invalid
    pub fn validate(settings: &Settings) -> Result<()> {
        if !settings.project_root.is_dir() {
            return Err(AutoImportError::config_error(format!(
                "project root '{}' does not exist",
                settings.project_root.display()
            )));
        }

        for pattern in &settings.exclude {
            glob::Pattern::new(pattern)
                .with_context(|| format!("Invalid exclude pattern: {}", pattern))?;
        }

        BundleConfig::from_specs(&settings.bundles)?;

        Self::validate_public_url(&settings.public_asset_url)?;

        if settings.environment.trim().is_empty() {
            return Err(AutoImportError::config_error("environment must not be empty"));
        }

        if let Some(command) = &settings.transformer_command {
            if command.first().is_none_or(|program| program.trim().is_empty()) {
                return Err(AutoImportError::config_error(
                    "transformer_command needs at least a program name",
                ));
            }
        }

        if let Some(path) = &settings.output_file {
            Self::validate_output_path(path)?;
        }

        Ok(())
    }

    /// Chunk URLs are built by appending file names, so the prefix ends in `/`
    fn validate_public_url(url: &str) -> Result<()> {
        if url.is_empty() || !url.ends_with('/') {
            return Err(AutoImportError::config_error(format!(
                "public_asset_url '{}' must end with '/'",
                url
            )));
        }
        if url.chars().any(char::is_whitespace) {
            return Err(AutoImportError::config_error(format!(
                "public_asset_url '{}' must not contain whitespace",
                url
            )));
        }
        Ok(())
    }

    /// The report file's directory has to exist
    fn validate_output_path(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.is_dir() {
                return Err(AutoImportError::config_error(format!(
                    "output file directory '{}' does not exist",
                    parent.display()
                )));
            }
        }
        Ok(())
    }
}
