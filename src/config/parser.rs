//! Configuration file parsing utilities

use std::fs;
use std::path::{Path, PathBuf};

use super::file::DEFAULT_CONFIG_FILE;
use crate::error::{AutoImportError, Result};
use crate::models::config::PartialSettings;

/// Embedded template written by `--init`
pub const DEFAULT_CONFIG: &str = include_str!("default_config.toml");

/// Parse a TOML configuration file into PartialSettings
pub fn parse_config_file<P: AsRef<Path>>(path: P) -> Result<PartialSettings> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(AutoImportError::ConfigNotFound {
            path: path.to_path_buf(),
        });
    }

    let content = fs::read_to_string(path).map_err(|e| AutoImportError::ConfigRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    parse_config_content(&content, path)
}

/// Parse TOML configuration content into PartialSettings
pub fn parse_config_content<P: AsRef<Path>>(content: &str, path: P) -> Result<PartialSettings> {
    let path = path.as_ref();

    let settings: PartialSettings =
        toml::from_str(content).map_err(|e| AutoImportError::ConfigParse {
            path: path.to_path_buf(),
            source: e,
        })?;

    validate_partial_settings(&settings, path)?;

    Ok(settings)
}

/// Validate partial settings for obvious errors
pub fn validate_partial_settings<P: AsRef<Path>>(
    settings: &PartialSettings,
    path: P,
) -> Result<()> {
    let path = path.as_ref();
    let invalid = |message: String| {
        Err(AutoImportError::config_error(format!(
            "{} in config file: {}",
            message,
            path.display()
        )))
    };

    if let Some(root) = &settings.project_root {
        if root.as_os_str().is_empty() {
            return invalid("Invalid empty project_root".to_string());
        }
    }

    if let Some(patterns) = &settings.exclude {
        for pattern in patterns {
            if pattern.is_empty() {
                return invalid("Empty exclude pattern".to_string());
            }
            if let Err(e) = glob::Pattern::new(pattern) {
                return invalid(format!("Invalid exclude pattern '{}': {}", pattern, e));
            }
        }
    }

    if let Some(bundles) = &settings.bundles {
        if bundles.is_empty() {
            return invalid("Empty bundles list".to_string());
        }
    }

    if let Some(url) = &settings.public_asset_url {
        if !url.ends_with('/') {
            return invalid(format!("public_asset_url '{}' must end with '/'", url));
        }
    }

    if let Some(command) = &settings.transformer_command {
        if command.is_empty() {
            return invalid("Empty transformer_command".to_string());
        }
    }

    if let Some(output_file) = &settings.output_file {
        if output_file.as_os_str().is_empty() {
            return invalid("Invalid empty output_file".to_string());
        }
    }

    if let Some(cache_dir) = &settings.cache_dir {
        if cache_dir.as_os_str().is_empty() {
            return invalid("Invalid empty cache_dir".to_string());
        }
    }

    Ok(())
}

/// Locations searched for a config file, in order
pub fn default_config_locations() -> Vec<PathBuf> {
    let mut locations = vec![PathBuf::from(DEFAULT_CONFIG_FILE)];
    if let Some(home_dir) = dirs::home_dir() {
        locations.push(home_dir.join(DEFAULT_CONFIG_FILE));
    }
    if let Some(config_dir) = dirs::config_dir() {
        locations.push(config_dir.join("auto-import").join("config.toml"));
    }
    locations
}

/// Parse the first existing file among `locations`
pub fn find_config_in(locations: &[PathBuf]) -> Result<Option<PartialSettings>> {
    match locations.iter().find(|path| path.is_file()) {
        Some(path) => {
            tracing::debug!(path = %path.display(), "using config file");
            parse_config_file(path).map(Some)
        }
        None => Ok(None),
    }
}

/// Find and load configuration from default locations
pub fn find_default_config() -> Result<Option<PartialSettings>> {
    find_config_in(&default_config_locations())
}

/// Create a default configuration file at the specified path
pub fn create_default_config<P: AsRef<Path>>(path: P) -> Result<()> {
    let path = path.as_ref();

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(AutoImportError::io_error)?;
        }
    }

    fs::write(path, DEFAULT_CONFIG).map_err(|e| AutoImportError::OutputWrite {
        path: path.to_path_buf(),
        source: e,
    })
}
