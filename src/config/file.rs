//! Configuration file and environment sources

use std::path::{Path, PathBuf};

use super::{parser, ConfigSource};
use crate::error::{AutoImportError, Result};
use crate::models::config::PartialSettings;

/// Default configuration file name
pub const DEFAULT_CONFIG_FILE: &str = ".auto-import.toml";

/// Prefix of every environment variable read by [`EnvConfig`]
pub const ENV_PREFIX: &str = "AUTO_IMPORT";

/// Variables [`EnvConfig`] understands, without the prefix
const ENV_KEYS: &[&str] = &[
    "PROJECT_ROOT",
    "OUTPUT_DIR",
    "CACHE_DIR",
    "PUBLIC_ASSET_URL",
    "EXCLUDE",
    "ENVIRONMENT",
];

/// Configuration file source
pub struct FileConfig {
    path: PathBuf,
    name: String,
}

impl FileConfig {
    /// Source for the default file in the current directory
    pub fn new() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_CONFIG_FILE),
            name: "default config file".to_string(),
        }
    }

    pub fn with_path<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            name: format!("config file ({})", path.as_ref().display()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the default configuration to this file's location
    pub fn create_default(&self) -> Result<()> {
        parser::create_default_config(&self.path)
    }
}

impl ConfigSource for FileConfig {
    fn load(&self) -> Result<PartialSettings> {
        if !self.is_available() {
            return Err(AutoImportError::ConfigNotFound {
                path: self.path.clone(),
            });
        }
        parser::parse_config_file(&self.path)
    }

    fn is_available(&self) -> bool {
        self.path.is_file()
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl Default for FileConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Environment variable configuration source
pub struct EnvConfig {
    prefix: String,
    name: String,
}

impl EnvConfig {
    pub fn new(prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        Self {
            name: format!("{} environment variables", &prefix),
            prefix,
        }
    }

    fn var(&self, key: &str) -> Option<String> {
        std::env::var(format!("{}_{}", self.prefix, key))
            .ok()
            .filter(|value| !value.trim().is_empty())
    }
}

impl ConfigSource for EnvConfig {
    fn load(&self) -> Result<PartialSettings> {
        let exclude = self.var("EXCLUDE").map(|exclude| {
            exclude
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        });

        let settings = PartialSettings {
            project_root: self.var("PROJECT_ROOT").map(PathBuf::from),
            output_dir: self.var("OUTPUT_DIR").map(PathBuf::from),
            cache_dir: self.var("CACHE_DIR").map(PathBuf::from),
            public_asset_url: self.var("PUBLIC_ASSET_URL"),
            environment: self.var("ENVIRONMENT"),
            exclude,
            ..Default::default()
        };

        Ok(settings)
    }

    fn is_available(&self) -> bool {
        ENV_KEYS.iter().any(|key| self.var(key).is_some())
    }

    fn name(&self) -> &str {
        &self.name
    }
}
