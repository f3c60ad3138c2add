//! Error context utilities
//!
//! Adapters from foreign errors and options into [`AutoImportError`], and
//! severity-aware logging for errors that do not stop the build.

use crate::error::types::ErrorSeverity;
use crate::error::{AutoImportError, Result};

/// Extension trait for Result to add context to errors
pub trait ResultExt<T> {
    /// Turn any error into a configuration error prefixed with `context`
    fn with_context<C, F>(self, context: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: std::fmt::Display;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: std::error::Error + 'static,
{
    fn with_context<C, F>(self, context: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: std::fmt::Display,
    {
        self.map_err(|err| AutoImportError::Configuration {
            message: format!("{}: {}", context(), err),
        })
    }
}

/// Extension trait for Option to convert to Result with a custom error
pub trait OptionExt<T> {
    fn ok_or_error<F>(self, err_fn: F) -> Result<T>
    where
        F: FnOnce() -> AutoImportError;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_error<F>(self, err_fn: F) -> Result<T>
    where
        F: FnOnce() -> AutoImportError,
    {
        self.ok_or_else(err_fn)
    }
}

/// Log an error at the level its severity maps to
pub fn log_error(err: &AutoImportError) {
    let message = err.user_message();
    match err.severity() {
        ErrorSeverity::Warning => tracing::warn!("{}", message),
        ErrorSeverity::Error => tracing::error!("{}", message),
        ErrorSeverity::Critical => tracing::error!(critical = true, "{}", message),
    }
}
