//! Error handling for auto-import
//!
//! This module provides the error taxonomy shared by every pipeline stage,
//! the result alias, and error context utilities.

pub mod context;
pub mod types;

pub use context::{log_error, OptionExt, ResultExt};
pub use types::{AutoImportError, ErrorSeverity, Result};
