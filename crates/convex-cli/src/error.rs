//! CLI error types.

use std::path::PathBuf;

use thiserror::Error;

/// CLI error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Argument outside its valid range.
    #[error("Invalid {name}: {value}. {hint}")]
    InvalidArgument {
        /// Argument name.
        name: &'static str,
        /// Offending value.
        value: f64,
        /// What a valid value looks like.
        hint: &'static str,
    },

    /// Missing required argument.
    #[error("Missing required argument: {0}")]
    MissingArgument(String),

    /// Configuration error.
    #[error("Configuration error in {path}: {reason}")]
    Config {
        /// Configuration file.
        path: PathBuf,
        /// What went wrong.
        reason: String,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Creates an invalid argument error.
    pub fn invalid(name: &'static str, value: f64, hint: &'static str) -> Self {
        Self::InvalidArgument { name, value, hint }
    }
}

/// CLI result type.
pub type CliResult<T> = Result<T, CliError>;
