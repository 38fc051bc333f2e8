//! CLI error type with exit code handling
//!
//! Library errors are folded into three categories so that scripts can
//! tell a broken configuration from unreadable input.

use std::path::Path;

use miette::Diagnostic;
use thiserror::Error;
use xgen_core::CoreError;
use xgen_engine::GeneratorError;

use crate::exit_codes;

#[derive(Error, Debug, Diagnostic, Clone)]
pub enum CliError {
    /// Invalid generator or resource configuration
    #[error("Configuration error: {message}")]
    #[diagnostic(code(xgen::cli::config))]
    Config {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// IO error (file not found, permissions, etc.)
    #[error("IO error: {message}")]
    #[diagnostic(code(xgen::cli::io))]
    Io { message: String },

    /// Anything else, with the formatted source message
    #[error("{message}")]
    #[diagnostic(code(xgen::cli::error))]
    Other { message: String },
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Config { .. } => exit_codes::CONFIG_ERROR,
            CliError::Io { .. } => exit_codes::IO_ERROR,
            CliError::Other { .. } => exit_codes::ERROR,
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            help: None,
        }
    }

    /// Error while loading one of the input files
    pub fn load(path: &Path, err: CoreError) -> Self {
        match err {
            CoreError::Io(err) => Self::Io {
                message: format!("{}: {}", path.display(), err),
            },
            err => Self::Config {
                message: format!("{}: {}", path.display(), err),
                help: None,
            },
        }
    }

    /// Error while generating the resource described by `path`
    pub fn generate(path: &Path, err: GeneratorError) -> Self {
        let help = err.help().map(|h| h.to_string());
        let message = format!("{}: {}", path.display(), err);

        if let GeneratorError::Core(CoreError::Io(_)) = err {
            return Self::Io { message };
        }
        if err.is_config_error() {
            Self::Config { message, help }
        } else {
            Self::Other { message }
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::Io {
            message: err.to_string(),
        }
    }
}

impl From<walkdir::Error> for CliError {
    fn from(err: walkdir::Error) -> Self {
        CliError::Io {
            message: err.to_string(),
        }
    }
}

impl From<serde_yaml::Error> for CliError {
    fn from(err: serde_yaml::Error) -> Self {
        CliError::Other {
            message: format!("Failed to render YAML: {}", err),
        }
    }
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
