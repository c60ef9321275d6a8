//! Error types for request handling
//!
//! This module provides structured error types using thiserror for better
//! error handling and actionable error messages. Every failure here ends a
//! single request; none of them is fatal to the process.

use std::path::PathBuf;
use thiserror::Error;

use crate::engine::EngineError;
use crate::resolver::ResolutionError;

/// Main error type for requests
#[derive(Error, Debug)]
pub enum BrokerError {
    /// Settings, runtime or project resolution failed
    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    /// The first definition hop found nothing
    #[error("Can't jump to {target}.")]
    NoDefinition { target: String },

    /// The engine found nothing, or failed in its own way
    #[error("{message}")]
    NoResult { message: String },

    /// The diff aligner produced an offset outside the text
    #[error("Invalid file offset in diff: {offset} is outside '{path}' ({length} characters)")]
    DiffRange {
        path: PathBuf,
        offset: usize,
        length: usize,
    },

    /// A required command argument is missing
    #[error("{reason}")]
    InvalidArgument { reason: String },

    /// File system errors
    #[error("Failed to read file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Configuration errors
    #[error("Invalid configuration: {reason}")]
    Config { reason: String },
}

impl BrokerError {
    pub fn no_definition(target: impl Into<String>) -> Self {
        Self::NoDefinition {
            target: target.into(),
        }
    }

    pub fn no_result(message: impl Into<String>) -> Self {
        Self::NoResult {
            message: message.into(),
        }
    }

    pub fn invalid_argument(reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            reason: reason.into(),
        }
    }

    /// Get a stable status code for this error type.
    ///
    /// Returns a string identifier that can be used in JSON responses
    /// for programmatic error handling.
    pub fn status_code(&self) -> String {
        match self {
            Self::Resolution(e) => return e.status_code(),
            Self::NoDefinition { .. } => "NO_DEFINITION",
            Self::NoResult { .. } => "NO_RESULT",
            Self::DiffRange { .. } => "DIFF_RANGE",
            Self::InvalidArgument { .. } => "INVALID_ARGUMENT",
            Self::FileRead { .. } => "FILE_READ_ERROR",
            Self::Config { .. } => "CONFIG_ERROR",
        }
        .to_string()
    }

    /// Whether the error means "nothing found" rather than "something broke".
    pub fn is_empty_result(&self) -> bool {
        matches!(self, Self::NoDefinition { .. } | Self::NoResult { .. })
    }

    /// Get recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            Self::Resolution(e) => e.recovery_suggestions(),
            Self::DiffRange { .. } => vec![
                "The refactoring was discarded; no partial edits were produced",
                "Retry after saving the file so the engine sees the same text",
            ],
            Self::InvalidArgument { .. } => {
                vec!["Pass the missing argument after the command name"]
            }
            Self::FileRead { .. } => vec![
                "Check that the file exists and you have read permissions",
                "Ensure the file is not locked by another process",
            ],
            Self::Config { .. } => vec![
                "Run 'engine-broker config' to inspect the effective settings",
                "Run 'engine-broker init --force' to regenerate the settings file",
            ],
            Self::NoDefinition { .. } | Self::NoResult { .. } => vec![],
        }
    }
}

impl From<EngineError> for BrokerError {
    fn from(error: EngineError) -> Self {
        Self::NoResult {
            message: error.message,
        }
    }
}

/// Result type alias for request operations
pub type BrokerResult<T> = Result<T, BrokerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_errors_surface_as_no_result() {
        let err: BrokerError = EngineError::new("parse failed").into();
        assert_eq!(err.status_code(), "NO_RESULT");
        assert_eq!(err.to_string(), "parse failed");
        assert!(err.is_empty_result());
    }

    #[test]
    fn resolution_errors_keep_their_code() {
        let err: BrokerError = ResolutionError::environment("/no/python").into();
        assert_eq!(err.status_code(), "RESOLUTION_ENVIRONMENT");
        assert_eq!(err.to_string(), "Cannot find interpreter path /no/python.");
        assert!(!err.recovery_suggestions().is_empty());
    }

    #[test]
    fn no_definition_message() {
        let err = BrokerError::no_definition("implementation");
        assert_eq!(err.to_string(), "Can't jump to implementation.");
    }
}
