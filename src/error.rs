//! Error handling for fxchain
//!
//! Every failure surfaces as one `FxError`. Validation failures carry the
//! exact wording shown to callers, so their `Display` output is stable.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Result type alias for fxchain operations
pub type Result<T> = std::result::Result<T, FxError>;

/// Main error type for fxchain operations
#[derive(Error, Debug)]
pub enum FxError {
    // Parameter Errors
    #[error("{message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    // File Errors
    #[error("Cannot access audio file {}: {reason}", .path.display())]
    FileAccess {
        path: PathBuf,
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    // Processing Errors
    #[error("Render failed: {reason}")]
    Render { reason: String },

    // Playback Errors
    #[error("{reason}")]
    Seek { requested: f64, reason: String },

    // Configuration Errors
    #[error("Invalid configuration: {reason}")]
    Config { reason: String },

    // I/O Errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization Errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl FxError {
    /// Build a `FileAccess` error from any underlying error
    pub fn file_access<E>(path: &Path, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        FxError::FileAccess {
            path: path.to_path_buf(),
            reason: source.to_string(),
            source: Some(Box::new(source)),
        }
    }

    /// Build a `FileAccess` error with a plain reason
    pub fn file_reason(path: &Path, reason: impl Into<String>) -> Self {
        FxError::FileAccess {
            path: path.to_path_buf(),
            reason: reason.into(),
            source: None,
        }
    }

    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            FxError::Validation { .. } => "VALIDATION_ERROR",
            FxError::FileAccess { .. } => "FILE_ACCESS_ERROR",
            FxError::Render { .. } => "RENDER_ERROR",
            FxError::Seek { .. } => "SEEK_ERROR",
            FxError::Config { .. } => "CONFIG_ERROR",
            FxError::Io(_) => "IO_ERROR",
            FxError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Check if the caller can fix the input and retry
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            FxError::Validation { .. }
                | FxError::FileAccess { .. }
                | FxError::Seek { .. }
                | FxError::Config { .. }
        )
    }

    /// Name of the offending option, for validation errors
    pub fn field(&self) -> Option<&'static str> {
        match self {
            FxError::Validation { field, .. } => Some(*field),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_displays_message_verbatim() {
        let err = FxError::Validation {
            field: "delayTimeInMS",
            message: "delayTimeInMS must be between 0 and 2000.".to_string(),
        };
        assert_eq!(err.to_string(), "delayTimeInMS must be between 0 and 2000.");
        assert_eq!(err.field(), Some("delayTimeInMS"));
    }

    #[test]
    fn test_error_codes() {
        let err = FxError::file_reason(Path::new("missing.wav"), "not found");
        assert_eq!(err.error_code(), "FILE_ACCESS_ERROR");
        assert!(err.is_recoverable());

        let err = FxError::Render {
            reason: "engine stalled".to_string(),
        };
        assert_eq!(err.error_code(), "RENDER_ERROR");
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_file_access_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = FxError::file_access(Path::new("a.wav"), io);
        assert!(std::error::Error::source(&err).is_some());
        assert!(err.to_string().contains("a.wav"));
    }
}
