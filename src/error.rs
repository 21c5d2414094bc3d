//! Error types for printlog.
//!
//! Provides structured error handling with:
//! - Machine-readable error codes (`ErrorCode`)
//! - Category-based exit codes (2=document, 3=not_found, 4=validation, etc.)
//! - Retryability flags for scripted callers
//! - Context-aware recovery hints
//! - Structured JSON output for piped / non-TTY consumers

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for printlog operations.
pub type Result<T> = std::result::Result<T, Error>;

// ── Error Code ────────────────────────────────────────────────

/// Machine-readable error codes grouped by category.
///
/// Each code maps to a SCREAMING_SNAKE string and a category-based
/// exit code. Scripts match on the string or the exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Document (exit 2)
    AlreadyInitialized,
    FormatError,

    // Not Found (exit 3)
    RecordNotFound,

    // Validation (exit 4)
    ValidationError,
    InvalidArgument,

    // Config (exit 7)
    ConfigError,

    // I/O (exit 8)
    IoError,
    JsonError,
}

impl ErrorCode {
    /// Machine-readable SCREAMING_SNAKE code string.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        match self {
            Self::AlreadyInitialized => "ALREADY_INITIALIZED",
            Self::FormatError => "FORMAT_ERROR",
            Self::RecordNotFound => "RECORD_NOT_FOUND",
            Self::ValidationError => "VALIDATION_ERROR",
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::ConfigError => "CONFIG_ERROR",
            Self::IoError => "IO_ERROR",
            Self::JsonError => "JSON_ERROR",
        }
    }

    /// Category-based exit code (2-8).
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::AlreadyInitialized | Self::FormatError => 2,
            Self::RecordNotFound => 3,
            Self::ValidationError | Self::InvalidArgument => 4,
            Self::ConfigError => 7,
            Self::IoError | Self::JsonError => 8,
        }
    }

    /// Whether a caller should retry with corrected input.
    ///
    /// True for validation errors and bad arguments. False for missing
    /// records, corrupt documents, I/O or internal errors.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::ValidationError | Self::InvalidArgument)
    }
}

// ── Error Enum ────────────────────────────────────────────────

/// Errors that can occur in printlog operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Already initialized at {path}")]
    AlreadyInitialized { path: PathBuf },

    #[error("Malformed document: {0}")]
    Format(String),

    #[error("Record not found: {id}")]
    NotFound { id: String },

    #[error("Invalid restore payload: {0}")]
    Validation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Map this error to its structured `ErrorCode`.
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::AlreadyInitialized { .. } => ErrorCode::AlreadyInitialized,
            Self::Format(_) => ErrorCode::FormatError,
            Self::NotFound { .. } => ErrorCode::RecordNotFound,
            Self::Validation(_) => ErrorCode::ValidationError,
            Self::InvalidArgument(_) => ErrorCode::InvalidArgument,
            Self::Config(_) => ErrorCode::ConfigError,
            Self::Io(_) => ErrorCode::IoError,
            Self::Json(_) => ErrorCode::JsonError,
        }
    }

    /// Category-based exit code, delegating to the `ErrorCode`.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        self.error_code().exit_code()
    }

    /// Context-aware recovery hint.
    ///
    /// Returns `None` if no actionable suggestion exists.
    #[must_use]
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::AlreadyInitialized { path } => Some(format!(
                "A job document already exists at {}. Use `--force` to reinitialize.",
                path.display()
            )),

            Self::NotFound { id } => Some(format!(
                "No job with ID '{id}'. Use `printlog list` to see available jobs."
            )),

            Self::Format(_) => Some(
                "The job document could not be read. Restore it from a backup with \
                 `printlog backup import <file>`, or inspect it with `printlog status`."
                    .to_string(),
            ),

            Self::Validation(_) => Some(
                "A backup must be a JSON array of objects, each with a unique non-empty \"id\"."
                    .to_string(),
            ),

            Self::InvalidArgument(msg) => {
                if msg.contains("field") {
                    Some("Fields are given as key=value, e.g. --set material=PLA".to_string())
                } else {
                    None
                }
            }

            Self::Io(_) | Self::Json(_) | Self::Config(_) => None,
        }
    }

    /// Structured JSON representation for machine consumption.
    ///
    /// Includes error code, message, retryability, exit code, and
    /// optional recovery hint.
    #[must_use]
    pub fn to_structured_json(&self) -> serde_json::Value {
        let code = self.error_code();
        let mut obj = serde_json::json!({
            "error": {
                "code": code.as_str(),
                "message": self.to_string(),
                "retryable": code.is_retryable(),
                "exit_code": code.exit_code(),
            }
        });

        if let Some(hint) = self.hint() {
            obj["error"]["hint"] = serde_json::Value::String(hint);
        }

        obj
    }
}
