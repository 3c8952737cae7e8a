//! Error handling for Svgen
//!
//! Every failure in the generation pipeline surfaces as a typed value the
//! UI layer can turn into a message. Nothing here aborts the process.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::InvocationError;
use crate::storage::StorageError;
use crate::svg::Rejection;

/// Result type alias for Svgen operations
pub type Result<T> = std::result::Result<T, SvgenError>;

/// Distinguishable error kinds, one per pipeline failure mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    InvalidRequest,
    NoSvgFound,
    TooLarge,
    MalformedRoot,
    MissingViewBox,
    UnsafeContent,
    DisallowedElement,
    Invocation,
    Storage,
    Config,
    Io,
}

/// Main error type for Svgen operations
#[derive(Error, Debug)]
pub enum SvgenError {
    // Request Errors
    #[error("Invalid {field}: {reason}")]
    InvalidRequest { field: &'static str, reason: String },

    #[error("Unknown model: {model}")]
    UnknownModel { model: String },

    #[error("Model not enabled in this deployment: {model}")]
    ModelNotAllowed { model: String },

    // Content Errors
    #[error("No SVG markup found in model response")]
    NoSvgFound,

    #[error("SVG rejected: {0}")]
    Rejected(Rejection),

    // Collaborator Errors
    #[error("Model invocation failed: {0}")]
    Invocation(#[from] InvocationError),

    #[error("Stage storage failed: {0}")]
    Storage(#[from] StorageError),

    // Configuration Errors
    #[error("Configuration error: {reason}")]
    Config { reason: String },

    #[error("Missing required environment variables: {}", vars.join(", "))]
    MissingEnvironment { vars: Vec<String> },

    // I/O Errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization Errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<Rejection> for SvgenError {
    fn from(rejection: Rejection) -> Self {
        SvgenError::Rejected(rejection)
    }
}

impl SvgenError {
    /// Get the kind of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            SvgenError::InvalidRequest { .. }
            | SvgenError::UnknownModel { .. }
            | SvgenError::ModelNotAllowed { .. } => ErrorKind::InvalidRequest,
            SvgenError::NoSvgFound => ErrorKind::NoSvgFound,
            SvgenError::Rejected(rejection) => rejection.kind(),
            SvgenError::Invocation(_) => ErrorKind::Invocation,
            SvgenError::Storage(_) => ErrorKind::Storage,
            SvgenError::Config { .. } | SvgenError::MissingEnvironment { .. } => ErrorKind::Config,
            SvgenError::Io(_) | SvgenError::Serialization(_) => ErrorKind::Io,
        }
    }

    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            SvgenError::InvalidRequest { .. } => "INVALID_REQUEST",
            SvgenError::UnknownModel { .. } => "UNKNOWN_MODEL",
            SvgenError::ModelNotAllowed { .. } => "MODEL_NOT_ALLOWED",
            SvgenError::NoSvgFound => "NO_SVG_FOUND",
            SvgenError::Rejected(rejection) => rejection.error_code(),
            SvgenError::Invocation(_) => "INVOCATION_ERROR",
            SvgenError::Storage(_) => "STORAGE_ERROR",
            SvgenError::Config { .. } => "CONFIG_ERROR",
            SvgenError::MissingEnvironment { .. } => "MISSING_ENVIRONMENT",
            SvgenError::Io(_) => "IO_ERROR",
            SvgenError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Check if retrying the same submission could succeed.
    ///
    /// Model output is non-deterministic, so content rejections are worth
    /// another attempt; request and configuration errors are not.
    pub fn is_recoverable(&self) -> bool {
        match self {
            SvgenError::NoSvgFound => true,
            SvgenError::Rejected(_) => true,
            SvgenError::Invocation(e) => e.is_transient(),
            SvgenError::Storage(e) => e.is_transient(),
            _ => false,
        }
    }

    /// Get recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self.kind() {
            ErrorKind::InvalidRequest => vec![
                "Describe the image in 10 to 1000 characters",
                "Use only letters, digits, '-' and '_' in the filename",
                "Pick one of the listed models",
            ],
            ErrorKind::NoSvgFound => vec![
                "Try generating again; the model answered without SVG code",
                "Ask for a simpler image",
            ],
            ErrorKind::TooLarge => vec![
                "Ask for fewer shapes or less detail",
                "Raise the configured size limit if large files are expected",
            ],
            ErrorKind::MalformedRoot | ErrorKind::MissingViewBox => vec![
                "Try generating again",
                "Try a different model",
            ],
            ErrorKind::UnsafeContent | ErrorKind::DisallowedElement => vec![
                "Avoid asking for interactivity, scripts or embedded web content",
                "Try generating again",
            ],
            ErrorKind::Invocation => vec![
                "Check that Cortex AI is enabled for your account",
                "Check your role can use the selected model",
                "Try a different model",
            ],
            ErrorKind::Storage => vec![
                "Make sure you have CREATE STAGE privileges",
                "Verify stage permissions and try again",
            ],
            ErrorKind::Config => vec![
                "Check the configuration file and environment variables",
            ],
            ErrorKind::Io => vec![],
        }
    }

    /// Get a user-friendly message for this error
    pub fn friendly_message(&self) -> String {
        match self {
            SvgenError::InvalidRequest { field, reason } => {
                format!("Please check the {}: {}.", field, reason)
            }
            SvgenError::NoSvgFound => {
                "The model replied, but its answer didn't contain any SVG code.".to_string()
            }
            SvgenError::Rejected(rejection) => {
                format!("The generated image was not saved: {}.", rejection.describe())
            }
            SvgenError::Invocation(e) => {
                format!("The AI model could not be reached: {}", e)
            }
            SvgenError::Storage(e) => format!("Upload failed: {}", e),
            _ => self.to_string(),
        }
    }
}
