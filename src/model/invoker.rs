//! Model invoker trait and core types
//!
//! Defines the boundary to hosted generative models. Whatever comes back is
//! untrusted text; interpreting it is the extractor's job.

use thiserror::Error;

use crate::request::ModelId;

/// Failures reported by a model invoker
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvocationError {
    #[error("model service unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("model call timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("connection failed: {message}")]
    Connection { message: String },

    #[error("model service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("unreadable model response: {reason}")]
    InvalidResponse { reason: String },

    #[error("model returned an empty response")]
    EmptyResponse,
}

impl InvocationError {
    /// Whether the same call may succeed if repeated
    pub fn is_transient(&self) -> bool {
        match self {
            InvocationError::Timeout { .. } | InvocationError::Connection { .. } => true,
            InvocationError::Status { status, .. } => *status == 429 || *status >= 500,
            InvocationError::EmptyResponse => true,
            _ => false,
        }
    }
}

/// Trait that all model backends implement
pub trait ModelInvoker: Send + Sync {
    /// Backend name for logs
    fn name(&self) -> &str;

    /// Send `instruction` to `model` and return its raw text reply
    fn invoke(&self, instruction: &str, model: ModelId) -> Result<String, InvocationError>;

    /// Check if the backend is ready to use
    fn is_available(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(InvocationError::Timeout { timeout_ms: 10 }.is_transient());
        assert!(InvocationError::Status {
            status: 503,
            body: String::new()
        }
        .is_transient());
        assert!(!InvocationError::Status {
            status: 401,
            body: String::new()
        }
        .is_transient());
        assert!(!InvocationError::Unavailable {
            reason: "feature off".to_string()
        }
        .is_transient());
    }
}
