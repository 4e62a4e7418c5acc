//! Error type shared by the responder library.
//!
//! Every stage of a polling tick returns [`Result`], so callers can use `?`
//! throughout and decide at the tick boundary whether a failure is logged or
//! propagated.

use thiserror::Error;

/// Errors raised while authorizing, talking to the mail provider, or
/// composing replies.
#[derive(Debug, Error)]
pub enum ResponderError {
    /// Interactive or refresh-token authorization failed
    #[error("Authorization failed: {0}")]
    Auth(String),

    /// Invalid runtime configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// The mail provider rejected or failed a call
    #[error("Mail provider error during {operation}: {message}")]
    Provider { operation: &'static str, message: String },

    /// A provider response lacked a field the pipeline depends on
    #[error("Provider response missing {0}")]
    MissingField(&'static str),

    /// A raw message payload was not valid base64url
    #[error("Invalid message encoding: {0}")]
    Encoding(#[from] base64::DecodeError),

    /// Credential or client registration file could not be read or written
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Credential or client registration file was not valid JSON
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A spawned reply task panicked or was cancelled
    #[error("Reply task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl ResponderError {
    /// Wrap a provider failure with the name of the call that produced it
    pub fn provider(operation: &'static str, err: impl std::fmt::Display) -> Self {
        ResponderError::Provider {
            operation,
            message: err.to_string(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        ResponderError::Config(message.into())
    }
}

/// Result type alias for responder operations
pub type Result<T> = std::result::Result<T, ResponderError>;
