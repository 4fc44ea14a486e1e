//! Error types for the opsgate client.
//!
//! # Design
//! Local argument problems (`Validation`) are raised before any request is
//! built, so callers can tell "never left the process" apart from failures
//! reported by the server (`Api`) or by the transport (`Transport`).
//! A missing resource is an `Api` error with status 404;
//! [`SdkError::is_not_found`] checks for exactly that.

use serde_json::Value;
use thiserror::Error;

/// Failure reported by a [`Transport`](crate::Transport) implementation.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The request could not be sent or the response could not be read.
    #[error("I/O failure: {0}")]
    Io(String),

    /// The transport gave up waiting for the server.
    #[error("request timed out")]
    Timeout,
}

/// Errors returned by the dispatcher and every service.
#[derive(Debug, Error)]
pub enum SdkError {
    /// A required argument was missing, empty, or whitespace-only.
    #[error("invalid argument `{field}`: {message}")]
    Validation { field: &'static str, message: String },

    /// The server returned a non-2xx status.
    #[error("API error (status {status}): {message}")]
    Api {
        status: u16,
        message: String,
        /// Structured error payload, when the server sent JSON.
        body: Option<Value>,
    },

    #[error("transport failed: {0}")]
    Transport(#[from] TransportError),

    /// The request body could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The response body did not match the expected shape.
    #[error("failed to decode {context}: {source}")]
    Decode {
        context: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl SdkError {
    pub(crate) fn validation(field: &'static str, message: impl Into<String>) -> Self {
        SdkError::Validation {
            field,
            message: message.into(),
        }
    }

    /// HTTP status for `Api` errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            SdkError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, SdkError::Validation { .. })
    }
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, SdkError>;
