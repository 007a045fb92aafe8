//! Error taxonomy for the enqueue path.
//!
//! Validation errors are the caller's fault and are rejected before any
//! telemetry work. Encoding and transport errors abort a single request and
//! are never retried here.

use thiserror::Error;

use crate::queue::TransportError;

/// Request rejected before anything was published.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("invalid request body: {0}")]
    Malformed(String),

    #[error("message must not be empty")]
    EmptyMessage,
}

/// Failure after validation, while building or publishing the message.
#[derive(Debug, Error)]
pub enum EnqueueError {
    #[error("failed to encode message: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("failed to enqueue message: {0}")]
    Transport(#[from] TransportError),
}

impl EnqueueError {
    /// Short, stable description returned to HTTP callers.
    pub fn public_message(&self) -> &'static str {
        match self {
            EnqueueError::Encode(_) => "Failed to marshal message",
            EnqueueError::Transport(_) => "Failed to enqueue message",
        }
    }
}
