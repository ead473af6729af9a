//! Error types for fullnode calls, transaction handling and sessions.

use std::time::Duration;
use thiserror::Error;

/// Errors raised by the library.
///
/// Transport-level failures (`Transport`, `Rpc`, `Timeout`) come from the
/// external call itself. `MissingPrecondition` is raised locally before a
/// call is attempted. None of these are retried.
#[derive(Error, Debug)]
pub enum BenchError {
    // ─────────────────────────────────────────────────────────────
    // External call failures
    // ─────────────────────────────────────────────────────────────
    #[error("transport error: {0}")]
    Transport(String),

    #[error("fullnode returned error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("call timed out after {after:?}")]
    Timeout { after: Duration },

    #[error("object not found: {object_id}")]
    NotFound { object_id: String },

    #[error("object {object_id} could not be read ({code}): {detail}")]
    ObjectError {
        object_id: String,
        code: String,
        detail: String,
    },

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    // ─────────────────────────────────────────────────────────────
    // Local failures
    // ─────────────────────────────────────────────────────────────
    #[error("missing precondition: {0}")]
    MissingPrecondition(String),

    #[error("invalid private key: {0}")]
    InvalidKey(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("unsupported operation: {0}")]
    Unsupported(String),
}

impl BenchError {
    /// True for failures of the external call rather than local validation.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            BenchError::Transport(_)
                | BenchError::Rpc { .. }
                | BenchError::Timeout { .. }
                | BenchError::NotFound { .. }
                | BenchError::ObjectError { .. }
                | BenchError::MalformedResponse(_)
        )
    }
}

impl From<reqwest::Error> for BenchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            BenchError::MalformedResponse(err.to_string())
        } else {
            BenchError::Transport(err.to_string())
        }
    }
}

pub type Result<T, E = BenchError> = std::result::Result<T, E>;
