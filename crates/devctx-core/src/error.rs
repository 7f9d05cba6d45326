//! Broker error types

use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors reported by the broker, organized by contract violation kind.
///
/// Every error is raised synchronously before any state mutation takes
/// place. The broker never retries and never recovers internally; callers
/// treat each of these as an integration bug in the producer, not as a
/// transient condition.
#[derive(Debug, Error)]
pub enum Error {
    // ─────────────────────────────────────────────────────────────
    // Infrastructure
    // ─────────────────────────────────────────────────────────────
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ─────────────────────────────────────────────────────────────
    // Invalid Input
    // ─────────────────────────────────────────────────────────────
    /// The update payload matched none of the accepted request shapes.
    ///
    /// `params` carries a best-effort serialization of the offending
    /// payload so producers can see what they sent.
    #[error("Invalid params: {params}")]
    InvalidParams { params: String },

    // ─────────────────────────────────────────────────────────────
    // Self-Contradictory Requests
    // ─────────────────────────────────────────────────────────────
    /// A folder-set update's own fields contradict each other.
    #[error("Illegal argument. {message}")]
    IllegalArgument { message: String },

    // ─────────────────────────────────────────────────────────────
    // Requests Conflicting With Current State
    // ─────────────────────────────────────────────────────────────
    /// A folder-set transition is inconsistent with the currently open set.
    #[error("Illegal state update. {message}")]
    IllegalStateUpdate { message: String },

    /// An update targets a folder that is not currently open.
    #[error("Illegal state. {message}")]
    IllegalState { message: String },

    // ─────────────────────────────────────────────────────────────
    // Lifecycle
    // ─────────────────────────────────────────────────────────────
    /// Any operation invoked after disposal.
    #[error("Disposed")]
    Disposed,
}

// ─────────────────────────────────────────────────────────────────
// Convenience Constructors
// ─────────────────────────────────────────────────────────────────

impl Error {
    pub fn invalid_params(params: impl Into<String>) -> Self {
        Self::InvalidParams {
            params: params.into(),
        }
    }

    pub fn illegal_argument(message: impl Into<String>) -> Self {
        Self::IllegalArgument {
            message: message.into(),
        }
    }

    pub fn illegal_state_update(message: impl Into<String>) -> Self {
        Self::IllegalStateUpdate {
            message: message.into(),
        }
    }

    pub fn illegal_state(message: impl Into<String>) -> Self {
        Self::IllegalState {
            message: message.into(),
        }
    }

    /// Check whether this error reports a malformed payload rather than a
    /// payload that conflicts with the broker's current state.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidParams { .. } | Error::IllegalArgument { .. }
        )
    }
}
