//! Domain error types.

use thiserror::Error;

/// Top-level domain error type.
#[derive(Debug, Error)]
pub enum DomainError {
    /// A validation error in domain logic or user input.
    #[error("validation error: {0}")]
    Validation(String),

    /// An operation was attempted in a session phase that does not allow it.
    #[error("invalid phase: expected {expected}, found {actual}")]
    InvalidPhase {
        /// The phase the operation requires.
        expected: &'static str,
        /// The phase the session is actually in.
        actual: &'static str,
    },

    /// A request to a remote boundary is already outstanding.
    #[error("a request is already in flight")]
    TurnInFlight,

    /// The remote boundary could not be reached or answered with a
    /// non-success status.
    #[error("transport error: {0}")]
    Transport(String),

    /// The remote boundary answered with a payload that violates the
    /// exchange contract.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Durable local storage is unavailable.
    #[error("storage error: {0}")]
    Storage(String),
}

impl DomainError {
    /// Returns `true` for failures raised while talking to a remote boundary.
    #[must_use]
    pub fn is_boundary_failure(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Protocol(_))
    }
}
