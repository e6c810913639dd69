use thiserror::Error;

/// Error taxonomy for the hold subsystem. Every public operation returns one
/// of these as a typed result; callers match on the kind instead of parsing
/// message strings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HoldError {
    /// Legitimate contention: the cycle already carries a blocking hold.
    #[error("cycle is already on hold")]
    AlreadyHeld,

    /// Malformed input; the caller must fix the payload, not retry it.
    #[error("invalid request: {0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(String),

    /// Transient store failure; safe to retry with backoff. Must never be
    /// collapsed into `AlreadyHeld` or silent success.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
}

impl HoldError {
    pub fn not_found(what: impl Into<String>) -> Self {
        HoldError::NotFound(what.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        HoldError::Validation(msg.into())
    }
}
