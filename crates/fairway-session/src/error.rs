//! Error types for the session layer.
//!
//! The `Display` strings go to the client as `error{message}`.

/// Errors that can occur during authentication and session bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// The presented token is not 64 lowercase hex characters.
    #[error("invalid session token")]
    InvalidToken,

    /// The token is well formed but unknown (never issued, or discarded).
    #[error("session not found")]
    SessionNotFound,

    /// The token's lifetime has passed. It is discarded on this path.
    #[error("session expired")]
    SessionExpired,

    /// The connection already completed authentication.
    #[error("already authenticated")]
    AlreadyAuthenticated,

    /// The connection tried something before authenticating.
    #[error("not authenticated")]
    NotAuthenticated,

    /// The OS random source failed while minting a token.
    #[error("random source unavailable: {0}")]
    RandomSource(String),
}
