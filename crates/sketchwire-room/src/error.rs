//! Error types for the room layer.

use sketchwire_session::SessionError;

/// Errors returned by room operations.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// Registration was refused by the connection registry.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The client sent something malformed or out of context.
    /// The message is safe to show to that client.
    #[error("{0}")]
    Validation(String),

    /// The room actor is gone (shut down or panicked).
    #[error("room is unavailable")]
    Unavailable,
}

/// Failures of the external adapters.
///
/// These never reach clients: the room logs them and carries on with
/// fallback data or skips persistence.
#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    /// The word source could not produce a word.
    #[error("word source failed: {0}")]
    WordSource(String),

    /// The result store rejected or failed a write.
    #[error("result store failed: {0}")]
    ResultStore(String),
}
