//! Error types for the session layer.

use sketchwire_protocol::SessionId;
use sketchwire_transport::ConnectionId;

/// Errors raised by the connection registry and identity lookup.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The display name belongs to a player whose connection is still open.
    #[error("display name {0:?} is already in use by an active player")]
    DuplicateActiveSession(String),

    /// The connection already has a registered player.
    #[error("connection {0} has already joined")]
    AlreadyRegistered(ConnectionId),

    /// No player is registered for the given connection.
    #[error("connection {0} is not registered")]
    NotRegistered(ConnectionId),

    /// The player's outbound channel is gone (writer task has exited).
    #[error("outbound channel closed for session {0}")]
    ChannelClosed(SessionId),

    /// The user directory could not be queried.
    #[error("user lookup failed: {0}")]
    LookupFailed(String),
}
