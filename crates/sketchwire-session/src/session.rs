//! Registry entries and the outbound frame channel.

use std::sync::Arc;

use sketchwire_protocol::SessionId;
use sketchwire_transport::ConnectionId;
use tokio::sync::mpsc;

use crate::SessionError;

/// What a connection's writer task is asked to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    /// Send one already-serialized text frame.
    ///
    /// Shared so a broadcast serializes once and every recipient gets a
    /// cheap clone.
    Frame(Arc<str>),
    /// Close the connection (kick or rejected join).
    Close,
}

/// Sending half of a connection's outbound queue.
///
/// Unbounded: the room actor must never wait on a slow client.
pub type PlayerSender = mpsc::UnboundedSender<Outbound>;

/// Creates the outbound queue for a fresh connection.
pub fn outbound_channel() -> (PlayerSender, mpsc::UnboundedReceiver<Outbound>) {
    mpsc::unbounded_channel()
}

/// One registered connection.
#[derive(Debug, Clone)]
pub struct RegistryEntry {
    /// Transport-level handle; never shown to clients.
    pub connection: ConnectionId,
    /// Ephemeral player identity issued at registration.
    pub session_id: SessionId,
    pub display_name: String,
    sender: PlayerSender,
}

impl RegistryEntry {
    pub(crate) fn new(
        connection: ConnectionId,
        session_id: SessionId,
        display_name: String,
        sender: PlayerSender,
    ) -> Self {
        Self {
            connection,
            session_id,
            display_name,
            sender,
        }
    }

    /// Whether the connection's writer task is still accepting frames.
    ///
    /// The writer drops its receiver when the socket closes or fails, so a
    /// closed channel is how a half-closed connection shows up here.
    pub fn is_open(&self) -> bool {
        !self.sender.is_closed()
    }

    /// Queues a frame for this connection.
    ///
    /// # Errors
    /// Returns [`SessionError::ChannelClosed`] if the writer has gone away.
    pub fn deliver(&self, frame: Arc<str>) -> Result<(), SessionError> {
        self.sender
            .send(Outbound::Frame(frame))
            .map_err(|_| SessionError::ChannelClosed(self.session_id.clone()))
    }

    /// Asks the writer task to close the connection.
    pub fn close(&self) {
        // Already gone is as good as closed.
        let _ = self.sender.send(Outbound::Close);
    }
}
