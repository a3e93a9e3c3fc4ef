//! Unified error type for the Sketchwire server.

use sketchwire_protocol::ProtocolError;
use sketchwire_room::{AdapterError, RoomError};
use sketchwire_session::SessionError;
use sketchwire_transport::TransportError;

/// Top-level error that wraps every layer's error.
///
/// The `#[from]` attribute on each variant generates the `From` impl, so
/// `?` converts layer errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum SketchError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, invalid message).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A registry or identity error (duplicate name, lookup failure).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A room-level error (validation, room gone).
    #[error(transparent)]
    Room(#[from] RoomError),

    /// A word source or result store failed.
    #[error(transparent)]
    Adapter(#[from] AdapterError),
}
