//! Error types for the protocol layer.

/// Errors that can occur while encoding or decoding events.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning an event into a frame).
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// The frame is not valid JSON, or a known event kind is missing
    /// required fields / carries fields of the wrong type.
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The frame names an event kind this server does not handle.
    /// Routers log and drop these without answering the sender.
    #[error("unknown event kind: {0}")]
    UnknownKind(String),

    /// The frame passed deserialization but is still unusable, e.g. it
    /// has no `type` tag at all.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}

impl ProtocolError {
    /// Returns `true` for errors the sender should be told about.
    ///
    /// Unknown kinds are silently ignored; everything else is a
    /// validation failure that earns an `error` event.
    pub fn is_reportable(&self) -> bool {
        !matches!(self, Self::UnknownKind(_))
    }
}
