//! Codec trait and the JSON implementation.
//!
//! A codec converts between events and text frames. Everything above the
//! transport is written against [`Codec`], so the wire format can change
//! without touching the router.

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::{ClientEvent, ProtocolError};

/// Encodes values into text frames and decodes raw frames back.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into a text frame.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<String, ProtocolError>;

    /// Deserializes a raw frame into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed or don't
    /// match the expected type.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

/// A [`Codec`] backed by `serde_json`.
///
/// ```rust
/// use sketchwire_protocol::{ClientEvent, Codec, JsonCodec};
///
/// let codec = JsonCodec;
/// let event = codec
///     .decode_client_event(br#"{"type":"chat","content":"hi"}"#)
///     .unwrap();
/// assert_eq!(event, ClientEvent::Chat { content: "hi".into() });
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<String, ProtocolError> {
        serde_json::to_string(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}

impl JsonCodec {
    /// Decodes an inbound frame, separating unknown kinds from bad payloads.
    ///
    /// - not JSON at all → [`ProtocolError::Decode`]
    /// - not an object, or no string `type` → [`ProtocolError::InvalidMessage`]
    /// - `type` not in [`ClientEvent::KINDS`] → [`ProtocolError::UnknownKind`]
    /// - known kind with missing/mistyped fields → [`ProtocolError::Decode`]
    pub fn decode_client_event(&self, data: &[u8]) -> Result<ClientEvent, ProtocolError> {
        let value: Value = self.decode(data)?;
        let kind = match value.get("type") {
            Some(Value::String(kind)) => kind,
            Some(_) => {
                return Err(ProtocolError::InvalidMessage(
                    "`type` must be a string".into(),
                ));
            }
            None => {
                return Err(ProtocolError::InvalidMessage(
                    "missing `type` field".into(),
                ));
            }
        };
        if !ClientEvent::KINDS.contains(&kind.as_str()) {
            return Err(ProtocolError::UnknownKind(kind.clone()));
        }
        serde_json::from_value(value).map_err(ProtocolError::Decode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Phase, ServerEvent};

    #[test]
    fn test_encode_server_event_is_tagged_json() {
        let frame = JsonCodec
            .encode(&ServerEvent::TimeUpdate { time_remaining: 59 })
            .unwrap();
        assert_eq!(frame, r#"{"type":"timeUpdate","timeRemaining":59}"#);
    }

    #[test]
    fn test_decode_known_kind() {
        let event = JsonCodec
            .decode_client_event(br#"{"type":"guess","content":"chat"}"#)
            .unwrap();
        assert_eq!(event, ClientEvent::Guess { content: "chat".into() });
    }

    #[test]
    fn test_decode_legacy_draw_alias() {
        let event = JsonCodec
            .decode_client_event(br#"{"type":"draw","x":1}"#)
            .unwrap();
        assert!(matches!(event, ClientEvent::DrawingStroke(ref p) if p["x"] == 1));
    }

    #[test]
    fn test_unknown_kind_is_not_reportable() {
        let err = JsonCodec
            .decode_client_event(br#"{"type":"teleport"}"#)
            .unwrap_err();
        assert!(matches!(err, ProtocolError::UnknownKind(ref k) if k == "teleport"));
        assert!(!err.is_reportable());
    }

    #[test]
    fn test_missing_type_is_invalid() {
        let err = JsonCodec.decode_client_event(br#"{"content":"x"}"#).unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidMessage(_)));
        assert!(err.is_reportable());
    }

    #[test]
    fn test_non_object_is_invalid() {
        let err = JsonCodec.decode_client_event(b"[1,2,3]").unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidMessage(_)));
    }

    #[test]
    fn test_garbage_bytes_fail_decode() {
        let err = JsonCodec.decode_client_event(b"not json {").unwrap_err();
        assert!(matches!(err, ProtocolError::Decode(_)));
        assert!(err.is_reportable());
    }

    #[test]
    fn test_known_kind_with_bad_fields_fails_decode() {
        let err = JsonCodec
            .decode_client_event(br#"{"type":"chat","content":42}"#)
            .unwrap_err();
        assert!(matches!(err, ProtocolError::Decode(_)));
    }

    #[test]
    fn test_generic_decode_reads_server_events() {
        let frame = br#"{"type":"waitingForPlayers","message":"need more"}"#;
        let event: ServerEvent = JsonCodec.decode(frame).unwrap();
        assert_eq!(
            event,
            ServerEvent::WaitingForPlayers { message: "need more".into() }
        );
        let phase: Phase = JsonCodec.decode(br#""starting""#).unwrap();
        assert_eq!(phase, Phase::Starting);
    }
}
