//! Wire protocol for Sketchwire.
//!
//! This crate defines what clients and the server say to each other:
//!
//! - **Types** ([`ClientEvent`], [`ServerEvent`], [`PlayerView`],
//!   [`Phase`], ...): closed, kind-tagged JSON events.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how events become text
//!   frames and back, including the unknown-kind / malformed split used
//!   by the message router.
//! - **Errors** ([`ProtocolError`]).
//!
//! ```text
//! Transport (text frames) → Protocol (events) → Room (state machine)
//! ```

mod codec;
mod error;
mod types;

pub use codec::{Codec, JsonCodec};
pub use error::ProtocolError;
pub use types::{
    ClientEvent, Phase, PlayerView, Role, ServerEvent, SessionId,
    StrokePayload,
};
