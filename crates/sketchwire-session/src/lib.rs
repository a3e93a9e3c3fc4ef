//! Connection registry and player identity for Sketchwire.
//!
//! This crate answers "who is on the other end of this socket?":
//!
//! 1. **Registry**: [`ConnectionRegistry`] maps each live connection to a
//!    player session, rejects duplicate display names, and lazily purges
//!    connections that have already gone away.
//! 2. **Outbound frames**: every entry owns a [`PlayerSender`], the
//!    channel the connection's writer task drains.
//! 3. **Identity**: the [`UserDirectory`] hook resolves a display name to
//!    a persistent account id, and [`AdminToken`] gates admin actions.
//!
//! # How it fits in the stack
//!
//! ```text
//! Room Layer (above)  ← owns the registry inside the room actor
//!     ↕
//! Session Layer (this crate)
//!     ↕
//! Protocol / Transport (below)  ← SessionId, ConnectionId
//! ```

mod auth;
mod error;
mod manager;
mod session;

pub use auth::{AdminToken, InMemoryUserDirectory, UserDirectory};
pub use error::SessionError;
pub use manager::ConnectionRegistry;
pub use session::{Outbound, PlayerSender, RegistryEntry, outbound_channel};
