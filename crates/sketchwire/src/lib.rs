//! # Sketchwire
//!
//! Real-time multiplayer draw-and-guess game server.
//!
//! Players connect over WebSocket, join a single shared room, and take
//! turns drawing a secret word while everyone else guesses. The server is
//! authoritative: one room actor owns all game state, and each connection
//! task only decodes, gates and forwards.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sketchwire::prelude::*;
//!
//! # async fn start() -> Result<(), SketchError> {
//! let server = SketchServer::<InMemoryUserDirectory>::builder()
//!     .bind("127.0.0.1:3001")
//!     .build(
//!         StaticWordList::seeded(),
//!         InMemoryResultStore::new(),
//!         InMemoryUserDirectory::new(),
//!     )
//!     .await?;
//! server.run().await
//! # }
//! ```

mod config;
mod error;
mod handler;
mod server;

pub use config::{DEFAULT_BIND_ADDR, ServerArgs, ServerConfig};
pub use error::SketchError;
pub use server::{SketchServer, SketchServerBuilder};

/// Everything needed to configure and run a server.
pub mod prelude {
    pub use crate::{ServerArgs, ServerConfig, SketchError, SketchServer, SketchServerBuilder};

    pub use sketchwire_protocol::{
        ClientEvent, Codec, JsonCodec, Phase, PlayerView, Role, ServerEvent, SessionId,
    };
    pub use sketchwire_room::{
        AdapterError, FallbackWordSource, GameOutcome, GameRecord, InMemoryResultStore,
        ResultStore, RoomConfig, RoomError, RoomHandle, RoomSnapshot, StaticWordList,
        WordEntry, WordSource,
    };
    pub use sketchwire_session::{
        AdminToken, InMemoryUserDirectory, SessionError, UserDirectory,
    };
    pub use sketchwire_transport::{ConnectionId, TransportError};
}
