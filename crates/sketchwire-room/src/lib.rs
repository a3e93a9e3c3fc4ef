//! The Sketchwire game room.
//!
//! One room runs as a single Tokio task (actor model) that owns the room
//! state and the connection registry. Everything that mutates either goes
//! through its command channel, so there is no locking.
//!
//! # Key types
//!
//! - [`spawn_room`] / [`RoomHandle`]: start the room and talk to it
//! - [`RoomState`]: players, phase, turn counters, secret word
//! - [`RoomConfig`]: delays, scoring and limits
//! - [`WordSource`]: where secret words come from
//! - [`ResultStore`]: where finished games are written
//!
//! Internally the actor is split by concern: `scheduler` drives the phase
//! state machine, `router` dispatches client events, `broadcast` fans
//! frames out.

mod broadcast;
mod config;
mod error;
mod results;
mod room;
mod router;
mod scheduler;
mod state;
mod words;

pub use broadcast::Fanout;
pub use config::RoomConfig;
pub use error::{AdapterError, RoomError};
pub use results::{
    GameOutcome, GameRecord, InMemoryResultStore, ResultStore, Standing, UserStats,
    persist_game,
};
pub use room::{JoinRequest, RoomHandle, RoomSnapshot, spawn_room};
pub use router::validate_join;
pub use state::{Departure, Player, RoomState, mask_word};
pub use words::{
    FallbackWordSource, StaticWordList, WordEntry, WordSource, fallback_word, fetch_word,
};
