//! The connection registry: who is connected, in join order.
//!
//! # Concurrency note
//!
//! `ConnectionRegistry` is not thread-safe by itself. It is owned by the
//! room actor and only touched from that one task, so a plain `Vec` is
//! enough.

use std::fmt::Display;

use rand::Rng;
use sketchwire_protocol::SessionId;
use sketchwire_transport::ConnectionId;

use crate::{PlayerSender, RegistryEntry, SessionError};

/// Maps live connections to player sessions.
///
/// ```text
/// register() ──→ [open] ──(socket closes)──→ [closed] ──→ purge_closed()
///                   │                                        │
///                   └──────────── unregister() ◄─────────────┘
/// ```
///
/// Closed entries are not swept in the background; they are purged the
/// next time someone registers.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    entries: Vec<RegistryEntry>,
}

impl ConnectionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a connection under `display_name` and issues a session id.
    ///
    /// Call [`purge_closed`](Self::purge_closed) first so a player who
    /// dropped without a clean close can rejoin under the same name.
    ///
    /// # Errors
    /// - [`SessionError::AlreadyRegistered`] if the connection has joined
    /// - [`SessionError::DuplicateActiveSession`] if an open connection
    ///   already uses `display_name`
    pub fn register(
        &mut self,
        connection: ConnectionId,
        display_name: &str,
        sender: PlayerSender,
    ) -> Result<&RegistryEntry, SessionError> {
        if self.find_by_connection(connection).is_some() {
            return Err(SessionError::AlreadyRegistered(connection));
        }
        if self
            .entries
            .iter()
            .any(|e| e.is_open() && e.display_name == display_name)
        {
            return Err(SessionError::DuplicateActiveSession(
                display_name.to_string(),
            ));
        }

        let session_id = self.unused_session_id();
        tracing::info!(%connection, %session_id, display_name, "session registered");
        self.entries.push(RegistryEntry::new(
            connection,
            session_id,
            display_name.to_string(),
            sender,
        ));
        Ok(&self.entries[self.entries.len() - 1])
    }

    /// Removes every entry whose connection is no longer open.
    ///
    /// Returns the purged entries so the caller can drop the matching
    /// players from room state.
    pub fn purge_closed(&mut self) -> Vec<RegistryEntry> {
        let (open, closed): (Vec<_>, Vec<_>) =
            std::mem::take(&mut self.entries)
                .into_iter()
                .partition(RegistryEntry::is_open);
        self.entries = open;
        for entry in &closed {
            tracing::debug!(
                connection = %entry.connection,
                session_id = %entry.session_id,
                "purged stale connection"
            );
        }
        closed
    }

    /// Removes the entry for `connection`. Idempotent.
    pub fn unregister(&mut self, connection: ConnectionId) -> Option<RegistryEntry> {
        let idx = self.entries.iter().position(|e| e.connection == connection)?;
        let entry = self.entries.remove(idx);
        tracing::info!(
            %connection,
            session_id = %entry.session_id,
            "session unregistered"
        );
        Some(entry)
    }

    /// Calls `f` for every open entry, in join order.
    ///
    /// A failure for one entry is logged and iteration continues. Returns
    /// how many entries `f` succeeded for.
    pub fn for_each_open<F, E>(&self, mut f: F) -> usize
    where
        F: FnMut(&RegistryEntry) -> Result<(), E>,
        E: Display,
    {
        let mut delivered = 0;
        for entry in self.entries.iter().filter(|e| e.is_open()) {
            match f(entry) {
                Ok(()) => delivered += 1,
                Err(e) => tracing::warn!(
                    session_id = %entry.session_id,
                    error = %e,
                    "per-connection delivery failed"
                ),
            }
        }
        delivered
    }

    /// Looks up the entry for a connection.
    pub fn find_by_connection(&self, connection: ConnectionId) -> Option<&RegistryEntry> {
        self.entries.iter().find(|e| e.connection == connection)
    }

    /// Looks up the entry for a session id.
    pub fn find_by_session(&self, session_id: &SessionId) -> Option<&RegistryEntry> {
        self.entries.iter().find(|e| &e.session_id == session_id)
    }

    /// All entries (open or not) in join order.
    pub fn iter(&self) -> impl Iterator<Item = &RegistryEntry> {
        self.entries.iter()
    }

    /// Number of registered entries, including not-yet-purged closed ones.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn unused_session_id(&self) -> SessionId {
        loop {
            let candidate = generate_session_id();
            if self.find_by_session(&candidate).is_none() {
                return candidate;
            }
        }
    }
}

/// Generates a random 16-character hex session id (64 bits).
fn generate_session_id() -> SessionId {
    let bytes: [u8; 8] = rand::rng().random();
    SessionId(bytes.iter().map(|b| format!("{b:02x}")).collect())
}

// =========================================================================
// Tests
// =========================================================================
