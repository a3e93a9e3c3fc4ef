//! `SketchServer` builder and server loop.
//!
//! This is the entry point for running a Sketchwire server. It ties
//! together all the layers: transport → protocol → session → room.

use std::sync::Arc;

use sketchwire_protocol::JsonCodec;
use sketchwire_room::{ResultStore, RoomConfig, RoomHandle, WordSource, spawn_room};
use sketchwire_session::{AdminToken, UserDirectory};
use sketchwire_transport::{Transport, WebSocketTransport};

use crate::SketchError;
use crate::config::{DEFAULT_BIND_ADDR, ServerConfig};
use crate::handler::handle_connection;

/// Shared server state passed to each connection handler task.
///
/// Wrapped in `Arc` so it can be cheaply cloned across tasks. All mutable
/// game state lives inside the room actor, so nothing here needs a lock.
pub(crate) struct ServerState<U: UserDirectory> {
    pub(crate) room: RoomHandle,
    pub(crate) room_config: RoomConfig,
    pub(crate) users: U,
    pub(crate) admin_token: Option<AdminToken>,
    pub(crate) codec: JsonCodec,
}

/// Builder for configuring and starting a Sketchwire server.
///
/// # Example
///
/// ```rust,ignore
/// use sketchwire::prelude::*;
///
/// let server = SketchServer::builder()
///     .bind("0.0.0.0:3001")
///     .admin_token("s3cret")
///     .build(StaticWordList::seeded(), InMemoryResultStore::new(), InMemoryUserDirectory::new())
///     .await?;
/// server.run().await
/// ```
pub struct SketchServerBuilder {
    bind_addr: String,
    room_config: RoomConfig,
    admin_token: Option<String>,
}

impl SketchServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            room_config: RoomConfig::default(),
            admin_token: None,
        }
    }

    /// Starts from a loaded [`ServerConfig`].
    pub fn from_config(config: ServerConfig) -> Self {
        Self {
            bind_addr: config.bind_addr,
            room_config: config.room,
            admin_token: config.admin_token,
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the room timings and limits.
    pub fn room_config(mut self, config: RoomConfig) -> Self {
        self.room_config = config;
        self
    }

    /// Enables admin actions for connections presenting `token`.
    pub fn admin_token(mut self, token: impl Into<String>) -> Self {
        self.admin_token = Some(token.into());
        self
    }

    /// Binds the listener and spawns the room actor.
    pub async fn build<W, R, U>(
        self,
        words: W,
        results: R,
        users: U,
    ) -> Result<SketchServer<U>, SketchError>
    where
        W: WordSource,
        R: ResultStore,
        U: UserDirectory,
    {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;

        let admin_token = self.admin_token.and_then(AdminToken::new);
        if admin_token.is_none() {
            tracing::info!("no admin token configured, admin actions disabled");
        }

        let room = spawn_room(self.room_config.clone(), Arc::new(words), Arc::new(results));
        let state = Arc::new(ServerState {
            room,
            room_config: self.room_config,
            users,
            admin_token,
            codec: JsonCodec,
        });

        Ok(SketchServer { transport, state })
    }
}

impl Default for SketchServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound Sketchwire server with its room running.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct SketchServer<U: UserDirectory> {
    transport: WebSocketTransport,
    state: Arc<ServerState<U>>,
}

impl<U: UserDirectory> SketchServer<U> {
    /// Creates a new builder.
    pub fn builder() -> SketchServerBuilder {
        SketchServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Handle to the room, for in-process inspection.
    pub fn room(&self) -> RoomHandle {
        self.state.room.clone()
    }

    /// Runs the server accept loop.
    ///
    /// Accepts incoming connections and spawns a handler task for each.
    /// Runs until the process is terminated.
    pub async fn run(self) -> Result<(), SketchError> {
        self.run_until(std::future::pending()).await
    }

    /// Runs the accept loop until `shutdown` resolves.
    ///
    /// On shutdown the listener is closed and the room actor stopped;
    /// connected sockets are closed as their handlers notice the room is
    /// gone.
    pub async fn run_until(
        mut self,
        shutdown: impl Future<Output = ()>,
    ) -> Result<(), SketchError> {
        tracing::info!("Sketchwire server running");
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                accepted = self.transport.accept() => match accepted {
                    Ok(conn) => {
                        let state = Arc::clone(&self.state);
                        tokio::spawn(async move {
                            if let Err(e) = handle_connection(conn, state).await {
                                tracing::debug!(error = %e, "connection ended with error");
                            }
                        });
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "accept failed");
                    }
                },
                () = &mut shutdown => break,
            }
        }

        tracing::info!("shutting down");
        self.transport.shutdown().await?;
        // Already stopped is fine.
        let _ = self.state.room.shutdown().await;
        Ok(())
    }
}
