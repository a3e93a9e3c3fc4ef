//! Per-connection handler: decoding, join, admin gating and forwarding.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Spawn a writer task that drains the connection's outbound channel
//!   2. Loop: receive frames → decode → gate → forward to the room
//!   3. On exit, tell the room the connection left
//!
//! The room only ever sees decoded events from connections that passed
//! the gates here: nothing but `join`/`adminConnect` before joining, and
//! admin actions only with the admin capability.

use std::sync::Arc;

use sketchwire_protocol::{ClientEvent, Codec, ServerEvent};
use sketchwire_room::{JoinRequest, RoomError, RoomHandle, validate_join};
use sketchwire_session::{Outbound, PlayerSender, UserDirectory, outbound_channel};
use sketchwire_transport::{Connection, ConnectionId, WebSocketConnection};
use tokio::sync::mpsc::UnboundedReceiver;

use crate::SketchError;
use crate::server::ServerState;

/// Drop guard that removes the connection from the room when the handler
/// exits.
///
/// This ensures cleanup happens even if the handler panics. Since `Drop`
/// is synchronous, we spawn a fire-and-forget task for the send.
struct LeaveGuard {
    connection: ConnectionId,
    room: RoomHandle,
}

impl Drop for LeaveGuard {
    fn drop(&mut self) {
        let connection = self.connection;
        let room = self.room.clone();
        tokio::spawn(async move {
            let _ = room.leave(connection).await;
        });
    }
}

/// What the handler knows about its peer.
#[derive(Debug)]
struct Peer {
    connection: ConnectionId,
    joined: bool,
    admin: bool,
}

/// Whether the reader loop keeps going.
#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Close,
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<U: UserDirectory>(
    conn: WebSocketConnection,
    state: Arc<ServerState<U>>,
) -> Result<(), SketchError> {
    let conn = Arc::new(conn);
    let connection = conn.id();
    tracing::debug!(%connection, "handling new connection");

    let (tx, rx) = outbound_channel();
    tokio::spawn(write_frames(Arc::clone(&conn), rx));

    let _guard = LeaveGuard {
        connection,
        room: state.room.clone(),
    };
    let mut peer = Peer {
        connection,
        joined: false,
        admin: false,
    };

    loop {
        let data = match conn.recv().await {
            Ok(Some(data)) => data,
            Ok(None) => {
                tracing::info!(%connection, "connection closed");
                break;
            }
            Err(e) => {
                tracing::debug!(%connection, error = %e, "recv error");
                break;
            }
        };

        if handle_frame(&state, &mut peer, &tx, &data).await? == Flow::Close {
            let _ = tx.send(Outbound::Close);
            break;
        }
    }

    // _guard drops here → leave fires; the writer exits once the room
    // drops its copy of the sender.
    Ok(())
}

/// Drains the outbound channel onto the socket.
async fn write_frames(conn: Arc<WebSocketConnection>, mut rx: UnboundedReceiver<Outbound>) {
    let connection = conn.id();
    while let Some(msg) = rx.recv().await {
        match msg {
            Outbound::Frame(frame) => {
                if let Err(e) = conn.send_text(&frame).await {
                    tracing::debug!(%connection, error = %e, "send failed, writer stopping");
                    break;
                }
            }
            Outbound::Close => {
                if let Err(e) = conn.close().await {
                    tracing::debug!(%connection, error = %e, "close failed");
                }
                break;
            }
        }
    }
}

/// Handles one inbound frame.
async fn handle_frame<U: UserDirectory>(
    state: &ServerState<U>,
    peer: &mut Peer,
    tx: &PlayerSender,
    data: &[u8],
) -> Result<Flow, SketchError> {
    let event = match state.codec.decode_client_event(data) {
        Ok(event) => event,
        Err(e) if !e.is_reportable() => {
            tracing::debug!(connection = %peer.connection, error = %e, "ignoring unknown event");
            return Ok(Flow::Continue);
        }
        Err(e) => {
            tracing::debug!(connection = %peer.connection, error = %e, "malformed event");
            reply(state, tx, &ServerEvent::error("invalid message"));
            return Ok(Flow::Continue);
        }
    };

    match event {
        ClientEvent::AdminConnect { token } => {
            if grant_admin(state, peer, &token) {
                reply(
                    state,
                    tx,
                    &ServerEvent::AdminConnected {
                        message: "Admin connected".into(),
                    },
                );
            } else {
                reply(state, tx, &ServerEvent::error("invalid admin token"));
            }
            Ok(Flow::Continue)
        }
        event if event.is_admin_action() && !peer.admin => {
            tracing::warn!(connection = %peer.connection, kind = event.kind(), "admin action without rights");
            reply(state, tx, &ServerEvent::error("admin rights required"));
            Ok(Flow::Continue)
        }
        ClientEvent::Join {
            display_name,
            is_creator,
            total_rounds,
            admin_token,
        } if !peer.joined => {
            if let Some(token) = admin_token {
                if grant_admin(state, peer, &token) {
                    reply(
                        state,
                        tx,
                        &ServerEvent::AdminConnected {
                            message: "Admin connected".into(),
                        },
                    );
                }
            }
            join(state, peer, tx, &display_name, is_creator, total_rounds).await
        }
        event if !peer.joined && !event.is_admin_action() => {
            reply(state, tx, &ServerEvent::error("join the game first"));
            Ok(Flow::Continue)
        }
        event => forward(state, peer, event).await,
    }
}

/// Checks an admin token and records the capability on success.
fn grant_admin<U: UserDirectory>(state: &ServerState<U>, peer: &mut Peer, token: &str) -> bool {
    let granted = state
        .admin_token
        .as_ref()
        .is_some_and(|expected| expected.verify(token));
    if granted {
        peer.admin = true;
        tracing::info!(connection = %peer.connection, "admin connected");
    } else {
        tracing::warn!(connection = %peer.connection, "admin token rejected");
    }
    granted
}

/// Validates, resolves the account and seats the peer in the room.
async fn join<U: UserDirectory>(
    state: &ServerState<U>,
    peer: &mut Peer,
    tx: &PlayerSender,
    display_name: &str,
    is_creator: bool,
    total_rounds: Option<u32>,
) -> Result<Flow, SketchError> {
    let name = match validate_join(display_name, total_rounds, &state.room_config) {
        Ok(name) => name,
        Err(e) => {
            tracing::debug!(connection = %peer.connection, error = %e, "join rejected");
            reply(state, tx, &ServerEvent::error(e.to_string()));
            return Ok(Flow::Close);
        }
    };

    let persistent_user_id = match state.users.lookup(&name).await {
        Ok(id) => id,
        Err(e) => {
            tracing::warn!(display_name = %name, error = %e, "user lookup failed, joining as guest");
            None
        }
    };

    let request = JoinRequest {
        connection: peer.connection,
        display_name: name,
        wants_creator: is_creator,
        total_rounds,
        persistent_user_id,
    };
    match state.room.join(request, tx.clone()).await {
        Ok(session_id) => {
            peer.joined = true;
            tracing::debug!(connection = %peer.connection, %session_id, "joined");
            Ok(Flow::Continue)
        }
        Err(RoomError::Unavailable) => Err(RoomError::Unavailable.into()),
        Err(e) => {
            tracing::info!(connection = %peer.connection, error = %e, "join refused");
            reply(state, tx, &ServerEvent::error(e.to_string()));
            Ok(Flow::Close)
        }
    }
}

async fn forward<U: UserDirectory>(
    state: &ServerState<U>,
    peer: &Peer,
    event: ClientEvent,
) -> Result<Flow, SketchError> {
    let admin_kind = event.is_admin_action().then(|| event.kind());
    state.room.send_event(peer.connection, event).await?;
    if let Some(kind) = admin_kind {
        log_room_stats(state, peer, kind).await?;
    }
    Ok(Flow::Continue)
}

/// Logs the room as it stands right after an admin action.
async fn log_room_stats<U: UserDirectory>(
    state: &ServerState<U>,
    peer: &Peer,
    action: &str,
) -> Result<(), SketchError> {
    let snapshot = state.room.snapshot().await?;
    let drawer = snapshot
        .players
        .iter()
        .find(|p| p.is_drawing)
        .map_or("-", |p| p.display_name.as_str());
    tracing::info!(
        connection = %peer.connection,
        action,
        phase = ?snapshot.phase,
        players = snapshot.players.len(),
        round = snapshot.round_index,
        total_rounds = snapshot.total_rounds,
        drawer,
        "room stats after admin action"
    );
    Ok(())
}

/// Queues an event for this connection only.
fn reply<U: UserDirectory>(state: &ServerState<U>, tx: &PlayerSender, event: &ServerEvent) {
    match state.codec.encode(event) {
        Ok(frame) => {
            let _ = tx.send(Outbound::Frame(Arc::from(frame)));
        }
        Err(e) => tracing::warn!(kind = event.kind(), error = %e, "failed to encode reply"),
    }
}
