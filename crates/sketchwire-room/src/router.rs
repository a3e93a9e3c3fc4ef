//! Message router: validates inbound client events and dispatches them.

use sketchwire_protocol::{ClientEvent, Phase, ServerEvent};
use sketchwire_transport::ConnectionId;

use crate::room::RoomActor;
use crate::words::WordSource;
use crate::{ResultStore, RoomConfig, RoomError};

/// Checks a join's display name and round count.
///
/// Returns the trimmed display name.
///
/// # Errors
/// Returns [`RoomError::Validation`] with a client-safe message.
pub fn validate_join(
    display_name: &str,
    total_rounds: Option<u32>,
    config: &RoomConfig,
) -> Result<String, RoomError> {
    let name = display_name.trim();
    if name.is_empty() {
        return Err(RoomError::Validation("display name is required".into()));
    }
    if name.chars().count() > config.max_display_name_len {
        return Err(RoomError::Validation(format!(
            "display name must be at most {} characters",
            config.max_display_name_len
        )));
    }
    if let Some(rounds) = total_rounds {
        if !config.accepts_total_rounds(rounds) {
            return Err(RoomError::Validation(format!(
                "totalRounds must be between 1 and {}",
                config.max_total_rounds
            )));
        }
    }
    Ok(name.to_string())
}

impl<W: WordSource, R: ResultStore> RoomActor<W, R> {
    /// Dispatches one client event.
    ///
    /// Admin actions arrive here only after the connection layer has
    /// checked the admin capability.
    pub(crate) fn route(&mut self, connection: ConnectionId, event: ClientEvent) {
        if event.is_admin_action() {
            self.admin_action(connection, event);
            return;
        }

        let Some(entry) = self.registry.find_by_connection(connection) else {
            tracing::debug!(%connection, kind = event.kind(), "event from unregistered connection ignored");
            return;
        };
        let session_id = entry.session_id.clone();
        let display_name = entry.display_name.clone();
        tracing::debug!(%session_id, kind = event.kind(), "routing event");

        match event {
            ClientEvent::Join { .. } => {
                self.send_to(connection, &ServerEvent::error("already joined"));
            }
            ClientEvent::AdminConnect { .. } => {
                tracing::debug!(%session_id, "adminConnect reached the room, ignored");
            }
            ClientEvent::Chat { content } => {
                self.broadcast(
                    &ServerEvent::Chat {
                        sender: display_name,
                        content,
                    },
                    None,
                );
            }
            ClientEvent::Guess { content } => {
                self.on_guess(&session_id, &display_name, &content);
            }
            ClientEvent::DrawingStroke(payload) => {
                if self.state.phase == Phase::Playing && self.state.is_drawer(&session_id) {
                    self.broadcast(&ServerEvent::DrawingStroke(payload), Some(connection));
                } else {
                    tracing::debug!(%session_id, "stroke from non-drawer ignored");
                }
            }
            ClientEvent::ClearCanvas => {
                self.broadcast(&ServerEvent::ClearCanvas, Some(connection));
            }
            ClientEvent::Undo { snapshot } => {
                self.broadcast(&ServerEvent::Undo { snapshot }, Some(connection));
            }
            ClientEvent::RestartGame => {
                self.restart(&display_name);
            }
            ClientEvent::KickPlayer { .. }
            | ClientEvent::KickAllPlayers
            | ClientEvent::EndAllGames => {}
        }
    }

    fn admin_action(&mut self, connection: ConnectionId, event: ClientEvent) {
        tracing::info!(%connection, kind = event.kind(), "admin action");
        match event {
            ClientEvent::KickPlayer { target_session_id } => {
                let Some(target) = self.registry.find_by_session(&target_session_id) else {
                    self.send_to(connection, &ServerEvent::error("no such player"));
                    return;
                };
                let target_connection = target.connection;
                let name = target.display_name.clone();
                target.close();
                self.depart(target_connection);
                self.broadcast(
                    &ServerEvent::AdminAction {
                        message: format!("{name} was removed by an administrator"),
                    },
                    None,
                );
            }
            ClientEvent::KickAllPlayers => {
                let targets: Vec<ConnectionId> = self
                    .registry
                    .iter()
                    .filter(|e| e.connection != connection)
                    .map(|e| {
                        e.close();
                        e.connection
                    })
                    .collect();
                for target in targets {
                    self.depart(target);
                }
                self.broadcast(
                    &ServerEvent::AdminAction {
                        message: "All players were removed by an administrator".into(),
                    },
                    None,
                );
            }
            ClientEvent::EndAllGames => {
                match self.state.phase {
                    Phase::Playing | Phase::RoundEnd => self.game_over(),
                    Phase::Starting => self.go_waiting("Game cancelled by an administrator"),
                    Phase::Waiting => {}
                }
                self.broadcast(
                    &ServerEvent::AdminAction {
                        message: "All games were ended by an administrator".into(),
                    },
                    None,
                );
            }
            other => {
                tracing::debug!(kind = other.kind(), "not an admin action");
            }
        }
    }
}
