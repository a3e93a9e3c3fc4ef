//! Core protocol types for Sketchwire's wire format.
//!
//! Every frame on the wire is a JSON object whose `type` field names the
//! event kind. Inbound and outbound kinds are closed enums, so the router
//! matches exhaustively instead of poking at untyped maps.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Ephemeral identity of a player, generated on join.
///
/// Stable for the lifetime of the socket that joined and unique among
/// currently registered players. Serialized as a plain string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl SessionId {
    /// Borrows the raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

// ---------------------------------------------------------------------------
// Phase: the room state machine, as seen by clients
// ---------------------------------------------------------------------------

/// The room's current state-machine state.
///
/// ```text
/// Waiting → Starting → Playing → RoundEnd → Playing (next turn)
///                                         ↘ Waiting (game over)
/// ```
///
/// Any phase may fall back to `Waiting` (player count dropped below the
/// minimum, restart, or admin intervention).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    #[default]
    Waiting,
    Starting,
    Playing,
    RoundEnd,
}

impl Phase {
    /// Returns `true` if moving from `self` to `target` is a legal edge.
    pub fn can_transition_to(self, target: Self) -> bool {
        match (self, target) {
            (_, Self::Waiting) => true,
            (Self::Waiting, Self::Starting) => true,
            (Self::Starting, Self::Playing) => true,
            (Self::Playing, Self::RoundEnd) => true,
            (Self::RoundEnd, Self::Playing) => true,
            _ => false,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Waiting => write!(f, "Waiting"),
            Self::Starting => write!(f, "Starting"),
            Self::Playing => write!(f, "Playing"),
            Self::RoundEnd => write!(f, "RoundEnd"),
        }
    }
}

/// Which side of the current turn a recipient is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Role {
    Drawer,
    Guesser,
}

// ---------------------------------------------------------------------------
// PlayerView
// ---------------------------------------------------------------------------

/// The public projection of a player, as included in rosters and scores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerView {
    pub session_id: SessionId,
    pub display_name: String,
    pub score: u32,
    pub is_drawing: bool,
    /// Account id from the user store; `None` for guests.
    pub persistent_user_id: Option<i64>,
}

/// Opaque drawing payload. The server relays it without looking inside.
pub type StrokePayload = serde_json::Map<String, serde_json::Value>;

// ---------------------------------------------------------------------------
// Inbound: client → server
// ---------------------------------------------------------------------------

/// Events a client can send.
///
/// Field aliases accept the names used by the legacy browser client
/// (`username`, `isGameCreator`, `guess`, `socketId`, kind `draw`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ClientEvent {
    Join {
        #[serde(alias = "username")]
        display_name: String,
        #[serde(default, alias = "isGameCreator")]
        is_creator: bool,
        #[serde(default)]
        total_rounds: Option<u32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        admin_token: Option<String>,
    },
    Chat {
        content: String,
    },
    Guess {
        #[serde(alias = "guess")]
        content: String,
    },
    #[serde(alias = "draw")]
    DrawingStroke(StrokePayload),
    ClearCanvas,
    Undo {
        #[serde(default)]
        snapshot: serde_json::Value,
    },
    RestartGame,
    AdminConnect {
        token: String,
    },
    KickPlayer {
        #[serde(alias = "socketId")]
        target_session_id: SessionId,
    },
    KickAllPlayers,
    EndAllGames,
}

impl ClientEvent {
    /// Every `type` tag (including aliases) that decodes to a variant.
    pub const KINDS: &'static [&'static str] = &[
        "join",
        "chat",
        "guess",
        "drawingStroke",
        "draw",
        "clearCanvas",
        "undo",
        "restartGame",
        "adminConnect",
        "kickPlayer",
        "kickAllPlayers",
        "endAllGames",
    ];

    /// The event kind, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Join { .. } => "join",
            Self::Chat { .. } => "chat",
            Self::Guess { .. } => "guess",
            Self::DrawingStroke(_) => "drawingStroke",
            Self::ClearCanvas => "clearCanvas",
            Self::Undo { .. } => "undo",
            Self::RestartGame => "restartGame",
            Self::AdminConnect { .. } => "adminConnect",
            Self::KickPlayer { .. } => "kickPlayer",
            Self::KickAllPlayers => "kickAllPlayers",
            Self::EndAllGames => "endAllGames",
        }
    }

    /// Returns `true` for kinds that need the admin capability.
    pub fn is_admin_action(&self) -> bool {
        matches!(
            self,
            Self::KickPlayer { .. } | Self::KickAllPlayers | Self::EndAllGames
        )
    }
}

// ---------------------------------------------------------------------------
// Outbound: server → client
// ---------------------------------------------------------------------------

/// Events the server sends.
///
/// `GameState.current_word` is always `None`: snapshots are broadcast to
/// everyone, and only the drawer's `NewRound` ever carries the word.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ServerEvent {
    GameState {
        players: Vec<PlayerView>,
        phase: Phase,
        current_word: Option<String>,
        current_drawer_id: Option<SessionId>,
        time_remaining: u32,
        round_index: u32,
        total_rounds: u32,
        creator_name: Option<String>,
    },
    PlayerJoined {
        player: PlayerView,
    },
    PlayerLeft {
        session_id: SessionId,
        display_name: String,
    },
    Chat {
        sender: String,
        content: String,
    },
    DrawingStroke(StrokePayload),
    ClearCanvas,
    Undo {
        #[serde(default)]
        snapshot: serde_json::Value,
    },
    NewRound {
        role: Role,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        word: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        word_hint: Option<String>,
        time_remaining: u32,
        drawer_name: String,
        drawer_id: SessionId,
        round_index: u32,
        total_rounds: u32,
        is_last_turn_of_game: bool,
        players: Vec<PlayerView>,
    },
    TimeUpdate {
        time_remaining: u32,
    },
    CorrectGuess {
        winner_name: String,
        word: String,
        scores: Vec<PlayerView>,
    },
    RoundEnd {
        word: Option<String>,
        scores: Vec<PlayerView>,
        is_game_over: bool,
        is_last_player_of_round: bool,
    },
    GameOver {
        final_scores: Vec<PlayerView>,
    },
    GameStarting {
        message: String,
        players: Vec<PlayerView>,
    },
    WaitingForPlayers {
        message: String,
    },
    GameRestarting {
        message: String,
        players: Vec<PlayerView>,
    },
    AdminConnected {
        message: String,
    },
    AdminAction {
        message: String,
    },
    Error {
        message: String,
    },
}

impl ServerEvent {
    /// The event kind, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::GameState { .. } => "gameState",
            Self::PlayerJoined { .. } => "playerJoined",
            Self::PlayerLeft { .. } => "playerLeft",
            Self::Chat { .. } => "chat",
            Self::DrawingStroke(_) => "drawingStroke",
            Self::ClearCanvas => "clearCanvas",
            Self::Undo { .. } => "undo",
            Self::NewRound { .. } => "newRound",
            Self::TimeUpdate { .. } => "timeUpdate",
            Self::CorrectGuess { .. } => "correctGuess",
            Self::RoundEnd { .. } => "roundEnd",
            Self::GameOver { .. } => "gameOver",
            Self::GameStarting { .. } => "gameStarting",
            Self::WaitingForPlayers { .. } => "waitingForPlayers",
            Self::GameRestarting { .. } => "gameRestarting",
            Self::AdminConnected { .. } => "adminConnected",
            Self::AdminAction { .. } => "adminAction",
            Self::Error { .. } => "error",
        }
    }

    /// Shorthand for an `error` event.
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! The browser client depends on these exact JSON shapes.

    use super::*;
    use serde_json::json;

    fn view(id: &str, name: &str) -> PlayerView {
        PlayerView {
            session_id: SessionId::from(id),
            display_name: name.into(),
            score: 0,
            is_drawing: false,
            persistent_user_id: None,
        }
    }

    #[test]
    fn test_session_id_serializes_as_plain_string() {
        let json = serde_json::to_string(&SessionId::from("ab12")).unwrap();
        assert_eq!(json, "\"ab12\"");
    }

    #[test]
    fn test_phase_serializes_camel_case() {
        assert_eq!(serde_json::to_value(Phase::RoundEnd).unwrap(), "roundEnd");
        assert_eq!(serde_json::to_value(Phase::Waiting).unwrap(), "waiting");
    }

    #[test]
    fn test_phase_transitions_follow_state_machine() {
        assert!(Phase::Waiting.can_transition_to(Phase::Starting));
        assert!(Phase::Starting.can_transition_to(Phase::Playing));
        assert!(Phase::Playing.can_transition_to(Phase::RoundEnd));
        assert!(Phase::RoundEnd.can_transition_to(Phase::Playing));
        assert!(Phase::Playing.can_transition_to(Phase::Waiting));
        assert!(!Phase::Waiting.can_transition_to(Phase::Playing));
        assert!(!Phase::RoundEnd.can_transition_to(Phase::Starting));
        assert!(!Phase::Starting.can_transition_to(Phase::RoundEnd));
    }

    #[test]
    fn test_join_decodes_spec_field_names() {
        let raw = json!({
            "type": "join",
            "displayName": "p1",
            "isCreator": true,
            "totalRounds": 2
        });
        let event: ClientEvent = serde_json::from_value(raw).unwrap();
        assert_eq!(
            event,
            ClientEvent::Join {
                display_name: "p1".into(),
                is_creator: true,
                total_rounds: Some(2),
                admin_token: None,
            }
        );
    }

    #[test]
    fn test_join_decodes_legacy_field_names() {
        let raw = json!({ "type": "join", "username": "p2", "isGameCreator": false });
        let event: ClientEvent = serde_json::from_value(raw).unwrap();
        assert!(matches!(
            event,
            ClientEvent::Join { ref display_name, is_creator: false, total_rounds: None, .. }
                if display_name == "p2"
        ));
    }

    #[test]
    fn test_drawing_stroke_keeps_payload_opaque() {
        let raw = json!({ "type": "drawingStroke", "x": 10, "y": 20, "tool": "pen" });
        let event: ClientEvent = serde_json::from_value(raw).unwrap();
        let ClientEvent::DrawingStroke(payload) = event else {
            panic!("expected DrawingStroke");
        };
        assert_eq!(payload["x"], 10);
        assert_eq!(payload["tool"], "pen");
        assert!(!payload.contains_key("type"), "tag must not leak into payload");

        let out = serde_json::to_value(ServerEvent::DrawingStroke(payload)).unwrap();
        assert_eq!(out["type"], "drawingStroke");
        assert_eq!(out["y"], 20);
    }

    #[test]
    fn test_unit_kinds_decode_from_bare_tag() {
        let event: ClientEvent =
            serde_json::from_str(r#"{"type":"clearCanvas"}"#).unwrap();
        assert_eq!(event, ClientEvent::ClearCanvas);
        let event: ClientEvent =
            serde_json::from_str(r#"{"type":"restartGame"}"#).unwrap();
        assert_eq!(event, ClientEvent::RestartGame);
    }

    #[test]
    fn test_admin_actions_are_flagged() {
        assert!(ClientEvent::KickAllPlayers.is_admin_action());
        assert!(ClientEvent::EndAllGames.is_admin_action());
        assert!(!ClientEvent::RestartGame.is_admin_action());
    }

    #[test]
    fn test_every_client_kind_is_listed() {
        let samples = [
            ClientEvent::Chat { content: "x".into() },
            ClientEvent::Guess { content: "x".into() },
            ClientEvent::DrawingStroke(StrokePayload::new()),
            ClientEvent::ClearCanvas,
            ClientEvent::Undo { snapshot: json!(null) },
            ClientEvent::RestartGame,
            ClientEvent::AdminConnect { token: "t".into() },
            ClientEvent::KickPlayer { target_session_id: "s".into() },
            ClientEvent::KickAllPlayers,
            ClientEvent::EndAllGames,
        ];
        for event in samples {
            assert!(ClientEvent::KINDS.contains(&event.kind()));
            let json = serde_json::to_value(&event).unwrap();
            assert_eq!(json["type"], event.kind());
        }
    }

    #[test]
    fn test_new_round_for_guesser_omits_word() {
        let event = ServerEvent::NewRound {
            role: Role::Guesser,
            word: None,
            word_hint: Some("____".into()),
            time_remaining: 60,
            drawer_name: "p1".into(),
            drawer_id: SessionId::from("s1"),
            round_index: 1,
            total_rounds: 2,
            is_last_turn_of_game: false,
            players: vec![view("s1", "p1")],
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "newRound");
        assert_eq!(json["role"], "guesser");
        assert_eq!(json["wordHint"], "____");
        assert!(json.get("word").is_none(), "guessers never get a word field");
        assert_eq!(json["drawerId"], "s1");
        assert_eq!(json["isLastTurnOfGame"], false);
    }

    #[test]
    fn test_game_state_json_format() {
        let event = ServerEvent::GameState {
            players: vec![view("s1", "p1")],
            phase: Phase::Playing,
            current_word: None,
            current_drawer_id: Some(SessionId::from("s1")),
            time_remaining: 42,
            round_index: 1,
            total_rounds: 3,
            creator_name: Some("p1".into()),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "gameState");
        assert_eq!(json["phase"], "playing");
        assert!(json["currentWord"].is_null());
        assert_eq!(json["players"][0]["displayName"], "p1");
        assert_eq!(json["players"][0]["isDrawing"], false);
        assert_eq!(json["creatorName"], "p1");
    }

    #[test]
    fn test_error_event_shape() {
        let json = serde_json::to_value(ServerEvent::error("nope")).unwrap();
        assert_eq!(json, json!({ "type": "error", "message": "nope" }));
    }

    #[test]
    fn test_unknown_client_kind_fails_to_decode() {
        let result: Result<ClientEvent, _> =
            serde_json::from_str(r#"{"type":"flyToMoon"}"#);
        assert!(result.is_err());
    }
}
