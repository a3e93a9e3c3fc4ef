//! Room state: the single record of players, turn counters and the
//! secret word.
//!
//! Plain data with a small mutation API. Every change that could break
//! "at most one drawer" or "the creator is a current player" goes through
//! a method here.

use sketchwire_protocol::{Phase, PlayerView, SessionId};

/// A player seated in the room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub session_id: SessionId,
    pub display_name: String,
    pub persistent_user_id: Option<i64>,
    pub score: u32,
    pub is_drawing: bool,
}

impl Player {
    pub fn new(
        session_id: SessionId,
        display_name: impl Into<String>,
        persistent_user_id: Option<i64>,
    ) -> Self {
        Self {
            session_id,
            display_name: display_name.into(),
            persistent_user_id,
            score: 0,
            is_drawing: false,
        }
    }

    /// Public projection for the wire.
    pub fn view(&self) -> PlayerView {
        PlayerView {
            session_id: self.session_id.clone(),
            display_name: self.display_name.clone(),
            score: self.score,
            is_drawing: self.is_drawing,
            persistent_user_id: self.persistent_user_id,
        }
    }
}

/// What [`RoomState::remove_player`] changed besides the roster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Departure {
    pub player: Player,
    /// The player was the current drawer; the turn has lost its drawer.
    pub was_drawer: bool,
    /// The creator role moved to this player.
    pub new_creator: Option<SessionId>,
}

/// The room's mutable state.
#[derive(Debug, Clone)]
pub struct RoomState {
    /// Join order; turn rotation follows it.
    players: Vec<Player>,
    pub phase: Phase,
    secret_word: Option<String>,
    current_drawer: Option<SessionId>,
    pub round_index: u32,
    pub total_rounds: u32,
    pub time_remaining: u32,
    creator: Option<SessionId>,
    /// Index of the next drawer candidate in `players`.
    next_slot: usize,
}

impl RoomState {
    pub fn new(total_rounds: u32) -> Self {
        Self {
            players: Vec::new(),
            phase: Phase::Waiting,
            secret_word: None,
            current_drawer: None,
            round_index: 0,
            total_rounds,
            time_remaining: 0,
            creator: None,
            next_slot: 0,
        }
    }

    // -- roster -----------------------------------------------------------

    /// Seats a player at the end of the rotation.
    pub fn add_player(&mut self, player: Player) {
        self.players.push(player);
    }

    /// Removes a player, keeping the rotation cursor and creator valid.
    pub fn remove_player(&mut self, session_id: &SessionId) -> Option<Departure> {
        let idx = self.index_of(session_id)?;
        let player = self.players.remove(idx);

        if idx < self.next_slot {
            self.next_slot -= 1;
        }

        let was_drawer = self.current_drawer.as_ref() == Some(session_id);
        if was_drawer {
            self.current_drawer = None;
        }

        let mut new_creator = None;
        if self.creator.as_ref() == Some(session_id) {
            self.creator = self.players.first().map(|p| p.session_id.clone());
            new_creator = self.creator.clone();
        }

        Some(Departure {
            player,
            was_drawer,
            new_creator,
        })
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player(&self, session_id: &SessionId) -> Option<&Player> {
        self.players.iter().find(|p| &p.session_id == session_id)
    }

    fn player_mut(&mut self, session_id: &SessionId) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| &p.session_id == session_id)
    }

    fn index_of(&self, session_id: &SessionId) -> Option<usize> {
        self.players.iter().position(|p| &p.session_id == session_id)
    }

    /// Roster in join order.
    pub fn views(&self) -> Vec<PlayerView> {
        self.players.iter().map(Player::view).collect()
    }

    /// Roster by descending score; ties keep join order.
    pub fn ranked_views(&self) -> Vec<PlayerView> {
        let mut views = self.views();
        views.sort_by(|a, b| b.score.cmp(&a.score));
        views
    }

    // -- creator ----------------------------------------------------------

    pub fn creator(&self) -> Option<&SessionId> {
        self.creator.as_ref()
    }

    pub fn creator_name(&self) -> Option<&str> {
        self.creator
            .as_ref()
            .and_then(|id| self.player(id))
            .map(|p| p.display_name.as_str())
    }

    /// Makes a seated player the creator. Ignored for unknown ids.
    pub fn set_creator(&mut self, session_id: &SessionId) {
        if self.player(session_id).is_some() {
            self.creator = Some(session_id.clone());
        }
    }

    // -- scoring / resets -------------------------------------------------

    /// Adds `points` to a player's score. Returns the new score.
    pub fn award(&mut self, session_id: &SessionId, points: u32) -> Option<u32> {
        let player = self.player_mut(session_id)?;
        player.score = player.score.saturating_add(points);
        Some(player.score)
    }

    /// Zeroes every score, clears the turn and rewinds the round counter.
    pub fn reset_scores_and_round(&mut self) {
        for p in &mut self.players {
            p.score = 0;
        }
        self.clear_turn();
        self.round_index = 0;
        self.next_slot = 0;
    }

    // -- turns ------------------------------------------------------------

    /// The player who would draw next, without committing the choice.
    pub fn rotate_drawer_candidate(&self) -> Option<&Player> {
        if self.players.is_empty() {
            return None;
        }
        self.players.get(self.next_slot % self.players.len())
    }

    /// Starts a turn: `session_id` becomes the only drawer and `word` the
    /// secret. Returns `false` if the player is not seated.
    pub fn begin_turn(&mut self, session_id: &SessionId, word: String, seconds: u32) -> bool {
        let Some(idx) = self.index_of(session_id) else {
            return false;
        };
        for (i, p) in self.players.iter_mut().enumerate() {
            p.is_drawing = i == idx;
        }
        self.current_drawer = Some(session_id.clone());
        self.secret_word = Some(word);
        self.time_remaining = seconds;
        self.next_slot = idx + 1;
        true
    }

    /// Clears the drawer, the word and the clock.
    pub fn clear_turn(&mut self) {
        for p in &mut self.players {
            p.is_drawing = false;
        }
        self.current_drawer = None;
        self.secret_word = None;
        self.time_remaining = 0;
    }

    /// Moves to the next round; the rotation starts again from the top.
    pub fn advance_round(&mut self) {
        self.round_index += 1;
        self.next_slot = 0;
    }

    /// `true` once every seated player has drawn in this round.
    pub fn is_last_player_of_round(&self) -> bool {
        self.next_slot >= self.players.len()
    }

    pub fn is_last_round(&self) -> bool {
        self.round_index >= self.total_rounds
    }

    pub fn current_drawer(&self) -> Option<&SessionId> {
        self.current_drawer.as_ref()
    }

    pub fn is_drawer(&self, session_id: &SessionId) -> bool {
        self.current_drawer.as_ref() == Some(session_id)
    }

    pub fn secret_word(&self) -> Option<&str> {
        self.secret_word.as_deref()
    }

    /// Counts the clock down by `seconds`, never below zero.
    pub fn tick_down_by(&mut self, seconds: u32) -> u32 {
        self.time_remaining = self.time_remaining.saturating_sub(seconds);
        self.time_remaining
    }

    /// Whether `guess` names the secret word.
    ///
    /// Surrounding whitespace is ignored; comparison is case-insensitive.
    pub fn guess_matches(&self, guess: &str) -> bool {
        match &self.secret_word {
            Some(word) => guess.trim().to_lowercase() == word.trim().to_lowercase(),
            None => false,
        }
    }
}

/// Replaces every non-space character with `_`.
pub fn mask_word(word: &str) -> String {
    word.chars().map(|c| if c == ' ' { ' ' } else { '_' }).collect()
}
