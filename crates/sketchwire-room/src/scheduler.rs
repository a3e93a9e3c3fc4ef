//! Turn/round scheduler: the phase state machine.
//!
//! ```text
//! Waiting → Starting → Playing → RoundEnd → Playing (next turn)
//!                                         ↘ GameOver → Waiting
//! ```
//!
//! Every transition bumps the room epoch. Timers and word fetches carry
//! the epoch they were started under and are dropped if it has moved on.

use std::sync::Arc;

use sketchwire_protocol::{Phase, Role, ServerEvent, SessionId};
use sketchwire_tick::Epoch;
use sketchwire_transport::ConnectionId;

use crate::ResultStore;
use crate::results::{GameRecord, persist_game};
use crate::room::{PendingTransition, RoomActor};
use crate::state::mask_word;
use crate::words::{WordEntry, WordSource};

impl<W: WordSource, R: ResultStore> RoomActor<W, R> {
    /// Sets the phase and starts a new epoch.
    fn enter(&mut self, phase: Phase) -> Epoch {
        let from = self.state.phase;
        if from != phase && !from.can_transition_to(phase) {
            tracing::warn!(%from, to = %phase, "unexpected phase transition");
        }
        self.state.phase = phase;
        let epoch = self.epoch.bump();
        tracing::debug!(%from, to = %phase, %epoch, "phase changed");
        epoch
    }

    /// Starts a game if the room is waiting with enough players; otherwise
    /// tells the room it is still waiting.
    pub(crate) fn maybe_start_game(&mut self) {
        if self.state.phase != Phase::Waiting {
            return;
        }
        let count = self.state.player_count();
        if count < self.config.min_players {
            if count > 0 {
                self.broadcast(
                    &ServerEvent::WaitingForPlayers {
                        message: format!(
                            "Waiting for more players ({count}/{})",
                            self.config.min_players
                        ),
                    },
                    None,
                );
            }
            return;
        }

        self.state.reset_scores_and_round();
        self.state.round_index = 1;
        self.finished = false;
        let epoch = self.enter(Phase::Starting);

        tracing::info!(
            players = count,
            total_rounds = self.state.total_rounds,
            "game starting"
        );
        self.broadcast(
            &ServerEvent::GameStarting {
                message: format!(
                    "Game starting in {} seconds...",
                    self.config.start_delay.as_secs()
                ),
                players: self.state.views(),
            },
            None,
        );
        self.timer
            .arm(self.config.start_delay, PendingTransition::BeginTurn(epoch));
    }

    pub(crate) fn on_timer(&mut self, pending: PendingTransition) {
        match pending {
            PendingTransition::BeginTurn(_) => self.begin_turn(),
            PendingTransition::AfterRoundEnd {
                game_over,
                last_player,
                ..
            } => self.after_round_end(game_over, last_player),
            PendingTransition::ResetAfterGameOver(_) => self.reset_after_game_over(),
            PendingTransition::RestartCheck(_) => self.maybe_start_game(),
        }
    }

    /// Prepares the next turn: checks the head count and fetches a word.
    /// The turn itself starts when the word arrives.
    fn begin_turn(&mut self) {
        if self.state.player_count() < self.config.min_players {
            self.go_waiting("Not enough players to continue");
            return;
        }
        self.request_word();
    }

    /// Starting/RoundEnd → Playing, once a word is available.
    pub(crate) fn on_word_ready(&mut self, epoch: Epoch, entry: WordEntry) {
        if !self.epoch.is_current(epoch) || self.awaiting_word != Some(epoch) {
            tracing::debug!(%epoch, current = %self.epoch, "stale word ignored");
            return;
        }
        self.awaiting_word = None;

        if self.state.player_count() < self.config.min_players {
            self.go_waiting("Not enough players to continue");
            return;
        }
        let Some(drawer) = self.state.rotate_drawer_candidate() else {
            return;
        };
        let drawer_id = drawer.session_id.clone();
        let drawer_name = drawer.display_name.clone();

        let seconds = self.config.round_duration_secs;
        let hint = mask_word(&entry.word);
        self.state.begin_turn(&drawer_id, entry.word.clone(), seconds);
        self.enter(Phase::Playing);
        self.clock.restart();

        let round_index = self.state.round_index;
        let total_rounds = self.state.total_rounds;
        let is_last_turn_of_game =
            self.state.is_last_round() && self.state.is_last_player_of_round();

        tracing::info!(
            round = round_index,
            total_rounds,
            drawer = %drawer_id,
            category = %entry.category,
            "turn started"
        );
        tracing::debug!(word = %entry.word, "secret word chosen");

        let players = self.state.views();
        let drawer_event = ServerEvent::NewRound {
            role: Role::Drawer,
            word: Some(entry.word),
            word_hint: None,
            time_remaining: seconds,
            drawer_name: drawer_name.clone(),
            drawer_id: drawer_id.clone(),
            round_index,
            total_rounds,
            is_last_turn_of_game,
            players: players.clone(),
        };
        let guesser_event = ServerEvent::NewRound {
            role: Role::Guesser,
            word: None,
            word_hint: Some(hint),
            time_remaining: seconds,
            drawer_name,
            drawer_id: drawer_id.clone(),
            round_index,
            total_rounds,
            is_last_turn_of_game,
            players,
        };
        self.fanout
            .broadcast_split(&self.registry, &drawer_id, &drawer_event, &guesser_event);
    }

    /// Tells a mid-turn joiner what is being drawn, as a guesser.
    pub(crate) fn send_current_turn(&self, connection: ConnectionId, joiner: &SessionId) {
        let (Some(drawer_id), Some(word)) =
            (self.state.current_drawer(), self.state.secret_word())
        else {
            return;
        };
        if drawer_id == joiner {
            return;
        }
        let Some(drawer) = self.state.player(drawer_id) else {
            return;
        };
        let event = ServerEvent::NewRound {
            role: Role::Guesser,
            word: None,
            word_hint: Some(mask_word(word)),
            time_remaining: self.state.time_remaining,
            drawer_name: drawer.display_name.clone(),
            drawer_id: drawer_id.clone(),
            round_index: self.state.round_index,
            total_rounds: self.state.total_rounds,
            is_last_turn_of_game: self.state.is_last_round()
                && self.state.is_last_player_of_round(),
            players: self.state.views(),
        };
        self.send_to(connection, &event);
    }

    /// One clock tick during a turn.
    pub(crate) fn on_tick(&mut self, ticks_skipped: u64) {
        if self.state.phase != Phase::Playing {
            self.clock.pause();
            return;
        }
        if ticks_skipped > 0 {
            tracing::debug!(ticks_skipped, "round clock fell behind");
        }
        let elapsed = u32::try_from(ticks_skipped).unwrap_or(u32::MAX).saturating_add(1);
        let time_remaining = self.state.tick_down_by(elapsed);
        tracing::trace!(time_remaining, "round tick");
        self.broadcast(&ServerEvent::TimeUpdate { time_remaining }, None);
        if time_remaining == 0 {
            tracing::info!(round = self.state.round_index, "turn timed out");
            self.end_turn();
        }
    }

    /// Scores a guess. Ignored unless a turn is running and the guesser is
    /// not the drawer.
    pub(crate) fn on_guess(&mut self, guesser: &SessionId, guesser_name: &str, guess: &str) {
        if self.state.phase != Phase::Playing || self.state.secret_word().is_none() {
            tracing::debug!(%guesser, "guess outside a turn ignored");
            return;
        }
        if self.state.is_drawer(guesser) {
            tracing::debug!(%guesser, "drawer guess ignored");
            return;
        }
        if !self.state.guess_matches(guess) {
            return;
        }

        let points = self.config.correct_guess_points;
        let score = self.state.award(guesser, points);
        let word = self.state.secret_word().unwrap_or_default().to_string();
        tracing::info!(%guesser, ?score, "correct guess");

        self.broadcast(
            &ServerEvent::CorrectGuess {
                winner_name: guesser_name.to_string(),
                word,
                scores: self.state.ranked_views(),
            },
            None,
        );
        self.end_turn();
    }

    /// Playing → RoundEnd: stop the clock and reveal the word.
    pub(crate) fn end_turn(&mut self) {
        if self.state.phase != Phase::Playing {
            return;
        }
        self.clock.pause();

        let last_player = self.state.is_last_player_of_round();
        let game_over = last_player && self.state.is_last_round();
        let word = self.state.secret_word().map(str::to_string);
        let epoch = self.enter(Phase::RoundEnd);

        tracing::info!(
            round = self.state.round_index,
            last_player,
            game_over,
            "turn ended"
        );
        self.broadcast(
            &ServerEvent::RoundEnd {
                word,
                scores: self.state.ranked_views(),
                is_game_over: game_over,
                is_last_player_of_round: last_player,
            },
            None,
        );

        if self.state.player_count() < self.config.min_players {
            self.go_waiting("Not enough players to continue");
            return;
        }
        self.timer.arm(
            self.config.round_end_delay,
            PendingTransition::AfterRoundEnd {
                epoch,
                game_over,
                last_player,
            },
        );
    }

    /// RoundEnd → next turn, next round, or game over.
    fn after_round_end(&mut self, announced_game_over: bool, announced_last: bool) {
        if self.state.player_count() < self.config.min_players {
            self.go_waiting("Not enough players to continue");
            return;
        }
        // Departures during the pause can exhaust the rotation early.
        let last_player = announced_last || self.state.is_last_player_of_round();
        let game_over = announced_game_over || (last_player && self.state.is_last_round());

        if game_over {
            self.game_over();
        } else {
            if last_player {
                self.state.advance_round();
                tracing::info!(round = self.state.round_index, "next round");
            }
            self.begin_turn();
        }
    }

    /// Ends the game: broadcast final scores and persist them once.
    pub(crate) fn game_over(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;
        self.clock.pause();
        self.awaiting_word = None;

        let creator_user_id = self
            .state
            .creator()
            .and_then(|id| self.state.player(id))
            .and_then(|p| p.persistent_user_id);
        let record = GameRecord::from_players(
            self.state.players(),
            creator_user_id,
            self.state.total_rounds,
        );
        let final_scores = self.state.ranked_views();
        self.state.clear_turn();

        let epoch = if self.state.phase == Phase::Playing {
            self.enter(Phase::RoundEnd)
        } else {
            self.epoch.bump()
        };

        tracing::info!(
            rounds = self.state.total_rounds,
            players = final_scores.len(),
            "game over"
        );
        self.broadcast(&ServerEvent::GameOver { final_scores }, None);

        let results = Arc::clone(&self.results);
        tokio::spawn(async move {
            persist_game(results.as_ref(), record).await;
        });

        self.timer.arm(
            self.config.game_over_reset_delay,
            PendingTransition::ResetAfterGameOver(epoch),
        );
    }

    fn reset_after_game_over(&mut self) {
        self.state.round_index = 0;
        self.enter(Phase::Waiting);
        self.broadcast_game_state();
    }

    /// Any phase → Waiting with the turn cleared.
    pub(crate) fn go_waiting(&mut self, message: &str) {
        self.clock.pause();
        self.timer.disarm();
        self.awaiting_word = None;
        self.state.clear_turn();
        self.state.round_index = 0;
        self.enter(Phase::Waiting);

        tracing::info!(players = self.state.player_count(), reason = message, "back to waiting");
        self.broadcast(
            &ServerEvent::WaitingForPlayers {
                message: message.to_string(),
            },
            None,
        );
        self.broadcast_game_state();
    }

    /// Explicit restart: zero everything, then re-check after a pause.
    pub(crate) fn restart(&mut self, requested_by: &str) {
        self.clock.pause();
        self.timer.disarm();
        self.awaiting_word = None;
        self.finished = false;
        self.state.reset_scores_and_round();
        let epoch = self.enter(Phase::Waiting);

        tracing::info!(requested_by, "game restarting");
        self.broadcast(
            &ServerEvent::GameRestarting {
                message: "Game restarting...".to_string(),
                players: self.state.views(),
            },
            None,
        );
        self.timer
            .arm(self.config.restart_delay, PendingTransition::RestartCheck(epoch));
    }
}
