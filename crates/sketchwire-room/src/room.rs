//! Room actor: the single task that owns room state and the connection
//! registry.
//!
//! Client events, joins and leaves arrive on one mpsc channel; the round
//! clock and the phase timer are polled in the same `select!`. Nothing
//! else touches the state, so handlers never interleave mid-mutation.

use std::sync::Arc;

use sketchwire_protocol::{ClientEvent, Phase, PlayerView, ServerEvent, SessionId};
use sketchwire_session::{ConnectionRegistry, PlayerSender, RegistryEntry};
use sketchwire_tick::{Epoch, PhaseTimer, TickConfig, TickScheduler};
use sketchwire_transport::ConnectionId;
use tokio::sync::{mpsc, oneshot};

use crate::broadcast::Fanout;
use crate::router::validate_join;
use crate::state::{Player, RoomState};
use crate::words::{WordEntry, WordSource, fetch_word};
use crate::{ResultStore, RoomConfig, RoomError};

/// A validated request to seat a connection in the room.
#[derive(Debug, Clone)]
pub struct JoinRequest {
    pub connection: ConnectionId,
    pub display_name: String,
    pub wants_creator: bool,
    pub total_rounds: Option<u32>,
    /// Resolved by the caller before joining; `None` for guests.
    pub persistent_user_id: Option<i64>,
}

/// Commands sent to the room actor.
pub(crate) enum RoomCommand {
    Join {
        request: JoinRequest,
        sender: PlayerSender,
        reply: oneshot::Sender<Result<SessionId, RoomError>>,
    },
    Leave {
        connection: ConnectionId,
    },
    Event {
        connection: ConnectionId,
        event: ClientEvent,
    },
    /// A background word fetch finished.
    WordReady {
        epoch: Epoch,
        entry: WordEntry,
    },
    Snapshot {
        reply: oneshot::Sender<RoomSnapshot>,
    },
    Shutdown,
}

/// Internal view of the room, for tests and diagnostics.
///
/// Never sent on the wire: it says whether a word is active, which
/// guessers must not learn from a snapshot.
#[derive(Debug, Clone)]
pub struct RoomSnapshot {
    pub phase: Phase,
    pub round_index: u32,
    pub total_rounds: u32,
    pub time_remaining: u32,
    /// Join order.
    pub players: Vec<PlayerView>,
    pub creator: Option<SessionId>,
    pub drawer: Option<SessionId>,
    pub word_active: bool,
}

impl RoomSnapshot {
    /// Looks up a player by display name.
    pub fn player(&self, display_name: &str) -> Option<&PlayerView> {
        self.players.iter().find(|p| p.display_name == display_name)
    }

    /// How many players are flagged as drawing.
    pub fn drawer_count(&self) -> usize {
        self.players.iter().filter(|p| p.is_drawing).count()
    }
}

/// Handle to the running room actor. Cheap to clone.
#[derive(Clone)]
pub struct RoomHandle {
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    /// Seats a connection. Frames for it start flowing into `sender`
    /// before this returns.
    ///
    /// # Errors
    /// - [`RoomError::Validation`] for a bad name or round count
    /// - [`RoomError::Session`] for a duplicate active name or a second join
    /// - [`RoomError::Unavailable`] if the room is gone
    pub async fn join(
        &self,
        request: JoinRequest,
        sender: PlayerSender,
    ) -> Result<SessionId, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Join {
                request,
                sender,
                reply: reply_tx,
            })
            .await
            .map_err(|_| RoomError::Unavailable)?;
        reply_rx.await.map_err(|_| RoomError::Unavailable)?
    }

    /// Reports that a connection has closed. Idempotent.
    pub async fn leave(&self, connection: ConnectionId) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Leave { connection })
            .await
            .map_err(|_| RoomError::Unavailable)
    }

    /// Delivers a decoded client event (fire-and-forget).
    pub async fn send_event(
        &self,
        connection: ConnectionId,
        event: ClientEvent,
    ) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Event { connection, event })
            .await
            .map_err(|_| RoomError::Unavailable)
    }

    /// Returns the current internal snapshot.
    pub async fn snapshot(&self) -> Result<RoomSnapshot, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Snapshot { reply: reply_tx })
            .await
            .map_err(|_| RoomError::Unavailable)?;
        reply_rx.await.map_err(|_| RoomError::Unavailable)
    }

    /// Tells the room to stop.
    pub async fn shutdown(&self) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Shutdown)
            .await
            .map_err(|_| RoomError::Unavailable)
    }
}

/// Delayed transitions, tagged with the epoch they were armed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PendingTransition {
    /// Starting → first turn.
    BeginTurn(Epoch),
    /// RoundEnd → next turn, next round or game over.
    AfterRoundEnd {
        epoch: Epoch,
        game_over: bool,
        last_player: bool,
    },
    /// Game over → Waiting.
    ResetAfterGameOver(Epoch),
    /// Restart → re-check whether a game can start.
    RestartCheck(Epoch),
}

impl PendingTransition {
    fn epoch(self) -> Epoch {
        match self {
            Self::BeginTurn(e)
            | Self::AfterRoundEnd { epoch: e, .. }
            | Self::ResetAfterGameOver(e)
            | Self::RestartCheck(e) => e,
        }
    }
}

/// The internal room actor state. Runs inside a Tokio task.
pub(crate) struct RoomActor<W, R> {
    pub(crate) config: RoomConfig,
    pub(crate) state: RoomState,
    pub(crate) registry: ConnectionRegistry,
    pub(crate) fanout: Fanout,
    pub(crate) clock: TickScheduler,
    pub(crate) timer: PhaseTimer<PendingTransition>,
    /// Bumped on every phase change; stale timers and word fetches carry
    /// an older value.
    pub(crate) epoch: Epoch,
    /// Epoch of the word fetch in flight, if any.
    pub(crate) awaiting_word: Option<Epoch>,
    /// GameOver already ran for the current game.
    pub(crate) finished: bool,
    pub(crate) words: Arc<W>,
    pub(crate) results: Arc<R>,
    receiver: mpsc::Receiver<RoomCommand>,
    /// Weak so that dropping every `RoomHandle` stops the actor.
    pub(crate) self_sender: mpsc::WeakSender<RoomCommand>,
}

impl<W: WordSource, R: ResultStore> RoomActor<W, R> {
    /// Runs the actor loop until shutdown or until every handle is gone.
    async fn run(mut self) {
        tracing::info!("room actor started");

        loop {
            tokio::select! {
                cmd = self.receiver.recv() => {
                    let Some(cmd) = cmd else { break };
                    if !self.handle_command(cmd) {
                        break;
                    }
                }
                info = self.clock.wait_for_tick() => {
                    self.on_tick(info.ticks_skipped);
                }
                pending = self.timer.expired() => {
                    if self.epoch.is_current(pending.epoch()) {
                        self.on_timer(pending);
                    } else {
                        tracing::debug!(?pending, current = %self.epoch, "stale timer ignored");
                    }
                }
            }
        }

        tracing::info!("room actor stopped");
    }

    /// Returns `false` when the actor should stop.
    fn handle_command(&mut self, cmd: RoomCommand) -> bool {
        match cmd {
            RoomCommand::Join {
                request,
                sender,
                reply,
            } => {
                let result = self.handle_join(request, sender);
                let _ = reply.send(result);
            }
            RoomCommand::Leave { connection } => {
                self.depart(connection);
            }
            RoomCommand::Event { connection, event } => {
                self.route(connection, event);
            }
            RoomCommand::WordReady { epoch, entry } => {
                self.on_word_ready(epoch, entry);
            }
            RoomCommand::Snapshot { reply } => {
                let _ = reply.send(self.snapshot());
            }
            RoomCommand::Shutdown => {
                tracing::info!("room shutting down");
                return false;
            }
        }
        true
    }

    fn handle_join(
        &mut self,
        request: JoinRequest,
        sender: PlayerSender,
    ) -> Result<SessionId, RoomError> {
        let display_name =
            validate_join(&request.display_name, request.total_rounds, &self.config)?;

        for stale in self.registry.purge_closed() {
            self.remove_from_room(stale);
        }

        let session_id = self
            .registry
            .register(request.connection, &display_name, sender)?
            .session_id
            .clone();

        let player = Player::new(
            session_id.clone(),
            display_name.clone(),
            request.persistent_user_id,
        );
        let view = player.view();
        self.state.add_player(player);

        if request.wants_creator || self.state.creator().is_none() {
            self.state.set_creator(&session_id);
            if self.state.phase == Phase::Waiting {
                if let Some(rounds) = request.total_rounds {
                    self.state.total_rounds = rounds;
                }
            }
        }

        tracing::info!(
            connection = %request.connection,
            %session_id,
            display_name,
            guest = request.persistent_user_id.is_none(),
            players = self.state.player_count(),
            phase = %self.state.phase,
            "player joined"
        );

        // Snapshot first, then the incremental notice.
        self.broadcast_game_state();
        self.broadcast(&ServerEvent::PlayerJoined { player: view }, None);

        match self.state.phase {
            Phase::Waiting => self.maybe_start_game(),
            Phase::Playing => self.send_current_turn(request.connection, &session_id),
            Phase::Starting | Phase::RoundEnd => {}
        }

        Ok(session_id)
    }

    /// Removes a connection from the registry and the room. Idempotent.
    pub(crate) fn depart(&mut self, connection: ConnectionId) {
        match self.registry.unregister(connection) {
            Some(entry) => self.remove_from_room(entry),
            None => tracing::debug!(%connection, "leave for unknown connection ignored"),
        }
    }

    fn remove_from_room(&mut self, entry: RegistryEntry) {
        let Some(departure) = self.state.remove_player(&entry.session_id) else {
            return;
        };

        tracing::info!(
            connection = %entry.connection,
            session_id = %entry.session_id,
            display_name = %departure.player.display_name,
            was_drawer = departure.was_drawer,
            players = self.state.player_count(),
            "player left"
        );
        if let Some(creator) = &departure.new_creator {
            tracing::info!(%creator, "creator reassigned");
        }

        self.broadcast(
            &ServerEvent::PlayerLeft {
                session_id: entry.session_id,
                display_name: departure.player.display_name,
            },
            None,
        );

        let below_minimum = self.state.player_count() < self.config.min_players;
        match self.state.phase {
            Phase::Playing if departure.was_drawer => self.end_turn(),
            Phase::Playing | Phase::RoundEnd if below_minimum => {
                self.go_waiting("Not enough players to continue");
            }
            // Starting re-checks the player count when its timer fires.
            _ => {}
        }

        self.broadcast_game_state();
    }

    /// Kicks off a background word fetch for the current epoch.
    pub(crate) fn request_word(&mut self) {
        let epoch = self.epoch;
        self.awaiting_word = Some(epoch);
        let Some(tx) = self.self_sender.upgrade() else {
            return;
        };
        let words = Arc::clone(&self.words);
        let timeout = self.config.word_fetch_timeout;
        tokio::spawn(async move {
            let entry = fetch_word(words.as_ref(), timeout).await;
            let _ = tx.send(RoomCommand::WordReady { epoch, entry }).await;
        });
    }

    pub(crate) fn broadcast(&self, event: &ServerEvent, exclude: Option<ConnectionId>) {
        self.fanout.broadcast(&self.registry, event, exclude);
    }

    pub(crate) fn send_to(&self, connection: ConnectionId, event: &ServerEvent) {
        self.fanout.send_to(&self.registry, connection, event);
    }

    pub(crate) fn game_state_event(&self) -> ServerEvent {
        ServerEvent::GameState {
            players: self.state.views(),
            phase: self.state.phase,
            current_word: None,
            current_drawer_id: self.state.current_drawer().cloned(),
            time_remaining: self.state.time_remaining,
            round_index: self.state.round_index,
            total_rounds: self.state.total_rounds,
            creator_name: self.state.creator_name().map(str::to_string),
        }
    }

    pub(crate) fn broadcast_game_state(&self) {
        self.broadcast(&self.game_state_event(), None);
    }

    fn snapshot(&self) -> RoomSnapshot {
        RoomSnapshot {
            phase: self.state.phase,
            round_index: self.state.round_index,
            total_rounds: self.state.total_rounds,
            time_remaining: self.state.time_remaining,
            players: self.state.views(),
            creator: self.state.creator().cloned(),
            drawer: self.state.current_drawer().cloned(),
            word_active: self.state.secret_word().is_some(),
        }
    }
}

/// Spawns the room actor and returns a handle to it.
pub fn spawn_room<W: WordSource, R: ResultStore>(
    config: RoomConfig,
    words: Arc<W>,
    results: Arc<R>,
) -> RoomHandle {
    let (tx, rx) = mpsc::channel(config.channel_size.max(1));

    let clock = TickScheduler::new(TickConfig::with_period(config.tick_period));
    let actor = RoomActor {
        state: RoomState::new(config.default_total_rounds),
        registry: ConnectionRegistry::new(),
        fanout: Fanout::new(),
        clock,
        timer: PhaseTimer::new(),
        epoch: Epoch::ZERO,
        awaiting_word: None,
        finished: false,
        words,
        results,
        receiver: rx,
        self_sender: tx.downgrade(),
        config,
    };

    tokio::spawn(actor.run());

    RoomHandle { sender: tx }
}
