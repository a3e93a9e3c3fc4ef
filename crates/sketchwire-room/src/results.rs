//! Result Persistence Adapter: one write per finished game.

use std::collections::HashMap;
use std::future::Future;

use tokio::sync::Mutex;

use crate::AdapterError;
use crate::state::Player;

/// One player's line in the final standings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Standing {
    pub display_name: String,
    pub persistent_user_id: Option<i64>,
    pub score: u32,
    /// 1-based; ties keep join order.
    pub rank: u32,
}

/// The match record written at game over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameRecord {
    pub creator_user_id: Option<i64>,
    pub total_rounds: u32,
    pub winner_user_id: Option<i64>,
    pub standings: Vec<Standing>,
}

impl GameRecord {
    /// Builds the record from the roster (in join order).
    pub fn from_players(players: &[Player], creator_user_id: Option<i64>, total_rounds: u32) -> Self {
        let mut ordered: Vec<&Player> = players.iter().collect();
        ordered.sort_by(|a, b| b.score.cmp(&a.score));

        let standings: Vec<Standing> = ordered
            .into_iter()
            .zip(1u32..)
            .map(|(p, rank)| Standing {
                display_name: p.display_name.clone(),
                persistent_user_id: p.persistent_user_id,
                score: p.score,
                rank,
            })
            .collect();

        let winner_user_id = standings.first().and_then(|s| s.persistent_user_id);

        Self {
            creator_user_id,
            total_rounds,
            winner_user_id,
            standings,
        }
    }

    /// Per-player stat changes for registered players.
    pub fn outcomes(&self) -> impl Iterator<Item = (i64, GameOutcome)> + '_ {
        self.standings.iter().filter_map(|s| {
            s.persistent_user_id.map(|id| {
                (
                    id,
                    GameOutcome {
                        score: s.score,
                        won: s.rank == 1,
                    },
                )
            })
        })
    }
}

/// How one game went for one player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameOutcome {
    pub score: u32,
    pub won: bool,
}

/// Cumulative stats for a registered player.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserStats {
    pub games_played: u32,
    pub games_won: u32,
    pub total_score: u64,
    pub best_score: u32,
    /// `total_score / games_played`, rounded to two decimals.
    pub average_score: f64,
}

impl UserStats {
    /// Folds one game into the running totals.
    pub fn apply(&mut self, outcome: GameOutcome) {
        self.games_played += 1;
        if outcome.won {
            self.games_won += 1;
        }
        self.total_score += u64::from(outcome.score);
        self.best_score = self.best_score.max(outcome.score);
        let avg = self.total_score as f64 / f64::from(self.games_played);
        self.average_score = (avg * 100.0).round() / 100.0;
    }
}

/// Persists finished games.
pub trait ResultStore: Send + Sync + 'static {
    /// Saves the match record and returns its id.
    fn save_game(
        &self,
        record: &GameRecord,
    ) -> impl Future<Output = Result<u64, AdapterError>> + Send;

    /// Folds one game into a player's cumulative stats.
    fn record_outcome(
        &self,
        user_id: i64,
        outcome: GameOutcome,
    ) -> impl Future<Output = Result<(), AdapterError>> + Send;
}

/// Writes a finished game: the record first, then each registered
/// player's stats. Failures are logged; nothing is returned.
pub async fn persist_game<R: ResultStore>(store: &R, record: GameRecord) {
    let game_id = match store.save_game(&record).await {
        Ok(id) => id,
        Err(e) => {
            tracing::warn!(error = %e, "failed to save game result, skipping stats");
            return;
        }
    };
    tracing::info!(game_id, players = record.standings.len(), "game result saved");

    for (user_id, outcome) in record.outcomes() {
        if let Err(e) = store.record_outcome(user_id, outcome).await {
            tracing::warn!(user_id, error = %e, "failed to update player stats");
        }
    }
}

/// A [`ResultStore`] that keeps everything in memory.
#[derive(Debug, Default)]
pub struct InMemoryResultStore {
    games: Mutex<Vec<GameRecord>>,
    stats: Mutex<HashMap<i64, UserStats>>,
}

impl InMemoryResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every saved game, oldest first.
    pub async fn games(&self) -> Vec<GameRecord> {
        self.games.lock().await.clone()
    }

    /// Stats for one player, if they have finished a game.
    pub async fn stats(&self, user_id: i64) -> Option<UserStats> {
        self.stats.lock().await.get(&user_id).cloned()
    }
}

impl ResultStore for InMemoryResultStore {
    async fn save_game(&self, record: &GameRecord) -> Result<u64, AdapterError> {
        let mut games = self.games.lock().await;
        games.push(record.clone());
        Ok(games.len() as u64)
    }

    async fn record_outcome(&self, user_id: i64, outcome: GameOutcome) -> Result<(), AdapterError> {
        self.stats
            .lock()
            .await
            .entry(user_id)
            .or_default()
            .apply(outcome);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sketchwire_protocol::SessionId;

    fn player(name: &str, id: Option<i64>, score: u32) -> Player {
        let mut p = Player::new(SessionId::from(name), name, id);
        p.score = score;
        p
    }

    struct BrokenStore;

    impl ResultStore for BrokenStore {
        async fn save_game(&self, _record: &GameRecord) -> Result<u64, AdapterError> {
            Err(AdapterError::ResultStore("database offline".into()))
        }

        async fn record_outcome(&self, _user_id: i64, _o: GameOutcome) -> Result<(), AdapterError> {
            panic!("stats must not be written when the game record failed");
        }
    }

    #[test]
    fn test_from_players_ranks_by_score() {
        let players = [
            player("a", Some(1), 100),
            player("b", None, 300),
            player("c", Some(3), 100),
        ];
        let record = GameRecord::from_players(&players, Some(1), 2);

        let ranked: Vec<_> = record
            .standings
            .iter()
            .map(|s| (s.display_name.as_str(), s.rank))
            .collect();
        assert_eq!(ranked, [("b", 1), ("a", 2), ("c", 3)]);
        assert_eq!(record.winner_user_id, None, "guest winner has no id");
        assert_eq!(record.creator_user_id, Some(1));
    }

    #[test]
    fn test_outcomes_skip_guests() {
        let players = [player("a", Some(1), 200), player("g", None, 100)];
        let record = GameRecord::from_players(&players, None, 1);
        let outcomes: Vec<_> = record.outcomes().collect();
        assert_eq!(outcomes, [(1, GameOutcome { score: 200, won: true })]);
        assert_eq!(record.winner_user_id, Some(1));
    }

    #[test]
    fn test_user_stats_apply_rounds_average() {
        let mut stats = UserStats::default();
        stats.apply(GameOutcome { score: 100, won: true });
        stats.apply(GameOutcome { score: 0, won: false });
        stats.apply(GameOutcome { score: 0, won: false });

        assert_eq!(stats.games_played, 3);
        assert_eq!(stats.games_won, 1);
        assert_eq!(stats.total_score, 100);
        assert_eq!(stats.best_score, 100);
        assert_eq!(stats.average_score, 33.33);
    }

    #[tokio::test]
    async fn test_persist_game_writes_record_and_stats() {
        let store = InMemoryResultStore::new();
        let players = [player("a", Some(1), 100), player("b", Some(2), 0)];
        persist_game(&store, GameRecord::from_players(&players, Some(2), 2)).await;

        assert_eq!(store.games().await.len(), 1);
        let a = store.stats(1).await.unwrap();
        assert_eq!((a.games_played, a.games_won, a.best_score), (1, 1, 100));
        let b = store.stats(2).await.unwrap();
        assert_eq!((b.games_played, b.games_won), (1, 0));
    }

    #[tokio::test]
    async fn test_persist_game_failure_is_swallowed() {
        let players = [player("a", Some(1), 100)];
        persist_game(&BrokenStore, GameRecord::from_players(&players, None, 1)).await;
    }
}
