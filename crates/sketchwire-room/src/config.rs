//! Room configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Timings and limits for the game room.
///
/// All delays are plain [`Duration`]s so tests can shrink them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomConfig {
    /// Players needed before a game starts (and to keep one running).
    pub min_players: usize,

    /// Pause between "game starting" and the first turn.
    pub start_delay: Duration,

    /// Seconds on the clock at the start of each turn.
    pub round_duration_secs: u32,

    /// Period of the round clock.
    pub tick_period: Duration,

    /// Pause after a turn ends before the next one (or game over).
    pub round_end_delay: Duration,

    /// Pause after a restart before re-checking whether to start.
    pub restart_delay: Duration,

    /// Pause after game over before the room returns to waiting.
    pub game_over_reset_delay: Duration,

    /// Points awarded for a correct guess.
    pub correct_guess_points: u32,

    /// Rounds per game when the creator did not choose.
    pub default_total_rounds: u32,

    /// Upper bound for a requested round count.
    pub max_total_rounds: u32,

    /// Longest accepted display name, in characters.
    pub max_display_name_len: usize,

    /// Capacity of the room's command channel.
    pub channel_size: usize,

    /// Longest a single word source call may take before it counts as failed.
    pub word_fetch_timeout: Duration,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            min_players: 2,
            start_delay: Duration::from_secs(3),
            round_duration_secs: 60,
            tick_period: Duration::from_secs(1),
            round_end_delay: Duration::from_secs(5),
            restart_delay: Duration::from_secs(2),
            game_over_reset_delay: Duration::from_secs(2),
            correct_guess_points: 100,
            default_total_rounds: 2,
            max_total_rounds: 10,
            max_display_name_len: 32,
            channel_size: 256,
            word_fetch_timeout: Duration::from_secs(5),
        }
    }
}

impl RoomConfig {
    /// Whether `rounds` is an acceptable round count.
    pub fn accepts_total_rounds(&self, rounds: u32) -> bool {
        (1..=self.max_total_rounds).contains(&rounds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_config_default() {
        let config = RoomConfig::default();
        assert_eq!(config.min_players, 2);
        assert_eq!(config.start_delay, Duration::from_secs(3));
        assert_eq!(config.round_duration_secs, 60);
        assert_eq!(config.round_end_delay, Duration::from_secs(5));
        assert_eq!(config.restart_delay, Duration::from_secs(2));
        assert_eq!(config.correct_guess_points, 100);
        assert_eq!(config.default_total_rounds, 2);
        assert_eq!(config.word_fetch_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_accepts_total_rounds_bounds() {
        let config = RoomConfig::default();
        assert!(!config.accepts_total_rounds(0));
        assert!(config.accepts_total_rounds(1));
        assert!(config.accepts_total_rounds(10));
        assert!(!config.accepts_total_rounds(11));
    }
}
