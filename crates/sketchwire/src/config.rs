//! Server configuration.
//!
//! Command-line flags with environment fallbacks, parsed by `clap`.

use clap::Parser;
use sketchwire_room::RoomConfig;

/// Address used when neither `--bind` nor `SKETCHWIRE_BIND` is given.
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3001";

/// Command-line arguments of the `sketchwire-server` binary.
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(author, version, about = "Real-time draw-and-guess game server")]
pub struct ServerArgs {
    /// Address to listen on
    #[arg(long, env = "SKETCHWIRE_BIND", default_value = DEFAULT_BIND_ADDR)]
    pub bind: String,
    /// Token unlocking admin actions; admin is disabled when unset
    #[arg(long, env = "SKETCHWIRE_ADMIN_TOKEN")]
    pub admin_token: Option<String>,
    /// Length of one drawing turn, in seconds
    #[arg(long, env = "SKETCHWIRE_ROUND_SECS", value_parser = clap::value_parser!(u32).range(1..))]
    pub round_secs: Option<u32>,
    /// Rounds per game when the creator does not pick a number
    #[arg(long, env = "SKETCHWIRE_DEFAULT_ROUNDS", value_parser = clap::value_parser!(u32).range(1..))]
    pub default_rounds: Option<u32>,
}

/// Everything the binary needs to start a server.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub bind_addr: String,
    /// `None` disables admin actions entirely.
    pub admin_token: Option<String>,
    pub room: RoomConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            admin_token: None,
            room: RoomConfig::default(),
        }
    }
}

impl From<ServerArgs> for ServerConfig {
    fn from(args: ServerArgs) -> Self {
        let mut config = Self {
            bind_addr: args.bind.trim().to_string(),
            admin_token: args.admin_token.filter(|t| !t.is_empty()),
            room: RoomConfig::default(),
        };
        if config.bind_addr.is_empty() {
            config.bind_addr = DEFAULT_BIND_ADDR.to_string();
        }

        if let Some(secs) = args.round_secs {
            config.room.round_duration_secs = secs;
        }
        if let Some(rounds) = args.default_rounds {
            if config.room.accepts_total_rounds(rounds) {
                config.room.default_total_rounds = rounds;
            } else {
                tracing::warn!(
                    rounds,
                    max = config.room.max_total_rounds,
                    "default rounds out of range, ignored"
                );
            }
        }

        config
    }
}
