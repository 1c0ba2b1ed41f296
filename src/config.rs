use clap::{ArgAction, Parser};
use std::path::PathBuf;

use crate::game::clock::TimeControl;
use crate::game::rush::{DEFAULT_RUSH_COUNT, DEFAULT_RUSH_SECS};
use crate::game::session::SessionConfig;

/// Server settings. Every flag can also come from the environment.
#[derive(Debug, Clone, Parser)]
#[command(name = "chess_rush", about, version)]
pub struct Config {
    /// Address the HTTP server listens on.
    #[arg(long, env = "CHESS_RUSH_BIND", default_value = "127.0.0.1:8080")]
    pub bind: String,

    /// Directory served under /static.
    #[arg(long, env = "CHESS_RUSH_STATIC_DIR", default_value = "./static")]
    pub static_dir: PathBuf,

    /// Where unlocked bot tiers are kept. Without it progression lives in
    /// memory only.
    #[arg(long, env = "CHESS_RUSH_TIER_STORE")]
    pub tier_store: Option<PathBuf>,

    /// Default starting time per side; 0 means unlimited.
    #[arg(long, env = "CHESS_RUSH_CLOCK_MINUTES", default_value_t = 10)]
    pub clock_minutes: u32,

    /// Seconds added to the mover's clock after each move.
    #[arg(long, env = "CHESS_RUSH_INCREMENT_SECS", default_value_t = 0)]
    pub increment_secs: u32,

    #[arg(long, env = "CHESS_RUSH_RUSH_SECS", default_value_t = DEFAULT_RUSH_SECS)]
    pub rush_secs: u32,

    #[arg(long, env = "CHESS_RUSH_RUSH_COUNT", default_value_t = DEFAULT_RUSH_COUNT)]
    pub rush_count: usize,

    /// How long a wrong puzzle answer stays on screen.
    #[arg(long, env = "CHESS_RUSH_FLASH_SECS", default_value_t = 2)]
    pub flash_secs: u32,

    /// End games automatically on checkmate or stalemate.
    #[arg(
        long,
        env = "CHESS_RUSH_DETECT_OUTCOMES",
        default_value_t = true,
        action = ArgAction::Set
    )]
    pub detect_outcomes: bool,

    /// Reject moves by the side that is not on turn.
    #[arg(
        long,
        env = "CHESS_RUSH_ENFORCE_TURN",
        default_value_t = false,
        action = ArgAction::Set
    )]
    pub enforce_turn: bool,
}

impl Config {
    pub fn time_control(&self) -> TimeControl {
        self.time_control_with(self.clock_minutes, self.increment_secs)
    }

    /// Time control for explicit minutes/increment, 0 minutes being
    /// unlimited.
    pub fn time_control_with(&self, minutes: u32, increment_secs: u32) -> TimeControl {
        if minutes == 0 {
            TimeControl::UNLIMITED
        } else {
            TimeControl::minutes(minutes, increment_secs)
        }
    }

    pub fn session_config(&self, time_control: TimeControl) -> SessionConfig {
        SessionConfig {
            time_control,
            detect_outcomes: self.detect_outcomes,
            enforce_turn: self.enforce_turn,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8080".to_string(),
            static_dir: PathBuf::from("./static"),
            tier_store: None,
            clock_minutes: 10,
            increment_secs: 0,
            rush_secs: DEFAULT_RUSH_SECS,
            rush_count: DEFAULT_RUSH_COUNT,
            flash_secs: 2,
            detect_outcomes: true,
            enforce_turn: false,
        }
    }
}
