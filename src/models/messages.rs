use actix::Message;
use serde::{Deserialize, Serialize};

use crate::game::bots::{BotTier, Opponent};
use crate::game::notation::MoveRecord;
use crate::game::puzzle::{Difficulty, PuzzleSolver, SolveState};
use crate::game::rush::{FinishReason, RushAttempt, RushPhase, RushSession};
use crate::suppliers::{CustomBot, GameAnalysis};

/// Message sent from client to server
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct ClientMessage {
    pub message_type: String,
    /// Board square for `select`.
    pub square: Option<String>,
    pub move_from: Option<String>,
    pub move_to: Option<String>,
    /// Side resigning, or the human's side in a bot game.
    pub color: Option<String>,
    pub start_time_minutes: Option<u32>,
    pub increment_seconds: Option<u32>,
    /// Ladder bot to play, by rating.
    pub bot_rating: Option<u32>,
    /// Custom bot to play, or the name for `create_bot`.
    pub bot_name: Option<String>,
    pub style_prompt: Option<String>,
    pub puzzle_id: Option<String>,
    pub difficulty: Option<String>,
    pub player_rating: Option<u32>,
}

/// Message sent from server to client
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ServerMessage {
    pub message_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fen: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub turn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_moves: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_move: Option<LastMove>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub white_time_secs: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub black_time_secs: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub increment_secs: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paused: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opponent: Option<Opponent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub puzzle: Option<PuzzleView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub solution: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rush: Option<RushView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<GameAnalysis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bot: Option<CustomBot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tiers: Option<Vec<BotTier>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unlocked_rating: Option<u32>,
}

impl ServerMessage {
    pub fn new(message_type: &str) -> Self {
        Self {
            message_type: message_type.to_string(),
            ..Self::default()
        }
    }

    pub fn error(text: impl ToString) -> Self {
        Self {
            error: Some(text.to_string()),
            ..Self::new("error")
        }
    }
}

/// Last move information
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct LastMove {
    pub from: String,
    pub to: String,
    pub san: String,
}

impl From<&MoveRecord> for LastMove {
    fn from(record: &MoveRecord) -> Self {
        Self {
            from: record.from.to_string(),
            to: record.to.to_string(),
            san: record.san.clone(),
        }
    }
}

/// The puzzle on screen.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PuzzleView {
    pub id: String,
    pub fen: String,
    pub rating: u32,
    pub difficulty: Difficulty,
    pub theme: String,
    pub state: SolveState,
    pub attempts: u32,
}

impl From<&PuzzleSolver> for PuzzleView {
    fn from(solver: &PuzzleSolver) -> Self {
        let puzzle = solver.puzzle();
        Self {
            id: puzzle.id.clone(),
            fen: solver.board().to_fen(puzzle.side_to_move),
            rating: puzzle.rating,
            difficulty: puzzle.difficulty,
            theme: puzzle.theme.clone(),
            state: solver.state(),
            attempts: solver.attempts(),
        }
    }
}

/// Rush progress for the score panel.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct RushView {
    pub phase: RushPhase,
    pub score: u32,
    pub cursor: usize,
    pub total: usize,
    pub seconds_remaining: u32,
    pub attempts: Vec<RushAttempt>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<FinishReason>,
}

impl From<&RushSession> for RushView {
    fn from(rush: &RushSession) -> Self {
        Self {
            phase: rush.phase(),
            score: rush.score(),
            cursor: rush.cursor(),
            total: rush.queue_len(),
            seconds_remaining: rush.seconds_remaining(),
            attempts: rush.attempts().to_vec(),
            finish_reason: rush.finish_reason(),
        }
    }
}

/// Another connection of the same player unlocked a tier.
#[derive(Message, Debug, Clone, Copy)]
#[rtype(result = "()")]
pub struct TierUnlocked {
    pub unlocked_rating: u32,
}
