//! Puzzles and the single-puzzle solving state machine.

use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::{MoveError, PuzzleError};
use crate::game::board::{Board, Color, Square};
use crate::game::notation::{parse_coordinate, MoveRecord};
use crate::game::rules::is_legal;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        })
    }
}

impl FromStr for Difficulty {
    type Err = PuzzleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(PuzzleError::Unknown(format!("difficulty '{}'", other))),
        }
    }
}

/// Puzzle as stored in the catalog file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PuzzleRecord {
    pub id: String,
    pub fen: String,
    /// Expected moves in coordinate notation; only the first is checked.
    pub moves: Vec<String>,
    pub rating: u32,
    pub difficulty: Difficulty,
    #[serde(default)]
    pub theme: String,
}

/// Immutable reference data for one puzzle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Puzzle {
    pub id: String,
    pub board: Board,
    pub side_to_move: Color,
    pub moves: Vec<String>,
    pub rating: u32,
    pub difficulty: Difficulty,
    pub theme: String,
}

impl Puzzle {
    pub fn first_move(&self) -> &str {
        // Non-empty by construction.
        self.moves.first().map(String::as_str).unwrap_or_default()
    }

    pub fn fen(&self) -> String {
        self.board.to_fen(self.side_to_move)
    }
}

impl TryFrom<PuzzleRecord> for Puzzle {
    type Error = PuzzleError;

    fn try_from(record: PuzzleRecord) -> Result<Self, Self::Error> {
        let (board, side_to_move) =
            Board::from_fen(&record.fen).map_err(|e| PuzzleError::Malformed {
                id: record.id.clone(),
                message: e.to_string(),
            })?;
        let first = record.moves.first().ok_or_else(|| PuzzleError::NoSolution {
            id: record.id.clone(),
        })?;
        let (from, to) = parse_coordinate(first).ok_or_else(|| PuzzleError::Malformed {
            id: record.id.clone(),
            message: format!("bad move '{}'", first),
        })?;
        if !is_legal(&board, from, to) {
            return Err(PuzzleError::Malformed {
                id: record.id.clone(),
                message: format!("solution {} is not playable", first),
            });
        }

        Ok(Self {
            id: record.id,
            board,
            side_to_move,
            moves: record.moves,
            rating: record.rating,
            difficulty: record.difficulty,
            theme: record.theme,
        })
    }
}

/// Puzzles by id, resolving the identifiers handed out by a sequence
/// supplier.
#[derive(Debug, Clone, Default)]
pub struct PuzzleCatalog {
    puzzles: Vec<Arc<Puzzle>>,
    by_id: HashMap<String, usize>,
}

impl PuzzleCatalog {
    /// Build a catalog from records, skipping (and logging) malformed ones.
    pub fn from_records(records: Vec<PuzzleRecord>) -> Self {
        let mut catalog = Self::default();
        for record in records {
            match Puzzle::try_from(record) {
                Ok(puzzle) => catalog.insert(puzzle),
                Err(e) => warn!("Skipping catalog entry: {}", e),
            }
        }
        catalog
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let records: Vec<PuzzleRecord> = serde_json::from_str(json)?;
        Ok(Self::from_records(records))
    }

    /// The catalog shipped with the crate.
    pub fn builtin() -> Self {
        match Self::from_json(include_str!("../../data/puzzles.json")) {
            Ok(catalog) => {
                info!("Loaded {} built-in puzzles", catalog.len());
                catalog
            }
            Err(e) => {
                warn!("Built-in puzzle catalog unreadable: {}", e);
                Self::default()
            }
        }
    }

    pub fn insert(&mut self, puzzle: Puzzle) {
        let id = puzzle.id.clone();
        match self.by_id.get(&id) {
            Some(&index) => self.puzzles[index] = Arc::new(puzzle),
            None => {
                self.by_id.insert(id, self.puzzles.len());
                self.puzzles.push(Arc::new(puzzle));
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<Arc<Puzzle>> {
        self.by_id.get(id).map(|&i| Arc::clone(&self.puzzles[i]))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Puzzle>> {
        self.puzzles.iter()
    }

    pub fn len(&self) -> usize {
        self.puzzles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.puzzles.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SolveState {
    Solving,
    Correct,
    /// Shown for `ticks_left` more seconds, then back to `Solving`.
    Incorrect { ticks_left: u32 },
}

/// Result of submitting a move to a puzzle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub correct: bool,
    pub record: MoveRecord,
}

/// Solving state for one puzzle instance.
#[derive(Debug, Clone)]
pub struct PuzzleSolver {
    puzzle: Arc<Puzzle>,
    board: Board,
    state: SolveState,
    flash_ticks: u32,
    attempts: u32,
}

impl PuzzleSolver {
    /// `flash_ticks` is how many one-second ticks the incorrect indicator
    /// stays up; at least one.
    pub fn new(puzzle: Arc<Puzzle>, flash_ticks: u32) -> Self {
        Self {
            board: puzzle.board,
            puzzle,
            state: SolveState::Solving,
            flash_ticks: flash_ticks.max(1),
            attempts: 0,
        }
    }

    pub fn puzzle(&self) -> &Arc<Puzzle> {
        &self.puzzle
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn state(&self) -> SolveState {
        self.state
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Apply and classify a move. Illegal moves are rejected without
    /// touching the board.
    pub fn submit(&mut self, from: Square, to: Square) -> Result<Verdict, PuzzleError> {
        match self.state {
            SolveState::Correct => return Err(PuzzleError::AlreadySolved),
            SolveState::Incorrect { .. } => return Err(PuzzleError::ShowingIncorrect),
            SolveState::Solving => {}
        }
        if !is_legal(&self.board, from, to) {
            return Err(MoveError::Illegal { from, to }.into());
        }

        let record = MoveRecord::describe(&self.board, from, to)?;
        self.board = self.board.with_move(from, to)?;
        self.attempts += 1;

        let correct = record.matches(self.puzzle.first_move());
        self.state = if correct {
            SolveState::Correct
        } else {
            SolveState::Incorrect {
                ticks_left: self.flash_ticks,
            }
        };
        info!(
            "Puzzle {}: {} is {}",
            self.puzzle.id,
            record.san,
            if correct { "correct" } else { "incorrect" }
        );
        Ok(Verdict { correct, record })
    }

    /// One second passes; clears the incorrect indicator when it runs out.
    pub fn tick(&mut self) -> SolveState {
        if let SolveState::Incorrect { ticks_left } = self.state {
            self.state = if ticks_left <= 1 {
                SolveState::Solving
            } else {
                SolveState::Incorrect {
                    ticks_left: ticks_left - 1,
                }
            };
        }
        self.state
    }

    /// The expected line. Reading it does not change the state.
    pub fn solution(&self) -> &[String] {
        &self.puzzle.moves
    }

    /// Start over from the puzzle's initial position.
    pub fn reset(&mut self) {
        *self = Self::new(Arc::clone(&self.puzzle), self.flash_ticks);
    }
}
