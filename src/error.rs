//! Error types for the rules engine, the session state machines and the
//! external collaborators.

use thiserror::Error;

use crate::game::board::Square;

/// Errors raised while building or parsing a board.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BoardError {
    #[error("Invalid square: {0}")]
    InvalidSquare(String),

    #[error("Invalid color: {0}")]
    InvalidColor(String),

    #[error("Invalid piece character: {0}")]
    InvalidPiece(char),

    #[error("Invalid FEN: {message}")]
    InvalidFen { message: String },
}

/// A move that could not be applied.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MoveError {
    #[error("No piece at source square {square}")]
    EmptySource { square: Square },

    #[error("Illegal move: from square {from} to square {to}")]
    Illegal { from: Square, to: Square },

    #[error("Not your turn")]
    OutOfTurn,
}

/// Errors from the game session state machine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Game is already over")]
    GameOver,

    #[error(transparent)]
    Move(#[from] MoveError),
}

/// Errors from the single puzzle state machine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PuzzleError {
    #[error("Puzzle already solved")]
    AlreadySolved,

    #[error("Wait for the incorrect indicator to clear")]
    ShowingIncorrect,

    #[error("Puzzle {id} has no expected moves")]
    NoSolution { id: String },

    #[error("Malformed puzzle {id}: {message}")]
    Malformed { id: String, message: String },

    #[error("Unknown puzzle: {0}")]
    Unknown(String),

    #[error(transparent)]
    Move(#[from] MoveError),
}

/// Errors from the puzzle rush orchestration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RushError {
    #[error("Rush is {phase}")]
    WrongPhase { phase: &'static str },

    #[error("Response belongs to a rush that is no longer loading")]
    StaleResponse,

    #[error(transparent)]
    Supplier(#[from] SupplierError),

    #[error(transparent)]
    Puzzle(#[from] PuzzleError),
}

/// Failures reported by (or about) an external collaborator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SupplierError {
    #[error("{supplier} supplier is not available")]
    Unavailable { supplier: &'static str },

    #[error("{supplier} supplier returned an empty result")]
    Empty { supplier: &'static str },

    #[error("{supplier} supplier returned a malformed result: {message}")]
    Malformed {
        supplier: &'static str,
        message: String,
    },

    #[error("{supplier} request failed: {message}")]
    Failed {
        supplier: &'static str,
        message: String,
    },

    #[error("A {supplier} request is already in flight")]
    Busy { supplier: &'static str },
}

/// Errors from the bot tier persistence boundary.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Tier store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Tier store serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Tier store lock poisoned")]
    Poisoned,
}
