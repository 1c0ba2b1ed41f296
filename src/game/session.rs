//! The game session state machine: selection, move application, turn
//! flips, clocks and terminal outcomes.

use log::{debug, info};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{MoveError, SessionError};
use crate::game::board::{Board, Color, Square};
use crate::game::clock::{ClockPair, ClockTick, TimeControl};
use crate::game::notation::MoveRecord;
use crate::game::outcome::{detect, game_status, Outcome};
use crate::game::rules::{is_legal, legal_destinations};

/// Knobs for a single game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub time_control: TimeControl,
    /// Run the outcome detector after every applied move.
    pub detect_outcomes: bool,
    /// Reject moves by the side that is not on turn.
    pub enforce_turn: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            time_control: TimeControl::UNLIMITED,
            detect_outcomes: true,
            enforce_turn: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum SessionState {
    AwaitingSelection,
    PieceSelected(Square),
    Terminal(Outcome),
}

/// Result of a click on the board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Click {
    /// Clicked an empty square with nothing selected.
    Ignored,
    Selected(Square),
    Deselected,
    /// Moved the selection to another piece of the same color.
    Reselected(Square),
    Moved {
        record: MoveRecord,
        outcome: Option<Outcome>,
    },
    /// The destination was illegal; the selection was cleared.
    Rejected { from: Square, to: Square },
}

/// Result of a clock tick delivered to a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionTick {
    /// The tick was scheduled for another session.
    Stale,
    /// Paused, finished, or no limited clock is running.
    Idle,
    Counting { color: Color, remaining_secs: u32 },
    Expired(Outcome),
}

/// One game from start to outcome. A rematch is a new session.
#[derive(Debug, Clone)]
pub struct GameSession {
    id: Uuid,
    board: Board,
    turn: Color,
    state: SessionState,
    clocks: ClockPair,
    history: Vec<MoveRecord>,
    config: SessionConfig,
    paused: bool,
}

impl GameSession {
    /// A new game from the standard position. White's clock starts
    /// immediately.
    pub fn new(config: SessionConfig) -> Self {
        Self::from_position(Board::initial(), Color::White, config)
    }

    pub fn from_position(board: Board, turn: Color, config: SessionConfig) -> Self {
        let mut clocks = ClockPair::new(config.time_control);
        clocks.start(turn);
        let id = Uuid::new_v4();
        info!("Game session {} started, {} to move", id, turn);
        Self {
            id,
            board,
            turn,
            state: SessionState::AwaitingSelection,
            clocks,
            history: Vec::new(),
            config,
            paused: false,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn turn(&self) -> Color {
        self.turn
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn selection(&self) -> Option<Square> {
        match self.state {
            SessionState::PieceSelected(square) => Some(square),
            _ => None,
        }
    }

    pub fn outcome(&self) -> Option<Outcome> {
        match self.state {
            SessionState::Terminal(outcome) => Some(outcome),
            _ => None,
        }
    }

    pub fn is_over(&self) -> bool {
        self.outcome().is_some()
    }

    pub fn clocks(&self) -> &ClockPair {
        &self.clocks
    }

    pub fn history(&self) -> &[MoveRecord] {
        &self.history
    }

    /// Moves so far in SAN, the form handed to the analysis supplier.
    pub fn san_moves(&self) -> Vec<String> {
        self.history.iter().map(|m| m.san.clone()).collect()
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn status(&self) -> String {
        game_status(&self.board, self.turn, self.outcome())
    }

    /// Destinations for the currently selected piece.
    pub fn selection_targets(&self) -> Vec<Square> {
        self.selection()
            .map(|from| legal_destinations(&self.board, from))
            .unwrap_or_default()
    }

    /// Feed a board click into the state machine.
    pub fn click(&mut self, square: Square) -> Result<Click, SessionError> {
        match self.state {
            SessionState::Terminal(_) => Err(SessionError::GameOver),
            SessionState::AwaitingSelection => {
                if self.board.is_empty(square) {
                    return Ok(Click::Ignored);
                }
                self.state = SessionState::PieceSelected(square);
                Ok(Click::Selected(square))
            }
            SessionState::PieceSelected(from) => {
                if from == square {
                    self.state = SessionState::AwaitingSelection;
                    return Ok(Click::Deselected);
                }
                if is_legal(&self.board, from, square) {
                    if let Err(e) = self.check_turn(from) {
                        self.state = SessionState::AwaitingSelection;
                        return Err(e.into());
                    }
                    let (record, outcome) = self.apply(from, square)?;
                    return Ok(Click::Moved { record, outcome });
                }
                if self.board.color_at(square).is_some()
                    && self.board.color_at(square) == self.board.color_at(from)
                {
                    self.state = SessionState::PieceSelected(square);
                    return Ok(Click::Reselected(square));
                }
                debug!("Rejected {}{} in session {}", from, square, self.id);
                self.state = SessionState::AwaitingSelection;
                Ok(Click::Rejected { from, to: square })
            }
        }
    }

    /// Apply a whole move at once, as a client sending both squares would.
    /// On any rejection the session is left exactly as it was, minus the
    /// selection.
    pub fn play(
        &mut self,
        from: Square,
        to: Square,
    ) -> Result<(MoveRecord, Option<Outcome>), SessionError> {
        if self.is_over() {
            return Err(SessionError::GameOver);
        }
        self.state = SessionState::AwaitingSelection;
        if self.board.is_empty(from) {
            return Err(MoveError::EmptySource { square: from }.into());
        }
        if !is_legal(&self.board, from, to) {
            return Err(MoveError::Illegal { from, to }.into());
        }
        self.check_turn(from)?;
        self.apply(from, to)
    }

    fn check_turn(&self, from: Square) -> Result<(), MoveError> {
        if self.config.enforce_turn && self.board.color_at(from) != Some(self.turn) {
            return Err(MoveError::OutOfTurn);
        }
        Ok(())
    }

    fn apply(
        &mut self,
        from: Square,
        to: Square,
    ) -> Result<(MoveRecord, Option<Outcome>), SessionError> {
        let record = MoveRecord::describe(&self.board, from, to)?;
        let next = self.board.with_move(from, to)?;
        let mover = record.piece.color;

        self.board = next;
        self.history.push(record.clone());
        self.turn = self.turn.opponent();
        self.state = SessionState::AwaitingSelection;
        if self.paused {
            self.clocks.add_increment(self.turn.opponent());
        } else {
            self.clocks.switch_to(self.turn);
        }
        debug!("Session {} applied {}", self.id, record.san);

        let outcome = if self.config.detect_outcomes {
            detect(&self.board, mover)
        } else {
            None
        };
        if let Some(outcome) = outcome {
            self.finish(outcome);
        }
        Ok((record, outcome))
    }

    /// Accept an outcome decided outside the session (external detector,
    /// agreement). Ignored once the game is already over.
    pub fn report_outcome(&mut self, outcome: Outcome) -> Result<(), SessionError> {
        if self.is_over() {
            return Err(SessionError::GameOver);
        }
        self.finish(outcome);
        Ok(())
    }

    pub fn resign(&mut self, loser: Color) -> Result<Outcome, SessionError> {
        let outcome = Outcome::Resignation { loser };
        self.report_outcome(outcome)?;
        Ok(outcome)
    }

    fn finish(&mut self, outcome: Outcome) {
        self.clocks.stop();
        self.state = SessionState::Terminal(outcome);
        info!(
            "Game session {} over: {} ({})",
            self.id,
            outcome.status(),
            outcome.reason()
        );
    }

    /// Stop the clocks, e.g. when the session is no longer on screen.
    pub fn pause(&mut self) {
        if !self.paused {
            self.paused = true;
            self.clocks.stop();
        }
    }

    pub fn resume(&mut self) {
        if self.paused {
            self.paused = false;
            if !self.is_over() {
                self.clocks.start(self.turn);
            }
        }
    }

    /// One second of wall time, delivered by the scheduler that was started
    /// for session `target`.
    pub fn tick(&mut self, target: Uuid) -> SessionTick {
        if target != self.id {
            return SessionTick::Stale;
        }
        if self.paused || self.is_over() {
            return SessionTick::Idle;
        }
        match self.clocks.tick() {
            ClockTick::Idle => SessionTick::Idle,
            ClockTick::Running {
                color,
                remaining_secs,
            } => SessionTick::Counting {
                color,
                remaining_secs,
            },
            ClockTick::Expired { color } => {
                let outcome = Outcome::Timeout { loser: color };
                self.finish(outcome);
                SessionTick::Expired(outcome)
            }
        }
    }
}
