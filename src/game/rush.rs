//! Puzzle rush: an ordered queue of puzzles under one shared countdown.
//!
//! ```text
//! Idle --start--> Loading --finish_loading(ok)--> Playing --(queue empty | time up)--> Finished
//!   ^               |  finish_loading(err) / cancel                                       |
//!   +---------------+-----------------------------------------------------restart--------+
//! ```
//!
//! Loading is split in two so the supplier call can run outside the
//! session: [`RushSession::start`] hands out a [`RushRequest`] whose ticket
//! must come back with the response.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{RushError, SupplierError};
use crate::game::board::Square;
use crate::game::puzzle::{Puzzle, PuzzleSolver, Verdict};
use crate::suppliers::SequenceRequest;

pub const DEFAULT_RUSH_SECS: u32 = 180;
pub const DEFAULT_RUSH_COUNT: usize = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RushPhase {
    Idle,
    Loading,
    Playing,
    Finished,
}

impl RushPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            RushPhase::Idle => "idle",
            RushPhase::Loading => "loading",
            RushPhase::Playing => "playing",
            RushPhase::Finished => "finished",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    QueueExhausted,
    TimeUp,
}

/// A pending supplier call for a rush run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RushRequest {
    pub ticket: Uuid,
    pub sequence: SequenceRequest,
}

/// One answered puzzle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RushAttempt {
    pub puzzle_id: String,
    pub played: String,
    pub correct: bool,
}

/// Result of a rush submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RushAnswer {
    pub verdict: Verdict,
    pub score: u32,
    pub finished: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RushTick {
    /// The tick belongs to a run that is no longer current.
    Stale,
    /// Not playing.
    Idle,
    Running { seconds_remaining: u32 },
    TimeUp,
}

#[derive(Debug, Clone)]
pub struct RushSession {
    duration_secs: u32,
    phase: RushPhase,
    ticket: Option<Uuid>,
    queue: Vec<Arc<Puzzle>>,
    cursor: usize,
    score: u32,
    seconds_remaining: u32,
    solver: Option<PuzzleSolver>,
    attempts: Vec<RushAttempt>,
    finish_reason: Option<FinishReason>,
}

impl RushSession {
    pub fn new(duration_secs: u32) -> Self {
        Self {
            duration_secs,
            phase: RushPhase::Idle,
            ticket: None,
            queue: Vec::new(),
            cursor: 0,
            score: 0,
            seconds_remaining: 0,
            solver: None,
            attempts: Vec::new(),
            finish_reason: None,
        }
    }

    pub fn phase(&self) -> RushPhase {
        self.phase
    }

    /// Id of the current run while loading, playing or finished.
    pub fn ticket(&self) -> Option<Uuid> {
        self.ticket
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn seconds_remaining(&self) -> u32 {
        self.seconds_remaining
    }

    pub fn duration_secs(&self) -> u32 {
        self.duration_secs
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn attempts(&self) -> &[RushAttempt] {
        &self.attempts
    }

    pub fn finish_reason(&self) -> Option<FinishReason> {
        self.finish_reason
    }

    /// The puzzle being played, with the board as the player sees it.
    pub fn current(&self) -> Option<&PuzzleSolver> {
        match self.phase {
            RushPhase::Playing => self.solver.as_ref(),
            _ => None,
        }
    }

    fn wrong_phase(&self) -> RushError {
        RushError::WrongPhase {
            phase: self.phase.as_str(),
        }
    }

    /// Idle -> Loading. Only one load can be outstanding.
    pub fn start(&mut self, sequence: SequenceRequest) -> Result<RushRequest, RushError> {
        if self.phase != RushPhase::Idle {
            return Err(self.wrong_phase());
        }
        let ticket = Uuid::new_v4();
        self.ticket = Some(ticket);
        self.phase = RushPhase::Loading;
        info!(
            "Rush {} loading {} {} puzzles",
            ticket, sequence.count, sequence.difficulty
        );
        Ok(RushRequest { ticket, sequence })
    }

    /// Loading -> Playing on success, back to Idle on failure. Responses
    /// for any other ticket are discarded without touching the session.
    pub fn finish_loading(
        &mut self,
        ticket: Uuid,
        result: Result<Vec<Arc<Puzzle>>, SupplierError>,
    ) -> Result<(), RushError> {
        if self.phase != RushPhase::Loading || self.ticket != Some(ticket) {
            debug!("Dropping stale rush response {}", ticket);
            return Err(RushError::StaleResponse);
        }

        let queue = match result {
            Ok(queue) if !queue.is_empty() => queue,
            Ok(_) => {
                self.reset();
                return Err(SupplierError::Empty {
                    supplier: "puzzle sequence",
                }
                .into());
            }
            Err(e) => {
                warn!("Rush {} failed to load: {}", ticket, e);
                self.reset();
                return Err(e.into());
            }
        };

        info!("Rush {} playing {} puzzles", ticket, queue.len());
        self.queue = queue;
        self.cursor = 0;
        self.score = 0;
        self.seconds_remaining = self.duration_secs;
        self.attempts.clear();
        self.finish_reason = None;
        self.phase = RushPhase::Playing;
        self.load_current();
        Ok(())
    }

    /// Abandon an outstanding load.
    pub fn cancel_loading(&mut self) {
        if self.phase == RushPhase::Loading {
            self.reset();
        }
    }

    fn load_current(&mut self) {
        // The flash is never shown in a rush; each answer advances at once.
        self.solver = self
            .queue
            .get(self.cursor)
            .map(|puzzle| PuzzleSolver::new(Arc::clone(puzzle), 1));
    }

    /// Answer the current puzzle. Correct or not, the rush moves on.
    pub fn submit(&mut self, from: Square, to: Square) -> Result<RushAnswer, RushError> {
        if self.phase != RushPhase::Playing {
            return Err(self.wrong_phase());
        }
        let solver = self.solver.as_mut().ok_or_else(|| RushError::WrongPhase {
            phase: RushPhase::Playing.as_str(),
        })?;
        let verdict = solver.submit(from, to)?;

        self.attempts.push(RushAttempt {
            puzzle_id: solver.puzzle().id.clone(),
            played: verdict.record.san.clone(),
            correct: verdict.correct,
        });
        if verdict.correct {
            self.score += 1;
        }
        self.cursor += 1;
        if self.cursor >= self.queue.len() {
            self.finish(FinishReason::QueueExhausted);
        } else {
            self.load_current();
        }

        Ok(RushAnswer {
            verdict,
            score: self.score,
            finished: self.phase == RushPhase::Finished,
        })
    }

    /// One second of the global countdown for run `ticket`.
    pub fn tick(&mut self, ticket: Uuid) -> RushTick {
        if self.ticket != Some(ticket) {
            return RushTick::Stale;
        }
        if self.phase != RushPhase::Playing {
            return RushTick::Idle;
        }
        self.seconds_remaining = self.seconds_remaining.saturating_sub(1);
        if self.seconds_remaining == 0 {
            self.finish(FinishReason::TimeUp);
            RushTick::TimeUp
        } else {
            RushTick::Running {
                seconds_remaining: self.seconds_remaining,
            }
        }
    }

    fn finish(&mut self, reason: FinishReason) {
        self.phase = RushPhase::Finished;
        self.finish_reason = Some(reason);
        self.solver = None;
        info!(
            "Rush finished ({:?}): score {} after {} of {} puzzles",
            reason,
            self.score,
            self.cursor,
            self.queue.len()
        );
    }

    /// Back to Idle defaults from any phase.
    pub fn restart(&mut self) {
        self.reset();
    }

    fn reset(&mut self) {
        *self = Self::new(self.duration_secs);
    }
}

impl Default for RushSession {
    fn default() -> Self {
        Self::new(DEFAULT_RUSH_SECS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PuzzleError;
    use crate::game::puzzle::{Difficulty, PuzzleRecord};

    fn puzzle(id: &str) -> Arc<Puzzle> {
        Arc::new(
            Puzzle::try_from(PuzzleRecord {
                id: id.to_string(),
                fen: "6k1/5ppp/8/8/8/8/8/R5K1 w - - 0 1".to_string(),
                moves: vec!["a1a8".to_string()],
                rating: 700,
                difficulty: Difficulty::Easy,
                theme: String::new(),
            })
            .unwrap(),
        )
    }

    fn request() -> SequenceRequest {
        SequenceRequest {
            difficulty: Difficulty::Easy,
            count: 3,
            player_rating: None,
        }
    }

    fn sq(name: &str) -> Square {
        name.parse().unwrap()
    }

    #[test]
    fn only_idle_can_start() {
        let mut rush = RushSession::new(60);
        rush.start(request()).unwrap();
        assert_eq!(rush.phase(), RushPhase::Loading);
        assert_eq!(
            rush.start(request()),
            Err(RushError::WrongPhase { phase: "loading" })
        );
    }

    #[test]
    fn failed_load_returns_to_idle() {
        let mut rush = RushSession::new(60);
        let req = rush.start(request()).unwrap();
        let result = rush.finish_loading(
            req.ticket,
            Err(SupplierError::Unavailable {
                supplier: "puzzle sequence",
            }),
        );
        assert!(matches!(result, Err(RushError::Supplier(_))));
        assert_eq!(rush.phase(), RushPhase::Idle);

        let req = rush.start(request()).unwrap();
        assert!(rush.finish_loading(req.ticket, Ok(Vec::new())).is_err());
        assert_eq!(rush.phase(), RushPhase::Idle);
        assert_eq!(rush.ticket(), None);
    }

    #[test]
    fn stale_responses_are_dropped() {
        let mut rush = RushSession::new(60);
        let old = rush.start(request()).unwrap();
        rush.cancel_loading();
        let new = rush.start(request()).unwrap();

        assert_eq!(
            rush.finish_loading(old.ticket, Ok(vec![puzzle("a")])),
            Err(RushError::StaleResponse)
        );
        assert_eq!(rush.phase(), RushPhase::Loading);
        rush.finish_loading(new.ticket, Ok(vec![puzzle("b")])).unwrap();
        assert_eq!(rush.phase(), RushPhase::Playing);
        assert_eq!(rush.current().unwrap().puzzle().id, "b");
    }

    #[test]
    fn illegal_moves_do_not_advance() {
        let mut rush = RushSession::new(60);
        let req = rush.start(request()).unwrap();
        rush.finish_loading(req.ticket, Ok(vec![puzzle("a"), puzzle("b")]))
            .unwrap();
        assert!(matches!(
            rush.submit(sq("a1"), sq("b3")),
            Err(RushError::Puzzle(PuzzleError::Move(_)))
        ));
        assert_eq!(rush.cursor(), 0);
        assert!(rush.attempts().is_empty());
    }

    #[test]
    fn restart_clears_everything() {
        let mut rush = RushSession::new(60);
        let req = rush.start(request()).unwrap();
        rush.finish_loading(req.ticket, Ok(vec![puzzle("a")])).unwrap();
        rush.submit(sq("a1"), sq("a8")).unwrap();
        assert_eq!(rush.phase(), RushPhase::Finished);
        assert_eq!(rush.finish_reason(), Some(FinishReason::QueueExhausted));
        assert_eq!(rush.score(), 1);

        rush.restart();
        assert_eq!(rush.phase(), RushPhase::Idle);
        assert_eq!(rush.score(), 0);
        assert_eq!(rush.cursor(), 0);
        assert_eq!(rush.queue_len(), 0);
        assert_eq!(rush.tick(req.ticket), RushTick::Stale);
    }
}
