use actix::prelude::*;
use actix_web_actors::ws;
use log::{debug, info};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{PuzzleError, RushError, SupplierError};
use crate::game::board::Square;
use crate::game::puzzle::{Difficulty, Puzzle, PuzzleSolver, SolveState};
use crate::game::rush::RushTick;
use crate::models::messages::{ClientMessage, LastMove, PuzzleView, RushView, ServerMessage};
use crate::suppliers::{fetch_puzzles, SequenceRequest};
use crate::websocket::handler::{square_field, ChessWebSocket, TICK};

fn move_fields(msg: &ClientMessage) -> Result<(Square, Square), String> {
    let from = square_field(&msg.move_from, "move_from")?;
    let to = square_field(&msg.move_to, "move_to")?;
    Ok((from, to))
}

fn difficulty_field(msg: &ClientMessage) -> Result<Difficulty, PuzzleError> {
    msg.difficulty
        .as_deref()
        .map(str::parse::<Difficulty>)
        .transpose()
        .map(|d| d.unwrap_or(Difficulty::Easy))
}

impl ChessWebSocket {
    fn puzzle_message(&self, message_type: &str) -> ServerMessage {
        match &self.puzzle {
            Some(solver) => ServerMessage {
                puzzle: Some(PuzzleView::from(solver)),
                ..ServerMessage::new(message_type)
            },
            None => ServerMessage::error("No puzzle open"),
        }
    }

    fn rush_message(&self, message_type: &str) -> ServerMessage {
        ServerMessage {
            rush: Some(RushView::from(&self.rush)),
            puzzle: self.rush.current().map(PuzzleView::from),
            ..ServerMessage::new(message_type)
        }
    }

    /// An explicit id wins; otherwise the catalog puzzle of the requested
    /// difficulty rated closest to the player.
    fn find_puzzle(&self, msg: &ClientMessage) -> Result<Arc<Puzzle>, PuzzleError> {
        let catalog = &self.app_state.catalog;
        if let Some(id) = msg.puzzle_id.as_deref() {
            return catalog
                .get(id)
                .ok_or_else(|| PuzzleError::Unknown(id.to_string()));
        }
        let difficulty = difficulty_field(msg)?;
        let rating = msg.player_rating.unwrap_or(0);
        catalog
            .iter()
            .filter(|p| p.difficulty == difficulty)
            .min_by_key(|p| p.rating.abs_diff(rating))
            .cloned()
            .ok_or_else(|| PuzzleError::Unknown(format!("{} puzzle", difficulty)))
    }

    pub fn handle_puzzle_open(&mut self, msg: ClientMessage, ctx: &mut ws::WebsocketContext<Self>) {
        let puzzle = match self.find_puzzle(&msg) {
            Ok(puzzle) => puzzle,
            Err(e) => return self.send_error(ctx, e),
        };
        info!("Connection {} opened puzzle {}", self.id, puzzle.id);
        Self::cancel_timer(&mut self.puzzle_timer, ctx);
        self.puzzle = Some(PuzzleSolver::new(puzzle, self.app_state.config.flash_secs));
        let message = self.puzzle_message("puzzle");
        self.send(ctx, &message);
    }

    pub fn handle_puzzle_move(&mut self, msg: ClientMessage, ctx: &mut ws::WebsocketContext<Self>) {
        let (from, to) = match move_fields(&msg) {
            Ok(squares) => squares,
            Err(e) => return self.send_error(ctx, e),
        };
        let submitted = match self.puzzle.as_mut() {
            Some(solver) => solver.submit(from, to),
            None => return self.send_error(ctx, "No puzzle open"),
        };
        match submitted {
            Ok(verdict) => {
                if !verdict.correct {
                    self.start_flash_timer(ctx);
                }
                let message = ServerMessage {
                    correct: Some(verdict.correct),
                    last_move: Some(LastMove::from(&verdict.record)),
                    ..self.puzzle_message("puzzle_result")
                };
                self.send(ctx, &message);
            }
            Err(e) => self.send_error(ctx, e),
        }
    }

    fn start_flash_timer(&mut self, ctx: &mut ws::WebsocketContext<Self>) {
        Self::cancel_timer(&mut self.puzzle_timer, ctx);
        self.puzzle_timer = Some(ctx.run_interval(TICK, |act, ctx| act.puzzle_tick(ctx)));
    }

    fn puzzle_tick(&mut self, ctx: &mut ws::WebsocketContext<Self>) {
        let state = self.puzzle.as_mut().map(PuzzleSolver::tick);
        match state {
            Some(SolveState::Incorrect { .. }) => {}
            Some(_) => {
                Self::cancel_timer(&mut self.puzzle_timer, ctx);
                let message = self.puzzle_message("puzzle");
                self.send(ctx, &message);
            }
            None => Self::cancel_timer(&mut self.puzzle_timer, ctx),
        }
    }

    pub fn handle_puzzle_reset(&mut self, ctx: &mut ws::WebsocketContext<Self>) {
        Self::cancel_timer(&mut self.puzzle_timer, ctx);
        if let Some(solver) = self.puzzle.as_mut() {
            solver.reset();
        }
        let message = self.puzzle_message("puzzle");
        self.send(ctx, &message);
    }

    pub fn handle_puzzle_solution(&mut self, ctx: &mut ws::WebsocketContext<Self>) {
        let solution = self.puzzle.as_ref().map(|s| s.solution().to_vec());
        let message = ServerMessage {
            solution,
            ..self.puzzle_message("puzzle_solution")
        };
        self.send(ctx, &message);
    }

    pub fn handle_rush_start(&mut self, msg: ClientMessage, ctx: &mut ws::WebsocketContext<Self>) {
        let difficulty = match difficulty_field(&msg) {
            Ok(difficulty) => difficulty,
            Err(e) => return self.send_error(ctx, e),
        };
        let sequence = SequenceRequest {
            difficulty,
            count: self.app_state.config.rush_count,
            player_rating: msg.player_rating,
        };
        let request = match self.rush.start(sequence) {
            Ok(request) => request,
            Err(e) => return self.send_error(ctx, e),
        };

        let supplier = Arc::clone(&self.app_state.sequence);
        let catalog = Arc::clone(&self.app_state.catalog);
        let pending = self.rush_request.launch(async move {
            fetch_puzzles(supplier.as_ref(), &catalog, request.sequence).await
        });
        let pending = match pending {
            Ok(pending) => pending,
            Err(e) => {
                self.rush.cancel_loading();
                return self.send_error(ctx, e);
            }
        };

        let ticket = request.ticket;
        ctx.spawn(pending.into_actor(self).map(move |result, act, ctx| {
            let result = match result {
                Ok(result) => result,
                Err(_) => return,
            };
            act.rush_request.settle();
            act.rush_loaded(ticket, result, ctx);
        }));

        let message = self.rush_message("rush_state");
        self.send(ctx, &message);
    }

    fn rush_loaded(
        &mut self,
        ticket: Uuid,
        result: Result<Vec<Arc<Puzzle>>, SupplierError>,
        ctx: &mut ws::WebsocketContext<Self>,
    ) {
        match self.rush.finish_loading(ticket, result) {
            Ok(()) => {
                Self::cancel_timer(&mut self.rush_timer, ctx);
                self.rush_timer =
                    Some(ctx.run_interval(TICK, move |act, ctx| act.rush_tick(ticket, ctx)));
                let message = self.rush_message("rush_state");
                self.send(ctx, &message);
            }
            Err(RushError::StaleResponse) => debug!("Ignoring rush response {}", ticket),
            Err(e) => {
                let message = ServerMessage {
                    error: Some(e.to_string()),
                    ..self.rush_message("rush_failed")
                };
                self.send(ctx, &message);
            }
        }
    }

    fn rush_tick(&mut self, ticket: Uuid, ctx: &mut ws::WebsocketContext<Self>) {
        match self.rush.tick(ticket) {
            RushTick::Stale | RushTick::Idle => {}
            RushTick::Running { .. } => {
                let message = ServerMessage {
                    rush: Some(RushView::from(&self.rush)),
                    ..ServerMessage::new("rush_clock")
                };
                self.send(ctx, &message);
            }
            RushTick::TimeUp => {
                Self::cancel_timer(&mut self.rush_timer, ctx);
                let message = self.rush_message("rush_finished");
                self.send(ctx, &message);
            }
        }
    }

    pub fn handle_rush_move(&mut self, msg: ClientMessage, ctx: &mut ws::WebsocketContext<Self>) {
        let (from, to) = match move_fields(&msg) {
            Ok(squares) => squares,
            Err(e) => return self.send_error(ctx, e),
        };
        match self.rush.submit(from, to) {
            Ok(answer) => {
                let message_type = if answer.finished {
                    Self::cancel_timer(&mut self.rush_timer, ctx);
                    "rush_finished"
                } else {
                    "rush_result"
                };
                let message = ServerMessage {
                    correct: Some(answer.verdict.correct),
                    last_move: Some(LastMove::from(&answer.verdict.record)),
                    ..self.rush_message(message_type)
                };
                self.send(ctx, &message);
            }
            Err(e) => self.send_error(ctx, e),
        }
    }

    pub fn handle_rush_restart(&mut self, ctx: &mut ws::WebsocketContext<Self>) {
        self.rush_request.cancel();
        Self::cancel_timer(&mut self.rush_timer, ctx);
        self.rush.restart();
        let message = self.rush_message("rush_state");
        self.send(ctx, &message);
    }
}
