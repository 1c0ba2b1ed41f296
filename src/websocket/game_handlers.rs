use actix::prelude::*;
use actix_web_actors::ws;
use log::{debug, info, warn};
use std::sync::Arc;
use uuid::Uuid;

use crate::game::board::Color;
use crate::game::bots::{record_and_persist, Opponent};
use crate::game::outcome::Outcome;
use crate::game::session::{Click, GameSession, SessionTick};
use crate::models::messages::{ClientMessage, LastMove, ServerMessage};
use crate::suppliers::{fetch_analysis, fetch_bot, BotRequest};
use crate::websocket::handler::{color_field, square_field, ChessWebSocket, TICK};

/// Who resigns. In a bot game only the human can, whatever the client
/// claims; otherwise the named side or the side on turn.
fn resigning_side(
    requested: Option<Color>,
    opponent: Option<&Opponent>,
    turn: Color,
) -> Result<Color, String> {
    match (opponent, requested) {
        (Some(opponent), Some(color)) if color != opponent.human_color => Err(format!(
            "Cannot resign for {} while playing {}",
            opponent.name, opponent.human_color
        )),
        (Some(opponent), _) => Ok(opponent.human_color),
        (None, requested) => Ok(requested.unwrap_or(turn)),
    }
}

impl ChessWebSocket {
    /// Full view of the current game.
    pub(crate) fn game_message(&self, message_type: &str) -> ServerMessage {
        let game = match &self.game {
            Some(game) => game,
            None => return ServerMessage::error("No game in progress"),
        };
        let clocks = game.clocks();
        ServerMessage {
            game_id: Some(game.id().to_string()),
            fen: Some(game.board().to_fen(game.turn())),
            turn: Some(game.turn().to_string()),
            selected: game.selection().map(|s| s.to_string()),
            available_moves: game
                .selection()
                .map(|_| game.selection_targets().iter().map(ToString::to_string).collect()),
            last_move: game.history().last().map(LastMove::from),
            game_status: Some(game.status()),
            outcome: game.outcome().map(|o| o.reason().to_string()),
            white_time_secs: clocks.remaining(Color::White),
            black_time_secs: clocks.remaining(Color::Black),
            increment_secs: Some(game.config().time_control.increment_secs),
            active_color: clocks.running().map(|c| c.to_string()),
            paused: Some(game.is_paused()),
            history: Some(game.san_moves()),
            opponent: self.opponent.clone(),
            ..ServerMessage::new(message_type)
        }
    }

    pub(crate) fn tiers_message(&self, message_type: &str) -> ServerMessage {
        ServerMessage {
            tiers: Some(self.app_state.ladder.tiers().to_vec()),
            unlocked_rating: Some(self.progression.unlocked_rating),
            ..ServerMessage::new(message_type)
        }
    }

    fn pick_opponent(&self, msg: &ClientMessage) -> Result<Option<Opponent>, String> {
        let human_color = color_field(&msg.color)?.unwrap_or(Color::White);

        if let Some(name) = msg.bot_name.as_deref() {
            if let Some(bot) = self
                .custom_bots
                .iter()
                .find(|b| b.name.eq_ignore_ascii_case(name))
            {
                return Ok(Some(Opponent {
                    name: bot.name.clone(),
                    rating: bot.rating,
                    human_color,
                }));
            }
            if msg.bot_rating.is_none() {
                return Err(format!("Unknown bot: {}", name));
            }
        }

        let rating = match msg.bot_rating {
            Some(rating) => rating,
            None => return Ok(None),
        };
        let ladder = &self.app_state.ladder;
        let tier = ladder
            .get(rating)
            .ok_or_else(|| format!("No bot tier rated {}", rating))?;
        if !ladder
            .unlocked(self.progression.unlocked_rating)
            .any(|t| t.rating == tier.rating)
        {
            return Err(format!("{} ({}) is still locked", tier.name, tier.rating));
        }
        Ok(Some(Opponent {
            name: tier.name.clone(),
            rating: tier.rating,
            human_color,
        }))
    }

    pub fn handle_new_game(&mut self, msg: ClientMessage, ctx: &mut ws::WebsocketContext<Self>) {
        let opponent = match self.pick_opponent(&msg) {
            Ok(opponent) => opponent,
            Err(e) => return self.send_error(ctx, e),
        };
        let config = &self.app_state.config;
        let time_control = match msg.start_time_minutes {
            Some(minutes) => config.time_control_with(minutes, msg.increment_seconds.unwrap_or(0)),
            None => config.time_control(),
        };
        let session = GameSession::new(config.session_config(time_control));
        info!(
            "Connection {} started game {} against {}",
            self.id,
            session.id(),
            opponent.as_ref().map(|o| o.name.as_str()).unwrap_or("a human")
        );

        // Whatever was in flight for the old game no longer applies.
        self.analysis_request.cancel();
        self.game = Some(session);
        self.opponent = opponent;
        self.start_game_timer(ctx);

        let message = self.game_message("game_created");
        self.send(ctx, &message);
    }

    fn start_game_timer(&mut self, ctx: &mut ws::WebsocketContext<Self>) {
        Self::cancel_timer(&mut self.game_timer, ctx);
        let target = match &self.game {
            Some(game) => game.id(),
            None => return,
        };
        self.game_timer = Some(ctx.run_interval(TICK, move |act, ctx| act.game_tick(target, ctx)));
    }

    fn game_tick(&mut self, target: Uuid, ctx: &mut ws::WebsocketContext<Self>) {
        let tick = match self.game.as_mut() {
            Some(game) => game.tick(target),
            None => SessionTick::Stale,
        };
        match tick {
            SessionTick::Stale | SessionTick::Idle => {}
            SessionTick::Counting { .. } => {
                let message = self.game_message("clock");
                self.send(ctx, &message);
            }
            SessionTick::Expired(outcome) => self.game_over(outcome, ctx),
        }
    }

    /// Announce the outcome and fold it into the bot ladder.
    fn game_over(&mut self, outcome: Outcome, ctx: &mut ws::WebsocketContext<Self>) {
        Self::cancel_timer(&mut self.game_timer, ctx);
        let message = self.game_message("game_over");
        self.send(ctx, &message);

        let opponent = match self.opponent.as_ref() {
            Some(opponent) => opponent,
            None => return,
        };
        let unlocked = record_and_persist(
            self.app_state.tier_store.as_ref(),
            &self.app_state.ladder,
            &mut self.progression,
            outcome,
            opponent,
        );
        if let Some(rating) = unlocked {
            let message = self.tiers_message("tier_unlocked");
            self.send(ctx, &message);
            self.broadcast_unlock(rating);
        }
    }

    pub fn handle_select(&mut self, msg: ClientMessage, ctx: &mut ws::WebsocketContext<Self>) {
        let square = match square_field(&msg.square, "square") {
            Ok(square) => square,
            Err(e) => return self.send_error(ctx, e),
        };
        let click = match self.game.as_mut() {
            Some(game) => game.click(square),
            None => return self.send_error(ctx, "No game in progress"),
        };
        match click {
            Ok(Click::Moved { outcome, .. }) => {
                let message = self.game_message("move_made");
                self.send(ctx, &message);
                if let Some(outcome) = outcome {
                    self.game_over(outcome, ctx);
                }
            }
            Ok(Click::Rejected { from, to }) => {
                debug!("Rejected {}{} on connection {}", from, to, self.id);
                let message = self.game_message("move_rejected");
                self.send(ctx, &message);
            }
            Ok(_) => {
                let message = self.game_message("selection");
                self.send(ctx, &message);
            }
            Err(e) => self.send_error(ctx, e),
        }
    }

    pub fn handle_move(&mut self, msg: ClientMessage, ctx: &mut ws::WebsocketContext<Self>) {
        let squares = square_field(&msg.move_from, "move_from")
            .and_then(|from| Ok((from, square_field(&msg.move_to, "move_to")?)));
        let (from, to) = match squares {
            Ok(squares) => squares,
            Err(e) => return self.send_error(ctx, e),
        };
        let played = match self.game.as_mut() {
            Some(game) => game.play(from, to),
            None => return self.send_error(ctx, "No game in progress"),
        };
        match played {
            Ok((_, outcome)) => {
                let message = self.game_message("move_made");
                self.send(ctx, &message);
                if let Some(outcome) = outcome {
                    self.game_over(outcome, ctx);
                }
            }
            Err(e) => self.send_error(ctx, e),
        }
    }

    pub fn handle_resign(&mut self, msg: ClientMessage, ctx: &mut ws::WebsocketContext<Self>) {
        let requested = match color_field(&msg.color) {
            Ok(color) => color,
            Err(e) => return self.send_error(ctx, e),
        };
        let turn = match &self.game {
            Some(game) => game.turn(),
            None => return self.send_error(ctx, "No game in progress"),
        };
        let loser = match resigning_side(requested, self.opponent.as_ref(), turn) {
            Ok(loser) => loser,
            Err(e) => return self.send_error(ctx, e),
        };
        let resigned = match self.game.as_mut() {
            Some(game) => game.resign(loser),
            None => return self.send_error(ctx, "No game in progress"),
        };
        match resigned {
            Ok(outcome) => self.game_over(outcome, ctx),
            Err(e) => self.send_error(ctx, e),
        }
    }

    pub fn handle_pause(&mut self, ctx: &mut ws::WebsocketContext<Self>) {
        match self.game.as_mut() {
            Some(game) => game.pause(),
            None => return self.send_error(ctx, "No game in progress"),
        }
        let message = self.game_message("state");
        self.send(ctx, &message);
    }

    pub fn handle_resume(&mut self, ctx: &mut ws::WebsocketContext<Self>) {
        match self.game.as_mut() {
            Some(game) => game.resume(),
            None => return self.send_error(ctx, "No game in progress"),
        }
        let message = self.game_message("state");
        self.send(ctx, &message);
    }

    pub fn handle_state(&mut self, ctx: &mut ws::WebsocketContext<Self>) {
        let message = self.game_message("state");
        self.send(ctx, &message);
    }

    pub fn handle_bot_tiers(&mut self, ctx: &mut ws::WebsocketContext<Self>) {
        let message = ServerMessage {
            opponent: self.opponent.clone(),
            ..self.tiers_message("bot_tiers")
        };
        self.send(ctx, &message);
    }

    pub fn handle_analyze(&mut self, ctx: &mut ws::WebsocketContext<Self>) {
        let (game_id, moves) = match &self.game {
            Some(game) => (game.id(), game.san_moves()),
            None => return self.send_error(ctx, "No game in progress"),
        };
        let supplier = Arc::clone(&self.app_state.analysis);
        let request = self
            .analysis_request
            .launch(async move { fetch_analysis(supplier.as_ref(), moves).await });
        let request = match request {
            Ok(request) => request,
            Err(e) => return self.send_error(ctx, e),
        };

        ctx.spawn(request.into_actor(self).map(move |result, act, ctx| {
            // Aborted: the request was cancelled and may already be replaced.
            let result = match result {
                Ok(result) => result,
                Err(_) => return,
            };
            act.analysis_request.settle();
            if act.game.as_ref().map(GameSession::id) != Some(game_id) {
                debug!("Dropping analysis for finished-with game {}", game_id);
                return;
            }
            match result {
                Ok(analysis) => {
                    let message = ServerMessage {
                        game_id: Some(game_id.to_string()),
                        analysis: Some(analysis),
                        ..ServerMessage::new("analysis")
                    };
                    act.send(ctx, &message);
                }
                Err(e) => {
                    warn!("Analysis of game {} failed: {}", game_id, e);
                    act.send_error(ctx, e);
                }
            }
        }));
    }

    pub fn handle_create_bot(&mut self, msg: ClientMessage, ctx: &mut ws::WebsocketContext<Self>) {
        let request = BotRequest {
            name: msg.bot_name.unwrap_or_default(),
            style_prompt: msg.style_prompt.unwrap_or_default(),
        };
        let supplier = Arc::clone(&self.app_state.bot_creation);
        let pending = self
            .bot_request
            .launch(async move { fetch_bot(supplier.as_ref(), request).await });
        let pending = match pending {
            Ok(pending) => pending,
            Err(e) => return self.send_error(ctx, e),
        };

        ctx.spawn(pending.into_actor(self).map(|result, act, ctx| {
            let result = match result {
                Ok(result) => result,
                Err(_) => return,
            };
            act.bot_request.settle();
            match result {
                Ok(bot) => {
                    info!("Created custom bot {} ({})", bot.name, bot.rating);
                    act.custom_bots.retain(|b| !b.name.eq_ignore_ascii_case(&bot.name));
                    act.custom_bots.push(bot.clone());
                    let message = ServerMessage {
                        bot: Some(bot),
                        ..ServerMessage::new("bot_created")
                    };
                    act.send(ctx, &message);
                }
                Err(e) => {
                    warn!("Bot creation failed: {}", e);
                    act.send_error(ctx, e);
                }
            }
        }));
    }
}
