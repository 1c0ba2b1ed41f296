use actix::prelude::*;
use actix_web::{web, Error, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use log::{debug, info, warn};
use std::time::Duration;
use uuid::Uuid;

use crate::game::board::{Color, Square};
use crate::game::bots::{load_progression, Opponent, TierProgression};
use crate::game::puzzle::PuzzleSolver;
use crate::game::rush::RushSession;
use crate::game::session::GameSession;
use crate::models::*;
use crate::suppliers::{CustomBot, InFlight};

/// Interval of every clock in the connection.
pub const TICK: Duration = Duration::from_secs(1);

/// WebSocket actor for one player. Owns at most one game, one puzzle and
/// one rush at a time.
pub struct ChessWebSocket {
    pub id: String,
    pub app_state: web::Data<AppState>,
    pub(crate) game: Option<GameSession>,
    pub(crate) opponent: Option<Opponent>,
    pub(crate) progression: TierProgression,
    pub(crate) custom_bots: Vec<CustomBot>,
    pub(crate) puzzle: Option<PuzzleSolver>,
    pub(crate) rush: RushSession,
    pub(crate) game_timer: Option<SpawnHandle>,
    pub(crate) puzzle_timer: Option<SpawnHandle>,
    pub(crate) rush_timer: Option<SpawnHandle>,
    pub(crate) rush_request: InFlight,
    pub(crate) analysis_request: InFlight,
    pub(crate) bot_request: InFlight,
}

impl ChessWebSocket {
    pub fn new(app_state: web::Data<AppState>) -> Self {
        let progression = load_progression(app_state.tier_store.as_ref(), &app_state.ladder);
        let rush = RushSession::new(app_state.config.rush_secs);
        Self {
            id: Uuid::new_v4().to_string(),
            app_state,
            game: None,
            opponent: None,
            progression,
            custom_bots: Vec::new(),
            puzzle: None,
            rush,
            game_timer: None,
            puzzle_timer: None,
            rush_timer: None,
            rush_request: InFlight::sequence(),
            analysis_request: InFlight::analysis(),
            bot_request: InFlight::bot_creation(),
        }
    }

    pub(crate) fn send(&self, ctx: &mut ws::WebsocketContext<Self>, message: &ServerMessage) {
        match serde_json::to_string(message) {
            Ok(text) => ctx.text(text),
            Err(e) => warn!("Failed to serialize {} message: {}", message.message_type, e),
        }
    }

    pub(crate) fn send_error(&self, ctx: &mut ws::WebsocketContext<Self>, error: impl ToString) {
        let message = ServerMessage::error(error);
        debug!("Connection {}: {:?}", self.id, message.error);
        self.send(ctx, &message);
    }

    pub(crate) fn cancel_timer(
        timer: &mut Option<SpawnHandle>,
        ctx: &mut ws::WebsocketContext<Self>,
    ) {
        if let Some(handle) = timer.take() {
            ctx.cancel_future(handle);
        }
    }

    pub fn handle_message(&mut self, msg: ClientMessage, ctx: &mut ws::WebsocketContext<Self>) {
        match msg.message_type.as_str() {
            "new_game" => self.handle_new_game(msg, ctx),
            "select" => self.handle_select(msg, ctx),
            "move" => self.handle_move(msg, ctx),
            "resign" => self.handle_resign(msg, ctx),
            "pause" => self.handle_pause(ctx),
            "resume" => self.handle_resume(ctx),
            "state" => self.handle_state(ctx),
            "analyze" => self.handle_analyze(ctx),
            "create_bot" => self.handle_create_bot(msg, ctx),
            "bot_tiers" => self.handle_bot_tiers(ctx),
            "puzzle_open" => self.handle_puzzle_open(msg, ctx),
            "puzzle_move" => self.handle_puzzle_move(msg, ctx),
            "puzzle_reset" => self.handle_puzzle_reset(ctx),
            "puzzle_solution" => self.handle_puzzle_solution(ctx),
            "rush_start" => self.handle_rush_start(msg, ctx),
            "rush_move" => self.handle_rush_move(msg, ctx),
            "rush_restart" => self.handle_rush_restart(ctx),
            other => {
                warn!("Unknown message type: {}", other);
                self.send_error(ctx, format!("Unknown message type: {}", other));
            }
        }
    }

    /// Tell the player's other connections about a newly unlocked tier.
    pub(crate) fn broadcast_unlock(&self, unlocked_rating: u32) {
        let sessions = match self.app_state.sessions.lock() {
            Ok(sessions) => sessions,
            Err(_) => {
                warn!("Session registry lock poisoned");
                return;
            }
        };
        for (id, addr) in sessions.iter() {
            if id != &self.id {
                addr.do_send(TierUnlocked { unlocked_rating });
            }
        }
    }
}

/// Parse a square field of a client message.
pub(crate) fn square_field(value: &Option<String>, field: &str) -> Result<Square, String> {
    let text = value
        .as_deref()
        .ok_or_else(|| format!("Missing {}", field))?;
    text.parse().map_err(|e| format!("{}", e))
}

pub(crate) fn color_field(value: &Option<String>) -> Result<Option<Color>, String> {
    value
        .as_deref()
        .map(str::parse::<Color>)
        .transpose()
        .map_err(|e| e.to_string())
}

impl Actor for ChessWebSocket {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        let addr = ctx.address();
        match self.app_state.sessions.lock() {
            Ok(mut sessions) => {
                sessions.insert(self.id.clone(), addr);
                info!("WebSocket connection started: {}", self.id);
                info!("Total active sessions: {}", sessions.len());
            }
            Err(_) => warn!("Session registry lock poisoned"),
        }
    }

    fn stopping(&mut self, ctx: &mut Self::Context) -> Running {
        self.rush_request.cancel();
        self.analysis_request.cancel();
        self.bot_request.cancel();
        Self::cancel_timer(&mut self.game_timer, ctx);
        Self::cancel_timer(&mut self.puzzle_timer, ctx);
        Self::cancel_timer(&mut self.rush_timer, ctx);

        if let Ok(mut sessions) = self.app_state.sessions.lock() {
            sessions.remove(&self.id);
            info!("WebSocket connection closed: {}", self.id);
            info!("Total active sessions: {}", sessions.len());
        }
        Running::Stop
    }
}

impl Handler<TierUnlocked> for ChessWebSocket {
    type Result = ();

    fn handle(&mut self, msg: TierUnlocked, ctx: &mut Self::Context) {
        if msg.unlocked_rating > self.progression.unlocked_rating {
            self.progression = TierProgression::new(msg.unlocked_rating);
            let message = self.tiers_message("tier_unlocked");
            self.send(ctx, &message);
        }
    }
}

impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for ChessWebSocket {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Ping(msg)) => ctx.pong(&msg),
            Ok(ws::Message::Pong(_)) => {}
            Ok(ws::Message::Text(text)) => {
                debug!("Received text message: {}", text);
                match serde_json::from_str::<ClientMessage>(text.as_ref()) {
                    Ok(client_msg) => self.handle_message(client_msg, ctx),
                    Err(e) => {
                        warn!("Error parsing client message: {}", e);
                        self.send_error(ctx, format!("Invalid message format: {}", e));
                    }
                }
            }
            Ok(ws::Message::Binary(_)) => {
                warn!("Binary messages are not supported");
                self.send_error(ctx, "Binary messages are not supported");
            }
            Ok(ws::Message::Close(reason)) => {
                info!("Connection closed: {:?}", reason);
                ctx.close(reason);
                ctx.stop();
            }
            _ => ctx.stop(),
        }
    }
}

/// WebSocket connection handler
pub async fn ws_index(
    req: HttpRequest,
    stream: web::Payload,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let ws = ChessWebSocket::new(app_state);
    info!("New WebSocket connection {}", ws.id);
    ws::start(ws, &req, stream)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn square_fields() {
        assert_eq!(
            square_field(&Some("e2".to_string()), "move_from"),
            Ok("e2".parse().unwrap())
        );
        assert_eq!(
            square_field(&None, "move_from"),
            Err("Missing move_from".to_string())
        );
        assert!(square_field(&Some("z9".to_string()), "move_to").is_err());
    }

    #[test]
    fn color_fields() {
        assert_eq!(color_field(&None), Ok(None));
        assert_eq!(color_field(&Some("Black".to_string())), Ok(Some(Color::Black)));
        assert!(color_field(&Some("green".to_string())).is_err());
    }
}
