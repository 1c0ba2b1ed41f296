use actix_files as fs;
use actix_web::{web, HttpResponse, Responder};

use crate::models::AppState;

/// HTTP handler for the index page
pub async fn index() -> impl Responder {
    HttpResponse::Ok().body("Chess Rush")
}

/// The bot ladder and its unlocked frontier, for clients that render the
/// tier list before opening a socket.
pub async fn tiers(app_state: web::Data<AppState>) -> impl Responder {
    let progression =
        crate::game::bots::load_progression(app_state.tier_store.as_ref(), &app_state.ladder);
    HttpResponse::Ok().json(serde_json::json!({
        "tiers": app_state.ladder.tiers(),
        "unlocked_rating": progression.unlocked_rating,
    }))
}

/// Configure the HTTP routes
pub fn configure_routes(cfg: &mut web::ServiceConfig, static_dir: &str) {
    cfg.service(web::resource("/ws").route(web::get().to(crate::websocket::ws_index)))
        .service(web::resource("/").route(web::get().to(index)))
        .service(web::resource("/tiers").route(web::get().to(tiers)))
        .service(fs::Files::new("/static", static_dir).show_files_listing());
}
