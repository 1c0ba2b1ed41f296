use actix_web::{web, App, HttpServer};
use clap::Parser;
use log::info;

use chess_rush::config::Config;
use chess_rush::models::AppState;
use chess_rush::routes::configure_routes;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = Config::parse();
    let bind = config.bind.clone();
    let static_dir = config.static_dir.to_string_lossy().into_owned();
    info!("Starting chess rush server at http://{}", bind);

    let app_state = web::Data::new(AppState::new(config));

    HttpServer::new(move || {
        let static_dir = static_dir.clone();
        App::new()
            .app_data(app_state.clone())
            .configure(move |cfg| configure_routes(cfg, &static_dir))
    })
    .bind(bind)?
    .run()
    .await
}
