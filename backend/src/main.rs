mod config;
mod estaticos;
mod ledger;
mod services;
mod sink;
mod state;

use actix_web::{web, App, HttpServer};
use env_logger::Env;
use log::info;
use std::fs;

use crate::config::Config;
use crate::ledger::Ledger;
use crate::state::AppState;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let config = Config::from_env().map_err(std::io::Error::other)?;
    fs::create_dir_all(&config.fotos_dir)?;

    let sink = sink::desde_config(&config).map_err(std::io::Error::other)?;
    let state = web::Data::new(AppState {
        fotos_dir: config.fotos_dir.clone().into(),
        ledger: Ledger::new(&config.ledger_path),
        sink,
    });

    let puerto = config.puerto;
    info!("Servidor de altas escuchando en 0.0.0.0:{puerto} (sink: {})", config.sink);

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .service(services::registro::configure_routes())
            .default_service(web::route().to(estaticos::serve_embedded))
    })
    .bind(("0.0.0.0", puerto))?
    .run()
    .await
}
