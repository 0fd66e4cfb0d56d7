use std::io;

use actix_web::{App, HttpServer, web};
use log::info;

use pow_ledger::api::{self, AppState};
use pow_ledger::config::Config;

#[actix_web::main]
async fn main() -> io::Result<()> {
    // reads .env before the logger so RUST_LOG can live there
    let config = Config::from_env().map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    env_logger::init();

    info!(
        "Starting ledger API at http://{}:{} (difficulty base={} reduced={}, oracle={})",
        config.host,
        config.port,
        config.policy.base(),
        config.policy.reduced(),
        config.oracle_command.as_deref().unwrap_or("none"),
    );

    let state = web::Data::new(AppState::from_config(&config));

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .configure(api::init_routes)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
