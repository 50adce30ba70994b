#![forbid(unsafe_code)]

use std::sync::Arc;

use anyhow::Result;
use tracing::info;

mod config;
mod db;
mod registry;
mod utils;
mod web;

use config::Config;
use registry::Registry;
use web::WebServer;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Arc::new(Config::load()?);
    utils::logging::init_tracing(&config.logging);
    info!("staff registry starting up");

    let db_manager = Arc::new(db::DatabaseManager::new(&config.database).await?);
    db_manager.migrate().await?;

    let registry = Arc::new(Registry::new(db_manager));

    let web_server = WebServer::new(config.clone(), registry);
    web_server.start().await
}
