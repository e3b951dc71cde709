mod app;
mod state;

use anyhow::Result;
use std::{
    fs::{self, OpenOptions},
    sync::Mutex,
};

use gamescope_core::{
    config::{self, AppConfig},
    CatalogClient, FavoritesStore, FileStore,
};
use tracing::info;
use tracing_subscriber::{prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    init_logging()?;

    config::ensure_default_config()?;
    let config = AppConfig::load()?;
    config.require_api_key()?;

    let client = CatalogClient::from_config(&config)?;
    let storage_root = config.storage_root();
    info!(base_url = client.base_url(), storage = %storage_root.display(), "starting GameScope");
    let favorites = FavoritesStore::new(FileStore::new(storage_root));

    let mut app = app::GameScopeApp::new(client, favorites, config);
    app.run().await
}

/// The terminal owns stdout, so events only go to `logs/gamescope.log`.
fn init_logging() -> Result<()> {
    let log_dir = std::env::current_dir()?.join("logs");
    fs::create_dir_all(&log_dir)?;
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("gamescope.log"))?;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let file_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_ansi(false)
        .compact()
        .with_writer(Mutex::new(log_file));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .init();

    Ok(())
}
