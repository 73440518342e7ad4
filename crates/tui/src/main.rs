mod app;

use anyhow::{Context, Result};
use std::{
    fs::{self, OpenOptions},
    sync::Mutex,
};

use gully_core::{
    config::{self, AppConfig},
    roster::PlayerRegistry,
    save::Store,
};
use tracing::info;
use tracing_subscriber::{prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = config::ensure_default_config()?;
    let config = AppConfig::load()?;
    init_logging(&config)?;
    info!(
        config = %config_path.display(),
        data_dir = %config.data_dir.display(),
        overs = config.overs_per_innings,
        "Starting gully scorer"
    );

    let store = Store::new(config.data_dir.clone());
    let registry = match store.load_players() {
        Some(players) if !players.is_empty() => PlayerRegistry::new(players),
        _ => {
            info!("No saved players, using the default squad");
            PlayerRegistry::with_defaults()
        }
    };

    let mut app = app::GullyApp::new(config, registry, store);
    app.run().await
}

fn init_logging(config: &AppConfig) -> Result<()> {
    let log_dir = config.logs_dir();
    fs::create_dir_all(&log_dir)
        .with_context(|| format!("failed to create {}", log_dir.display()))?;
    let log_path = log_dir.join("gully.log");
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("failed to open {}", log_path.display()))?;

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
