//! `gemlink` binary: serves the completions endpoint until Ctrl-C.

use std::sync::Arc;

use anyhow::Context;
use gemlink_core::Translator;
use gemlink_core::config::{self, API_KEY_ENV, GemlinkConfig, SecretString};
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Environment variable pointing at an optional YAML/JSON config file.
const CONFIG_ENV: &str = "GEMLINK_CONFIG";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = load_config()?;
    match &config.default_api_key {
        Some(key) => info!(key = %key.partial_redact(), "Default API key configured"),
        None => warn!("No default API key; requests must carry a bearer token"),
    }

    let translator = Arc::new(
        Translator::from_config(&config).context("Failed to build upstream client")?,
    );

    let bind = config.server.bind_address();
    let listener = TcpListener::bind(&bind)
        .await
        .with_context(|| format!("Failed to bind {bind}"))?;

    gemlink_server::serve(listener, translator, shutdown_signal()).await
}

/// Config file when `GEMLINK_CONFIG` is set, otherwise environment only.
fn load_config() -> anyhow::Result<GemlinkConfig> {
    let env = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());

    let Some(path) = env(CONFIG_ENV) else {
        return Ok(GemlinkConfig::from_env()?);
    };

    let mut config =
        config::load(&path).with_context(|| format!("Failed to load config from {path}"))?;
    if config.default_api_key.is_none() {
        config.default_api_key = env(API_KEY_ENV).map(SecretString::new);
    }
    config.apply_env_overrides(env)?;
    info!(path = %path, "Loaded configuration file");
    Ok(config)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}
