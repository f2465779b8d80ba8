//! Chatbot conversation API
//!
//! Persists chatbot conversations in SQLite and forwards questions to an external
//! chatbot service.

use anyhow::Context;
use chatbot_conversation_api::config::Settings;
use chatbot_conversation_api::infrastructure::database;
use log::info;
use tokio::runtime::{Builder, Runtime};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    // initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                EnvFilter::new("info,chatbot_conversation_api=debug,tower_http=debug")
            }),
        )
        .init();

    let settings = Settings::from_env().context("invalid configuration")?;

    let runtime: Runtime = Builder::new_multi_thread().enable_all().build()?;
    runtime.block_on(web_server_task(settings))
}

async fn web_server_task(settings: Settings) -> anyhow::Result<()> {
    let pool = database::connect(&settings.database)
        .await
        .context("cannot open database")?;

    let cors_allowed_origins = settings.server.cors_allowed_origins.clone();
    let bind_address = settings.server.bind_address;

    let provider = chatbot_conversation_api::services(settings, pool.clone())
        .build_provider()
        .map_err(|e| anyhow::anyhow!("invalid service registrations: {e:?}"))?;

    let app = chatbot_conversation_api::app(provider, &cors_allowed_origins);

    let listener = tokio::net::TcpListener::bind(bind_address)
        .await
        .with_context(|| format!("cannot bind {bind_address}"))?;
    info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutting down...");
    pool.close().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("cannot listen for shutdown signal: {e}");
    }
}
