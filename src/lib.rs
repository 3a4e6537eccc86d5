pub mod commands;
pub mod config;
pub mod doc_processor;
pub mod engine;
pub mod history;
pub mod llm;
pub mod page;
pub mod prompt;
pub mod server;
pub mod session;
pub mod state;

use anyhow::Context;
use clap::Parser;
use config::CliArgs;
use state::AppState;
use std::sync::Arc;

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let args = CliArgs::parse();
    let settings = config::load_settings(&args).context("failed to load settings")?;
    server::init_tracing(&settings.log_filter);

    let bind_addr = settings.bind_addr.clone();
    tracing::info!(
        persona = %settings.persona,
        model = %settings.default_model,
        max_history_turns = settings.max_history_turns,
        "starting doc-chat"
    );

    let app = server::router(Arc::new(AppState::new(settings)));

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    tracing::info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(server::shutdown_signal())
        .await?;

    Ok(())
}
