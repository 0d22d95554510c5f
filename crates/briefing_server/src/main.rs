use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use briefing_core::EnvCredentials;
use briefing_logging::{briefing_error, briefing_info, LogDestination};
use briefing_server::{router, AppState, ServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = match std::env::args_os().nth(1) {
        Some(path) => ServerConfig::load(Path::new(&path))?,
        None => ServerConfig::default(),
    };

    let destination = match &config.log_file {
        Some(path) => LogDestination::Both(path.clone()),
        None => LogDestination::Terminal,
    };
    briefing_logging::initialize(destination, briefing_logging::parse_level(&config.log_level));

    let state = AppState::from_config(&config, Arc::new(EnvCredentials))?;

    let listener = tokio::net::TcpListener::bind(&config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;
    briefing_info!("Briefing server listening on {}", listener.local_addr()?);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    briefing_info!("Briefing server shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        briefing_error!("Failed to install ctrl-c handler: {}", err);
        std::future::pending::<()>().await;
    }
    briefing_info!("Received shutdown signal");
}
