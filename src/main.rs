use anyhow::Context;
use tracing_subscriber::EnvFilter;

use trace_search::api;
use trace_search::config::Config;
use trace_search::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env();
    tracing::info!("GitHub API: {}", config.github.base_url);
    tracing::info!("Stack Exchange API: {}", config.stackoverflow.base_url);
    if config.github.token.is_none() {
        tracing::warn!("GITHUB_API_TOKEN not set, issue search will be heavily rate limited");
    }

    let state = AppState::new(&config)?;
    let app = api::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
