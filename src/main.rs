mod error;
mod handlers;
mod llm;
mod middleware;
mod routes;
mod settings;
mod state;
mod translate;

use anyhow::Result;
use std::net::SocketAddr;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use llm::StatelessLLMFactory;
use settings::Config;
use state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("translate_backend=debug,tower_http=debug")),
        )
        .init();

    // CONFIG_PATH may name a YAML file (extension optional); defaults apply when it is absent
    let config_path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "conf".to_string());
    let config = Config::load(&config_path).map_err(|e| {
        error!("Failed to load configuration from {}: {}", config_path, e);
        e
    })?;
    info!("Loaded configuration (source: {})", config_path);

    let api_key = settings::load_api_key().map_err(|e| {
        error!("{}", e);
        e
    })?;

    let llm = StatelessLLMFactory::create_llm(&config.llm, api_key)?;
    let app_state = AppState::new(config.clone(), llm);

    app_state
        .rate_limiter
        .clone()
        .spawn_cleanup(Duration::from_secs(config.rate_limit.cleanup_interval_secs.max(1)));

    let app = routes::create_router(app_state);

    let listener =
        tokio::net::TcpListener::bind((config.server.host.as_str(), config.server.port)).await?;
    info!("Starting server on {}", listener.local_addr()?);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
