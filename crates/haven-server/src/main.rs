mod configuration;
mod error;
mod routes;
mod state;

use std::sync::Arc;

use anyhow::Context;
use haven::{agent::Agent, builtin::default_registry, providers::factory, service::AgentService};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing for logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = configuration::Settings::new()?;
    let addr = settings.server.socket_addr()?;
    let options = settings.agent.options();

    // The registry is fixed from here on and shared by every run
    let registry = Arc::new(default_registry()?);
    info!(tools = registry.len(), "tool registry ready");

    let provider_type = settings.provider.provider_type();
    let provider = factory::get_provider(settings.provider.into_config())
        .context("failed to create model provider")?;
    info!(provider = ?provider_type, "model provider ready");

    let agent = Agent::with_options(provider, registry, options)?;
    let state = state::AppState::new(AgentService::new(agent));
    let app = routes::configure(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
