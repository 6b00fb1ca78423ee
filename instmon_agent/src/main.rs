//! Entry point for instmon_agent. Parses args, starts the sampler and serves the API.

use std::env;
use std::net::SocketAddr;

use anyhow::Context;
use instmon_agent::api::router;
use instmon_agent::config::{parse_args, AgentConfig};
use instmon_agent::sampler::spawn_sampler;
use instmon_agent::state::AppState;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = match parse_args(env::args()) {
        Ok(v) => v,
        Err(msg) => {
            eprintln!("{msg}");
            return Ok(());
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AgentConfig::from_env(args);
    let state = AppState::new(&config);
    let _sampler = spawn_sampler(state.clone(), config.sample_period);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(
        instance = %config.instance_id,
        period_secs = config.sample_period.as_secs(),
        auth = config.auth_token.is_some(),
        "instmon agent listening on http://{addr}"
    );
    axum::serve(listener, router(state)).await?;
    Ok(())
}
