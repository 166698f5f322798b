use tokio_util::sync::CancellationToken;
use anyhow::{Context, Result};
use registry_client::config::Config;
use registry_client::{run_until_signal, Agent, RegistryClient};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("registry_client=info"))
        )
        .init();

    tracing::info!("Starting registry-client");

    // Load config, built-in defaults when no path is given
    let config = match std::env::args().nth(1) {
        Some(config_path) => {
            let config = Config::load(&config_path)
                .with_context(|| format!("Failed to load config from {}", config_path))?;
            tracing::info!("Loaded config from {}", config_path);
            config
        }
        None => {
            tracing::info!("No config file given, using defaults");
            Config::default()
        }
    };

    let descriptor = config.service.descriptor()?;
    let client = RegistryClient::new(&config.registry)
        .context("Failed to create registry client")?;

    tracing::info!(
        "Registry at {}, polling every {}s",
        client.base_url(),
        config.poll.interval_secs
    );

    // Create cancellation token for graceful shutdown
    let cancel = CancellationToken::new();

    let agent = Agent::new(client, descriptor, &config.poll);
    let summary = run_until_signal(agent, cancel, tokio::signal::ctrl_c)
        .await
        .context("Registry client stopped")?;

    tracing::info!(
        "Shutdown complete: {} poll(s), registered={}, deregistered={}, state={}",
        summary.polls,
        summary.registered,
        summary.deregistered,
        summary.state
    );
    Ok(())
}
