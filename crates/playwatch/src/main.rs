//! Playwatch server binary.

use playwatch::prelude::*;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (config, origin) = PlaywatchConfig::load()?;

    // RUST_LOG wins over the configured level.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.debug_level.as_filter())),
        )
        .with_target(true)
        .init();
    origin.log();

    tracing::info!(
        port = config.port,
        event_source = %config.event_source,
        staleness_window_ms = config.staleness_window_ms,
        "playwatch starting"
    );

    let server = PlaywatchServer::builder().config(config).build().await?;
    server.run().await?;
    Ok(())
}
