//! Standalone REST API server binary.
//!
//! ## Purpose
//! Runs the REST API server on its own, without loading `.env`.
//!
//! ## Intended use
//! Useful during development when the environment is already set up by the shell. The
//! workspace's main `ayush-run` binary loads `.env` first and then serves the same router.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the AYUSH REST API server
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the environment holds an invalid setting,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("api_rest=info".parse()?)
                .add_directive("ayush_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cfg = api_rest::config_from_env()?;
    tracing::info!("-- Starting AYUSH REST API on {}", cfg.addr);
    tracing::info!("-- Terminology backend at {}", cfg.client.api_base_url());

    api_rest::serve(&cfg).await
}
