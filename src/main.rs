use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the AYUSH terminology application
///
/// Loads `.env`, resolves configuration once and serves the REST backend-for-frontend
/// with Swagger UI at `/swagger-ui`.
///
/// # Environment Variables
/// - `AYUSH_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `AYUSH_API_BASE_URL`: Terminology backend (default: "http://localhost:8000")
/// - `AYUSH_DOCUMENT_DIR`: Directory holding the `users/` and `patients/` documents (default: "documents")
/// - `AYUSH_SUGGEST_DEBOUNCE_MS`: Suggestion debounce, clamped to 150-400 (default: 300)
/// - `AYUSH_DETAIL_MAX_PAGES`: Server pages fetched per source for detail views (default: 3)
/// - `AYUSH_REQUEST_TIMEOUT_SECS`: Optional backend request timeout (default: none)
///
/// # Returns
/// * `Ok(())` - If the server starts and runs successfully
/// * `Err(anyhow::Error)` - If configuration, startup or the server itself fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("ayush_run=info".parse()?)
                .add_directive("api_rest=info".parse()?)
                .add_directive("ayush_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cfg = api_rest::config_from_env()?;

    tracing::info!("++ Starting AYUSH REST on {}", cfg.addr);
    tracing::info!("++ Terminology backend at {}", cfg.client.api_base_url());
    tracing::info!("++ Documents from {}", cfg.document_dir.display());

    api_rest::serve(&cfg).await
}
