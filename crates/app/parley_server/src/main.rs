//! Parley chat relay server binary.
//!
//! Reads configuration from the environment (and `.env`), then serves the
//! chat API until interrupted.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use parley_api::config::ApiConfig;
use parley_core::generation::GeminiClient;
use parley_core::scenario::ScenarioCatalog;
use tracing::{info, warn};

/// CLI arguments. Anything not given falls back to the environment.
#[derive(Parser, Debug)]
#[command(name = "parley_server", about = "Parley chat relay server", version)]
struct Args {
    /// Interface to bind (overrides `HOST`).
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on (overrides `PORT`).
    #[arg(long)]
    port: Option<u16>,

    /// Gemini model name (overrides `GEMINI_MODEL`).
    #[arg(long)]
    model: Option<String>,

    /// Upstream timeout in seconds (overrides `GEMINI_TIMEOUT_SECS`).
    #[arg(long)]
    timeout_secs: Option<u64>,
}

impl Args {
    fn apply(self, mut config: ApiConfig) -> ApiConfig {
        if self.host.is_some() || self.port.is_some() {
            let (env_host, env_port) = config
                .bind_addr
                .rsplit_once(':')
                .unwrap_or(("0.0.0.0", "5000"));
            let host = self.host.as_deref().unwrap_or(env_host);
            let port = self.port.map_or_else(|| env_port.to_string(), |p| p.to_string());
            let bind_addr = format!("{host}:{port}");
            config.bind_addr = bind_addr;
        }
        if let Some(model) = self.model {
            config.gemini.model = model;
        }
        if let Some(secs) = self.timeout_secs {
            config.gemini.timeout = Duration::from_secs(secs);
        }
        config
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,parley_api=debug,parley_core=debug".into()),
        )
        .init();

    let config = Args::parse().apply(ApiConfig::from_env());

    if config.gemini.api_key.is_none() {
        warn!("GEMINI_API_KEY is not set; chat requests will fail with a configuration error");
    }

    info!(
        model = %config.gemini.model,
        timeout_secs = config.gemini.timeout.as_secs(),
        "configuring generation client"
    );

    let generator = GeminiClient::new(config.gemini.clone())?;

    let state = parley_api::AppState {
        config: config.clone(),
        catalog: Arc::new(ScenarioCatalog::builtin()),
        generator: Arc::new(generator),
    };

    let app = parley_api::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    let local_addr = listener.local_addr()?;

    info!(addr = %local_addr, "REST API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
