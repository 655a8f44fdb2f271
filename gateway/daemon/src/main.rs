//! Gateway Daemon - HTTP and WebSocket Front End
//!
//! Serves the chat gateway over two transports:
//!
//! - `POST /chat`: synchronous; the reply is the response body
//! - `GET /ws`: push-style; answers arrive as `chat_response` events
//!
//! plus `GET /` (liveness) and `GET /health`.
//!
//! # Usage
//!
//! ```bash
//! # Start with defaults (0.0.0.0:8000, Ollama on localhost:11434)
//! gateway-daemon
//!
//! # Point at another Ollama instance
//! gateway-daemon --ollama-url http://ollama:11434 --model llama3.2
//!
//! # With config file
//! gateway-daemon --config /etc/chat-gateway/gateway.toml
//!
//! # Verbose logging
//! RUST_LOG=debug gateway-daemon
//! ```
//!
//! # Signals
//!
//! - `SIGTERM` / `SIGINT`: Graceful shutdown

mod server;
mod socket;
#[cfg(test)]
mod test_support;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{error, info, warn};

use gateway_core::config::{load_config, load_config_from_path, ConfigOverrides};
use gateway_core::{Gateway, LlmBackend, OllamaBackend};

/// Gateway Daemon - aggregates streamed LLM replies for chat clients
#[derive(Parser, Debug)]
#[command(name = "gateway-daemon")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Configuration file path
    #[arg(short = 'c', long, env = "GATEWAY_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Listen host
    #[arg(long, value_name = "HOST")]
    host: Option<String>,

    /// Listen port
    #[arg(short = 'p', long, value_name = "PORT")]
    port: Option<u16>,

    /// Ollama base URL
    #[arg(long, value_name = "URL")]
    ollama_url: Option<String>,

    /// Model name sent upstream
    #[arg(short = 'm', long, value_name = "MODEL")]
    model: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long, env = "GATEWAY_LOG_LEVEL", default_value = "info")]
    log_level: String,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        let mut overrides = ConfigOverrides::new();
        if let Some(host) = &self.host {
            overrides = overrides.with_host(host);
        }
        if let Some(port) = self.port {
            overrides = overrides.with_port(port);
        }
        if let Some(url) = &self.ollama_url {
            overrides = overrides.with_upstream_url(url);
        }
        if let Some(model) = &self.model {
            overrides = overrides.with_model(model);
        }
        overrides
    }
}

/// Initialize logging with the specified level
fn init_logging(level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!(
            "gateway_daemon={level},gateway_core={level},tower_http={level}"
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}

/// Resolve once Ctrl+C or SIGTERM arrives
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        }
        () = terminate => {
            info!("Received SIGTERM, shutting down");
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level);

    info!("Starting Gateway Daemon");

    let loaded = match &args.config {
        Some(path) => load_config_from_path(Some(path.clone())),
        None => load_config(),
    };
    let mut config = loaded.context("Failed to load configuration")?;
    args.overrides().apply(&mut config);
    config.validate().context("Invalid configuration")?;

    info!(
        source = %config.source(),
        upstream = %config.upstream.base_url,
        model = %config.upstream.model,
        read_timeout_secs = config.upstream.read_timeout.as_secs(),
        "Configuration loaded"
    );

    let backend = Arc::new(
        OllamaBackend::from_config(&config.upstream).context("Failed to create upstream client")?,
    );
    if !backend.health_check().await {
        warn!(
            upstream = %backend.base_url(),
            "Upstream not reachable yet; requests will fail until it is"
        );
    }

    let gateway = Gateway::new(backend, &config);
    let app = server::build_router(gateway);

    let bind_address = config.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {bind_address}"))?;
    info!(addr = %listener.local_addr()?, "Ready to accept connections");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Gateway Daemon stopped");
    Ok(())
}
