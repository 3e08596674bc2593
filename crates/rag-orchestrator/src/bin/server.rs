//! RAG orchestrator server binary
//!
//! Run with: cargo run -p rag-orchestrator --bin rag-orchestrator-server

use std::path::PathBuf;

use clap::Parser;
use rag_orchestrator::{config::RagConfig, server::RagServer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// RAG orchestrator: retrieval, generation and cited answers over HTTP
#[derive(Debug, Parser)]
#[command(name = "rag-orchestrator-server", version)]
struct Args {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Host to bind (overrides config and RAG_HOST)
    #[arg(long)]
    host: Option<String>,

    /// Port to bind (overrides config and RAG_PORT)
    #[arg(short, long)]
    port: Option<u16>,

    /// Backend for the orchestrator: `mock` or `http`
    #[arg(long)]
    backend: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rag_orchestrator=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let mut config = RagConfig::load(args.config.as_deref())?;
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(backend) = args.backend {
        config.backend = backend.parse()?;
    }
    config.validate()?;

    tracing::info!("Configuration loaded");
    tracing::info!("  - Backend: {:?}", config.backend);
    tracing::info!("  - Retrieval: {}", config.base_url_for(&config.retrieval));
    tracing::info!("  - Generation: {}", config.base_url_for(&config.generation));
    tracing::info!(
        "  - Retries: {} (base delay {}ms)",
        config.retry.max_retries,
        config.retry.base_delay_ms
    );
    tracing::info!("  - Answer cache: {}", if config.cache.enabled { "on" } else { "off" });

    let server = RagServer::new(config)?;

    tracing::info!("  Health: http://{}/health", server.address());
    tracing::info!("  Query:  POST http://{}/v1/query", server.address());

    server.start().await?;

    Ok(())
}
