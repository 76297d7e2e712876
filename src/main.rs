//! Pantry proxy (v1)
//!
//! Backend for the pantry tracker front end.
//!
//! # Architecture Overview
//!
//! ```text
//!                     ┌──────────────────────────────────────────────┐
//!                     │                 PANTRY PROXY                  │
//!   Client Request    │  ┌────────┐   ┌─────────────────────────┐    │
//!   ──────────────────┼─▶│ router │──▶│ record / attachment     │────┼──▶ Document
//!                     │  │ prefix │   │ proxy (records wrapper) │◀───┼─── service
//!                     │  └────────┘   └─────────────────────────┘    │
//!                     │       │       ┌─────────────────────────┐    │
//!                     │       └──────▶│ AI relay                │────┼──▶ AI
//!   Client Response   │               │ buffered JSON / stream  │◀───┼─── microservice
//!   ◀─────────────────┼───────────────└─────────────────────────┘    │
//!                     │  config · logging · metrics · timeouts        │
//!                     └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use pantry_proxy::config::{load_config, ConfigOverrides};
use pantry_proxy::http::HttpServer;
use pantry_proxy::lifecycle::Shutdown;
use pantry_proxy::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "pantry-proxy")]
#[command(about = "Record and AI relay backend for the pantry tracker", long_about = None)]
struct Cli {
    /// TOML configuration file. Flags and environment override it.
    #[arg(short, long, env = "PANTRY_CONFIG")]
    config: Option<PathBuf>,

    /// Listen address, e.g. 0.0.0.0:3000.
    #[arg(long, env = "PANTRY_BIND")]
    bind: Option<String>,

    /// Prefix for every API route ("" for none).
    #[arg(long, env = "PANTRY_PREFIX")]
    prefix: Option<String>,

    #[arg(long, env = "DOCS_BASE_URL")]
    docs_url: Option<String>,

    #[arg(long, env = "DOCS_API_KEY", hide_env_values = true)]
    docs_api_key: Option<String>,

    #[arg(long, env = "DOCS_DOC_ID")]
    docs_doc_id: Option<String>,

    #[arg(long, env = "AI_SERVICE_URL")]
    ai_url: Option<String>,

    #[arg(long, env = "AI_PROVIDER")]
    ai_provider: Option<String>,

    #[arg(long, env = "AI_CHAT_MODEL")]
    ai_chat_model: Option<String>,

    #[arg(long, env = "AI_VISION_MODEL")]
    ai_vision_model: Option<String>,

    #[arg(long, env = "AI_API_KEY", hide_env_values = true)]
    ai_api_key: Option<String>,

    #[arg(long, env = "AI_API_BASE")]
    ai_api_base: Option<String>,

    /// Log level when RUST_LOG is unset.
    #[arg(long, env = "PANTRY_LOG_LEVEL")]
    log_level: Option<String>,
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            bind_address: self.bind.clone(),
            prefix: self.prefix.clone(),
            docs_base_url: self.docs_url.clone(),
            docs_api_key: self.docs_api_key.clone(),
            docs_doc_id: self.docs_doc_id.clone(),
            ai_service_url: self.ai_url.clone(),
            ai_provider: self.ai_provider.clone(),
            ai_chat_model: self.ai_chat_model.clone(),
            ai_vision_model: self.ai_vision_model.clone(),
            ai_api_key: self.ai_api_key.clone(),
            ai_api_base: self.ai_api_base.clone(),
            log_level: self.log_level.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let loaded = load_config(cli.config.as_deref(), cli.overrides());

    // The config's level applies once it is valid; otherwise fall back so
    // the refusal itself is logged.
    let level = match &loaded {
        Ok(config) => config.observability.log_level.clone(),
        Err(_) => cli.log_level.clone().unwrap_or_else(|| "info".to_string()),
    };
    logging::init_logging(&level);

    tracing::info!("pantry-proxy v{} starting", env!("CARGO_PKG_VERSION"));

    let config = match loaded {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Refusing to start");
            return Err(e.into());
        }
    };

    tracing::info!(
        bind_address = %config.listener.bind_address,
        prefix = %config.routing.prefix,
        documents = %config.documents.base_url,
        ai_service = %config.ai.service_url,
        upstream_timeout_secs = config.timeouts.upstream_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let server = HttpServer::new(config.clone())?;

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    shutdown.trigger_on_signal();

    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
