//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Build the shared upstream clients from configuration
//! - Create the Axum router with all handlers under the routing prefix
//! - Wire up middleware (request ID, tracing, body limit, timeout, metrics)
//! - Serve until the shutdown signal fires

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{DefaultBodyLimit, Request},
    middleware, Router,
};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::ai::AiClient;
use crate::api;
use crate::config::ProxyConfig;
use crate::documents::DocumentClient;
use crate::http::request::{request_id, MakeRequestUuid, X_REQUEST_ID};
use crate::observability::metrics;

/// Errors raised while assembling the server, before any traffic.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("invalid upstream URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub documents: Arc<DocumentClient>,
    pub ai: Arc<AiClient>,
}

impl AppState {
    /// Build both upstream clients over one shared connection pool.
    pub fn from_config(config: &ProxyConfig) -> Result<Self, ServerError> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
            .user_agent(concat!("pantry-proxy/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let documents = DocumentClient::new(
            http.clone(),
            &config.documents,
            Duration::from_secs(config.timeouts.upstream_secs),
        )?;
        let ai = AiClient::new(http, &config.ai, &config.timeouts)?;

        Ok(Self {
            documents: Arc::new(documents),
            ai: Arc::new(ai),
        })
    }
}

/// HTTP server for the pantry proxy.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given (validated) configuration.
    pub fn new(config: ProxyConfig) -> Result<Self, ServerError> {
        let state = AppState::from_config(&config)?;

        tracing::debug!(documents = ?state.documents, ai = ?state.ai, "Upstream clients ready");

        let router = Self::build_router(&config, state);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ProxyConfig, state: AppState) -> Router {
        let prefix = config.routing.prefix.as_str();
        let routes = if prefix.is_empty() {
            api::api_routes()
        } else {
            Router::new().nest(prefix, api::api_routes())
        };

        routes
            .with_state(state)
            .layer(middleware::from_fn(metrics::track_requests))
            .layer(DefaultBodyLimit::disable())
            .layer(RequestBodyLimitLayer::new(config.security.max_body_size))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
            .layer(TraceLayer::new_for_http().make_span_with(|request: &Request| {
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = %request_id(request),
                )
            }))
            .layer(SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuid))
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            prefix = %self.config.routing.prefix,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    /// The assembled router, for driving the server without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }
}
