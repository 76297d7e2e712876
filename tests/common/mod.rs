//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    body::{to_bytes, Bytes},
    extract::Request,
    http::{HeaderMap, Method},
    response::Response,
    Router,
};
use pantry_proxy::config::ProxyConfig;
use pantry_proxy::http::HttpServer;
use pantry_proxy::lifecycle::Shutdown;
use tokio::net::TcpListener;

pub const API_KEY: &str = "test-key";
pub const DOC_ID: &str = "doc-1";

/// One request as seen by a mock upstream.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub method: Method,
    pub path: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl RecordedCall {
    #[allow(dead_code)]
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).expect("upstream body is not JSON")
    }

    #[allow(dead_code)]
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Calls received by a mock upstream, in arrival order.
#[derive(Clone, Default)]
pub struct Calls(Arc<Mutex<Vec<RecordedCall>>>);

impl Calls {
    #[allow(dead_code)]
    pub fn all(&self) -> Vec<RecordedCall> {
        self.0.lock().unwrap().clone()
    }

    #[allow(dead_code)]
    pub fn len(&self) -> usize {
        self.0.lock().unwrap().len()
    }

    #[allow(dead_code)]
    pub fn paths(&self) -> Vec<String> {
        self.all().into_iter().map(|c| c.path).collect()
    }
}

/// Start a programmable upstream answering every request with `respond`.
#[allow(dead_code)]
pub async fn start_upstream<F, Fut>(respond: F) -> (SocketAddr, Calls)
where
    F: Fn(RecordedCall) -> Fut + Clone + Send + Sync + 'static,
    Fut: std::future::Future<Output = Response> + Send + 'static,
{
    let calls = Calls::default();
    let recorder = calls.clone();

    let app = Router::new().fallback(move |request: Request| {
        let respond = respond.clone();
        let recorder = recorder.clone();
        async move {
            let (parts, body) = request.into_parts();
            let body = to_bytes(body, usize::MAX).await.unwrap_or_default();
            let call = RecordedCall {
                method: parts.method,
                path: parts.uri.path().to_string(),
                headers: parts.headers,
                body,
            };
            recorder.0.lock().unwrap().push(call.clone());
            respond(call).await
        }
    });

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    (addr, calls)
}

/// Proxy config pointing at the given mock upstreams.
#[allow(dead_code)]
pub fn test_config(docs: SocketAddr, ai: SocketAddr) -> ProxyConfig {
    let mut config = ProxyConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.documents.base_url = format!("http://{}", docs);
    config.documents.api_key = API_KEY.into();
    config.documents.doc_id = DOC_ID.into();
    config.ai.service_url = format!("http://{}/chat", ai);
    config.timeouts.upstream_secs = 5;
    config.timeouts.stream_start_secs = 5;
    config
}

/// A running proxy; shuts down when dropped.
pub struct TestProxy {
    pub addr: SocketAddr,
    pub client: reqwest::Client,
    shutdown: Shutdown,
}

impl TestProxy {
    pub async fn start(config: ProxyConfig) -> Self {
        let server = HttpServer::new(config).expect("server config");
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let shutdown = Shutdown::new();
        let server_shutdown = shutdown.subscribe();
        tokio::spawn(async move {
            let _ = server.run(listener, server_shutdown).await;
        });

        let client = reqwest::Client::builder()
            .no_proxy()
            .timeout(Duration::from_secs(20))
            .build()
            .unwrap();

        Self {
            addr,
            client,
            shutdown,
        }
    }

    /// URL of an API path under the default `/api` prefix.
    pub fn url(&self, path: &str) -> String {
        format!("http://{}/api{}", self.addr, path)
    }

    /// URL of a path with no prefix applied.
    #[allow(dead_code)]
    pub fn raw_url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestProxy {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Records path on the mock document service.
#[allow(dead_code)]
pub fn records_path(table: &str) -> String {
    format!("/api/docs/{}/tables/{}/records", DOC_ID, table)
}

#[allow(dead_code)]
pub fn delete_path(table: &str) -> String {
    format!("/api/docs/{}/tables/{}/data/delete", DOC_ID, table)
}

#[allow(dead_code)]
pub fn attachments_path() -> String {
    format!("/api/docs/{}/attachments", DOC_ID)
}

#[allow(dead_code)]
pub fn remove_unused_path() -> String {
    format!("/api/docs/{}/attachments/removeUnused", DOC_ID)
}
