//! AI microservice client.
//!
//! Both entry points share one transport: a multipart POST carrying a
//! JSON `payload` field and an optional binary `image` field. They diverge
//! at response handling:
//! - [`AiClient::complete`] buffers the whole answer and decodes it as JSON
//! - [`AiClient::open_stream`] returns as soon as headers arrive, leaving the
//!   body for the caller to relay chunk by chunk

use std::time::{Duration, Instant};

use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use serde_json::Value;
use url::Url;

use crate::ai::payload::ChatPayload;
use crate::config::{AiConfig, TimeoutConfig};
use crate::error::{ProxyError, ProxyResult, Service};
use crate::observability::metrics;
use crate::resilience::with_timeout;

/// Image attached to a chat request.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub filename: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

/// Client for the AI microservice chat endpoint.
#[derive(Clone)]
pub struct AiClient {
    http: reqwest::Client,
    endpoint: Url,
    config: AiConfig,
    upstream_timeout: Duration,
    stream_start_timeout: Duration,
}

impl AiClient {
    pub fn new(
        http: reqwest::Client,
        config: &AiConfig,
        timeouts: &TimeoutConfig,
    ) -> Result<Self, url::ParseError> {
        Ok(Self {
            http,
            endpoint: Url::parse(&config.service_url)?,
            config: config.clone(),
            upstream_timeout: Duration::from_secs(timeouts.upstream_secs),
            stream_start_timeout: Duration::from_secs(timeouts.stream_start_secs),
        })
    }

    /// Provider and model settings payloads are built from.
    pub fn config(&self) -> &AiConfig {
        &self.config
    }

    /// Send a non-streaming request and decode the complete JSON answer.
    pub async fn complete(
        &self,
        payload: &ChatPayload,
        image: Option<ImageUpload>,
    ) -> ProxyResult<Value> {
        let start = Instant::now();
        let form = build_form(payload, image)?;
        let request = self.http.post(self.endpoint.clone()).multipart(form);

        let result = with_timeout(Service::Ai, self.upstream_timeout, async {
            let response = request
                .send()
                .await
                .map_err(|e| ProxyError::transport(Service::Ai, e))?;
            let status = response.status();
            let body = response
                .bytes()
                .await
                .map_err(|e| ProxyError::transport(Service::Ai, e))?;

            if !status.is_success() {
                return Err(ProxyError::upstream(Service::Ai, status, &body));
            }

            serde_json::from_slice::<Value>(&body).map_err(|e| ProxyError::Parse {
                what: "AI service response",
                reason: e.to_string(),
                raw: String::from_utf8_lossy(&body).into_owned(),
            })
        })
        .await;

        metrics::record_upstream(Service::Ai, "complete", result.is_ok(), start);
        result
    }

    /// Send a streaming request and return the response once its headers
    /// arrive with a success status. Only that wait is time-bounded.
    pub async fn open_stream(&self, payload: &ChatPayload) -> ProxyResult<reqwest::Response> {
        let start = Instant::now();
        let form = build_form(payload, None)?;
        let request = self.http.post(self.endpoint.clone()).multipart(form);

        let result = with_timeout(Service::Ai, self.stream_start_timeout, async {
            let response = request
                .send()
                .await
                .map_err(|e| ProxyError::transport(Service::Ai, e))?;

            let status = response.status();
            if !status.is_success() {
                let body = error_body(response).await;
                return Err(ProxyError::upstream(Service::Ai, status, &body));
            }
            Ok(response)
        })
        .await;

        metrics::record_upstream(Service::Ai, "open_stream", result.is_ok(), start);
        result
    }
}

impl std::fmt::Debug for AiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AiClient")
            .field("endpoint", &self.endpoint.as_str())
            .field("provider", &self.config.provider)
            .finish()
    }
}

/// Body of a failed streaming response. An unreadable body is logged and
/// treated as empty, so the error falls back to the status code.
async fn error_body(response: reqwest::Response) -> Bytes {
    match response.bytes().await {
        Ok(body) => body,
        Err(e) => {
            tracing::debug!(error = %e, "Could not read AI service error body");
            Bytes::new()
        }
    }
}

/// Multipart body: `payload` (JSON text) plus optional `image`.
pub fn build_form(payload: &ChatPayload, image: Option<ImageUpload>) -> ProxyResult<Form> {
    let json = serde_json::to_string(payload).map_err(|e| ProxyError::Parse {
        what: "chat payload",
        reason: e.to_string(),
        raw: String::new(),
    })?;

    let mut form = Form::new().text("payload", json);
    if let Some(image) = image {
        let mut part = Part::bytes(image.bytes.to_vec()).file_name(image.filename);
        if let Some(content_type) = image.content_type {
            part = part
                .mime_str(&content_type)
                .map_err(|e| ProxyError::validation(format!("invalid image content type: {e}")))?;
        }
        form = form.part("image", part);
    }
    Ok(form)
}
