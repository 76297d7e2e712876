//! Document service HTTP client.
//!
//! # Responsibilities
//! - Build table/attachment endpoint URLs for the configured document
//! - Authenticate every call with the bearer token
//! - Bound every call with the upstream timeout
//! - Turn non-2xx answers into typed upstream errors

use std::time::{Duration, Instant};

use bytes::Bytes;
use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::{Form, Part};
use reqwest::RequestBuilder;
use url::Url;

use crate::config::DocumentServiceConfig;
use crate::documents::types::{Collection, RecordBatch, UpstreamReply};
use crate::error::{ProxyError, ProxyResult, Service};
use crate::observability::metrics;
use crate::resilience::with_timeout;

/// A file to store as a document attachment.
#[derive(Debug, Clone)]
pub struct AttachmentUpload {
    pub filename: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

/// Client for one document of the external document service.
#[derive(Clone)]
pub struct DocumentClient {
    http: reqwest::Client,
    base_url: Url,
    doc_id: String,
    api_key: String,
    locations_table: String,
    food_table: String,
    timeout: Duration,
}

impl DocumentClient {
    /// Create a client for the configured document.
    pub fn new(
        http: reqwest::Client,
        config: &DocumentServiceConfig,
        timeout: Duration,
    ) -> Result<Self, url::ParseError> {
        Ok(Self {
            http,
            base_url: Url::parse(&config.base_url)?,
            doc_id: config.doc_id.clone(),
            api_key: config.api_key.clone(),
            locations_table: config.locations_table.clone(),
            food_table: config.food_table.clone(),
            timeout,
        })
    }

    /// Table name backing a collection.
    pub fn table(&self, collection: Collection) -> &str {
        match collection {
            Collection::Locations => &self.locations_table,
            Collection::Food => &self.food_table,
        }
    }

    /// `{base}/api/docs/{docId}/{segments...}`, each segment percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty()
                .extend(["api", "docs", self.doc_id.as_str()])
                .extend(segments);
        }
        url
    }

    fn records_url(&self, collection: Collection) -> Url {
        self.endpoint(&["tables", self.table(collection), "records"])
    }

    /// List every record of a collection.
    pub async fn list_records(&self, collection: Collection) -> ProxyResult<UpstreamReply> {
        let request = self.http.get(self.records_url(collection));
        self.execute("list_records", request).await
    }

    /// Create records; the reply carries the assigned ids.
    pub async fn add_records(
        &self,
        collection: Collection,
        batch: &RecordBatch,
    ) -> ProxyResult<UpstreamReply> {
        let request = self.http.post(self.records_url(collection)).json(batch);
        self.execute("add_records", request).await
    }

    /// Patch records by id.
    pub async fn update_records(
        &self,
        collection: Collection,
        batch: &RecordBatch,
    ) -> ProxyResult<UpstreamReply> {
        let request = self.http.patch(self.records_url(collection)).json(batch);
        self.execute("update_records", request).await
    }

    /// Delete records by id. The endpoint takes a bare array of ids.
    pub async fn delete_records(
        &self,
        collection: Collection,
        ids: &[i64],
    ) -> ProxyResult<UpstreamReply> {
        let url = self.endpoint(&["tables", self.table(collection), "data", "delete"]);
        let request = self.http.post(url).json(ids);
        self.execute("delete_records", request).await
    }

    /// List attachment metadata for the document.
    pub async fn list_attachments(&self) -> ProxyResult<UpstreamReply> {
        let request = self.http.get(self.endpoint(&["attachments"]));
        self.execute("list_attachments", request).await
    }

    /// Upload one file; the reply carries the assigned attachment id(s).
    pub async fn upload_attachment(&self, upload: AttachmentUpload) -> ProxyResult<UpstreamReply> {
        let mut part = Part::bytes(upload.bytes.to_vec()).file_name(upload.filename);
        if let Some(content_type) = upload.content_type {
            part = part
                .mime_str(&content_type)
                .map_err(|e| ProxyError::validation(format!("invalid file content type: {e}")))?;
        }
        let form = Form::new().part("upload", part);

        let request = self.http.post(self.endpoint(&["attachments"])).multipart(form);
        self.execute("upload_attachment", request).await
    }

    /// Ask the service to drop attachments no record references anymore.
    pub async fn remove_unused_attachments(&self) -> ProxyResult<UpstreamReply> {
        let request = self.http.post(self.endpoint(&["attachments", "removeUnused"]));
        self.execute("remove_unused_attachments", request).await
    }

    /// Send an authenticated request and buffer the full reply.
    async fn execute(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> ProxyResult<UpstreamReply> {
        let start = Instant::now();
        let request = request.bearer_auth(&self.api_key);

        let result = with_timeout(Service::Documents, self.timeout, async {
            let response = request
                .send()
                .await
                .map_err(|e| ProxyError::transport(Service::Documents, e))?;

            let status = response.status();
            let content_type = response.headers().get(CONTENT_TYPE).cloned();
            let body = response
                .bytes()
                .await
                .map_err(|e| ProxyError::transport(Service::Documents, e))?;

            if !status.is_success() {
                return Err(ProxyError::upstream(Service::Documents, status, &body));
            }

            Ok(UpstreamReply {
                status,
                content_type,
                body,
            })
        })
        .await;

        metrics::record_upstream(Service::Documents, operation, result.is_ok(), start);
        if let Err(e) = &result {
            tracing::debug!(operation, error = %e, "Document service call failed");
        }
        result
    }
}

impl std::fmt::Debug for DocumentClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentClient")
            .field("base_url", &self.base_url.as_str())
            .field("doc_id", &self.doc_id)
            .field("timeout_secs", &self.timeout.as_secs())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client(base_url: &str) -> DocumentClient {
        let config = DocumentServiceConfig {
            base_url: base_url.to_string(),
            api_key: "key".to_string(),
            doc_id: "doc 1".to_string(),
            ..Default::default()
        };
        DocumentClient::new(reqwest::Client::new(), &config, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_records_url() {
        let client = test_client("https://docs.example.com");
        assert_eq!(
            client.records_url(Collection::Food).as_str(),
            "https://docs.example.com/api/docs/doc%201/tables/Food/records"
        );
    }

    #[test]
    fn test_trailing_slash_and_base_path() {
        let client = test_client("https://example.com/grist/");
        assert_eq!(
            client.endpoint(&["attachments", "removeUnused"]).as_str(),
            "https://example.com/grist/api/docs/doc%201/attachments/removeUnused"
        );
    }

    #[test]
    fn test_delete_url() {
        let client = test_client("http://localhost:8484");
        assert_eq!(
            client
                .endpoint(&["tables", client.table(Collection::Locations), "data", "delete"])
                .as_str(),
            "http://localhost:8484/api/docs/doc%201/tables/Locations/data/delete"
        );
    }

    #[test]
    fn test_debug_hides_api_key() {
        let client = test_client("https://docs.example.com");
        assert!(!format!("{:?}", client).contains("key\""));
    }
}
