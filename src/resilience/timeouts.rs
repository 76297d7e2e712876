//! Timeout enforcement.
//!
//! # Responsibilities
//! - Wrap upstream calls with a deadline
//! - Turn an elapsed deadline into a typed error
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - Timeout errors are distinct from other errors
//! - Streaming calls are bounded only until response headers arrive

use std::future::Future;
use std::time::Duration;
use tokio::time::timeout;

use crate::error::{ProxyError, ProxyResult, Service};

/// Run `fut` against `service`, failing with [`ProxyError::Timeout`] once
/// `limit` elapses. The inner future is dropped (cancelled) on timeout.
pub async fn with_timeout<T, F>(service: Service, limit: Duration, fut: F) -> ProxyResult<T>
where
    F: Future<Output = ProxyResult<T>>,
{
    match timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(service = service.label(), timeout_secs = limit.as_secs(), "Upstream call timed out");
            Err(ProxyError::Timeout {
                service,
                secs: limit.as_secs(),
            })
        }
    }
}
