//! Document service integration.
//!
//! # Data Flow
//! ```text
//! Inbound body (field map | array | {records})
//!     → types.rs (normalize to {records:[{id?, fields}]})
//!     → client.rs (authenticated call to {base}/api/docs/{docId}/...)
//!     → UpstreamReply (status, content-type, body) relayed verbatim
//! ```
//!
//! # Security Constraints
//! - The API key is only ever sent as a bearer token
//! - Never log the API key

pub mod client;
pub mod types;

pub use client::{AttachmentUpload, DocumentClient};
pub use types::{Collection, Fields, Record, RecordBatch, UpstreamReply};
