//! Pantry proxy library.
//!
//! Translates the pantry front end's REST calls into the document service's
//! record/attachment protocol and relays AI chat requests, buffered or
//! streamed.

pub mod ai;
pub mod api;
pub mod config;
pub mod documents;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod resilience;

pub use config::schema::ProxyConfig;
pub use error::{ProxyError, ProxyResult};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
