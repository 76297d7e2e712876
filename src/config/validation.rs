//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Refuse to start without document service credentials
//! - Validate URLs, addresses and value ranges
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::ProxyConfig;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required setting is absent or blank.
    #[error("missing required setting `{0}`")]
    Missing(&'static str),

    /// A URL setting does not parse as an absolute http(s) URL.
    #[error("`{field}` is not a valid http(s) URL: {value}")]
    InvalidUrl { field: &'static str, value: String },

    /// A socket address setting does not parse.
    #[error("`{field}` is not a valid socket address: {value}")]
    InvalidAddress { field: &'static str, value: String },

    /// The routing prefix is malformed.
    #[error("routing prefix must be empty or start with '/' and not end with '/': {0}")]
    InvalidPrefix(String),

    /// A numeric setting must be strictly positive.
    #[error("`{0}` must be greater than zero")]
    NotPositive(&'static str),
}

/// Validate a configuration, collecting every problem found.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let docs = &config.documents;
    if docs.base_url.trim().is_empty() {
        errors.push(ValidationError::Missing("documents.base_url"));
    } else if !is_http_url(&docs.base_url) {
        errors.push(ValidationError::InvalidUrl {
            field: "documents.base_url",
            value: docs.base_url.clone(),
        });
    }
    if docs.api_key.trim().is_empty() {
        errors.push(ValidationError::Missing("documents.api_key"));
    }
    if docs.doc_id.trim().is_empty() {
        errors.push(ValidationError::Missing("documents.doc_id"));
    }
    if docs.locations_table.trim().is_empty() {
        errors.push(ValidationError::Missing("documents.locations_table"));
    }
    if docs.food_table.trim().is_empty() {
        errors.push(ValidationError::Missing("documents.food_table"));
    }

    if !is_http_url(&config.ai.service_url) {
        errors.push(ValidationError::InvalidUrl {
            field: "ai.service_url",
            value: config.ai.service_url.clone(),
        });
    }

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    let prefix = &config.routing.prefix;
    if !prefix.is_empty() && (!prefix.starts_with('/') || prefix.ends_with('/')) {
        errors.push(ValidationError::InvalidPrefix(prefix.clone()));
    }

    let timeouts = &config.timeouts;
    for (name, value) in [
        ("timeouts.connect_secs", timeouts.connect_secs),
        ("timeouts.request_secs", timeouts.request_secs),
        ("timeouts.upstream_secs", timeouts.upstream_secs),
        ("timeouts.stream_start_secs", timeouts.stream_start_secs),
    ] {
        if value == 0 {
            errors.push(ValidationError::NotPositive(name));
        }
    }
    if config.security.max_body_size == 0 {
        errors.push(ValidationError::NotPositive("security.max_body_size"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn is_http_url(value: &str) -> bool {
    url::Url::parse(value)
        .map(|u| matches!(u.scheme(), "http" | "https") && u.has_host())
        .unwrap_or(false)
}
