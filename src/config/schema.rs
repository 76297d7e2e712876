//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the pantry proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Inbound routing settings.
    pub routing: RoutingConfig,

    /// Document service connection settings.
    pub documents: DocumentServiceConfig,

    /// AI microservice settings.
    pub ai: AiConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    #[serde(default)]
    pub security: SecurityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
        }
    }
}

/// Inbound routing configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Prefix every API route is mounted under. Empty mounts at the root.
    pub prefix: String,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            prefix: "/api".to_string(),
        }
    }
}

/// Document service (spreadsheet-backed record store) configuration.
///
/// `base_url`, `api_key` and `doc_id` have no usable defaults; startup
/// validation rejects a config where any of them is empty.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DocumentServiceConfig {
    /// Base URL of the document service (e.g., "https://docs.example.com").
    pub base_url: String,

    /// API key sent as a bearer token.
    pub api_key: String,

    /// Identifier of the document holding the pantry tables.
    pub doc_id: String,

    /// Table backing the Locations collection.
    pub locations_table: String,

    /// Table backing the Food collection.
    pub food_table: String,
}

impl Default for DocumentServiceConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_key: String::new(),
            doc_id: String::new(),
            locations_table: "Locations".to_string(),
            food_table: "Food".to_string(),
        }
    }
}

/// AI microservice configuration. Every field has a default.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AiConfig {
    /// Full URL of the microservice chat endpoint.
    pub service_url: String,

    /// Provider tag forwarded as `providerType`.
    pub provider: String,

    /// Model used for pantry chat.
    pub chat_model: String,

    /// Model used for image analysis.
    pub vision_model: String,

    /// Upstream provider API key forwarded as `apiKey`.
    pub api_key: String,

    /// Upstream provider base URL forwarded as `modelUrl`.
    pub api_base: String,

    /// Sampling temperature.
    pub temperature: f32,

    /// Maximum tokens to generate.
    pub max_tokens: u32,

    /// Ask reasoning models to think before answering.
    pub think: bool,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            service_url: "http://localhost:8000/chat".to_string(),
            provider: "ollama".to_string(),
            chat_model: "llama3.2".to_string(),
            vision_model: "llava".to_string(),
            api_key: String::new(),
            api_base: "http://localhost:11434".to_string(),
            temperature: 0.7,
            max_tokens: 1024,
            think: false,
        }
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Inbound request timeout (time until response headers) in seconds.
    pub request_secs: u64,

    /// Bound on a complete buffered upstream exchange in seconds.
    pub upstream_secs: u64,

    /// Bound on waiting for a streaming upstream to send headers in seconds.
    pub stream_start_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            request_secs: 120,
            upstream_secs: 60,
            stream_start_secs: 60,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Security hardening configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Maximum inbound body size in bytes (uploads included).
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_body_size: 20 * 1024 * 1024, // 20MB, room for phone photos
        }
    }
}
