//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → CLI flags / environment overrides
//!     → validation.rs (semantic checks, credentials present)
//!     → ProxyConfig (validated, immutable)
//!     → handed to each component constructor
//! ```
//!
//! # Design Decisions
//! - Config is read once at process entry; components never read the environment
//! - All fields have defaults except document service credentials
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError, ConfigOverrides};
pub use schema::AiConfig;
pub use schema::DocumentServiceConfig;
pub use schema::ListenerConfig;
pub use schema::ProxyConfig;
pub use schema::TimeoutConfig;
pub use validation::ValidationError;
