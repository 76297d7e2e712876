//! Configuration loading from disk and process arguments.

use std::fs;
use std::path::Path;

use crate::config::schema::ProxyConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Values supplied at process entry (flags or environment) that take
/// precedence over the config file. `None` leaves the file value in place.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub bind_address: Option<String>,
    pub prefix: Option<String>,
    pub docs_base_url: Option<String>,
    pub docs_api_key: Option<String>,
    pub docs_doc_id: Option<String>,
    pub ai_service_url: Option<String>,
    pub ai_provider: Option<String>,
    pub ai_chat_model: Option<String>,
    pub ai_vision_model: Option<String>,
    pub ai_api_key: Option<String>,
    pub ai_api_base: Option<String>,
    pub log_level: Option<String>,
}

impl ConfigOverrides {
    /// Apply every present override onto `config`.
    pub fn apply(self, config: &mut ProxyConfig) {
        fn set(target: &mut String, value: Option<String>) {
            if let Some(v) = value {
                *target = v;
            }
        }

        set(&mut config.listener.bind_address, self.bind_address);
        set(&mut config.routing.prefix, self.prefix);
        set(&mut config.documents.base_url, self.docs_base_url);
        set(&mut config.documents.api_key, self.docs_api_key);
        set(&mut config.documents.doc_id, self.docs_doc_id);
        set(&mut config.ai.service_url, self.ai_service_url);
        set(&mut config.ai.provider, self.ai_provider);
        set(&mut config.ai.chat_model, self.ai_chat_model);
        set(&mut config.ai.vision_model, self.ai_vision_model);
        set(&mut config.ai.api_key, self.ai_api_key);
        set(&mut config.ai.api_base, self.ai_api_base);
        set(&mut config.observability.log_level, self.log_level);
    }
}

/// Parse configuration from a TOML file without validating it.
pub fn read_config_file(path: &Path) -> Result<ProxyConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    toml::from_str(&content).map_err(ConfigError::Parse)
}

/// Build the effective configuration: file (or defaults), then overrides,
/// then validation. Nothing is accepted unless validation passes.
pub fn load_config(
    path: Option<&Path>,
    overrides: ConfigOverrides,
) -> Result<ProxyConfig, ConfigError> {
    let mut config = match path {
        Some(path) => read_config_file(path)?,
        None => ProxyConfig::default(),
    };

    overrides.apply(&mut config);

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}
