//! Chat payload sent to the AI microservice.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::config::AiConfig;

/// System instruction for image analysis.
pub const ANALYSIS_SYSTEM_PROMPT: &str = "You are a food recognition assistant. \
Respond ONLY with a JSON object matching the provided schema: \
{\"item\": string, \"expiration_days\": integer, \"notes\": string or null}. \
`item` is the common name of the food, `expiration_days` is your estimate of \
how many days it stays good when stored normally, `notes` holds storage tips \
or null. Do not add any other text.";

/// User instruction accompanying the uploaded photo.
pub const ANALYSIS_USER_PROMPT: &str =
    "Analyze the attached image. Identify the food item and estimate how many days until it expires.";

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Normalized chat-completion request understood by the AI microservice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatPayload {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub provider_type: String,
    pub api_key: String,
    pub model_url: String,
    pub stream: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<Value>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub think: bool,
}

impl ChatPayload {
    /// Payload carrying the configured provider settings.
    pub fn new(config: &AiConfig, model: &str, messages: Vec<ChatMessage>, stream: bool) -> Self {
        Self {
            model: model.to_string(),
            messages,
            provider_type: config.provider.clone(),
            api_key: config.api_key.clone(),
            model_url: config.api_base.clone(),
            stream,
            format: None,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            think: config.think,
        }
    }

    /// Constrain the output to a JSON schema.
    pub fn with_format(mut self, schema: Value) -> Self {
        self.format = Some(schema);
        self
    }
}

/// JSON schema the image analysis output must match.
pub fn analysis_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "item": { "type": "string" },
            "expiration_days": { "type": "integer" },
            "notes": { "type": ["string", "null"] }
        },
        "required": ["item", "expiration_days", "notes"],
        "additionalProperties": false
    })
}

/// Buffered payload for analyzing one food photo.
pub fn analysis_payload(config: &AiConfig) -> ChatPayload {
    let messages = vec![
        ChatMessage::system(ANALYSIS_SYSTEM_PROMPT),
        ChatMessage::user(ANALYSIS_USER_PROMPT),
    ];
    ChatPayload::new(config, &config.vision_model, messages, false).with_format(analysis_schema())
}
