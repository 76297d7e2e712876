//! Pantry chat request and context rendering.

use chrono::DateTime;
use serde::Deserialize;
use serde_json::Value;

use crate::ai::payload::{ChatMessage, ChatPayload};
use crate::config::AiConfig;
use crate::error::{ProxyError, ProxyResult};

/// One Food row as sent by the front end.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PantryItem {
    #[serde(rename = "Name", alias = "name")]
    pub name: String,
    #[serde(rename = "Quantity", alias = "quantity", default)]
    pub quantity: Value,
    /// Unix timestamp in seconds.
    #[serde(rename = "Expiration", alias = "expiration", default)]
    pub expiration: Value,
}

/// Inbound pantry chat body.
#[derive(Debug, Clone, Deserialize)]
pub struct PantryChatRequest {
    pub items: Option<Vec<PantryItem>>,
    pub message: Option<String>,
}

impl PantryChatRequest {
    /// Both fields are required; an empty item list is allowed.
    pub fn into_parts(self) -> ProxyResult<(Vec<PantryItem>, String)> {
        match (self.items, self.message) {
            (Some(items), Some(message)) if !message.trim().is_empty() => Ok((items, message)),
            _ => Err(ProxyError::validation("items and message are required")),
        }
    }
}

fn render_quantity(quantity: &Value) -> String {
    match quantity {
        Value::Number(n) => n.to_string(),
        Value::String(s) if !s.trim().is_empty() => s.trim().to_string(),
        _ => "?".to_string(),
    }
}

/// UTC calendar date (`YYYY-MM-DD`) of an expiration timestamp.
fn render_expiration(expiration: &Value) -> String {
    let seconds = match expiration {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => match s.trim().parse::<i64>() {
            Ok(secs) => Some(secs),
            // Already a date string.
            Err(_) if !s.trim().is_empty() => return s.trim().to_string(),
            Err(_) => None,
        },
        _ => None,
    };

    seconds
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .map(|date| date.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "unknown date".to_string())
}

/// Render the inventory, one line per item.
pub fn render_context(items: &[PantryItem]) -> String {
    if items.is_empty() {
        return "The pantry is empty.".to_string();
    }

    items
        .iter()
        .map(|item| {
            format!(
                "{} (x{}) expiring on {}",
                item.name,
                render_quantity(&item.quantity),
                render_expiration(&item.expiration)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// System message grounding the conversation in the inventory.
pub fn system_prompt(context: &str) -> String {
    format!(
        "You are a helpful kitchen assistant. Answer the user's question using \
         the pantry inventory below. Prefer ingredients that expire soonest and \
         say so when something the user asks about is not in the pantry.\n\n\
         Pantry inventory:\n{context}"
    )
}

/// Streaming payload for one pantry question.
pub fn pantry_chat_payload(config: &AiConfig, items: &[PantryItem], message: &str) -> ChatPayload {
    let messages = vec![
        ChatMessage::system(system_prompt(&render_context(items))),
        ChatMessage::user(message),
    ];
    ChatPayload::new(config, &config.chat_model, messages, true)
}
