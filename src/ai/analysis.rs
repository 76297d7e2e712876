//! Decoding of image analysis output.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{ProxyError, ProxyResult};

/// Structured description of one grocery item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub item: String,
    pub expiration_days: i64,
    /// Must be present in the model output, though it may be null.
    #[serde(deserialize_with = "present_or_null")]
    pub notes: Option<String>,
}

fn present_or_null<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer)
}

/// Pull the generated text out of a microservice response.
///
/// Checked in order: `text`, `content`, `message.content`, `response`.
pub fn extract_text(response: &Value) -> Option<&str> {
    response
        .get("text")
        .and_then(Value::as_str)
        .or_else(|| response.get("content").and_then(Value::as_str))
        .or_else(|| response.pointer("/message/content").and_then(Value::as_str))
        .or_else(|| response.get("response").and_then(Value::as_str))
}

/// Strip a surrounding markdown code fence (```json or ```), if any.
pub fn strip_code_fence(text: &str) -> &str {
    let mut inner = text.trim();
    if let Some(rest) = inner.strip_prefix("```") {
        inner = rest
            .strip_prefix("json")
            .or_else(|| rest.strip_prefix("JSON"))
            .unwrap_or(rest);
    }
    if let Some(rest) = inner.trim_end().strip_suffix("```") {
        inner = rest;
    }
    inner.trim()
}

/// Decode a complete microservice response into an [`AnalysisResult`].
pub fn parse_analysis(response: &Value) -> ProxyResult<AnalysisResult> {
    let text = extract_text(response).ok_or_else(|| ProxyError::Parse {
        what: "analysis response",
        reason: "no text field in response".to_string(),
        raw: response.to_string(),
    })?;

    serde_json::from_str(strip_code_fence(text)).map_err(|e| ProxyError::Parse {
        what: "analysis result",
        reason: e.to_string(),
        raw: text.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn apple() -> AnalysisResult {
        AnalysisResult {
            item: "Apple".to_string(),
            expiration_days: 7,
            notes: None,
        }
    }

    #[test]
    fn test_fenced_json() {
        let response = json!({
            "text": "```json\n{\"item\":\"Apple\",\"expiration_days\":7,\"notes\":null}\n```"
        });
        assert_eq!(parse_analysis(&response).unwrap(), apple());
    }

    #[test]
    fn test_plain_fence_and_unfenced() {
        let plain = json!({"text": "```\n{\"item\":\"Apple\",\"expiration_days\":7,\"notes\":null}\n```"});
        assert_eq!(parse_analysis(&plain).unwrap(), apple());

        let bare = json!({"text": " {\"item\":\"Apple\",\"expiration_days\":7,\"notes\":null} "});
        assert_eq!(parse_analysis(&bare).unwrap(), apple());
    }

    #[test]
    fn test_fallback_text_fields() {
        let nested = json!({"message": {"role": "assistant", "content": "{\"item\":\"Apple\",\"expiration_days\":7,\"notes\":null}"}});
        assert_eq!(parse_analysis(&nested).unwrap(), apple());

        let response = json!({"response": "{\"item\":\"Pear\",\"expiration_days\":4,\"notes\":\"Keep cool\"}"});
        let result = parse_analysis(&response).unwrap();
        assert_eq!(result.item, "Pear");
        assert_eq!(result.notes.as_deref(), Some("Keep cool"));
    }

    #[test]
    fn test_invalid_json_is_parse_error() {
        let response = json!({"text": "```json\n{\"item\":\"Apple\",\"expiration_days\":\n```"});
        assert!(matches!(parse_analysis(&response), Err(ProxyError::Parse { .. })));
    }

    #[test]
    fn test_missing_notes_is_parse_error() {
        let response = json!({"text": "{\"item\":\"Apple\",\"expiration_days\":7}"});
        assert!(matches!(parse_analysis(&response), Err(ProxyError::Parse { .. })));
    }

    #[test]
    fn test_non_integer_days_is_parse_error() {
        let response = json!({"text": "{\"item\":\"Apple\",\"expiration_days\":\"a week\",\"notes\":null}"});
        assert!(parse_analysis(&response).is_err());
    }

    #[test]
    fn test_missing_text_field() {
        let err = parse_analysis(&json!({"status": "ok"})).unwrap_err();
        assert!(err.to_string().contains("no text field"));
    }

    #[test]
    fn test_strip_code_fence_untouched_text() {
        assert_eq!(strip_code_fence("  {\"a\":1}\n"), "{\"a\":1}");
    }
}
