//! OpenAI-style chat completion payloads, shared by the OpenAI adapter and
//! the DeepSeek relay (which forwards to an OpenAI-compatible endpoint).

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Serialize)]
pub(crate) struct ChatRequest {
    pub messages: Vec<Message>,
    pub model: String,
}

impl ChatRequest {
    /// A system instruction followed by the text to translate.
    pub fn translation(model: &str, system_prompt: &str, text: &str) -> Self {
        Self {
            messages: vec![
                Message {
                    role: "system".to_string(),
                    content: system_prompt.to_string(),
                },
                Message {
                    role: "user".to_string(),
                    content: text.to_string(),
                },
            ],
            model: model.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct Message {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

impl ChatResponse {
    /// Text of the first choice, if the backend returned one.
    pub fn into_text(self) -> Option<String> {
        self.choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.unwrap_or_default().trim().to_string())
    }
}

/// Pull a human-readable message out of an error body.
///
/// Understands `{"error": "..."}`, `{"error": {"message": "..."}}` and
/// `{"message": "..."}`.
pub(crate) fn error_message(body: &Value) -> Option<String> {
    match body.get("error") {
        Some(Value::String(s)) => return Some(s.clone()),
        Some(Value::Object(obj)) => {
            if let Some(Value::String(s)) = obj.get("message") {
                return Some(s.clone());
            }
            return Some(Value::Object(obj.clone()).to_string());
        }
        Some(Value::Null) | None => {}
        Some(other) => return Some(other.to_string()),
    }

    body.get("message").and_then(Value::as_str).map(str::to_string)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_message_shapes() {
        assert_eq!(error_message(&json!({"error": "bad key"})).as_deref(), Some("bad key"));
        assert_eq!(
            error_message(&json!({"error": {"message": "quota", "type": "x"}})).as_deref(),
            Some("quota")
        );
        assert_eq!(error_message(&json!({"message": "nope"})).as_deref(), Some("nope"));
        assert_eq!(error_message(&json!({"error": null, "choices": []})), None);
        assert_eq!(error_message(&json!({"choices": []})), None);
    }

    #[test]
    fn test_first_choice_is_trimmed() {
        let response: ChatResponse = serde_json::from_value(json!({
            "choices": [{"message": {"content": "  Olá mundo \n"}}, {"message": {"content": "x"}}]
        }))
        .unwrap();
        assert_eq!(response.into_text().as_deref(), Some("Olá mundo"));
    }

    #[test]
    fn test_no_choices() {
        let response: ChatResponse = serde_json::from_value(json!({})).unwrap();
        assert_eq!(response.into_text(), None);
    }

    #[test]
    fn test_request_shape() {
        let request = ChatRequest::translation("deepseek-chat", "sys", "hello");
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            json!({
                "messages": [
                    {"role": "system", "content": "sys"},
                    {"role": "user", "content": "hello"}
                ],
                "model": "deepseek-chat"
            })
        );
    }
}
