//! OpenAI-compatible chat completion client (https://api.openai.com/v1 by default).
//! Non-streaming: one POST per prompt, first choice wins.

use crate::llm::CompletionBackend;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Baseline model requested when none is configured.
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

/// Client for an OpenAI-compatible chat completion API.
#[derive(Clone)]
pub struct OpenAiClient {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
    #[error("completion request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("completion api error: {0}")]
    Api(String),
    #[error("completion response malformed: {0}")]
    Malformed(String),
}

impl OpenAiClient {
    pub fn new(api_key: impl Into<String>, base_url: Option<String>) -> Self {
        let base_url = base_url
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Self {
            base_url,
            api_key: api_key.into(),
            client: reqwest::Client::new(),
        }
    }

    /// POST /chat/completions — non-streaming chat completion.
    pub async fn chat(
        &self,
        model: &str,
        messages: Vec<ChatMessage>,
    ) -> Result<ChatResponse, CompletionError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = ChatRequest {
            model: model.to_string(),
            messages,
        };
        let res = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(CompletionError::Api(format!("{} {}", status, body)));
        }
        let data: ChatResponse = res.json().await?;
        Ok(data)
    }
}

#[async_trait]
impl CompletionBackend for OpenAiClient {
    async fn complete(
        &self,
        model: &str,
        messages: Vec<ChatMessage>,
    ) -> Result<String, CompletionError> {
        let res = self.chat(model, messages).await?;
        match res.content() {
            Some(text) if !text.trim().is_empty() => Ok(text.to_string()),
            _ => Err(CompletionError::Malformed(
                "no assistant content in response".to_string(),
            )),
        }
    }
}

/// One (role, content) pair in a chat completion request or response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatChoice {
    pub message: ChatMessage,
}

impl ChatResponse {
    /// Text content of the first choice's message, if any.
    pub fn content(&self) -> Option<&str> {
        self.choices.first().map(|c| c.message.content.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_completion_response() {
        let json = r#"{
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "choices": [
                { "index": 0, "message": { "role": "assistant", "content": "4" }, "finish_reason": "stop" }
            ],
            "usage": { "prompt_tokens": 10, "completion_tokens": 1, "total_tokens": 11 }
        }"#;
        let res: ChatResponse = serde_json::from_str(json).expect("parse response");
        assert_eq!(res.content(), Some("4"));
    }

    #[test]
    fn empty_choices_has_no_content() {
        let res: ChatResponse = serde_json::from_str(r#"{"choices": []}"#).expect("parse");
        assert_eq!(res.content(), None);
        let res: ChatResponse = serde_json::from_str("{}").expect("parse");
        assert_eq!(res.content(), None);
    }

    #[test]
    fn request_serializes_single_user_message() {
        let body = ChatRequest {
            model: "gpt-3.5-turbo".to_string(),
            messages: vec![ChatMessage::user("what is 2+2")],
        };
        let v = serde_json::to_value(&body).expect("serialize request");
        assert_eq!(v["model"], "gpt-3.5-turbo");
        assert_eq!(v["messages"][0]["role"], "user");
        assert_eq!(v["messages"][0]["content"], "what is 2+2");
    }
}
