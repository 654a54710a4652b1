//! Chat-completions client for the symptom and medication assistants.
//!
//! Talks to any OpenAI-compatible endpoint (`{base_url}/chat/completions`).
//! Callers pass a system role and a user prompt; the reply comes back as
//! plain text for the forgiving parsers downstream.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from a chat-completion call.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Cannot reach chat API at {0}")]
    Connection(String),
    #[error("Request timed out after {0}s")]
    Timeout(u64),
    #[error("HTTP client error: {0}")]
    HttpClient(String),
    #[error("Chat API returned {status}: {body}")]
    Api { status: u16, body: String },
    #[error("Failed to parse chat API response: {0}")]
    ResponseParsing(String),
    #[error("Chat API returned no choices")]
    EmptyResponse,
}

/// HTTP client for chat-completion requests.
pub struct ChatClient {
    base_url: String,
    api_key: String,
    model: String,
    client: reqwest::Client,
    timeout_secs: u64,
}

/// Sampling options for a single request.
#[derive(Debug, Clone, Copy)]
pub struct ChatOptions {
    pub temperature: f32,
    pub max_tokens: Option<u32>,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}

impl ChatClient {
    /// Create a client for the given endpoint and model.
    pub fn new(base_url: &str, api_key: &str, model: &str, timeout_secs: u64) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            client,
            timeout_secs,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send one system+user exchange and return the reply text.
    pub async fn chat(
        &self,
        system: &str,
        user: &str,
        options: ChatOptions,
    ) -> Result<String, LlmError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            temperature: options.temperature,
            max_tokens: options.max_tokens,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    LlmError::Connection(self.base_url.clone())
                } else if e.is_timeout() {
                    LlmError::Timeout(self.timeout_secs)
                } else {
                    LlmError::HttpClient(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::ResponseParsing(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or(LlmError::EmptyResponse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_body_serializes_roles_in_order() {
        let body = ChatRequest {
            model: "gpt-4",
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: "你是导诊助手",
                },
                ChatMessage {
                    role: "user",
                    content: "我头疼",
                },
            ],
            temperature: 0.3,
            max_tokens: Some(1000),
        };
        let json = serde_json::to_string(&body).unwrap();
        assert!(json.contains("\"role\":\"system\""));
        assert!(json.contains("\"max_tokens\":1000"));
        assert!(json.find("system").unwrap() < json.find("user").unwrap());
    }

    #[test]
    fn max_tokens_omitted_when_unset() {
        let body = ChatRequest {
            model: "gpt-4",
            messages: vec![],
            temperature: 0.2,
            max_tokens: None,
        };
        let json = serde_json::to_string(&body).unwrap();
        assert!(!json.contains("max_tokens"));
    }

    #[test]
    fn response_parses_first_choice() {
        let raw = r#"{"choices":[{"message":{"role":"assistant","content":"【推荐科室】内科"}}]}"#;
        let parsed: ChatResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.choices[0].message.content, "【推荐科室】内科");
    }

    #[test]
    fn trailing_slash_trimmed_from_base_url() {
        let client = ChatClient::new("https://api.example.com/v1/", "key", "gpt-4", 30);
        assert_eq!(client.base_url, "https://api.example.com/v1");
    }
}
