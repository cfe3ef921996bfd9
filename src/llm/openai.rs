use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::LlmClient;

pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "o3-mini";
pub const DEFAULT_TEMPERATURE: f32 = 1.0;

/// Generation parameters, fixed for the whole session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub endpoint: String,
    pub model: String,
    pub temperature: f32,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Client for an OpenAI-compatible `POST /v1/chat/completions` endpoint.
///
/// Each prompt is sent as a single user message with no retained history.
pub struct ChatCompletionsClient {
    http: Client,
    config: ServiceConfig,
    api_key: Option<String>,
}

impl ChatCompletionsClient {
    pub fn new(config: ServiceConfig, api_key: Option<String>) -> Self {
        Self {
            http: Client::new(),
            config,
            api_key,
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }
}

#[async_trait]
impl LlmClient for ChatCompletionsClient {
    async fn query(&self, prompt: &str) -> Result<String> {
        let request = ChatCompletionRequest {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.config.temperature,
        };

        log::debug!(
            "Querying {} ({} chars of prompt)",
            self.config.model,
            prompt.len()
        );

        let mut builder = self.http.post(&self.config.endpoint).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder
            .send()
            .await
            .context("chat completion request failed")?
            .error_for_status()
            .context("chat completion non-2xx response")?
            .json::<ChatCompletionResponse>()
            .await
            .context("chat completion response decode failed")?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .context("chat completion returned no content")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_serializes_single_user_message() {
        let request = ChatCompletionRequest {
            model: "o3-mini",
            messages: vec![ChatMessage {
                role: "user",
                content: "hello",
            }],
            temperature: 1.0,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "model": "o3-mini",
                "messages": [{"role": "user", "content": "hello"}],
                "temperature": 1.0
            })
        );
    }

    #[test]
    fn response_content_is_extracted() {
        let body = r#"{"choices": [{"message": {"role": "assistant", "content": "{}"}}]}"#;
        let parsed: ChatCompletionResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.choices[0].message.content.as_deref(), Some("{}"));
    }

    #[test]
    fn service_config_fills_defaults() {
        let config: ServiceConfig = serde_json::from_str(r#"{"model": "gpt-4o"}"#).unwrap();
        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
    }
}
