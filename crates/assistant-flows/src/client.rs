//! Completion endpoint client.

use std::collections::hash_map::DefaultHasher;
use std::collections::VecDeque;
use std::hash::{Hash, Hasher};

use async_trait::async_trait;
use facility_config::LlmSettings;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::error::{AssistantError, AssistantResult};

fn summarize_response_body(body: &str) -> String {
    let mut hasher = DefaultHasher::new();
    body.hash(&mut hasher);
    format!("len={},digest={:016x}", body.len(), hasher.finish())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Anything that turns a message list into one completion.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(&self, messages: &[ChatMessage]) -> AssistantResult<String>;
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: MessageResponse,
}

#[derive(Debug, Deserialize)]
struct MessageResponse {
    #[serde(default)]
    content: Option<String>,
}

/// Client for any `/chat/completions` endpoint speaking the OpenAI format.
#[derive(Clone)]
pub struct OpenAiCompatibleClient {
    http_client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: u32,
}

impl OpenAiCompatibleClient {
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            max_tokens: 1024,
        }
    }

    /// # Errors
    /// Returns `AssistantError::MissingApiKey` when no key is configured.
    pub fn from_settings(settings: &LlmSettings) -> AssistantResult<Self> {
        let api_key = settings
            .api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or(AssistantError::MissingApiKey)?;
        Ok(Self::new(api_key, &settings.base_url, &settings.model))
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

impl std::fmt::Debug for OpenAiCompatibleClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiCompatibleClient")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl CompletionProvider for OpenAiCompatibleClient {
    async fn complete(&self, messages: &[ChatMessage]) -> AssistantResult<String> {
        let request = ChatCompletionRequest {
            model: &self.model,
            messages,
            max_tokens: self.max_tokens,
            temperature: 0.3,
        };

        tracing::debug!(model = %self.model, messages = messages.len(), "sending completion request");

        let response = self
            .http_client
            .post(self.completions_url())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            let body_summary = summarize_response_body(&body);
            tracing::error!(status, body_summary = %body_summary, "completion API error");
            return Err(AssistantError::ApiError {
                status,
                message: format!("upstream error ({body_summary})"),
            });
        }

        let completion: ChatCompletionResponse = response.json().await?;
        let content = completion
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AssistantError::InvalidResponse("No choices in response".to_string()))?
            .message
            .content
            .unwrap_or_default();

        tracing::info!(chars = content.len(), "completion received");
        Ok(content.trim().to_string())
    }
}

/// Replies from a fixed script and records every request.
#[derive(Default)]
pub struct StaticCompletionProvider {
    replies: Mutex<VecDeque<Result<String, String>>>,
    requests: Mutex<Vec<Vec<ChatMessage>>>,
}

impl StaticCompletionProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replying(text: impl Into<String>) -> Self {
        let provider = Self::new();
        provider.push_reply(text);
        provider
    }

    pub fn failing(message: impl Into<String>) -> Self {
        let provider = Self::new();
        provider.push_failure(message);
        provider
    }

    pub fn push_reply(&self, text: impl Into<String>) {
        self.replies.lock().push_back(Ok(text.into()));
    }

    pub fn push_failure(&self, message: impl Into<String>) {
        self.replies.lock().push_back(Err(message.into()));
    }

    pub fn requests(&self) -> Vec<Vec<ChatMessage>> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl CompletionProvider for StaticCompletionProvider {
    async fn complete(&self, messages: &[ChatMessage]) -> AssistantResult<String> {
        self.requests.lock().push(messages.to_vec());
        match self.replies.lock().pop_front() {
            Some(Ok(text)) => Ok(text),
            Some(Err(message)) => Err(AssistantError::ApiError {
                status: 503,
                message,
            }),
            None => Err(AssistantError::InvalidResponse(
                "no scripted reply left".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serialization() {
        let messages = vec![ChatMessage::user("Hello")];
        let request = ChatCompletionRequest {
            model: "llama-3.1-8b-instant",
            messages: &messages,
            max_tokens: 32,
            temperature: 0.3,
        };

        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("llama-3.1-8b-instant"));
        assert!(json.contains(r#""role":"user""#));
        assert!(json.contains("Hello"));
    }

    #[test]
    fn test_from_settings_requires_key() {
        let mut settings = LlmSettings::default();
        assert!(matches!(
            OpenAiCompatibleClient::from_settings(&settings),
            Err(AssistantError::MissingApiKey)
        ));

        settings.api_key = Some(String::new());
        assert!(OpenAiCompatibleClient::from_settings(&settings).is_err());

        settings.api_key = Some("k".into());
        settings.base_url = "https://llm.local/v1/".into();
        let client = OpenAiCompatibleClient::from_settings(&settings).unwrap();
        assert_eq!(client.completions_url(), "https://llm.local/v1/chat/completions");
    }

    #[test]
    fn test_debug_hides_key() {
        let client = OpenAiCompatibleClient::new("secret", "https://x", "m");
        assert!(!format!("{client:?}").contains("secret"));
    }

    #[test]
    fn test_summary_does_not_leak_body() {
        let summary = summarize_response_body("api key sk-123 invalid");
        assert!(summary.starts_with("len=22,"));
        assert!(!summary.contains("sk-123"));
    }

    #[tokio::test]
    async fn test_static_provider_scripts_replies() {
        let provider = StaticCompletionProvider::replying("hi");
        provider.push_failure("down");

        assert_eq!(provider.complete(&[ChatMessage::user("a")]).await.unwrap(), "hi");
        assert!(provider.complete(&[]).await.is_err());
        assert!(provider.complete(&[]).await.is_err());
        assert_eq!(provider.requests().len(), 3);
    }
}
