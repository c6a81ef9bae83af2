//! The "Goldie" chat assistant.

use std::fmt::Write as _;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::client::{ChatMessage, CompletionProvider};
use crate::error::AssistantResult;

const SYSTEM_PROMPT: &str = include_str!("prompts/chat_system.txt");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Speaker,
    pub content: String,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Speaker::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Speaker::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatOutput {
    pub response: String,
}

pub struct ChatFlow {
    provider: Arc<dyn CompletionProvider>,
}

impl ChatFlow {
    pub fn new(provider: Arc<dyn CompletionProvider>) -> Self {
        Self { provider }
    }

    /// History as `User:` / `Goldie:` lines, then the question.
    pub fn render(history: &[ChatTurn], message: &str) -> String {
        let mut prompt = String::from("History:\n");
        for turn in history {
            let speaker = match turn.role {
                Speaker::User => "User",
                Speaker::Assistant => "Goldie",
            };
            let _ = writeln!(prompt, "{speaker}: {}", turn.content);
        }
        let _ = write!(prompt, "\nCurrent Question: {message}");
        prompt
    }

    pub async fn respond(&self, history: &[ChatTurn], message: &str) -> AssistantResult<ChatOutput> {
        let messages = [
            ChatMessage::system(SYSTEM_PROMPT.trim_end()),
            ChatMessage::user(Self::render(history, message)),
        ];
        tracing::debug!(turns = history.len(), "asking assistant");
        let response = self.provider.complete(&messages).await?;
        Ok(ChatOutput { response })
    }
}

/// Conversation shown in the chat panel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatState {
    pub messages: Vec<ChatTurn>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Parse a stored conversation. Fails with "Invalid chat history." on any
/// shape mismatch.
pub fn parse_history(raw: &str) -> Result<Vec<ChatTurn>, String> {
    serde_json::from_str(raw).map_err(|_| "Invalid chat history.".to_string())
}

/// Submit `message` on top of `previous`.
///
/// The user's turn is kept even when the assistant fails; failures only set
/// `error`.
pub async fn chat_action(flow: &ChatFlow, previous: ChatState, message: &str) -> ChatState {
    if message.is_empty() {
        return ChatState {
            error: Some("Message cannot be empty.".to_string()),
            ..previous
        };
    }

    let history = previous.messages;
    let mut messages = history.clone();
    messages.push(ChatTurn::user(message));

    match flow.respond(&history, message).await {
        Ok(output) if !output.response.is_empty() => {
            messages.push(ChatTurn::assistant(output.response));
            ChatState {
                messages,
                error: None,
            }
        }
        Ok(_) => ChatState {
            messages,
            error: Some("The AI did not provide a response.".to_string()),
        },
        Err(e) => {
            tracing::warn!(error = %e, "assistant request failed");
            ChatState {
                messages,
                error: Some(format!("Error communicating with AI: {e}")),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::StaticCompletionProvider;

    fn flow(provider: StaticCompletionProvider) -> (ChatFlow, Arc<StaticCompletionProvider>) {
        let provider = Arc::new(provider);
        (ChatFlow::new(provider.clone()), provider)
    }

    #[test]
    fn render_labels_speakers() {
        let prompt = ChatFlow::render(
            &[ChatTurn::user("Where are the mops?"), ChatTurn::assistant("Closet B.")],
            "And the buckets?",
        );
        assert_eq!(
            prompt,
            "History:\nUser: Where are the mops?\nGoldie: Closet B.\n\nCurrent Question: And the buckets?"
        );
    }

    #[test]
    fn history_parsing() {
        let turns = parse_history(r#"[{"role":"user","content":"hi"},{"role":"assistant","content":"hello"}]"#)
            .unwrap();
        assert_eq!(turns, vec![ChatTurn::user("hi"), ChatTurn::assistant("hello")]);
        assert_eq!(
            parse_history(r#"[{"role":"model","content":"x"}]"#).unwrap_err(),
            "Invalid chat history."
        );
    }

    #[tokio::test]
    async fn empty_message_keeps_state() {
        let (flow, provider) = flow(StaticCompletionProvider::new());
        let previous = ChatState {
            messages: vec![ChatTurn::user("hi")],
            error: None,
        };
        let next = chat_action(&flow, previous.clone(), "").await;
        assert_eq!(next.messages, previous.messages);
        assert_eq!(next.error.as_deref(), Some("Message cannot be empty."));
        assert!(provider.requests().is_empty());
    }

    #[tokio::test]
    async fn reply_is_appended() {
        let (flow, provider) = flow(StaticCompletionProvider::replying("Closet B."));
        let next = chat_action(&flow, ChatState::default(), "Where are the mops?").await;
        assert_eq!(
            next.messages,
            vec![ChatTurn::user("Where are the mops?"), ChatTurn::assistant("Closet B.")]
        );
        assert!(next.error.is_none());

        let requests = provider.requests();
        assert_eq!(requests[0][0].role, "system");
        assert!(requests[0][0].content.contains("Your name is Goldie."));
        assert!(requests[0][1].content.ends_with("Current Question: Where are the mops?"));
    }

    #[tokio::test]
    async fn failure_keeps_user_turn() {
        let (flow, _) = flow(StaticCompletionProvider::failing("overloaded"));
        let next = chat_action(&flow, ChatState::default(), "Hello").await;
        assert_eq!(next.messages, vec![ChatTurn::user("Hello")]);
        let error = next.error.unwrap();
        assert!(error.starts_with("Error communicating with AI: "));
        assert!(error.contains("overloaded"));
    }

    #[tokio::test]
    async fn blank_reply_is_reported() {
        let (flow, _) = flow(StaticCompletionProvider::replying(""));
        let next = chat_action(&flow, ChatState::default(), "Hello").await;
        assert_eq!(next.messages.len(), 1);
        assert_eq!(
            next.error.as_deref(),
            Some("The AI did not provide a response.")
        );
    }
}
