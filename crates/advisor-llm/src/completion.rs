//! Chat completion request and response

use crate::Message;
use serde::{Deserialize, Serialize};

/// Tokens generated when the caller does not say otherwise
pub const DEFAULT_MAX_TOKENS: usize = 1024;

/// One chat completion call: a persona, the conversation and sampling settings
///
/// Built with chained `with_*` calls:
///
/// ```rust
/// use advisor_llm::{CompletionRequest, Message};
///
/// let request = CompletionRequest::new("gpt-4")
///     .with_system("You answer questions about listed companies.")
///     .with_message(Message::user("Summarise AAPL"))
///     .with_temperature(0.7);
/// assert_eq!(request.messages.len(), 1);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<Message>,

    /// Sent ahead of `messages` as a system turn
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    pub max_tokens: usize,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl CompletionRequest {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            messages: Vec::new(),
            system: None,
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: None,
        }
    }

    pub fn with_system(mut self, persona: impl Into<String>) -> Self {
        self.system = Some(persona.into());
        self
    }

    pub fn with_message(mut self, message: Message) -> Self {
        self.messages.push(message);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Text of the latest user turn, if any
    pub fn last_user_text(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == crate::Role::User)
            .map(Message::text)
    }
}

/// What the model sent back
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    pub message: Message,
    pub stop_reason: StopReason,
    pub usage: TokenUsage,
}

impl CompletionResponse {
    /// Reply text exactly as the model sent it
    pub fn text(&self) -> &str {
        self.message.text()
    }

    /// The reply was cut off by the token limit
    pub fn is_truncated(&self) -> bool {
        self.stop_reason == StopReason::MaxTokens
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    EndTurn,
    MaxTokens,
    StopSequence,
    /// Output withheld by the provider's content filter
    ContentFilter,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: usize,
    pub output_tokens: usize,
}

impl TokenUsage {
    pub fn total(&self) -> usize {
        self.input_tokens + self.output_tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_defaults() {
        let request = CompletionRequest::new("gpt-4");
        assert_eq!(request.max_tokens, DEFAULT_MAX_TOKENS);
        assert!(request.system.is_none());
        assert!(request.temperature.is_none());
        assert!(request.last_user_text().is_none());
    }

    #[test]
    fn test_chained_request() {
        let request = CompletionRequest::new("gpt-4")
            .with_system("You are a financial analyst")
            .with_message(Message::user("first"))
            .with_message(Message::assistant("reply"))
            .with_message(Message::user("Analyze MSFT"))
            .with_max_tokens(2048)
            .with_temperature(0.7);

        assert_eq!(request.messages.len(), 3);
        assert_eq!(request.max_tokens, 2048);
        assert_eq!(request.temperature, Some(0.7));
        assert_eq!(request.system.as_deref(), Some("You are a financial analyst"));
        assert_eq!(request.last_user_text(), Some("Analyze MSFT"));
    }

    #[test]
    fn test_response_helpers() {
        let response = CompletionResponse {
            message: Message::assistant("  Hold.\n"),
            stop_reason: StopReason::MaxTokens,
            usage: TokenUsage {
                input_tokens: 100,
                output_tokens: 50,
            },
        };
        assert_eq!(response.text(), "  Hold.\n");
        assert!(response.is_truncated());
        assert_eq!(response.usage.total(), 150);
    }
}
