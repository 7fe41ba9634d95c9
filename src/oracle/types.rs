// Oracle request/response types

use serde::{Deserialize, Serialize};

/// A single completion request: system instruction, user prompt, and the
/// sampling/budget knobs the continuation protocol depends on.
#[derive(Debug, Clone)]
pub struct OracleRequest {
    pub system: String,
    pub prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Stop marker passed through to the service. The continuation driver
    /// also checks for it at the tail of each completion.
    pub stop: Option<String>,
}

impl OracleRequest {
    pub fn new(system: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            prompt: prompt.into(),
            temperature: super::DEFAULT_TEMPERATURE,
            max_tokens: super::MAX_TOKENS_PER_CALL,
            stop: Some(super::CONTINUATION_MARKER.to_string()),
        }
    }
}

/// One completion plus the finish indicator the service reported.
#[derive(Debug, Clone)]
pub struct OracleReply {
    pub text: String,
    /// True when the service signalled a natural stop ("stop" finish reason)
    /// rather than running out of its token budget.
    pub natural_stop: bool,
}

// Wire format for OpenAI-compatible chat-completion endpoints.

#[derive(Debug, Clone, Serialize)]
pub(crate) struct ChatRequest {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop: Option<Vec<String>>,
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ChatResponse {
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ChatChoice {
    pub message: ChatResponseMessage,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ChatResponseMessage {
    pub content: Option<String>,
}
