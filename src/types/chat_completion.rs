use serde::{Deserialize, Serialize};

use crate::types::{ChatMessage, ChatRole};

/// Body of a `POST chat/completions` request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatCompletionRequest {
    /// The model identifier, as returned by the model listing.
    pub model: String,

    /// Conversation so far, system prompt first.
    pub messages: Vec<ChatMessage>,

    /// Always `false`; replies arrive in a single body.
    #[serde(default)]
    pub stream: bool,
}

impl ChatCompletionRequest {
    /// Create a new non-streaming request.
    pub fn new(model: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self {
            model: model.into(),
            messages,
            stream: false,
        }
    }
}

/// The message carried in a completion choice.
///
/// The content may be null, e.g. when the model stopped before producing text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceMessage {
    /// Role of the author, normally `assistant`.
    pub role: ChatRole,

    /// Text of the reply.
    #[serde(default)]
    pub content: Option<String>,
}

/// One candidate completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    /// Index of this choice.
    #[serde(default)]
    pub index: u32,

    /// The generated message.
    pub message: ChoiceMessage,

    /// Why generation stopped (`stop`, `length`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

/// Token accounting reported with a completion.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionUsage {
    /// Tokens in the prompt.
    #[serde(default)]
    pub prompt_tokens: u64,

    /// Tokens in the generated reply.
    #[serde(default)]
    pub completion_tokens: u64,

    /// Sum of the two.
    #[serde(default)]
    pub total_tokens: u64,
}

/// Body of a successful `POST chat/completions` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatCompletionResponse {
    /// Server-assigned completion id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Model that served the request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Candidate completions; the first one is used.
    pub choices: Vec<Choice>,

    /// Token usage, when reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<CompletionUsage>,
}

impl ChatCompletionResponse {
    /// Text of the first choice, if the server produced any.
    pub fn text(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|choice| choice.message.content.as_deref())
    }
}
