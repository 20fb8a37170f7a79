//! The two upstream services the chat core depends on.
//!
//! [`ModelCatalog`] answers "which models can this credential use" once per
//! session, and [`CompletionClient`] turns a bounded history plus a question into
//! a reply.  [`crate::Groq`] implements both; tests substitute in-memory fakes.

use crate::error::Result;
use crate::types::ChatMessage;

/// Source of the model identifiers available to the configured credential.
#[async_trait::async_trait]
pub trait ModelCatalog: Send + Sync {
    /// Lists model identifiers in upstream order.
    async fn list_models(&self) -> Result<Vec<String>>;
}

/// A single-shot chat completion service.
#[async_trait::async_trait]
pub trait CompletionClient: Send + Sync {
    /// Sends one request and returns the reply text.
    async fn complete(&self, request: CompletionRequest) -> Result<String>;
}

/// Everything a completion client needs to answer one turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    /// Instruction placed ahead of the history.
    pub system_instruction: String,
    /// Recent conversation, oldest first.
    pub history: Vec<ChatMessage>,
    /// The message being answered.
    pub question: String,
    /// Model identifier to answer with.
    pub model: String,
}

impl CompletionRequest {
    /// Flattens the request into wire messages: system, history, then question.
    ///
    /// The question is the newest history entry as well, so it appears twice.
    /// Replies are tuned against that layout.
    pub fn into_messages(self) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(self.history.len() + 2);
        messages.push(ChatMessage::system(self.system_instruction));
        messages.extend(self.history);
        messages.push(ChatMessage::user(self.question));
        messages
    }
}
