//! Logging hook for Groq client operations.
//!
//! This module provides the [`ClientLogger`] trait that allows callers to capture
//! every API interaction passing through the [`Groq`](crate::Groq) client, and
//! [`TracingClientLogger`], which forwards them to `tracing` at debug level.

use crate::types::{ChatCompletionRequest, ChatCompletionResponse, ModelListResponse};

/// A trait for logging Groq client operations.
///
/// # Example
///
/// ```rust,ignore
/// use groqchat::{ClientLogger, ChatCompletionRequest, ChatCompletionResponse, ModelListResponse};
/// use std::sync::Mutex;
///
/// struct Recorder {
///     requests: Mutex<Vec<ChatCompletionRequest>>,
/// }
///
/// impl ClientLogger for Recorder {
///     fn log_request(&self, request: &ChatCompletionRequest) {
///         self.requests.lock().unwrap().push(request.clone());
///     }
///
///     fn log_response(&self, _: &ChatCompletionResponse) {}
///
///     fn log_models(&self, _: &ModelListResponse) {}
/// }
/// ```
pub trait ClientLogger: Send + Sync {
    /// Log an outgoing chat completion request, right before it is sent.
    fn log_request(&self, request: &ChatCompletionRequest);

    /// Log a successfully decoded chat completion response.
    fn log_response(&self, response: &ChatCompletionResponse);

    /// Log a successfully decoded model listing.
    fn log_models(&self, response: &ModelListResponse);
}

/// Forwards client traffic to `tracing` under the `groqchat::client` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingClientLogger;

impl ClientLogger for TracingClientLogger {
    fn log_request(&self, request: &ChatCompletionRequest) {
        tracing::debug!(
            target: "groqchat::client",
            model = %request.model,
            messages = request.messages.len(),
            "sending chat completion"
        );
    }

    fn log_response(&self, response: &ChatCompletionResponse) {
        let usage = response.usage.unwrap_or_default();
        tracing::debug!(
            target: "groqchat::client",
            id = response.id.as_deref().unwrap_or("-"),
            choices = response.choices.len(),
            prompt_tokens = usage.prompt_tokens,
            completion_tokens = usage.completion_tokens,
            "received chat completion"
        );
    }

    fn log_models(&self, response: &ModelListResponse) {
        tracing::debug!(
            target: "groqchat::client",
            models = response.models().len(),
            "received model listing"
        );
    }
}
