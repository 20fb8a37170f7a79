// Public modules
pub mod chat_completion;
pub mod chat_message;
pub mod model_info;
pub mod model_list_response;

// Re-exports
pub use chat_completion::{
    ChatCompletionRequest, ChatCompletionResponse, Choice, ChoiceMessage, CompletionUsage,
};
pub use chat_message::{ChatMessage, ChatRole};
pub use model_info::ModelInfo;
pub use model_list_response::ModelListResponse;
