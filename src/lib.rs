// Public modules
pub mod backend;
pub mod chat;
pub mod client;
pub mod client_logger;
pub mod env_file;
pub mod error;
pub mod observability;
pub mod types;

// Re-exports
pub use backend::{CompletionClient, CompletionRequest, ModelCatalog};
pub use client::Groq;
pub use client_logger::{ClientLogger, TracingClientLogger};
pub use env_file::EnvFile;
pub use error::{Error, Result};
pub use observability::register_biometrics;
pub use types::*;
