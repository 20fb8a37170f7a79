//! Interactive chat with a windowed conversation memory.
//!
//! This module provides the REPL-facing pieces of groqchat:
//!
//! - A per-session transcript that only ever grows or is cleared whole
//! - A turn processor that forwards the last N messages to the model
//! - Slash commands for session control
//! - Configurable model, memory window, and system instruction
//!
//! # Architecture
//!
//! The module is organized into several components:
//!
//! - [`config`]: CLI argument parsing, YAML config, and defaults
//! - [`transcript`]: the ordered message log
//! - [`session`]: transcript plus selected model and memory window
//! - [`turn`]: one request per user message, errors folded into the transcript
//! - [`commands`]: slash command parsing
//! - [`render`]: terminal output

mod commands;
mod config;
mod render;
mod session;
mod transcript;
mod turn;

pub use commands::{ChatCommand, help_text, parse_command};
pub use config::{ChatArgs, ChatConfig, ConfigFile};
pub use render::{PlainTextRenderer, Renderer};
pub use session::{MemoryWindow, Session, SessionConfig, SessionStats, resolve_model};
pub use transcript::{Message, Role, Transcript};
pub use turn::{DEFAULT_SYSTEM_INSTRUCTION, TurnOutcome, TurnProcessor};
