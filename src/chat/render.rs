//! Output rendering for the chat application.
//!
//! This module provides a trait-based rendering abstraction that allows
//! for different output styles. The default implementation uses ANSI
//! escape codes to set replies, errors, and status lines apart.

use std::io::{self, Stdout, Write};

use crate::chat::transcript::{Message, Role};

/// ANSI escape code for dim text (used for the pending-reply marker).
const ANSI_DIM: &str = "\x1b[2m";

/// ANSI escape code for bold text (used for speaker labels).
const ANSI_BOLD: &str = "\x1b[1m";

/// ANSI escape code to reset all styling.
const ANSI_RESET: &str = "\x1b[0m";

/// ANSI escape code for cyan text (used for informational lines).
const ANSI_CYAN: &str = "\x1b[36m";

/// ANSI escape code for red text (used for errors).
const ANSI_RED: &str = "\x1b[31m";

/// Trait for rendering chat output.
///
/// This abstraction allows for different rendering strategies:
/// - Plain text with ANSI styling
/// - Plain text without styling (for piping/redirecting)
pub trait Renderer: Send {
    /// Called before a request goes out.
    fn start_reply(&mut self) {}

    /// Print the assistant message that ended a turn.
    ///
    /// `is_error` is set when the message stands in for a failed request.
    fn print_reply(&mut self, message: &Message, is_error: bool);

    /// Print one transcript entry, e.g. for `/history`.
    fn print_entry(&mut self, message: &Message);

    /// Print an error message.
    fn print_error(&mut self, error: &str);

    /// Print an informational message.
    fn print_info(&mut self, info: &str);
}

/// Plain text renderer with optional ANSI styling.
///
/// This renderer outputs text directly to stdout with optional
/// ANSI escape codes for styling.
pub struct PlainTextRenderer {
    stdout: Stdout,
    use_color: bool,
    pending: bool,
}

impl PlainTextRenderer {
    /// Creates a new PlainTextRenderer with ANSI colors enabled.
    pub fn new() -> Self {
        Self::with_color(true)
    }

    /// Creates a new PlainTextRenderer with specified color setting.
    pub fn with_color(use_color: bool) -> Self {
        Self {
            stdout: io::stdout(),
            use_color,
            pending: false,
        }
    }

    /// Returns true when ANSI styling is enabled.
    pub fn use_color(&self) -> bool {
        self.use_color
    }

    fn flush(&mut self) {
        let _ = self.stdout.flush();
    }

    /// Erases the pending-reply marker, if shown.
    fn clear_pending(&mut self) {
        if self.pending {
            if self.use_color {
                print!("\r\x1b[2K");
            } else {
                println!();
            }
            self.pending = false;
        }
    }

    fn label(&self, role: Role) -> String {
        let name = match role {
            Role::User => "You",
            Role::Assistant => "Assistant",
        };
        if self.use_color {
            format!("{ANSI_BOLD}{name}:{ANSI_RESET}")
        } else {
            format!("{name}:")
        }
    }
}

impl Default for PlainTextRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for PlainTextRenderer {
    fn start_reply(&mut self) {
        if self.use_color {
            print!("{ANSI_DIM}Thinking...{ANSI_RESET}");
        } else {
            print!("Thinking...");
        }
        self.pending = true;
        self.flush();
    }

    fn print_reply(&mut self, message: &Message, is_error: bool) {
        self.clear_pending();
        let label = self.label(message.role());
        if is_error && self.use_color {
            println!("{label} {ANSI_RED}{}{ANSI_RESET}", message.content());
        } else {
            println!("{label} {}", message.content());
        }
        println!();
        self.flush();
    }

    fn print_entry(&mut self, message: &Message) {
        let label = self.label(message.role());
        println!("{label} {}", message.content());
        self.flush();
    }

    fn print_error(&mut self, error: &str) {
        self.clear_pending();
        if self.use_color {
            eprintln!("{ANSI_RED}Error: {error}{ANSI_RESET}");
        } else {
            eprintln!("Error: {error}");
        }
    }

    fn print_info(&mut self, info: &str) {
        self.clear_pending();
        if self.use_color {
            println!("{ANSI_CYAN}{info}{ANSI_RESET}");
        } else {
            println!("{info}");
        }
        self.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renderer_default_has_color() {
        let renderer = PlainTextRenderer::new();
        assert!(renderer.use_color());
    }

    #[test]
    fn renderer_without_color() {
        let renderer = PlainTextRenderer::with_color(false);
        assert!(!renderer.use_color());
        assert_eq!(renderer.label(Role::Assistant), "Assistant:");
        assert_eq!(renderer.label(Role::User), "You:");
    }

    #[test]
    fn colored_label_is_bold() {
        let renderer = PlainTextRenderer::with_color(true);
        assert_eq!(
            renderer.label(Role::Assistant),
            format!("{ANSI_BOLD}Assistant:{ANSI_RESET}")
        );
    }
}
