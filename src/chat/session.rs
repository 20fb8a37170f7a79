//! Per-session chat state.
//!
//! A [`Session`] owns the [`Transcript`] and the user-adjustable
//! [`SessionConfig`].  It is created once the model listing is known, mutated only
//! by the REPL actions (send, clear, model and window changes) and dropped when
//! the program exits.  Nothing is persisted.

use std::fmt;
use std::str::FromStr;

use crate::backend::ModelCatalog;
use crate::chat::transcript::{Message, Transcript};
use crate::error::{Error, Result};
use crate::observability::CHAT_CLEARS;

/// How many recent messages are forwarded as context on each turn.
///
/// Always an even number between [`MemoryWindow::MIN`] and [`MemoryWindow::MAX`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MemoryWindow(u32);

impl MemoryWindow {
    /// Smallest allowed window.
    pub const MIN: u32 = 2;
    /// Largest allowed window.
    pub const MAX: u32 = 20;
    /// Window used when nothing is configured.
    pub const DEFAULT: MemoryWindow = MemoryWindow(8);

    /// Validates and wraps a window size.
    pub fn new(value: u32) -> Result<Self> {
        if !(Self::MIN..=Self::MAX).contains(&value) {
            return Err(Error::validation(
                format!(
                    "memory window must be between {} and {}, got {value}",
                    Self::MIN,
                    Self::MAX
                ),
                Some("memory_window".to_string()),
            ));
        }
        if value % 2 != 0 {
            return Err(Error::validation(
                format!("memory window must be even, got {value}"),
                Some("memory_window".to_string()),
            ));
        }
        Ok(Self(value))
    }

    /// The window as a count of messages.
    pub fn get(self) -> usize {
        self.0 as usize
    }
}

impl Default for MemoryWindow {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for MemoryWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for MemoryWindow {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let value = s.trim().parse::<u32>().map_err(|_| {
            Error::validation(
                format!("memory window must be an integer, got {s:?}"),
                Some("memory_window".to_string()),
            )
        })?;
        Self::new(value)
    }
}

impl TryFrom<u32> for MemoryWindow {
    type Error = Error;

    fn try_from(value: u32) -> Result<Self> {
        Self::new(value)
    }
}

/// Settings the user can change during a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Model answering each turn; always one of the session's available models.
    pub selected_model: String,
    /// Number of recent messages forwarded as context.
    pub memory_window: MemoryWindow,
}

/// Aggregated stats for a chat session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionStats {
    /// The model answering turns.
    pub model: String,
    /// The number of messages in the transcript.
    pub message_count: usize,
    /// The configured memory window.
    pub memory_window: MemoryWindow,
    /// How many models the listing offered.
    pub available_models: usize,
    /// Turns processed since the session started or was last cleared.
    pub turns: u64,
    /// Turns whose reply was an error message.
    pub failed_turns: u64,
}

/// One user's conversation and its settings.
#[derive(Debug, Clone)]
pub struct Session {
    transcript: Transcript,
    config: SessionConfig,
    available_models: Vec<String>,
    turns: u64,
    failed_turns: u64,
}

impl Session {
    /// Queries `catalog` once and creates a session over its listing.
    ///
    /// Fails when the listing fails or is empty; both are fatal for the caller.
    pub async fn open<M: ModelCatalog + ?Sized>(
        catalog: &M,
        preferred: Option<&str>,
        memory_window: MemoryWindow,
    ) -> Result<Self> {
        let available_models = catalog.list_models().await?;
        tracing::info!(models = available_models.len(), "model listing received");
        Self::new(available_models, preferred, memory_window)
    }

    /// Creates a session over a non-empty model listing.
    ///
    /// Uses `preferred` when it is listed and the first listed model otherwise.
    /// Repeated identifiers are dropped, keeping the listing order.
    pub fn new(
        available_models: Vec<String>,
        preferred: Option<&str>,
        memory_window: MemoryWindow,
    ) -> Result<Self> {
        let mut unique: Vec<String> = Vec::with_capacity(available_models.len());
        for model in available_models {
            if !unique.contains(&model) {
                unique.push(model);
            }
        }
        let available_models = unique;
        let selected_model = resolve_model(preferred, &available_models).ok_or_else(|| {
            Error::not_found(
                "No models returned for this API key. Regenerate the key and try again.",
                Some("model".to_string()),
            )
        })?;
        Ok(Self {
            transcript: Transcript::new(),
            config: SessionConfig {
                selected_model,
                memory_window,
            },
            available_models,
            turns: 0,
            failed_turns: 0,
        })
    }

    /// The conversation so far.
    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// The current settings.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Models offered by the listing taken at session start.
    pub fn available_models(&self) -> &[String] {
        &self.available_models
    }

    /// The model answering turns.
    pub fn model(&self) -> &str {
        &self.config.selected_model
    }

    /// The configured memory window.
    pub fn memory_window(&self) -> MemoryWindow {
        self.config.memory_window
    }

    /// Switches to a listed model.
    ///
    /// Unknown identifiers are rejected and the selection is left unchanged.
    pub fn set_model(&mut self, model: &str) -> Result<()> {
        if !self.available_models.iter().any(|m| m == model) {
            return Err(Error::not_found(
                format!("{model} is not available for this API key"),
                Some("model".to_string()),
            ));
        }
        self.config.selected_model = model.to_string();
        Ok(())
    }

    /// Changes how many messages are forwarded as context.
    pub fn set_memory_window(&mut self, window: MemoryWindow) {
        self.config.memory_window = window;
    }

    /// Drops the whole conversation.
    pub fn clear(&mut self) {
        self.transcript.clear();
        self.turns = 0;
        self.failed_turns = 0;
        CHAT_CLEARS.click();
        tracing::info!(model = %self.config.selected_model, "conversation cleared");
    }

    /// Returns the current session statistics snapshot.
    pub fn stats(&self) -> SessionStats {
        SessionStats {
            model: self.config.selected_model.clone(),
            message_count: self.transcript.len(),
            memory_window: self.config.memory_window,
            available_models: self.available_models.len(),
            turns: self.turns,
            failed_turns: self.failed_turns,
        }
    }

    pub(crate) fn append(&mut self, message: Message) {
        self.transcript.append(message);
    }

    pub(crate) fn record_turn(&mut self, failed: bool) {
        self.turns = self.turns.saturating_add(1);
        if failed {
            self.failed_turns = self.failed_turns.saturating_add(1);
        }
    }
}

/// Picks the model a session should use.
///
/// Returns `preferred` when the listing contains it, the first listed model
/// otherwise, and `None` only for an empty listing.
pub fn resolve_model(preferred: Option<&str>, available: &[String]) -> Option<String> {
    if let Some(preferred) = preferred
        && available.iter().any(|m| m == preferred)
    {
        return Some(preferred.to_string());
    }
    available.first().cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn models(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn memory_window_bounds() {
        for ok in [2, 4, 8, 20] {
            assert_eq!(MemoryWindow::new(ok).unwrap().get(), ok as usize);
        }
        for bad in [0, 1, 3, 7, 21, 22, 100] {
            assert!(MemoryWindow::new(bad).unwrap_err().is_validation(), "{bad}");
        }
        assert_eq!(MemoryWindow::default().get(), 8);
    }

    #[test]
    fn memory_window_from_str() {
        assert_eq!("6".parse::<MemoryWindow>().unwrap().get(), 6);
        assert_eq!(" 10 ".parse::<MemoryWindow>().unwrap().get(), 10);
        assert!("six".parse::<MemoryWindow>().is_err());
        assert!("-2".parse::<MemoryWindow>().is_err());
        assert!(MemoryWindow::try_from(5).is_err());
    }

    #[test]
    fn resolve_prefers_listed_choice() {
        let available = models(&["a", "b", "c"]);
        assert_eq!(resolve_model(Some("b"), &available), Some("b".to_string()));
    }

    #[test]
    fn resolve_falls_back_to_first() {
        let available = models(&["a", "b", "c"]);
        assert_eq!(resolve_model(Some("gone"), &available), Some("a".to_string()));
        assert_eq!(resolve_model(None, &available), Some("a".to_string()));
        assert_eq!(resolve_model(Some("a"), &[]), None);
    }

    #[test]
    fn new_session_uses_fallback_model() {
        let session =
            Session::new(models(&["x", "y"]), Some("retired"), MemoryWindow::DEFAULT).unwrap();
        assert_eq!(session.model(), "x");
        assert!(session.transcript().is_empty());
        assert_eq!(session.memory_window(), MemoryWindow::DEFAULT);
    }

    #[test]
    fn new_session_requires_models() {
        let err = Session::new(Vec::new(), None, MemoryWindow::DEFAULT).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn new_session_drops_repeated_models() {
        let session =
            Session::new(models(&["b", "a", "b"]), None, MemoryWindow::DEFAULT).unwrap();
        assert_eq!(session.available_models(), &models(&["b", "a"])[..]);
        assert_eq!(session.model(), "b");
    }

    struct FixedCatalog(Result<Vec<String>>);

    #[async_trait::async_trait]
    impl ModelCatalog for FixedCatalog {
        async fn list_models(&self) -> Result<Vec<String>> {
            self.0.clone()
        }
    }

    #[tokio::test]
    async fn open_falls_back_when_preferred_disappears() {
        let catalog = FixedCatalog(Ok(models(&["llama-3.1-8b-instant", "gemma2-9b-it"])));
        let session = Session::open(&catalog, Some("mixtral-8x7b-32768"), MemoryWindow::DEFAULT)
            .await
            .unwrap();
        assert_eq!(session.model(), "llama-3.1-8b-instant");
        assert_eq!(session.available_models().len(), 2);
    }

    #[tokio::test]
    async fn open_fails_on_empty_or_failed_listing() {
        let empty = FixedCatalog(Ok(Vec::new()));
        let err = Session::open(&empty, None, MemoryWindow::DEFAULT)
            .await
            .unwrap_err();
        assert!(err.is_not_found());

        let failing = FixedCatalog(Err(Error::authentication("Invalid API Key")));
        let err = Session::open(&failing, None, MemoryWindow::DEFAULT)
            .await
            .unwrap_err();
        assert!(err.is_authentication());
    }

    #[test]
    fn set_model_rejects_unlisted() {
        let mut session = Session::new(models(&["x", "y"]), None, MemoryWindow::DEFAULT).unwrap();
        session.set_model("y").unwrap();
        assert_eq!(session.model(), "y");
        assert!(session.set_model("z").is_err());
        assert_eq!(session.model(), "y");
    }

    #[test]
    fn clear_resets_transcript_and_counters() {
        let mut session = Session::new(models(&["x"]), None, MemoryWindow::DEFAULT).unwrap();
        session.append(Message::user("hi"));
        session.append(Message::assistant("hello"));
        session.record_turn(false);
        session.record_turn(true);
        assert_eq!(session.stats().turns, 2);
        assert_eq!(session.stats().failed_turns, 1);

        session.clear();
        let stats = session.stats();
        assert_eq!(stats.message_count, 0);
        assert_eq!(stats.turns, 0);
        assert_eq!(stats.failed_turns, 0);
        assert!(session.transcript().recent(5).is_empty());
    }
}
