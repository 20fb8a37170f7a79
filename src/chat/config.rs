//! Configuration types for the chat application.
//!
//! Settings come from three layers, later ones winning: built-in defaults, an
//! optional YAML file (`--config`), and command-line flags parsed via `arrrg`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use arrrg_derive::CommandLine;
use serde::{Deserialize, Serialize};

use crate::chat::session::MemoryWindow;
use crate::chat::turn::DEFAULT_SYSTEM_INSTRUCTION;
use crate::error::{Error, Result};

/// Default per-request timeout.
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Default location of the credentials file.
const DEFAULT_ENV_FILE: &str = ".env";

/// Command-line arguments for the groqchat tool.
#[derive(CommandLine, Debug, Default, PartialEq, Eq)]
pub struct ChatArgs {
    /// Preferred model; ignored when the listing does not offer it.
    #[arrrg(optional, "Preferred model (default: first listed)", "MODEL")]
    pub model: Option<String>,

    /// Memory window.
    #[arrrg(optional, "Messages of history sent per turn, even, 2-20 (default: 8)", "N")]
    pub window: Option<u32>,

    /// System instruction for every turn.
    #[arrrg(optional, "System instruction for every turn", "PROMPT")]
    pub system: Option<String>,

    /// YAML configuration file.
    #[arrrg(optional, "YAML configuration file", "PATH")]
    pub config: Option<String>,

    /// File holding GROQ_API_KEY.
    #[arrrg(optional, "Credentials file (default: .env)", "PATH")]
    pub env_file: Option<String>,

    /// API base URL.
    #[arrrg(optional, "API base URL (default: https://api.groq.com/openai/v1/)", "URL")]
    pub base_url: Option<String>,

    /// Per-request timeout in seconds.
    #[arrrg(optional, "Request timeout in seconds (default: 60)", "SECS")]
    pub timeout: Option<u32>,

    /// Disable ANSI colors and styles.
    #[arrrg(flag, "Disable ANSI colors/styles")]
    pub no_color: bool,
}

/// Settings read from a YAML file.  Every key is optional.
///
/// ```yaml
/// model: llama-3.3-70b-versatile
/// memory_window: 10
/// system_instruction: You are terse.
/// timeout_secs: 30
/// color: false
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Preferred model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Memory window.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_window: Option<u32>,

    /// System instruction.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<String>,

    /// API base URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Per-request timeout in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,

    /// Credentials file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env_file: Option<PathBuf>,

    /// Whether to use ANSI styling.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<bool>,
}

impl ConfigFile {
    /// Parses YAML configuration text.
    pub fn parse(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Reads and parses a YAML configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|err| Error::io(format!("failed to read {}", path.display()), err))?;
        Self::parse(&content)
    }
}

/// Configuration for a chat session.
///
/// This struct holds the resolved configuration values after processing
/// the config file and command-line arguments with appropriate defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatConfig {
    /// Model to select when the listing offers it.
    pub model: Option<String>,

    /// Messages of history forwarded per turn.
    pub memory_window: MemoryWindow,

    /// Instruction sent ahead of the history on every turn.
    pub system_instruction: String,

    /// Override for the API base URL.
    pub base_url: Option<String>,

    /// Per-request timeout.
    pub timeout: Duration,

    /// Whether to use ANSI colors and styles in output.
    pub use_color: bool,

    /// Where to look for `GROQ_API_KEY` when the environment lacks it.
    pub env_file: PathBuf,
}

impl ChatConfig {
    /// Creates a new ChatConfig with default values.
    ///
    /// Defaults:
    /// - Model: first one listed
    /// - Memory window: 8
    /// - Timeout: 60 seconds
    /// - Color: enabled
    /// - Credentials file: `.env`
    pub fn new() -> Self {
        Self {
            model: None,
            memory_window: MemoryWindow::DEFAULT,
            system_instruction: DEFAULT_SYSTEM_INSTRUCTION.to_string(),
            base_url: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            use_color: true,
            env_file: PathBuf::from(DEFAULT_ENV_FILE),
        }
    }

    /// Resolves defaults, the optional config file, and flags, in that order.
    pub fn from_args(args: ChatArgs) -> Result<Self> {
        let mut config = Self::new();
        if let Some(path) = &args.config {
            config = config.merge_file(ConfigFile::load(path)?)?;
        }
        config.merge_args(args)
    }

    /// Applies every key set in `file`.
    pub fn merge_file(mut self, file: ConfigFile) -> Result<Self> {
        if let Some(model) = file.model {
            self.model = Some(model);
        }
        if let Some(window) = file.memory_window {
            self.memory_window = MemoryWindow::new(window)?;
        }
        if let Some(instruction) = file.system_instruction {
            self.system_instruction = instruction;
        }
        if let Some(base_url) = file.base_url {
            self.base_url = Some(base_url);
        }
        if let Some(secs) = file.timeout_secs {
            self.timeout = timeout_from_secs(secs)?;
        }
        if let Some(env_file) = file.env_file {
            self.env_file = env_file;
        }
        if let Some(color) = file.color {
            self.use_color = color;
        }
        Ok(self)
    }

    /// Applies every flag set in `args`.
    pub fn merge_args(mut self, args: ChatArgs) -> Result<Self> {
        if let Some(model) = args.model {
            self.model = Some(model);
        }
        if let Some(window) = args.window {
            self.memory_window = MemoryWindow::new(window)?;
        }
        if let Some(system) = args.system {
            self.system_instruction = system;
        }
        if let Some(base_url) = args.base_url {
            self.base_url = Some(base_url);
        }
        if let Some(secs) = args.timeout {
            self.timeout = timeout_from_secs(secs.into())?;
        }
        if let Some(env_file) = args.env_file {
            self.env_file = PathBuf::from(env_file);
        }
        if args.no_color {
            self.use_color = false;
        }
        Ok(self)
    }

    /// Sets the preferred model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Sets the memory window.
    pub fn with_memory_window(mut self, window: MemoryWindow) -> Self {
        self.memory_window = window;
        self
    }

    /// Sets the system instruction.
    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = instruction.into();
        self
    }

    /// Sets the API base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Disables ANSI color output.
    pub fn without_color(mut self) -> Self {
        self.use_color = false;
        self
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn timeout_from_secs(secs: u64) -> Result<Duration> {
    if secs == 0 {
        return Err(Error::validation(
            "timeout must be at least one second",
            Some("timeout".to_string()),
        ));
    }
    Ok(Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = ChatConfig::new();
        assert!(config.model.is_none());
        assert_eq!(config.memory_window.get(), 8);
        assert_eq!(config.system_instruction, DEFAULT_SYSTEM_INSTRUCTION);
        assert!(config.base_url.is_none());
        assert_eq!(config.timeout, Duration::from_secs(60));
        assert!(config.use_color);
        assert_eq!(config.env_file, PathBuf::from(".env"));
    }

    #[test]
    fn config_from_args_defaults() {
        let config = ChatConfig::from_args(ChatArgs::default()).unwrap();
        assert_eq!(config, ChatConfig::new());
    }

    #[test]
    fn config_from_args_custom() {
        let args = ChatArgs {
            model: Some("gemma2-9b-it".to_string()),
            window: Some(12),
            system: Some("Be brief.".to_string()),
            config: None,
            env_file: Some("secrets.env".to_string()),
            base_url: Some("http://localhost:8080/v1/".to_string()),
            timeout: Some(15),
            no_color: true,
        };
        let config = ChatConfig::from_args(args).unwrap();
        assert_eq!(config.model.as_deref(), Some("gemma2-9b-it"));
        assert_eq!(config.memory_window.get(), 12);
        assert_eq!(config.system_instruction, "Be brief.");
        assert_eq!(config.env_file, PathBuf::from("secrets.env"));
        assert_eq!(config.base_url.as_deref(), Some("http://localhost:8080/v1/"));
        assert_eq!(config.timeout, Duration::from_secs(15));
        assert!(!config.use_color);
    }

    #[test]
    fn invalid_window_flag_rejected() {
        let args = ChatArgs {
            window: Some(7),
            ..ChatArgs::default()
        };
        assert!(ChatConfig::from_args(args).unwrap_err().is_validation());
    }

    #[test]
    fn zero_timeout_rejected() {
        let args = ChatArgs {
            timeout: Some(0),
            ..ChatArgs::default()
        };
        assert!(ChatConfig::from_args(args).unwrap_err().is_validation());
    }

    #[test]
    fn config_file_then_flags() {
        let file = ConfigFile::parse(
            "model: llama-3.3-70b-versatile\n\
             memory_window: 10\n\
             system_instruction: You are terse.\n\
             timeout_secs: 30\n\
             color: false\n",
        )
        .unwrap();
        let config = ChatConfig::new().merge_file(file).unwrap();
        assert_eq!(config.model.as_deref(), Some("llama-3.3-70b-versatile"));
        assert_eq!(config.memory_window.get(), 10);
        assert_eq!(config.system_instruction, "You are terse.");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert!(!config.use_color);

        let args = ChatArgs {
            window: Some(4),
            ..ChatArgs::default()
        };
        let config = config.merge_args(args).unwrap();
        assert_eq!(config.memory_window.get(), 4);
        assert_eq!(config.model.as_deref(), Some("llama-3.3-70b-versatile"));
    }

    #[test]
    fn config_file_rejects_unknown_keys() {
        let err = ConfigFile::parse("modle: typo\n").unwrap_err();
        assert!(matches!(err, Error::Serialization { .. }));
    }

    #[test]
    fn config_file_rejects_odd_window() {
        let file = ConfigFile::parse("memory_window: 5\n").unwrap();
        assert!(ChatConfig::new().merge_file(file).is_err());
    }

    #[test]
    fn missing_config_file_is_io_error() {
        let args = ChatArgs {
            config: Some("/no/such/groqchat.yaml".to_string()),
            ..ChatArgs::default()
        };
        assert!(matches!(
            ChatConfig::from_args(args).unwrap_err(),
            Error::Io { .. }
        ));
    }

    #[test]
    fn config_builder_pattern() {
        let config = ChatConfig::new()
            .with_model("mixtral-8x7b-32768")
            .with_memory_window(MemoryWindow::new(2).unwrap())
            .with_system_instruction("Reply in haiku.")
            .with_base_url("http://127.0.0.1:9/")
            .with_timeout(Duration::from_secs(5))
            .without_color();

        assert_eq!(config.model.as_deref(), Some("mixtral-8x7b-32768"));
        assert_eq!(config.memory_window.get(), 2);
        assert_eq!(config.system_instruction, "Reply in haiku.");
        assert_eq!(config.base_url.as_deref(), Some("http://127.0.0.1:9/"));
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert!(!config.use_color);
    }
}
