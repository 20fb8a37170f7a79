//! Minimal `.env` support.
//!
//! Lines look like `KEY=VALUE`.  Blank lines and `#` comments are skipped, an
//! optional leading `export ` is accepted, and one layer of matching single or
//! double quotes is stripped from the value.  Values are kept in a map instead of
//! being written into the process environment.

use std::collections::HashMap;
use std::env;
use std::io;
use std::path::Path;

use crate::error::{Error, Result};

/// Key/value pairs read from a `.env` file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvFile {
    vars: HashMap<String, String>,
}

impl EnvFile {
    /// An empty set of variables.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse the contents of a `.env` file.
    pub fn parse(contents: &str) -> Self {
        let mut vars = HashMap::new();
        for line in contents.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let line = line.strip_prefix("export ").unwrap_or(line);
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let key = key.trim();
            if key.is_empty() {
                continue;
            }
            vars.insert(key.to_string(), unquote(value.trim()).to_string());
        }
        Self { vars }
    }

    /// Read a `.env` file.  A missing file yields an empty set.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(contents) => Ok(Self::parse(&contents)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(Self::empty()),
            Err(err) => Err(Error::io(
                format!("failed to read {}", path.display()),
                err,
            )),
        }
    }

    /// Value from the file, ignoring the process environment.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// Value from the process environment, falling back to the file.
    ///
    /// Empty values count as unset in both places.
    pub fn resolve(&self, key: &str) -> Option<String> {
        env::var(key)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .or_else(|| {
                self.get(key)
                    .filter(|v| !v.trim().is_empty())
                    .map(str::to_string)
            })
    }

    /// Number of variables read.
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    /// True when the file defined nothing.
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_basic_lines() {
        let env = EnvFile::parse(
            "# credentials\n\
             GROQ_API_KEY=gsk_123\n\
             \n\
             export OTHER = \"quoted value\"\n\
             SINGLE='x'\n\
             not a pair\n\
             =nokey\n",
        );
        assert_eq!(env.get("GROQ_API_KEY"), Some("gsk_123"));
        assert_eq!(env.get("OTHER"), Some("quoted value"));
        assert_eq!(env.get("SINGLE"), Some("x"));
        assert_eq!(env.len(), 3);
    }

    #[test]
    fn value_may_contain_equals() {
        let env = EnvFile::parse("URL=https://example.com/?a=b");
        assert_eq!(env.get("URL"), Some("https://example.com/?a=b"));
    }

    #[test]
    fn unmatched_quote_kept() {
        let env = EnvFile::parse("A=\"open");
        assert_eq!(env.get("A"), Some("\"open"));
    }

    #[test]
    fn missing_file_is_empty() {
        let env = EnvFile::load("/definitely/not/here/.env").unwrap();
        assert!(env.is_empty());
    }

    #[test]
    fn resolve_falls_back_to_file() {
        let env = EnvFile::parse("GROQCHAT_TEST_ONLY_IN_FILE=from-file\nGROQCHAT_TEST_BLANK=  ");
        assert_eq!(
            env.resolve("GROQCHAT_TEST_ONLY_IN_FILE"),
            Some("from-file".to_string())
        );
        assert_eq!(env.resolve("GROQCHAT_TEST_BLANK"), None);
        assert_eq!(env.resolve("GROQCHAT_TEST_NOWHERE"), None);
    }
}
