use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Information about a model available to the configured credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Unique model identifier, the value passed as `model` on completions.
    pub id: String,

    /// Unix timestamp at which the model was published, when reported.
    #[serde(
        default,
        with = "time::serde::timestamp::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub created: Option<OffsetDateTime>,

    /// Organization that owns the model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owned_by: Option<String>,

    /// Whether the model is currently served.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,

    /// Maximum context length in tokens.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_window: Option<u64>,
}

impl ModelInfo {
    /// Create a `ModelInfo` carrying only an identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            created: None,
            owned_by: None,
            active: None,
            context_window: None,
        }
    }
}
