use serde::{Deserialize, Serialize};

use crate::types::ModelInfo;

/// Response from the list models endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelListResponse {
    /// Models available to the credential, in server order.
    pub data: Vec<ModelInfo>,
}

impl ModelListResponse {
    /// Create a new `ModelListResponse`.
    pub fn new(data: Vec<ModelInfo>) -> Self {
        Self { data }
    }

    /// Get the list of models.
    pub fn models(&self) -> &[ModelInfo] {
        &self.data
    }

    /// Model identifiers in server order.
    pub fn model_ids(&self) -> Vec<String> {
        self.data.iter().map(|model| model.id.clone()).collect()
    }
}
