//! Generation settings forwarded to the backend.

use bon::Builder;
use serde::{Deserialize, Serialize};

/// Settings controlling text generation.
#[derive(Debug, Clone, Builder, Serialize, Deserialize, Default, PartialEq)]
pub struct GenerationSettings {
    pub temperature: Option<f64>,
    pub max_output_tokens: Option<u32>,
}

impl GenerationSettings {
    pub fn is_empty(&self) -> bool {
        self.temperature.is_none() && self.max_output_tokens.is_none()
    }
}
