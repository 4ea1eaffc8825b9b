//! Typed access to tool call arguments.

use crate::error::AgentError;

/// Wrapper around a tool call's argument bag providing typed extraction.
#[derive(Debug, Clone)]
pub struct ToolArguments {
    value: serde_json::Value,
}

impl ToolArguments {
    pub fn new(value: serde_json::Value) -> Self {
        Self { value }
    }

    /// Get the raw JSON value.
    pub fn raw(&self) -> &serde_json::Value {
        &self.value
    }

    /// Get a string argument by key.
    pub fn get_str(&self, key: &str) -> Result<&str, AgentError> {
        self.value
            .get(key)
            .and_then(|v| v.as_str())
            .ok_or_else(|| AgentError::InvalidArgument(format!("Missing string argument: {key}")))
    }

    /// Deserialize the entire argument bag into a typed struct.
    pub fn deserialize<T: serde::de::DeserializeOwned>(&self) -> Result<T, AgentError> {
        serde_json::from_value(self.value.clone()).map_err(|e| {
            AgentError::InvalidArgument(format!("Failed to deserialize arguments: {e}"))
        })
    }
}
