//! Model backend trait and the Gemini implementation.

pub mod google;
pub mod http;

pub use google::GoogleBackend;

use async_trait::async_trait;

use crate::error::AgentError;
use crate::tools::ToolSpec;
use crate::types::{ToolInvocationRequest, Turn};

/// A request sent to a model backend: the whole conversation plus the tool schema.
#[derive(Debug, Clone, Copy)]
pub struct BackendRequest<'a> {
    pub system_instruction: &'a str,
    pub turns: &'a [Turn],
    pub tools: &'a [ToolSpec],
}

/// What the backend wants next.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendResponse {
    /// Non-empty batch of tool calls, in emitted order.
    ToolCalls(Vec<ToolInvocationRequest>),
    FinalText(String),
}

impl BackendResponse {
    /// Collapse a raw reply into a response. Tool calls win over text.
    pub fn from_parts(text: String, tool_calls: Vec<ToolInvocationRequest>) -> Self {
        if tool_calls.is_empty() {
            Self::FinalText(text)
        } else {
            Self::ToolCalls(tool_calls)
        }
    }
}

/// Core trait implemented by model backends.
#[async_trait]
pub trait ModelBackend: Send + Sync {
    /// Provider name (e.g., "google").
    fn provider_name(&self) -> &str;
    /// The model ID this backend instance serves.
    fn model_id(&self) -> &str;

    /// Produce the next step for the given conversation.
    async fn generate(&self, request: &BackendRequest<'_>) -> Result<BackendResponse, AgentError>;
}
