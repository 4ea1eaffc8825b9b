//! Tool trait and closure-based tool wrapper.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;

use super::arguments::ToolArguments;
use super::types::ToolSpec;
use crate::error::AgentError;

/// Core tool trait: a declarative spec plus an executable handler.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Spec sent to the backend. Its name is the dispatch key.
    fn spec(&self) -> &ToolSpec;

    /// Tool name (must match what the backend calls).
    fn name(&self) -> &str {
        self.spec().name()
    }

    /// Whether the executor may abandon this tool at its timeout.
    ///
    /// Tools whose side effects cannot be abandoned halfway return `false`.
    fn bounded_by_timeout(&self) -> bool {
        true
    }

    /// Execute the tool with already-validated arguments.
    async fn execute(&self, args: &ToolArguments) -> Result<serde_json::Value, AgentError>;
}

type ToolFuture = Pin<Box<dyn Future<Output = Result<serde_json::Value, AgentError>> + Send>>;

/// Type alias for the tool handler function.
type ToolHandler = dyn Fn(ToolArguments) -> ToolFuture + Send + Sync;

/// Closure-based tool for quick tool creation.
pub struct AgentTool {
    spec: ToolSpec,
    handler: Arc<ToolHandler>,
    bounded: bool,
}

impl AgentTool {
    /// Create a tool from a spec and a closure.
    pub fn new<F, Fut>(spec: ToolSpec, handler: F) -> Self
    where
        F: Fn(ToolArguments) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<serde_json::Value, AgentError>> + Send + 'static,
    {
        Self {
            spec,
            handler: Arc::new(move |args| Box::pin(handler(args))),
            bounded: true,
        }
    }

    /// Let the tool run to completion even past the executor timeout.
    pub fn without_timeout(mut self) -> Self {
        self.bounded = false;
        self
    }
}

#[async_trait]
impl Tool for AgentTool {
    fn spec(&self) -> &ToolSpec {
        &self.spec
    }

    fn bounded_by_timeout(&self) -> bool {
        self.bounded
    }

    async fn execute(&self, args: &ToolArguments) -> Result<serde_json::Value, AgentError> {
        (self.handler)(args.clone()).await
    }
}

impl std::fmt::Debug for AgentTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentTool")
            .field("name", &self.spec.name())
            .field("description", &self.spec.description())
            .field("bounded", &self.bounded)
            .finish()
    }
}
