//! Name-keyed registry of tools.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use super::arguments::ToolArguments;
use super::tool::{AgentTool, Tool};
use super::types::ToolSpec;
use crate::error::AgentError;

/// Maps tool names to handlers and specs, preserving registration order.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a closure handler under `spec`.
    pub fn register<F, Fut>(&mut self, spec: ToolSpec, handler: F) -> Result<(), AgentError>
    where
        F: Fn(ToolArguments) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<serde_json::Value, AgentError>> + Send + 'static,
    {
        self.register_tool(Arc::new(AgentTool::new(spec, handler)))
    }

    /// Register a trait-object tool. Fails if the name is already taken.
    pub fn register_tool(&mut self, tool: Arc<dyn Tool>) -> Result<(), AgentError> {
        let name = tool.name().to_string();
        if self.index.contains_key(&name) {
            return Err(AgentError::DuplicateTool(name));
        }
        self.index.insert(name, self.tools.len());
        self.tools.push(tool);
        Ok(())
    }

    /// Specs for `names`, in the order requested.
    pub fn schema_for(&self, names: &[&str]) -> Result<Vec<ToolSpec>, AgentError> {
        names
            .iter()
            .map(|name| self.handler_for(name).map(|tool| tool.spec().clone()))
            .collect()
    }

    /// Every registered spec, in registration order.
    pub fn schema(&self) -> Vec<ToolSpec> {
        self.tools.iter().map(|tool| tool.spec().clone()).collect()
    }

    /// Look up the handler registered under `name`.
    pub fn handler_for(&self, name: &str) -> Result<Arc<dyn Tool>, AgentError> {
        self.index
            .get(name)
            .map(|&idx| Arc::clone(&self.tools[idx]))
            .ok_or_else(|| AgentError::UnknownTool(name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field(
                "tools",
                &self.tools.iter().map(|t| t.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}
