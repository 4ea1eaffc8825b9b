//! Shared test helpers and scripted backend.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use codemend::error::AgentError;
use codemend::provider::{BackendRequest, BackendResponse, ModelBackend};
use codemend::tools::{register_builtin_tools, ListFilesOptions, ToolRegistry};
use codemend::types::{ToolInvocationRequest, Turn};

/// What the backend was sent on one call.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub system_instruction: String,
    pub turns: Vec<Turn>,
    pub tool_names: Vec<String>,
    pub at: tokio::time::Instant,
}

/// A backend that replays queued replies and records every request.
///
/// Once the queue is drained it answers with the fallback, or
/// "Mock response" when none is set.
#[derive(Default)]
pub struct ScriptedBackend {
    replies: Mutex<VecDeque<Result<BackendResponse, AgentError>>>,
    fallback: Mutex<Option<BackendResponse>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl ScriptedBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queue a final-text reply.
    pub fn queue_text(&self, text: &str) {
        self.queue(Ok(BackendResponse::FinalText(text.to_string())));
    }

    /// Queue a batch of tool calls, each `(name, args)`.
    pub fn queue_tool_calls(&self, calls: Vec<(&str, serde_json::Value)>) {
        let calls = calls
            .into_iter()
            .map(|(name, args)| ToolInvocationRequest::new(name, args))
            .collect();
        self.queue(Ok(BackendResponse::ToolCalls(calls)));
    }

    pub fn queue_error(&self, error: AgentError) {
        self.queue(Err(error));
    }

    pub fn queue(&self, reply: Result<BackendResponse, AgentError>) {
        self.replies.lock().unwrap().push_back(reply);
    }

    /// Reply used after the queue runs dry.
    pub fn set_fallback(&self, reply: BackendResponse) {
        *self.fallback.lock().unwrap() = Some(reply);
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl ModelBackend for ScriptedBackend {
    fn provider_name(&self) -> &str {
        "scripted"
    }

    fn model_id(&self) -> &str {
        "scripted-model"
    }

    async fn generate(&self, request: &BackendRequest<'_>) -> Result<BackendResponse, AgentError> {
        self.requests.lock().unwrap().push(RecordedRequest {
            system_instruction: request.system_instruction.to_string(),
            turns: request.turns.to_vec(),
            tool_names: request.tools.iter().map(|t| t.name().to_string()).collect(),
            at: tokio::time::Instant::now(),
        });

        if let Some(reply) = self.replies.lock().unwrap().pop_front() {
            return reply;
        }
        Ok(self
            .fallback
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| BackendResponse::FinalText("Mock response".to_string())))
    }
}

pub fn rate_limited(message: &str) -> AgentError {
    AgentError::RateLimited {
        message: message.to_string(),
    }
}

/// Registry holding the three built-in tools with default options.
pub fn builtin_registry() -> Arc<ToolRegistry> {
    let mut registry = ToolRegistry::new();
    register_builtin_tools(&mut registry, &ListFilesOptions::default()).unwrap();
    Arc::new(registry)
}
