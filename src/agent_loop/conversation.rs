//! Append-only conversation log.

use serde::Serialize;

use crate::error::AgentError;
use crate::types::{ToolInvocationRequest, ToolResponse, Turn, TurnRole};

/// Ordered turns of one run, exactly as sent to the backend.
///
/// Turns are never reordered or removed. After a tool-call batch is
/// recorded, the only turns accepted are results for the calls in that
/// batch until every one of them has arrived.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConversationState {
    turns: Vec<Turn>,
    #[serde(skip)]
    pending: Vec<String>,
}

impl ConversationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// A conversation whose first turn is the user's instruction.
    pub fn seeded(instruction: impl Into<String>) -> Self {
        Self {
            turns: vec![Turn::user(instruction)],
            pending: Vec::new(),
        }
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn count(&self, role: TurnRole) -> usize {
        self.turns.iter().filter(|t| t.role == role).count()
    }

    /// Ids of calls still waiting for a result, in request order.
    pub fn pending_call_ids(&self) -> &[String] {
        &self.pending
    }

    pub fn push_model_text(&mut self, text: impl Into<String>) -> Result<(), AgentError> {
        self.ensure_no_pending("model text")?;
        self.turns.push(Turn::model_text(text));
        Ok(())
    }

    /// Record a tool-call batch as one model turn.
    pub fn push_tool_calls(&mut self, calls: Vec<ToolInvocationRequest>) -> Result<(), AgentError> {
        self.ensure_no_pending("a tool-call batch")?;
        if calls.is_empty() {
            return Err(AgentError::InvalidState("tool-call batch is empty".into()));
        }
        self.pending = calls.iter().map(|c| c.id.clone()).collect();
        self.turns.push(Turn::tool_calls(calls));
        Ok(())
    }

    /// Record the result of an outstanding call.
    pub fn push_tool_result(&mut self, response: ToolResponse) -> Result<(), AgentError> {
        let Some(idx) = self.pending.iter().position(|id| *id == response.call_id) else {
            return Err(AgentError::InvalidState(format!(
                "result for call '{}' ({}) was not requested",
                response.call_id, response.tool_name
            )));
        };
        self.pending.remove(idx);
        self.turns.push(Turn::tool_result(response));
        Ok(())
    }

    fn ensure_no_pending(&self, what: &str) -> Result<(), AgentError> {
        if self.pending.is_empty() {
            return Ok(());
        }
        Err(AgentError::InvalidState(format!(
            "cannot append {what} while {} tool result(s) are outstanding",
            self.pending.len()
        )))
    }
}
