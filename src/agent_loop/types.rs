//! Core run types for the agent loop.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::conversation::ConversationState;

/// Unique run identifier.
pub type RunId = Uuid;

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunOutcome {
    /// The backend replied with final text.
    Completed { text: String },
    /// The backend-call budget ran out while the backend still wanted tools.
    MaxTurnsExceeded { max_turns: usize },
    /// The token fired. Calls of the last batch that never ran are closed
    /// with a `Canceled` failure result.
    Canceled,
}

/// Result of a run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: RunId,
    pub outcome: RunOutcome,
    pub conversation: ConversationState,
    pub backend_calls: usize,
    pub finished_at: DateTime<Utc>,
}

impl RunReport {
    /// Final text, when the run completed.
    pub fn text(&self) -> Option<&str> {
        match &self.outcome {
            RunOutcome::Completed { text } => Some(text),
            _ => None,
        }
    }
}
