//! Conversation turns, tool invocations and tool results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Who produced a turn.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Display)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum TurnRole {
    User,
    Model,
    ToolResult,
}

/// Body of a turn.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TurnPayload {
    Text { text: String },
    ToolCalls { calls: Vec<ToolInvocationRequest> },
    ToolResult(ToolResponse),
}

/// One immutable entry in the conversation log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Turn {
    pub role: TurnRole,
    pub payload: TurnPayload,
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    /// Create a user text turn.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            payload: TurnPayload::Text { text: text.into() },
            timestamp: Utc::now(),
        }
    }

    /// Create a model text turn.
    pub fn model_text(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Model,
            payload: TurnPayload::Text { text: text.into() },
            timestamp: Utc::now(),
        }
    }

    /// Create a model turn recording a tool-call batch.
    pub fn tool_calls(calls: Vec<ToolInvocationRequest>) -> Self {
        Self {
            role: TurnRole::Model,
            payload: TurnPayload::ToolCalls { calls },
            timestamp: Utc::now(),
        }
    }

    /// Create a tool-result turn.
    pub fn tool_result(response: ToolResponse) -> Self {
        Self {
            role: TurnRole::ToolResult,
            payload: TurnPayload::ToolResult(response),
            timestamp: Utc::now(),
        }
    }

    /// Text content, if this is a text turn.
    pub fn text(&self) -> Option<&str> {
        match &self.payload {
            TurnPayload::Text { text } => Some(text),
            _ => None,
        }
    }
}

/// A tool call requested by the backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolInvocationRequest {
    pub id: String,
    pub name: String,
    pub arguments: serde_json::Value,
}

impl ToolInvocationRequest {
    /// Create a request with a freshly generated call id.
    pub fn new(name: impl Into<String>, arguments: serde_json::Value) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            arguments,
        }
    }
}

/// Why a tool call failed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display, EnumString)]
pub enum ToolFailureKind {
    UnknownTool,
    InvalidArguments,
    FileNotFound,
    IsADirectory,
    PermissionDenied,
    PathError,
    Io,
    Timeout,
    /// Skipped because the run was canceled before the call was dispatched.
    Canceled,
    Execution,
}

/// Outcome of one tool call. Exactly one of success or failure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ToolResult {
    Success { value: serde_json::Value },
    Failure { kind: ToolFailureKind, message: String },
}

impl ToolResult {
    pub fn success(value: serde_json::Value) -> Self {
        Self::Success { value }
    }

    pub fn failure(kind: ToolFailureKind, message: impl Into<String>) -> Self {
        Self::Failure {
            kind,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Failure { .. })
    }

    pub fn failure_kind(&self) -> Option<ToolFailureKind> {
        match self {
            Self::Failure { kind, .. } => Some(*kind),
            Self::Success { .. } => None,
        }
    }

    /// Backend-facing envelope: `{"result": ..}` or `{"error": {"kind", "message"}}`.
    pub fn envelope(&self) -> serde_json::Value {
        match self {
            Self::Success { value } => serde_json::json!({ "result": value }),
            Self::Failure { kind, message } => serde_json::json!({
                "error": {
                    "kind": kind.to_string(),
                    "message": message,
                }
            }),
        }
    }
}

/// A tool result tied back to the call that produced it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolResponse {
    pub call_id: String,
    pub tool_name: String,
    pub result: ToolResult,
}

impl ToolResponse {
    pub fn new(call: &ToolInvocationRequest, result: ToolResult) -> Self {
        Self {
            call_id: call.id.clone(),
            tool_name: call.name.clone(),
            result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_envelope_carries_kind_and_message() {
        let result = ToolResult::failure(ToolFailureKind::UnknownTool, "no such tool: rm");
        assert_eq!(
            result.envelope(),
            serde_json::json!({
                "error": { "kind": "UnknownTool", "message": "no such tool: rm" }
            })
        );
    }

    #[test]
    fn success_envelope_wraps_value() {
        let result = ToolResult::success(serde_json::json!("body"));
        assert_eq!(result.envelope(), serde_json::json!({ "result": "body" }));
        assert!(!result.is_error());
    }

    #[test]
    fn turn_role_displays_kebab_case() {
        assert_eq!(TurnRole::ToolResult.to_string(), "tool-result");
    }
}
