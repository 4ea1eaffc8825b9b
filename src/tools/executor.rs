//! Tool dispatch: lookup, validation, bounded invocation and failure
//! normalization.

use std::sync::Arc;
use std::time::Duration;

use super::arguments::ToolArguments;
use super::registry::ToolRegistry;
use super::validation::validate_arguments;
use crate::error::AgentError;
use crate::types::{ToolFailureKind, ToolInvocationRequest, ToolResponse, ToolResult};

/// Default per-call timeout applied to tool handlers.
///
/// Tools that opt out through [`Tool::bounded_by_timeout`](super::Tool::bounded_by_timeout)
/// always run to completion.
pub const DEFAULT_TOOL_TIMEOUT: Duration = Duration::from_secs(60);

/// Executes tool calls against a registry.
///
/// Every outcome, including unknown tools and handler errors, is returned as
/// a [`ToolResponse`] so the backend can see and react to it.
#[derive(Debug, Clone)]
pub struct ToolExecutor {
    registry: Arc<ToolRegistry>,
    timeout: Option<Duration>,
}

impl ToolExecutor {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self {
            registry,
            timeout: Some(DEFAULT_TOOL_TIMEOUT),
        }
    }

    /// Override the per-call timeout. `None` disables it.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    pub async fn execute(&self, call: &ToolInvocationRequest) -> ToolResponse {
        let result = self.run(call).await;
        if let ToolResult::Failure { kind, message } = &result {
            tracing::debug!(
                tool = %call.name,
                call_id = %call.id,
                %kind,
                %message,
                "tool call failed"
            );
        }
        ToolResponse::new(call, result)
    }

    async fn run(&self, call: &ToolInvocationRequest) -> ToolResult {
        let tool = match self.registry.handler_for(&call.name) {
            Ok(tool) => tool,
            Err(_) => {
                return ToolResult::failure(
                    ToolFailureKind::UnknownTool,
                    format!("no tool named '{}' is registered", call.name),
                )
            }
        };

        if let Err(message) = validate_arguments(&call.arguments, tool.spec()) {
            return ToolResult::failure(ToolFailureKind::InvalidArguments, message);
        }

        tracing::debug!(tool = %call.name, call_id = %call.id, "executing tool");
        let args = ToolArguments::new(call.arguments.clone());
        let outcome = match self.timeout.filter(|_| tool.bounded_by_timeout()) {
            Some(limit) => tokio::time::timeout(limit, tool.execute(&args))
                .await
                .unwrap_or_else(|_| {
                    Err(AgentError::Timeout(
                        u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
                    ))
                }),
            None => tool.execute(&args).await,
        };

        match outcome {
            Ok(value) => ToolResult::success(value),
            Err(err) => ToolResult::failure(err.tool_failure_kind(), err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::types::ToolSpec;
    use serde_json::json;

    fn executor() -> ToolExecutor {
        let mut registry = ToolRegistry::new();
        registry
            .register(
                ToolSpec::new("readFile", "Read the content of a file").string(
                    "filePath",
                    "The path of the file to read",
                    true,
                ),
                |args: ToolArguments| async move {
                    let path = args.get_str("filePath")?;
                    if path == "missing.js" {
                        return Err(AgentError::FileNotFound(path.into()));
                    }
                    Ok(json!(format!("contents of {path}")))
                },
            )
            .unwrap();
        registry
            .register(ToolSpec::new("sleepy", "Never finishes"), |_args: ToolArguments| async move {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(serde_json::Value::Null)
            })
            .unwrap();
        ToolExecutor::new(Arc::new(registry))
    }

    #[tokio::test]
    async fn unknown_tool_becomes_failure() {
        let call = ToolInvocationRequest::new("deleteEverything", json!({}));

        let response = executor().execute(&call).await;

        assert_eq!(response.call_id, call.id);
        assert_eq!(
            response.result.failure_kind(),
            Some(ToolFailureKind::UnknownTool)
        );
    }

    #[tokio::test]
    async fn missing_required_argument_is_rejected_before_invocation() {
        let call = ToolInvocationRequest::new("readFile", json!({ "path": "a.js" }));

        let response = executor().execute(&call).await;

        assert_eq!(
            response.result.failure_kind(),
            Some(ToolFailureKind::InvalidArguments)
        );
    }

    #[tokio::test]
    async fn handler_error_is_classified() {
        let call = ToolInvocationRequest::new("readFile", json!({ "filePath": "missing.js" }));

        let response = executor().execute(&call).await;

        match response.result {
            ToolResult::Failure { kind, message } => {
                assert_eq!(kind, ToolFailureKind::FileNotFound);
                assert!(message.contains("missing.js"));
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn success_wraps_handler_value() {
        let call = ToolInvocationRequest::new("readFile", json!({ "filePath": "a.js" }));

        let response = executor().execute(&call).await;

        assert_eq!(response.tool_name, "readFile");
        assert_eq!(response.result, ToolResult::success(json!("contents of a.js")));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_tool_times_out() {
        let executor = executor().with_timeout(Some(Duration::from_secs(5)));
        let call = ToolInvocationRequest::new("sleepy", serde_json::Value::Null);

        let response = executor.execute(&call).await;

        match response.result {
            ToolResult::Failure { kind, message } => {
                assert_eq!(kind, ToolFailureKind::Timeout);
                assert_eq!(message, "Timeout after 5000ms");
            }
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn write_file_runs_to_completion_past_the_timeout() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("app.js");
        let mut registry = ToolRegistry::new();
        crate::tools::register_builtin_tools(&mut registry, &Default::default()).unwrap();
        let executor =
            ToolExecutor::new(Arc::new(registry)).with_timeout(Some(Duration::from_nanos(1)));
        let call = ToolInvocationRequest::new(
            "writeFile",
            json!({ "filePath": path, "content": "let x = 1;" }),
        );

        let response = executor.execute(&call).await;

        assert!(!response.result.is_error(), "{:?}", response.result);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "let x = 1;");
    }
}
