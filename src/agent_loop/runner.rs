//! Agent loop runner: backend calls interleaved with tool dispatch.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::config::{AgentConfig, DEFAULT_MAX_TURNS};
use crate::error::AgentError;
use crate::prompt::DEFAULT_SYSTEM_INSTRUCTION;
use crate::provider::{BackendRequest, BackendResponse, ModelBackend};
use crate::tools::{ToolExecutor, ToolRegistry};
use crate::types::{ToolFailureKind, ToolInvocationRequest, ToolResponse, ToolResult};
use crate::util::{RetryPolicy, RetryingBackendClient};

use super::conversation::ConversationState;
use super::events::{RunEventEmitter, RunEventPayload, RunEventSink};
use super::types::{RunOutcome, RunReport};

enum LoopState {
    AwaitingBackend,
    DispatchingTools(Vec<ToolInvocationRequest>),
    Done(RunOutcome),
}

/// Drives one instruction to completion.
///
/// Strictly sequential: one backend call at a time and the tools of a
/// batch in the order the backend emitted them.
pub struct AgentLoop {
    client: RetryingBackendClient,
    executor: ToolExecutor,
    system_instruction: String,
    max_turns: usize,
    event_sink: Option<RunEventSink>,
}

impl AgentLoop {
    pub fn new(backend: Arc<dyn ModelBackend>, registry: Arc<ToolRegistry>) -> Self {
        Self {
            client: RetryingBackendClient::new(backend, RetryPolicy::default()),
            executor: ToolExecutor::new(registry),
            system_instruction: DEFAULT_SYSTEM_INSTRUCTION.to_string(),
            max_turns: DEFAULT_MAX_TURNS,
            event_sink: None,
        }
    }

    pub fn from_config(
        backend: Arc<dyn ModelBackend>,
        registry: Arc<ToolRegistry>,
        config: &AgentConfig,
    ) -> Self {
        Self::new(backend, registry)
            .with_retry_policy(config.retry.policy())
            .with_tool_timeout(config.tool_timeout)
            .with_system_instruction(config.system_instruction.clone())
            .with_max_turns(config.max_turns)
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.client = RetryingBackendClient::new(Arc::clone(self.client.backend()), policy);
        self
    }

    /// `None` disables the per-tool timeout.
    pub fn with_tool_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.executor = self.executor.with_timeout(timeout);
        self
    }

    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = instruction.into();
        self
    }

    /// Maximum number of backend calls per run.
    pub fn with_max_turns(mut self, max_turns: usize) -> Self {
        self.max_turns = max_turns;
        self
    }

    pub fn with_event_sink(mut self, sink: RunEventSink) -> Self {
        self.event_sink = Some(sink);
        self
    }

    /// Run `instruction` until the backend answers with text, the turn
    /// budget runs out, or `cancel` fires.
    ///
    /// Tool failures are fed back to the backend. Only backend errors that
    /// survive the retry policy end the run with `Err`.
    pub async fn run(
        &self,
        instruction: impl Into<String>,
        cancel: CancellationToken,
    ) -> Result<RunReport, AgentError> {
        let run_id = Uuid::new_v4();
        let emitter = RunEventEmitter::new(run_id, self.event_sink.clone());
        let tools = self.executor.registry().schema();
        let mut conversation = ConversationState::seeded(instruction);
        let mut backend_calls = 0usize;
        let mut state = LoopState::AwaitingBackend;

        tracing::info!(
            run_id = %run_id,
            tools = tools.len(),
            max_turns = self.max_turns,
            "codemend run started"
        );

        let outcome = loop {
            state = match state {
                LoopState::Done(outcome) => break outcome,
                LoopState::AwaitingBackend => {
                    if cancel.is_cancelled() {
                        LoopState::Done(RunOutcome::Canceled)
                    } else if backend_calls >= self.max_turns {
                        LoopState::Done(RunOutcome::MaxTurnsExceeded {
                            max_turns: self.max_turns,
                        })
                    } else {
                        backend_calls += 1;
                        emitter.emit(RunEventPayload::BackendCallStarted {
                            call_number: backend_calls,
                        });
                        let request = BackendRequest {
                            system_instruction: &self.system_instruction,
                            turns: conversation.turns(),
                            tools: &tools,
                        };
                        let response = tokio::select! {
                            biased;
                            _ = cancel.cancelled() => None,
                            response = self.client.call(&request) => Some(response?),
                        };
                        match response {
                            None => LoopState::Done(RunOutcome::Canceled),
                            Some(BackendResponse::FinalText(text)) => {
                                LoopState::Done(RunOutcome::Completed { text })
                            }
                            Some(BackendResponse::ToolCalls(calls)) => {
                                if calls.is_empty() {
                                    return Err(AgentError::InvalidResponse(
                                        "backend returned an empty tool-call batch".into(),
                                    ));
                                }
                                tracing::debug!(
                                    run_id = %run_id,
                                    calls = calls.len(),
                                    "tool-call batch received"
                                );
                                conversation.push_tool_calls(calls.clone())?;
                                LoopState::DispatchingTools(calls)
                            }
                        }
                    }
                }
                LoopState::DispatchingTools(calls) => {
                    let mut next = LoopState::AwaitingBackend;
                    for call in calls {
                        if cancel.is_cancelled() {
                            conversation.push_tool_result(ToolResponse::new(
                                &call,
                                ToolResult::failure(
                                    ToolFailureKind::Canceled,
                                    "run canceled before this call was dispatched",
                                ),
                            ))?;
                            next = LoopState::Done(RunOutcome::Canceled);
                            continue;
                        }
                        emitter.emit(RunEventPayload::ToolCallStarted { call: call.clone() });
                        let response = self.executor.execute(&call).await;
                        emitter.emit(RunEventPayload::ToolCallCompleted {
                            response: response.clone(),
                        });
                        conversation.push_tool_result(response)?;
                    }
                    next
                }
            };
        };

        tracing::info!(
            run_id = %run_id,
            backend_calls,
            outcome = ?outcome,
            "codemend run finished"
        );
        emitter.emit(RunEventPayload::Finished {
            outcome: outcome.clone(),
        });

        Ok(RunReport {
            run_id,
            outcome,
            conversation,
            backend_calls,
            finished_at: Utc::now(),
        })
    }
}

impl std::fmt::Debug for AgentLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentLoop")
            .field("client", &self.client)
            .field("executor", &self.executor)
            .field("max_turns", &self.max_turns)
            .finish_non_exhaustive()
    }
}
