//! Run event types.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::types::{ToolInvocationRequest, ToolResponse};

use super::types::{RunId, RunOutcome};

/// Concrete event payloads emitted by the agent loop.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RunEventPayload {
    /// `call_number` is one-based.
    BackendCallStarted { call_number: usize },
    ToolCallStarted { call: ToolInvocationRequest },
    ToolCallCompleted { response: ToolResponse },
    Finished { outcome: RunOutcome },
}

/// Envelope for run events.
#[derive(Debug, Clone, Serialize)]
pub struct RunEvent {
    pub run_id: RunId,
    pub seq: u64,
    pub timestamp: DateTime<Utc>,
    pub payload: RunEventPayload,
}

/// Callback receiving run events.
pub type RunEventSink = Arc<dyn Fn(RunEvent) + Send + Sync>;

pub(crate) struct RunEventEmitter {
    run_id: RunId,
    seq: AtomicU64,
    sink: Option<RunEventSink>,
}

impl RunEventEmitter {
    pub(crate) fn new(run_id: RunId, sink: Option<RunEventSink>) -> Self {
        Self {
            run_id,
            seq: AtomicU64::new(1),
            sink,
        }
    }

    pub(crate) fn emit(&self, payload: RunEventPayload) {
        let Some(sink) = &self.sink else {
            return;
        };
        let seq = self.seq.fetch_add(1, Ordering::SeqCst);
        (sink)(RunEvent {
            run_id: self.run_id,
            seq,
            timestamp: Utc::now(),
            payload,
        });
    }
}
