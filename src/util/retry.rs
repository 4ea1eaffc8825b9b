//! Retry for rate-limited backend calls.
//!
//! Waits for the server's `retry in N` hint when present, otherwise backs
//! off exponentially from `base_delay`.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::error::AgentError;
use crate::provider::{BackendRequest, BackendResponse, ModelBackend};

/// Retry policy configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the first).
    pub max_attempts: u32,
    /// Backoff before the second attempt; doubles for each one after.
    pub base_delay: Duration,
    /// Added to a server-supplied retry hint.
    pub hint_margin: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_secs(5),
            hint_margin: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Delay to wait after zero-based `attempt` failed with `error`.
    pub fn delay_for(&self, attempt: u32, error: &AgentError) -> Duration {
        match error.retry_hint() {
            Some(hint) => hint.saturating_add(self.hint_margin),
            None => self
                .base_delay
                .saturating_mul(2u32.checked_pow(attempt).unwrap_or(u32::MAX)),
        }
    }

    /// Execute an async operation, retrying rate-limit failures.
    ///
    /// Any other error, or the error from the final attempt, is returned
    /// unchanged.
    pub async fn execute<F, Fut, T>(&self, mut operation: F) -> Result<T, AgentError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, AgentError>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    if !e.is_rate_limited() || attempt + 1 >= max_attempts {
                        return Err(e);
                    }

                    let delay = self.delay_for(attempt, &e);
                    tracing::warn!(
                        attempt = attempt + 1,
                        max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Rate limited, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

/// A [`ModelBackend`] wrapped in a [`RetryPolicy`].
#[derive(Clone)]
pub struct RetryingBackendClient {
    backend: Arc<dyn ModelBackend>,
    policy: RetryPolicy,
}

impl RetryingBackendClient {
    pub fn new(backend: Arc<dyn ModelBackend>, policy: RetryPolicy) -> Self {
        Self { backend, policy }
    }

    pub fn backend(&self) -> &Arc<dyn ModelBackend> {
        &self.backend
    }

    pub async fn call(&self, request: &BackendRequest<'_>) -> Result<BackendResponse, AgentError> {
        tracing::debug!(
            provider = self.backend.provider_name(),
            model = self.backend.model_id(),
            turns = request.turns.len(),
            "calling backend"
        );
        self.policy.execute(|| self.backend.generate(request)).await
    }
}

impl std::fmt::Debug for RetryingBackendClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryingBackendClient")
            .field("provider", &self.backend.provider_name())
            .field("model", &self.backend.model_id())
            .field("policy", &self.policy)
            .finish()
    }
}
