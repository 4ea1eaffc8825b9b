mod common;

use std::time::Duration;

use pretty_assertions::assert_eq;
use tokio_util::sync::CancellationToken;

use codemend::agent_loop::{AgentLoop, RunOutcome};
use codemend::error::AgentError;
use codemend::provider::{BackendRequest, BackendResponse};
use codemend::util::{RetryPolicy, RetryingBackendClient};

use common::{builtin_registry, rate_limited, ScriptedBackend};

fn gaps(backend: &ScriptedBackend) -> Vec<Duration> {
    backend
        .requests()
        .windows(2)
        .map(|pair| pair[1].at - pair[0].at)
        .collect()
}

async fn call_once(client: &RetryingBackendClient) -> Result<BackendResponse, AgentError> {
    let request = BackendRequest {
        system_instruction: "",
        turns: &[],
        tools: &[],
    };
    client.call(&request).await
}

#[tokio::test(start_paused = true)]
async fn four_rate_limits_then_success_backs_off_exponentially() {
    let backend = ScriptedBackend::new();
    for _ in 0..4 {
        backend.queue_error(rate_limited("Resource has been exhausted"));
    }
    backend.queue_text("finally");
    let client = RetryingBackendClient::new(backend.clone(), RetryPolicy::default());

    let response = call_once(&client).await.unwrap();

    assert_eq!(response, BackendResponse::FinalText("finally".into()));
    assert_eq!(backend.call_count(), 5);
    assert_eq!(
        gaps(&backend),
        vec![
            Duration::from_secs(5),
            Duration::from_secs(10),
            Duration::from_secs(20),
            Duration::from_secs(40),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn server_hint_sets_the_delay() {
    let backend = ScriptedBackend::new();
    backend.queue_error(rate_limited("Quota exceeded. Please retry in 2.5s."));
    backend.queue_text("ok");
    let client = RetryingBackendClient::new(backend.clone(), RetryPolicy::default());

    call_once(&client).await.unwrap();

    assert_eq!(gaps(&backend), vec![Duration::from_millis(3_500)]);
}

#[tokio::test(start_paused = true)]
async fn persistent_rate_limit_exhausts_attempts_with_original_error() {
    let backend = ScriptedBackend::new();
    for attempt in 0..10 {
        backend.queue_error(rate_limited(&format!("busy #{attempt}")));
    }
    let client = RetryingBackendClient::new(backend.clone(), RetryPolicy::default());

    let err = call_once(&client).await.unwrap_err();

    assert_eq!(backend.call_count(), 5);
    assert!(matches!(err, AgentError::RateLimited { message } if message == "busy #4"));
}

#[tokio::test(start_paused = true)]
async fn api_429_is_retried_like_rate_limit() {
    let backend = ScriptedBackend::new();
    backend.queue_error(AgentError::api(429, "too many requests"));
    backend.queue_text("ok");
    let client = RetryingBackendClient::new(backend.clone(), RetryPolicy::default());

    call_once(&client).await.unwrap();

    assert_eq!(backend.call_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn other_errors_are_not_retried() {
    let backend = ScriptedBackend::new();
    backend.queue_error(AgentError::api(500, "internal"));
    backend.queue_text("never reached");
    let client = RetryingBackendClient::new(backend.clone(), RetryPolicy::default());

    let err = call_once(&client).await.unwrap_err();

    assert!(matches!(err, AgentError::Api { status: 500, .. }));
    assert_eq!(backend.call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn custom_policy_limits_attempts() {
    let backend = ScriptedBackend::new();
    for _ in 0..3 {
        backend.queue_error(rate_limited("busy"));
    }
    let policy = RetryPolicy {
        max_attempts: 2,
        base_delay: Duration::from_millis(100),
        hint_margin: Duration::ZERO,
    };
    let client = RetryingBackendClient::new(backend.clone(), policy);

    assert!(call_once(&client).await.is_err());
    assert_eq!(backend.call_count(), 2);
    assert_eq!(gaps(&backend), vec![Duration::from_millis(100)]);
}

#[tokio::test(start_paused = true)]
async fn loop_retries_count_as_one_turn() {
    let backend = ScriptedBackend::new();
    backend.queue_error(rate_limited("busy"));
    backend.queue_text("done");

    let report = AgentLoop::new(backend.clone(), builtin_registry())
        .with_max_turns(1)
        .run("go", CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.outcome, RunOutcome::Completed { text: "done".into() });
    assert_eq!(report.backend_calls, 1);
    assert_eq!(backend.call_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn cancel_interrupts_retry_sleep() {
    let backend = ScriptedBackend::new();
    backend.queue_error(rate_limited("busy"));
    backend.queue_text("too late");
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(1)).await;
        trigger.cancel();
    });

    let report = AgentLoop::new(backend.clone(), builtin_registry())
        .run("go", cancel)
        .await
        .unwrap();

    assert_eq!(report.outcome, RunOutcome::Canceled);
    assert_eq!(backend.call_count(), 1);
}
