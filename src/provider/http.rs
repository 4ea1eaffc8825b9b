//! HTTP client construction and status-code error mapping.

use std::time::Duration;

use crate::error::AgentError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Build the reqwest client a backend owns.
pub fn build_client() -> Result<reqwest::Client, AgentError> {
    reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .pool_max_idle_per_host(10)
        .build()
        .map_err(AgentError::Network)
}

/// Map a non-success HTTP status to an error.
pub fn status_to_error(status: u16, body: &str) -> AgentError {
    let message = extract_error_message(body);
    match status {
        401 | 403 => AgentError::Authentication(message),
        429 => AgentError::RateLimited { message },
        _ => AgentError::api(status, message),
    }
}

/// Pull `error.message` out of a JSON error body, falling back to the raw body.
fn extract_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limit_keeps_retry_phrase() {
        let body = r#"{"error":{"code":429,"message":"Quota exceeded. Please retry in 7.5s.","status":"RESOURCE_EXHAUSTED"}}"#;

        let err = status_to_error(429, body);

        assert!(err.is_rate_limited());
        assert_eq!(err.retry_hint(), Some(Duration::from_millis(7_500)));
    }

    #[test]
    fn auth_statuses_map_to_authentication() {
        assert!(matches!(status_to_error(401, "nope"), AgentError::Authentication(_)));
        assert!(matches!(status_to_error(403, "nope"), AgentError::Authentication(_)));
    }

    #[test]
    fn other_statuses_keep_raw_body() {
        let err = status_to_error(500, "upstream exploded");

        match err {
            AgentError::Api { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "upstream exploded");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }
}
