//! CLI-specific error formatting for user-facing messages.

use crate::config::CONFIG_FILE_NAME;
use crate::error::AgentError;

/// Map an [`AgentError`] to a user-facing help string with actionable guidance.
pub fn format_error_help(err: &AgentError) -> String {
    match err {
        AgentError::MissingCredential { provider, env_var } => {
            format!("Missing credentials for {provider}. Set {env_var} in your environment or .env file")
        }
        AgentError::Authentication(msg) => {
            format!("Authentication failed: {msg}. Check that GEMINI_API_KEY is valid")
        }
        AgentError::Configuration(msg) => {
            format!("Configuration error: {msg}. Check CODEMEND_* variables and {CONFIG_FILE_NAME}")
        }
        AgentError::ConfigFile(e) => {
            format!("Invalid config file: {e}. Check CODEMEND_CONFIG or {CONFIG_FILE_NAME}")
        }
        AgentError::RateLimited { message } => {
            format!("Still rate limited after retrying: {message}. Wait a while and try again")
        }
        other => format!("{other}"),
    }
}
