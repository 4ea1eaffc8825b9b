//! Error types for codemend.

use std::path::PathBuf;
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use thiserror::Error;

use crate::types::ToolFailureKind;

/// Primary error type for all codemend operations.
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Missing credential for {provider}: set {env_var}")]
    MissingCredential { provider: String, env_var: String },

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Rate limited: {message}")]
    RateLimited { message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Config file error: {0}")]
    ConfigFile(#[from] toml::de::Error),

    #[error("Invalid backend response: {0}")]
    InvalidResponse(String),

    #[error("Tool already registered: {0}")]
    DuplicateTool(String),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("Is a directory: {}", .0.display())]
    IsADirectory(PathBuf),

    #[error("Permission denied: {}: {message}", .path.display())]
    PermissionDenied { path: PathBuf, message: String },

    #[error("Invalid path: {}: {message}", .path.display())]
    PathError { path: PathBuf, message: String },

    #[error("Tool execution error: {tool_name}: {message}")]
    ToolExecution { tool_name: String, message: String },

    #[error("Timeout after {0}ms")]
    Timeout(u64),

    #[error("Invalid state: {0}")]
    InvalidState(String),
}

/// Broad error category for routing recovery logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Authentication,
    RateLimit,
    Network,
    Timeout,
    Server,
    Api,
    Configuration,
    Serialization,
    ToolExecution,
    Unknown,
}

impl AgentError {
    /// Create an API error.
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Create a tool execution error.
    pub fn tool(tool_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ToolExecution {
            tool_name: tool_name.into(),
            message: message.into(),
        }
    }

    /// Map an I/O error on `path` to the most specific filesystem variant.
    pub fn from_io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        let path = path.into();
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::FileNotFound(path),
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied {
                path,
                message: err.to_string(),
            },
            _ => Self::Io(err),
        }
    }

    /// Classify this error into a category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Authentication(_) | Self::MissingCredential { .. } => {
                ErrorCategory::Authentication
            }
            Self::RateLimited { .. } => ErrorCategory::RateLimit,
            Self::Network(_) => ErrorCategory::Network,
            Self::Timeout(_) => ErrorCategory::Timeout,
            Self::Configuration(_) | Self::ConfigFile(_) => ErrorCategory::Configuration,
            Self::Serialization(_) | Self::InvalidResponse(_) => ErrorCategory::Serialization,
            Self::Api { status, .. } => match status {
                401 | 403 => ErrorCategory::Authentication,
                429 => ErrorCategory::RateLimit,
                500..=599 => ErrorCategory::Server,
                _ => ErrorCategory::Api,
            },
            Self::UnknownTool(_)
            | Self::InvalidArgument(_)
            | Self::FileNotFound(_)
            | Self::IsADirectory(_)
            | Self::PermissionDenied { .. }
            | Self::PathError { .. }
            | Self::ToolExecution { .. } => ErrorCategory::ToolExecution,
            _ => ErrorCategory::Unknown,
        }
    }

    /// Whether the backend rejected the call for rate limiting.
    pub fn is_rate_limited(&self) -> bool {
        self.category() == ErrorCategory::RateLimit
    }

    /// Suggested wait parsed from a `retry in <seconds>` phrase in the error text.
    ///
    /// Best-effort: backends are not obliged to include the phrase.
    pub fn retry_hint(&self) -> Option<Duration> {
        let message = match self {
            Self::RateLimited { message } | Self::Api { message, .. } => message,
            _ => return None,
        };
        parse_retry_hint(message)
    }

    /// Failure classification used when a tool error is fed back to the backend.
    pub fn tool_failure_kind(&self) -> ToolFailureKind {
        match self {
            Self::UnknownTool(_) => ToolFailureKind::UnknownTool,
            Self::InvalidArgument(_) | Self::Serialization(_) => ToolFailureKind::InvalidArguments,
            Self::FileNotFound(_) => ToolFailureKind::FileNotFound,
            Self::IsADirectory(_) => ToolFailureKind::IsADirectory,
            Self::PermissionDenied { .. } => ToolFailureKind::PermissionDenied,
            Self::PathError { .. } => ToolFailureKind::PathError,
            Self::Io(_) => ToolFailureKind::Io,
            Self::Timeout(_) => ToolFailureKind::Timeout,
            _ => ToolFailureKind::Execution,
        }
    }
}

static RETRY_HINT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)retry in (\d+(?:\.\d+)?)").expect("retry hint regex must compile")
});

fn parse_retry_hint(message: &str) -> Option<Duration> {
    let captures = RETRY_HINT_RE.captures(message)?;
    let seconds: f64 = captures.get(1)?.as_str().parse().ok()?;
    let millis = (seconds * 1000.0).ceil();
    if !millis.is_finite() || millis < 0.0 {
        return None;
    }
    Some(Duration::from_millis(millis as u64))
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, AgentError>;
