//! Configuration system (layered: defaults < config file < env).

use std::fmt;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::AgentError;
use crate::prompt::DEFAULT_SYSTEM_INSTRUCTION;
use crate::tools::ListFilesOptions;
use crate::types::GenerationSettings;
use crate::util::RetryPolicy;

pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MAX_TURNS: usize = 50;
pub const DEFAULT_TOOL_TIMEOUT_SECS: u64 = 60;

/// File looked up in the working directory when `CODEMEND_CONFIG` is unset.
pub const CONFIG_FILE_NAME: &str = "codemend.toml";

/// Credential env vars, in lookup order.
pub const API_KEY_ENV_VARS: [&str; 2] = ["GEMINI_API_KEY", "GOOGLE_API_KEY"];

/// Retry knobs as they appear in the config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub hint_margin_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            max_attempts: policy.max_attempts,
            base_delay_ms: policy.base_delay.as_millis() as u64,
            hint_margin_ms: policy.hint_margin.as_millis() as u64,
        }
    }
}

impl RetrySettings {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            base_delay: Duration::from_millis(self.base_delay_ms),
            hint_margin: Duration::from_millis(self.hint_margin_ms),
        }
    }
}

/// Contents of `codemend.toml`. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub max_turns: Option<usize>,
    pub tool_timeout_secs: Option<u64>,
    pub system_instruction: Option<String>,
    pub generation: Option<GenerationSettings>,
    pub retry: Option<RetrySettings>,
    pub list_files: Option<ListFilesOptions>,
}

impl FileConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, AgentError> {
        Ok(toml::from_str(raw)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, AgentError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            AgentError::Configuration(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&raw)
    }
}

/// Resolved runtime configuration.
#[derive(Clone)]
pub struct AgentConfig {
    api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub max_turns: usize,
    /// `None` disables the per-tool timeout.
    pub tool_timeout: Option<Duration>,
    pub system_instruction: String,
    pub generation: GenerationSettings,
    pub retry: RetrySettings,
    pub list_files: ListFilesOptions,
}

impl fmt::Debug for AgentConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "[redacted]"))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("max_turns", &self.max_turns)
            .field("tool_timeout", &self.tool_timeout)
            .field("generation", &self.generation)
            .field("retry", &self.retry)
            .field("list_files", &self.list_files)
            .finish_non_exhaustive()
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            max_turns: DEFAULT_MAX_TURNS,
            tool_timeout: Some(Duration::from_secs(DEFAULT_TOOL_TIMEOUT_SECS)),
            system_instruction: DEFAULT_SYSTEM_INSTRUCTION.to_string(),
            generation: GenerationSettings::default(),
            retry: RetrySettings::default(),
            list_files: ListFilesOptions::default(),
        }
    }
}

impl AgentConfig {
    /// Load from `.env`, the config file and the process environment.
    pub fn load() -> Result<Self, AgentError> {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error

        let file = match std::env::var("CODEMEND_CONFIG") {
            Ok(path) if !path.trim().is_empty() => Some(FileConfig::load(path)?),
            _ => {
                let local = Path::new(CONFIG_FILE_NAME);
                if local.is_file() {
                    Some(FileConfig::load(local)?)
                } else {
                    None
                }
            }
        };

        Self::from_sources(file, |key| std::env::var(key).ok())
    }

    /// Merge defaults, an optional file layer and an env lookup.
    pub fn from_sources<E>(file: Option<FileConfig>, env: E) -> Result<Self, AgentError>
    where
        E: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let lookup = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        if let Some(file) = file {
            if let Some(model) = file.model {
                config.model = model;
            }
            if let Some(base_url) = file.base_url {
                config.base_url = base_url;
            }
            if let Some(max_turns) = file.max_turns {
                config.max_turns = max_turns;
            }
            if let Some(secs) = file.tool_timeout_secs {
                config.tool_timeout = timeout_from_secs(secs);
            }
            if let Some(instruction) = file.system_instruction {
                config.system_instruction = instruction;
            }
            if let Some(generation) = file.generation {
                config.generation = generation;
            }
            if let Some(retry) = file.retry {
                config.retry = retry;
            }
            if let Some(list_files) = file.list_files {
                config.list_files = list_files;
            }
        }

        config.api_key = API_KEY_ENV_VARS.iter().find_map(|key| lookup(*key));
        if let Some(model) = lookup("CODEMEND_MODEL") {
            config.model = model;
        }
        if let Some(base_url) = lookup("CODEMEND_BASE_URL") {
            config.base_url = base_url;
        }
        if let Some(raw) = lookup("CODEMEND_MAX_TURNS") {
            config.max_turns = parse_env("CODEMEND_MAX_TURNS", &raw)?;
        }
        if let Some(raw) = lookup("CODEMEND_TOOL_TIMEOUT_SECS") {
            config.tool_timeout = timeout_from_secs(parse_env("CODEMEND_TOOL_TIMEOUT_SECS", &raw)?);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    fn validate(&self) -> Result<(), AgentError> {
        if self.max_turns == 0 {
            return Err(AgentError::Configuration(
                "max_turns must be at least 1".into(),
            ));
        }
        if self.retry.max_attempts == 0 {
            return Err(AgentError::Configuration(
                "retry.max_attempts must be at least 1".into(),
            ));
        }
        if self.list_files.max_depth == 0 {
            return Err(AgentError::Configuration(
                "list_files.max_depth must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

fn timeout_from_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

fn parse_env<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, AgentError> {
    raw.trim().parse().map_err(|_| {
        AgentError::Configuration(format!("{key} must be a non-negative integer, got '{raw}'"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_without_sources() {
        let config = AgentConfig::from_sources(None, env_from(&[])).unwrap();

        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.max_turns, 50);
        assert_eq!(config.tool_timeout, Some(Duration::from_secs(60)));
        assert_eq!(config.retry.policy(), RetryPolicy::default());
        assert!(config.api_key().is_none());
    }

    #[test]
    fn gemini_key_wins_over_google_key() {
        let config = AgentConfig::from_sources(
            None,
            env_from(&[("GOOGLE_API_KEY", "google"), ("GEMINI_API_KEY", "gemini")]),
        )
        .unwrap();

        assert_eq!(config.api_key(), Some("gemini"));
    }

    #[test]
    fn debug_redacts_api_key() {
        let config = AgentConfig::default().with_api_key("sk-secret");

        let rendered = format!("{config:?}");

        assert!(!rendered.contains("sk-secret"));
        assert!(rendered.contains("[redacted]"));
    }

    #[test]
    fn zero_timeout_disables_tool_timeout() {
        let config =
            AgentConfig::from_sources(None, env_from(&[("CODEMEND_TOOL_TIMEOUT_SECS", "0")]))
                .unwrap();

        assert_eq!(config.tool_timeout, None);
    }

    #[test]
    fn malformed_env_number_is_a_configuration_error() {
        let err = AgentConfig::from_sources(None, env_from(&[("CODEMEND_MAX_TURNS", "lots")]))
            .unwrap_err();

        assert!(
            matches!(err, AgentError::Configuration(msg) if msg.contains("CODEMEND_MAX_TURNS"))
        );
    }

    #[test]
    fn zero_max_turns_is_rejected() {
        let file = FileConfig {
            max_turns: Some(0),
            ..FileConfig::default()
        };

        assert!(AgentConfig::from_sources(Some(file), env_from(&[])).is_err());
    }

    #[test]
    fn unknown_file_keys_are_rejected() {
        assert!(FileConfig::from_toml_str("modle = \"typo\"").is_err());
    }
}
