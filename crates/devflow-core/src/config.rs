use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{DevflowError, Result};

/// Top-level devflow configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub engine: EngineConfig,
    pub model: ModelConfig,
    #[serde(default)]
    pub retry: RetryConfig,
}

/// Executor limits and artifact placement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Safety ceiling on total node visits per run. The graph has no
    /// structural termination guarantee: every revision loop is gated
    /// on an external verdict that could oscillate indefinitely.
    #[serde(default = "default_max_visits")]
    pub max_visits: usize,
    /// Directory generated code artifacts are written into.
    #[serde(default = "default_artifact_dir")]
    pub artifact_dir: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_visits: default_max_visits(),
            artifact_dir: default_artifact_dir(),
        }
    }
}

// Happy path visits 10 nodes; 60 allows several full revision cycles.
fn default_max_visits() -> usize {
    60
}

fn default_artifact_dir() -> String {
    "generated_code".to_string()
}

/// Content service model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    pub model_id: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_provider() -> String {
    "openai".to_string()
}

fn default_max_tokens() -> u32 {
    8192
}

fn default_temperature() -> f32 {
    0.2
}

fn default_request_timeout() -> u64 {
    120
}

/// Retry policy for the content-service boundary. The engine itself
/// never retries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_initial_backoff")]
    pub initial_backoff_ms: u64,
    #[serde(default = "default_max_backoff")]
    pub max_backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff(),
            max_backoff_ms: default_max_backoff(),
        }
    }
}

fn default_max_retries() -> u32 {
    3
}

fn default_initial_backoff() -> u64 {
    1000
}

fn default_max_backoff() -> u64 {
    30000
}

impl PipelineConfig {
    /// Load config from a TOML file, with env var expansion.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|_| DevflowError::ConfigNotFound(path.display().to_string()))?;

        // Expand ${ENV_VAR} references (API keys live in the environment)
        let expanded = expand_env_vars(&content);

        toml::from_str(&expanded).map_err(|e| DevflowError::Config(e.to_string()))
    }
}

fn expand_env_vars(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '$' && chars.peek() == Some(&'{') {
            chars.next(); // consume '{'
            let mut var_name = String::new();
            for c in chars.by_ref() {
                if c == '}' {
                    break;
                }
                var_name.push(c);
            }
            match std::env::var(&var_name) {
                Ok(val) => result.push_str(&val),
                Err(_) => {
                    // Keep original if env var not set
                    result.push_str(&format!("${{{}}}", var_name));
                }
            }
        } else {
            result.push(c);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_defaults() {
        let engine = EngineConfig::default();
        assert_eq!(engine.max_visits, 60);
        assert_eq!(engine.artifact_dir, "generated_code");
    }

    #[test]
    fn test_minimal_toml() {
        let config: PipelineConfig = toml::from_str(
            r#"
            [model]
            model_id = "gemma2-9b-it"
            "#,
        )
        .unwrap();
        assert_eq!(config.model.provider, "openai");
        assert_eq!(config.model.model_id, "gemma2-9b-it");
        assert_eq!(config.model.request_timeout_secs, 120);
        assert_eq!(config.retry.max_retries, 3);
        assert_eq!(config.engine.max_visits, 60);
    }

    #[test]
    fn test_expand_env_vars() {
        std::env::set_var("TEST_DEVFLOW_VAR", "expanded");
        let result = expand_env_vars("key = \"${TEST_DEVFLOW_VAR}\"");
        assert_eq!(result, "key = \"expanded\"");

        let kept = expand_env_vars("key = \"${TEST_DEVFLOW_MISSING}\"");
        assert_eq!(kept, "key = \"${TEST_DEVFLOW_MISSING}\"");
    }
}
