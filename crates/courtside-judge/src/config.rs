//! Configuration types for the judge.
//!
//! All configuration is loaded from environment variables. When no backend
//! is configured the judge runs in fallback-only mode: every verdict comes
//! from the local deterministic computation.

use std::time::Duration;

use crate::error::JudgeError;

/// Default deadline for a single model call.
pub const DEFAULT_TIMEOUT_MS: u64 = 8000;

/// Complete judge configuration.
#[derive(Debug, Clone)]
pub struct JudgeConfig {
    /// Model backend, `None` for fallback-only mode.
    pub backend: Option<LlmBackendConfig>,
    /// Maximum time allowed for one model call.
    pub timeout: Duration,
    /// Directory with prompt template overrides. Embedded templates are
    /// used for anything not found there.
    pub templates_dir: Option<String>,
}

impl Default for JudgeConfig {
    fn default() -> Self {
        Self {
            backend: None,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            templates_dir: None,
        }
    }
}

/// Configuration for a single model backend.
#[derive(Debug, Clone)]
pub struct LlmBackendConfig {
    /// The backend type.
    pub backend_type: BackendType,
    /// Base API URL (e.g. `https://api.openai.com/v1`).
    pub api_url: String,
    /// API key for authentication.
    pub api_key: String,
    /// Model identifier.
    pub model: String,
}

/// Supported model backend types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendType {
    /// `OpenAI`-compatible chat completions API.
    OpenAi,
    /// Anthropic Messages API.
    Anthropic,
}

impl BackendType {
    /// Parse a backend name as it appears in `JUDGE_BACKEND`.
    ///
    /// # Errors
    ///
    /// Returns [`JudgeError::Config`] for unknown names.
    pub fn parse(name: &str) -> Result<Self, JudgeError> {
        match name.trim().to_lowercase().as_str() {
            "openai" | "deepseek" | "ollama" | "kimi" | "moonshot" => Ok(Self::OpenAi),
            "anthropic" | "claude" => Ok(Self::Anthropic),
            other => Err(JudgeError::Config(format!("unknown backend type: {other}"))),
        }
    }
}

impl JudgeConfig {
    /// Load configuration from environment variables.
    ///
    /// Optional variables:
    /// - `JUDGE_BACKEND` -- backend type; when unset the judge is fallback-only
    /// - `JUDGE_API_URL` -- API base URL (required with `JUDGE_BACKEND`)
    /// - `JUDGE_API_KEY` -- API key (required with `JUDGE_BACKEND`)
    /// - `JUDGE_MODEL` -- model name (required with `JUDGE_BACKEND`)
    /// - `JUDGE_TIMEOUT_MS` -- per-call deadline in milliseconds (default 8000)
    /// - `JUDGE_TEMPLATES_DIR` -- directory with prompt template overrides
    ///
    /// # Errors
    ///
    /// Returns [`JudgeError::Config`] if a backend is named but incomplete,
    /// or if the timeout does not parse.
    pub fn from_env() -> Result<Self, JudgeError> {
        let backend = match std::env::var("JUDGE_BACKEND") {
            Ok(name) if !name.trim().is_empty() => Some(LlmBackendConfig {
                backend_type: BackendType::parse(&name)?,
                api_url: env_var("JUDGE_API_URL")?,
                api_key: env_var("JUDGE_API_KEY")?,
                model: env_var("JUDGE_MODEL")?,
            }),
            _ => None,
        };

        let timeout_ms: u64 = std::env::var("JUDGE_TIMEOUT_MS")
            .unwrap_or_else(|_| DEFAULT_TIMEOUT_MS.to_string())
            .parse()
            .map_err(|e| JudgeError::Config(format!("invalid JUDGE_TIMEOUT_MS: {e}")))?;

        let templates_dir = std::env::var("JUDGE_TEMPLATES_DIR").ok();

        Ok(Self {
            backend,
            timeout: Duration::from_millis(timeout_ms),
            templates_dir,
        })
    }
}

/// Read a required environment variable.
fn env_var(name: &str) -> Result<String, JudgeError> {
    std::env::var(name)
        .map_err(|e| JudgeError::Config(format!("missing required env var {name}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_type_parsing() {
        assert!(matches!(BackendType::parse("OpenAI"), Ok(BackendType::OpenAi)));
        assert!(matches!(BackendType::parse("kimi"), Ok(BackendType::OpenAi)));
        assert!(matches!(
            BackendType::parse(" claude "),
            Ok(BackendType::Anthropic)
        ));
        assert!(matches!(
            BackendType::parse("gopher"),
            Err(JudgeError::Config(_))
        ));
    }

    #[test]
    fn default_is_fallback_only() {
        let config = JudgeConfig::default();
        assert!(config.backend.is_none());
        assert_eq!(config.timeout, Duration::from_millis(DEFAULT_TIMEOUT_MS));
    }
}
