//! Error types for the judge.
//!
//! None of these ever reach a simulation caller: every public judge method
//! recovers from them by falling back to the local computation. They exist
//! so the fallback path can log what went wrong.

/// Errors that can occur while consulting the world model.
#[derive(Debug, thiserror::Error)]
pub enum JudgeError {
    /// Failed to load or render a prompt template.
    #[error("template render error: {0}")]
    Template(String),

    /// A model backend returned an error or was unreachable.
    #[error("model backend error: {0}")]
    Backend(String),

    /// The model response did not contain usable JSON.
    #[error("response parse error: {0}")]
    Parse(String),

    /// The model call exceeded the configured deadline.
    #[error("model call exceeded {timeout_ms} ms")]
    Timeout {
        /// The deadline that was exceeded.
        timeout_ms: u128,
    },

    /// No model backend is configured.
    #[error("no model backend configured")]
    Disabled,

    /// Configuration is invalid or missing.
    #[error("config error: {0}")]
    Config(String),

    /// Serialization or deserialization failure.
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
}
