//! Model backends the judge can call.
//!
//! [`LlmBackend`] dispatches by enum so the async `complete` call needs no
//! boxed futures. Both hosted wire formats go through one [`HttpBackend`];
//! the [`BackendType`] decides the path, the auth header, the request body
//! and where the reply text sits in the response. [`ScriptedBackend`]
//! answers offline with a fixed reply.

use std::time::Duration;

use serde_json::{Value, json};

use crate::config::{BackendType, LlmBackendConfig};
use crate::error::JudgeError;
use crate::prompt::RenderedPrompt;

/// Header version pinned for the Messages API.
const MESSAGES_API_VERSION: &str = "2023-06-01";

/// A judge backend: something that turns a prompt into reply text.
#[derive(Debug)]
pub enum LlmBackend {
    /// A hosted model reached over HTTP.
    Http(HttpBackend),
    /// Canned reply, for offline runs and tests.
    Scripted(ScriptedBackend),
}

impl LlmBackend {
    /// Ask the backend for a reply to `prompt`.
    ///
    /// # Errors
    ///
    /// Returns [`JudgeError::Backend`] when the call fails or the reply
    /// carries no text.
    pub async fn complete(&self, prompt: &RenderedPrompt) -> Result<String, JudgeError> {
        match self {
            Self::Http(backend) => backend.complete(prompt).await,
            Self::Scripted(backend) => backend.complete().await,
        }
    }

    /// Short label used in log lines.
    pub const fn name(&self) -> &str {
        match self {
            Self::Http(backend) => wire_label(backend.wire),
            Self::Scripted(_) => "scripted",
        }
    }
}

/// Create the backend described by `config`.
pub fn create_backend(config: &LlmBackendConfig) -> LlmBackend {
    LlmBackend::Http(HttpBackend::new(config))
}

/// A hosted model speaking either chat completions or Messages.
#[derive(Debug)]
pub struct HttpBackend {
    client: reqwest::Client,
    wire: BackendType,
    endpoint: String,
    api_key: String,
    model: String,
}

impl HttpBackend {
    /// Build a client for `config`. A trailing slash on the URL is ignored.
    pub fn new(config: &LlmBackendConfig) -> Self {
        let base = config.api_url.trim_end_matches('/');
        let path = match config.backend_type {
            BackendType::OpenAi => "chat/completions",
            BackendType::Anthropic => "messages",
        };
        Self {
            client: reqwest::Client::new(),
            wire: config.backend_type,
            endpoint: format!("{base}/{path}"),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        }
    }

    async fn complete(&self, prompt: &RenderedPrompt) -> Result<String, JudgeError> {
        let request = self
            .client
            .post(&self.endpoint)
            .json(&request_body(self.wire, &self.model, prompt));
        let request = match self.wire {
            BackendType::OpenAi => request.bearer_auth(&self.api_key),
            BackendType::Anthropic => request
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", MESSAGES_API_VERSION),
        };

        let response = request
            .send()
            .await
            .map_err(|e| self.failure(format!("request failed: {e}")))?;
        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(self.failure(format!("HTTP {status}: {detail}")));
        }
        let reply: Value = response
            .json()
            .await
            .map_err(|e| self.failure(format!("unreadable body: {e}")))?;
        reply_text(self.wire, &reply)
            .map(ToOwned::to_owned)
            .ok_or_else(|| self.failure(format!("no text at {}", reply_pointer(self.wire))))
    }

    fn failure(&self, detail: String) -> JudgeError {
        JudgeError::Backend(format!("{} judge: {detail}", wire_label(self.wire)))
    }
}

const fn wire_label(wire: BackendType) -> &'static str {
    match wire {
        BackendType::OpenAi => "openai-compatible",
        BackendType::Anthropic => "anthropic",
    }
}

/// JSON pointer to the reply text in a successful response.
const fn reply_pointer(wire: BackendType) -> &'static str {
    match wire {
        BackendType::OpenAi => "/choices/0/message/content",
        BackendType::Anthropic => "/content/0/text",
    }
}

fn reply_text(wire: BackendType, reply: &Value) -> Option<&str> {
    reply.pointer(reply_pointer(wire)).and_then(Value::as_str)
}

/// Request body for one prompt. The Messages API takes the system prompt
/// as a top-level field and has no JSON mode.
fn request_body(wire: BackendType, model: &str, prompt: &RenderedPrompt) -> Value {
    match wire {
        BackendType::OpenAi => {
            let mut body = json!({
                "model": model,
                "messages": [
                    {"role": "system", "content": prompt.system},
                    {"role": "user", "content": prompt.user},
                ],
                "temperature": prompt.temperature,
                "max_tokens": prompt.max_tokens,
            });
            if prompt.json_response
                && let Some(fields) = body.as_object_mut()
            {
                fields.insert("response_format".to_owned(), json!({"type": "json_object"}));
            }
            body
        }
        BackendType::Anthropic => json!({
            "model": model,
            "system": prompt.system,
            "messages": [{"role": "user", "content": prompt.user}],
            "temperature": prompt.temperature,
            "max_tokens": prompt.max_tokens,
        }),
    }
}

/// Backend that always answers with the same reply after an optional delay.
#[derive(Debug, Clone)]
pub struct ScriptedBackend {
    reply: Result<String, String>,
    delay: Duration,
}

impl ScriptedBackend {
    /// Always answer with `text`.
    pub fn reply(text: impl Into<String>) -> Self {
        Self {
            reply: Ok(text.into()),
            delay: Duration::ZERO,
        }
    }

    /// Always fail with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            reply: Err(message.into()),
            delay: Duration::ZERO,
        }
    }

    /// Wait `delay` before answering.
    #[must_use]
    pub const fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    async fn complete(&self) -> Result<String, JudgeError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.reply.clone().map_err(JudgeError::Backend)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(backend_type: BackendType) -> LlmBackendConfig {
        LlmBackendConfig {
            backend_type,
            api_url: "https://judge.example/v1/".to_owned(),
            api_key: "test-key".to_owned(),
            model: "test-model".to_owned(),
        }
    }

    #[test]
    fn endpoints_follow_the_wire_format() {
        let chat = HttpBackend::new(&config(BackendType::OpenAi));
        assert_eq!(chat.endpoint, "https://judge.example/v1/chat/completions");
        let messages = HttpBackend::new(&config(BackendType::Anthropic));
        assert_eq!(messages.endpoint, "https://judge.example/v1/messages");
        assert_eq!(create_backend(&config(BackendType::Anthropic)).name(), "anthropic");
    }

    #[test]
    fn chat_replies_are_read_from_the_first_choice() {
        let reply = json!({"choices": [{"message": {"content": "{\"homeScoreAdjust\": 4}"}}]});
        assert!(reply_text(BackendType::OpenAi, &reply).is_some_and(|t| t.contains("homeScoreAdjust")));
        assert_eq!(reply_text(BackendType::OpenAi, &json!({"choices": []})), None);
    }

    #[test]
    fn message_replies_are_read_from_the_first_block() {
        let reply = json!({"content": [{"type": "text", "text": "Fans cheer for Ace."}]});
        assert_eq!(reply_text(BackendType::Anthropic, &reply), Some("Fans cheer for Ace."));
        let image = json!({"content": [{"type": "image"}]});
        assert_eq!(reply_text(BackendType::Anthropic, &image), None);
    }

    #[test]
    fn json_mode_only_rides_on_chat_requests() {
        let mut prompt = RenderedPrompt::plain("system", "user");
        prompt.json_response = true;
        let chat = request_body(BackendType::OpenAi, "m", &prompt);
        assert_eq!(chat.pointer("/response_format/type"), Some(&json!("json_object")));
        assert_eq!(chat.pointer("/messages/0/role"), Some(&json!("system")));

        let messages = request_body(BackendType::Anthropic, "m", &prompt);
        assert!(messages.get("response_format").is_none());
        assert_eq!(messages.get("system"), Some(&json!("system")));
    }

    #[tokio::test]
    async fn scripted_backend_replays() {
        let prompt = RenderedPrompt::plain("system", "user");
        let ok = LlmBackend::Scripted(ScriptedBackend::reply("{}"));
        assert!(ok.complete(&prompt).await.is_ok_and(|t| t == "{}"));

        let failing = LlmBackend::Scripted(ScriptedBackend::failing("down"));
        assert!(matches!(
            failing.complete(&prompt).await,
            Err(JudgeError::Backend(msg)) if msg == "down"
        ));
    }
}
