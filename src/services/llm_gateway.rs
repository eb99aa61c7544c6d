use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value as JsonValue};
use std::time::Duration;

use crate::config::Config;
use crate::error::{Error, Result};

/// Prefix of every offline placeholder reply.
pub const PLACEHOLDER_TAG: &str = "[DUMMY-";

pub fn is_placeholder(text: &str) -> bool {
    text.starts_with(PLACEHOLDER_TAG)
}

/// Uniform text completion over whatever provider is configured.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LlmGateway: Send + Sync {
    async fn complete(&self, system: &str, user: &str, temperature: f32) -> Result<String>;
}

/// Non-2xx replies are data here, not errors: the caller decides whether a
/// status means "try the other endpoint".
enum Reply {
    Body(JsonValue),
    Status(StatusCode, String),
}

/// OpenAI-compatible gateway. Tries the Responses API first and falls back
/// once to Chat Completions when the endpoint is missing (404/405). Without
/// credentials it answers with a labelled placeholder so the app stays usable
/// offline.
#[derive(Clone)]
pub struct OpenAiGateway {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    live: bool,
    timeout: Duration,
}

impl OpenAiGateway {
    pub fn new(config: &Config, client: Client) -> Self {
        Self {
            client,
            base_url: config.openai_base_url.trim_end_matches('/').to_string(),
            api_key: config.openai_api_key.clone(),
            model: config.llm_model.clone(),
            live: config.llm_live(),
            timeout: Duration::from_secs(config.llm_timeout_secs.max(1)),
        }
    }

    fn placeholder(&self, system: &str, user: &str) -> String {
        format!(
            "{}{}]\nSistema: {}\n\nPergunta:\n{}\n\nResposta simulada: (substitua pelo provedor real).",
            PLACEHOLDER_TAG, self.model, system, user
        )
    }

    async fn post(&self, path: &str, payload: &JsonValue) -> Result<Reply> {
        let mut request = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .json(payload)
            .timeout(self.timeout);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let res = request.send().await?;
        let status = res.status();
        if !status.is_success() {
            let text = res.text().await.unwrap_or_default();
            return Ok(Reply::Status(status, text));
        }
        Ok(Reply::Body(res.json::<JsonValue>().await?))
    }

    async fn responses_api(&self, system: &str, user: &str, temperature: f32) -> Result<Reply> {
        let payload = json!({
            "model": self.model,
            "input": [
                {"role": "system", "content": system},
                {"role": "user", "content": user}
            ],
            "temperature": temperature,
        });
        self.post("/responses", &payload).await
    }

    async fn chat_completions(&self, system: &str, user: &str, temperature: f32) -> Result<String> {
        let payload = json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": system},
                {"role": "user", "content": user}
            ],
            "temperature": temperature,
        });
        match self.post("/chat/completions", &payload).await? {
            Reply::Body(body) => body
                .get("choices")
                .and_then(|c| c.get(0))
                .and_then(|c| c.get("message"))
                .and_then(|m| m.get("content"))
                .and_then(|c| c.as_str())
                .map(|s| s.trim().to_string())
                .ok_or_else(|| anyhow::anyhow!("Invalid chat completion response format").into()),
            Reply::Status(status, text) => Err(upstream_error(status, &text)),
        }
    }
}

fn upstream_error(status: StatusCode, text: &str) -> Error {
    anyhow::anyhow!("LLM API Error {}: {}", status, text).into()
}

/// Text out of a Responses API body: `output[0].content[0].text`, then
/// `output_text`, then a top-level `content` string.
fn responses_text(body: &JsonValue) -> String {
    let from_output = body
        .get("output")
        .or_else(|| body.get("response").and_then(|r| r.get("output")))
        .and_then(|o| o.get(0))
        .and_then(|item| item.get("content"))
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("text"))
        .and_then(|t| t.as_str())
        .filter(|t| !t.is_empty());

    from_output
        .or_else(|| body.get("output_text").and_then(|t| t.as_str()))
        .or_else(|| body.get("content").and_then(|t| t.as_str()))
        .map(|t| t.trim().to_string())
        .unwrap_or_else(|| body.to_string())
}

#[async_trait]
impl LlmGateway for OpenAiGateway {
    async fn complete(&self, system: &str, user: &str, temperature: f32) -> Result<String> {
        if !self.live {
            tracing::warn!(model = %self.model, "no LLM credentials configured, returning placeholder");
            return Ok(self.placeholder(system, user));
        }

        match self.responses_api(system, user, temperature).await? {
            Reply::Body(body) => Ok(responses_text(&body)),
            Reply::Status(status, _)
                if status == StatusCode::NOT_FOUND || status == StatusCode::METHOD_NOT_ALLOWED =>
            {
                tracing::warn!(%status, "responses endpoint unavailable, falling back to chat completions");
                self.chat_completions(system, user, temperature).await
            }
            Reply::Status(status, text) => Err(upstream_error(status, &text)),
        }
    }
}
