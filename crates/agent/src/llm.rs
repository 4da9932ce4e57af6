use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use carfinder_core::config::{LlmConfig, LlmProvider};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};
use tracing::warn;

const ANTHROPIC_VERSION: &str = "2023-06-01";
const ANTHROPIC_MAX_TOKENS: u32 = 512;
const RETRY_BACKOFF_MS: u64 = 250;

/// Single-prompt text completion. Everything vendor-specific lives behind it.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}

#[async_trait]
impl<T> LlmClient for std::sync::Arc<T>
where
    T: LlmClient + ?Sized,
{
    async fn complete(&self, prompt: &str) -> Result<String> {
        (**self).complete(prompt).await
    }
}

pub struct HttpLlmClient {
    http: Client,
    provider: LlmProvider,
    endpoint: String,
    api_key: Option<SecretString>,
    model: String,
    max_retries: u32,
}

impl HttpLlmClient {
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("failed to build llm http client")?;

        Ok(Self {
            http,
            provider: config.provider,
            endpoint: endpoint_for(config.provider, config.base_url.as_deref()),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            max_retries: config.max_retries,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn request_body(&self, prompt: &str) -> Value {
        match self.provider {
            LlmProvider::OpenAi => json!({
                "model": self.model,
                "temperature": 0,
                "messages": [{ "role": "user", "content": prompt }],
            }),
            LlmProvider::Anthropic => json!({
                "model": self.model,
                "max_tokens": ANTHROPIC_MAX_TOKENS,
                "temperature": 0,
                "messages": [{ "role": "user", "content": prompt }],
            }),
            LlmProvider::Ollama => json!({
                "model": self.model,
                "prompt": prompt,
                "stream": false,
                "format": "json",
                "options": { "temperature": 0 },
            }),
        }
    }

    async fn send_once(&self, body: &Value) -> Result<Value> {
        let mut request = self.http.post(&self.endpoint).json(body);
        if let Some(key) = &self.api_key {
            request = match self.provider {
                LlmProvider::OpenAi => request.bearer_auth(key.expose_secret()),
                LlmProvider::Anthropic => request
                    .header("x-api-key", key.expose_secret())
                    .header("anthropic-version", ANTHROPIC_VERSION),
                LlmProvider::Ollama => request,
            };
        }

        let response = request.send().await?.error_for_status()?;
        Ok(response.json::<Value>().await?)
    }
}

#[async_trait]
impl LlmClient for HttpLlmClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let body = self.request_body(prompt);
        let mut attempt = 0;

        loop {
            match self.send_once(&body).await {
                Ok(payload) => return parse_completion(self.provider, &payload),
                Err(error) if attempt < self.max_retries => {
                    attempt += 1;
                    warn!(
                        event_name = "llm.request_retry",
                        attempt,
                        max_retries = self.max_retries,
                        error = %error,
                        "llm request failed; retrying"
                    );
                    tokio::time::sleep(Duration::from_millis(RETRY_BACKOFF_MS * attempt as u64))
                        .await;
                }
                Err(error) => {
                    return Err(error.context(format!(
                        "llm request to {} failed after {} attempt(s)",
                        self.endpoint,
                        attempt + 1
                    )))
                }
            }
        }
    }
}

fn endpoint_for(provider: LlmProvider, base_url: Option<&str>) -> String {
    let default_base = match provider {
        LlmProvider::OpenAi => "https://api.openai.com",
        LlmProvider::Anthropic => "https://api.anthropic.com",
        LlmProvider::Ollama => "http://localhost:11434",
    };
    let base = base_url.map(str::trim).filter(|url| !url.is_empty()).unwrap_or(default_base);
    let base = base.trim_end_matches('/');

    let path = match provider {
        LlmProvider::OpenAi => "/chat/completions",
        LlmProvider::Anthropic => "/messages",
        LlmProvider::Ollama => "/api/generate",
    };
    if base.ends_with(path) {
        return base.to_string();
    }

    // OpenAI-compatible gateways are often configured with their versioned root.
    match provider {
        LlmProvider::OpenAi | LlmProvider::Anthropic if !has_version_segment(base) => {
            format!("{base}/v1{path}")
        }
        _ => format!("{base}{path}"),
    }
}

fn has_version_segment(base: &str) -> bool {
    if base.ends_with("/openai") {
        return true;
    }
    let last = base.rsplit('/').next().unwrap_or_default();
    let mut chars = last.chars();
    chars.next() == Some('v') && chars.next().map(|ch| ch.is_ascii_digit()).unwrap_or(false)
}

fn parse_completion(provider: LlmProvider, payload: &Value) -> Result<String> {
    let text = match provider {
        LlmProvider::OpenAi => payload
            .get("choices")
            .and_then(|value| value.as_array())
            .and_then(|choices| choices.first())
            .and_then(|choice| choice.get("message"))
            .and_then(|message| message.get("content"))
            .and_then(|content| content.as_str()),
        LlmProvider::Anthropic => payload
            .get("content")
            .and_then(|value| value.as_array())
            .and_then(|parts| {
                parts.iter().find(|part| part.get("type").and_then(Value::as_str) == Some("text"))
            })
            .and_then(|part| part.get("text"))
            .and_then(|text| text.as_str()),
        LlmProvider::Ollama => payload.get("response").and_then(|value| value.as_str()),
    };

    text.map(str::to_string).ok_or_else(|| anyhow!("llm response is missing completion text"))
}
