//! OpenAI-compatible chat completions adapter
//!
//! Serves three backends that speak the same wire shape: the local LM Studio
//! server, a generic remote endpoint, and a custom endpoint path.

use super::error::BackendError;
use super::http::{join_url, post_json};
use super::traits::ChatBackend;
use super::types::{ChatMessage, Generation, TokenUsage};
use crate::core::config::Config;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const CHAT_COMPLETIONS: &str = "/v1/chat/completions";

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
}

#[derive(Debug, Default, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: Option<i64>,
    completion_tokens: Option<i64>,
}

impl CompletionResponse {
    /// `choices[0].message.content` and the usage counters
    fn into_parts(self) -> (Option<String>, Option<TokenUsage>) {
        let text = self
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .filter(|t| !t.trim().is_empty());
        let usage = self
            .usage
            .and_then(|u| TokenUsage::from_counts(u.prompt_tokens, u.completion_tokens));
        (text, usage)
    }
}

#[derive(Debug, Clone)]
pub struct OpenAiCompatible {
    name: &'static str,
    client: reqwest::Client,
    /// Full endpoint URL; `None` when the base URL is not configured
    url: Option<String>,
    api_key: Option<String>,
    temperature: f32,
    timeout: Duration,
}

impl OpenAiCompatible {
    pub fn new(
        name: &'static str,
        client: reqwest::Client,
        url: Option<String>,
        api_key: Option<String>,
        temperature: f32,
        timeout: Duration,
    ) -> Self {
        Self {
            name,
            client,
            url,
            api_key,
            temperature,
            timeout,
        }
    }

    /// Local LM Studio server
    pub fn lmstudio(client: reqwest::Client, config: &Config) -> Self {
        Self::new(
            "lmstudio",
            client,
            Some(join_url(&config.lmstudio_url, CHAT_COMPLETIONS)),
            config.api_key.clone(),
            config.temperature,
            Duration::from_secs(config.lmstudio_timeout_secs),
        )
    }

    /// Remote OpenAI-compatible service at `base-url`
    pub fn generic(client: reqwest::Client, config: &Config) -> Self {
        Self::new(
            "openai_compat",
            client,
            config
                .base_url
                .as_deref()
                .map(|base| join_url(base, CHAT_COMPLETIONS)),
            config.api_key.clone(),
            config.temperature,
            Duration::from_secs(config.remote_timeout_secs),
        )
    }

    /// `base-url` + `custom-endpoint`
    pub fn custom(client: reqwest::Client, config: &Config) -> Self {
        Self::new(
            "custom",
            client,
            config
                .base_url
                .as_deref()
                .map(|base| join_url(base, &config.custom_endpoint)),
            config.api_key.clone(),
            config.temperature,
            Duration::from_secs(config.remote_timeout_secs),
        )
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }
}

#[async_trait::async_trait]
impl ChatBackend for OpenAiCompatible {
    fn name(&self) -> &str {
        self.name
    }

    async fn generate(
        &self,
        messages: &[ChatMessage],
        model: &str,
    ) -> Result<Generation, BackendError> {
        let url = self.url.as_deref().ok_or_else(|| BackendError::NotConfigured {
            backend: self.name.to_string(),
            reason: format!("{} requires base-url (or LLM_BASE_URL)", self.name),
        })?;

        let request = CompletionRequest {
            model,
            messages,
            temperature: self.temperature,
        };
        let response: CompletionResponse = post_json(
            &self.client,
            self.name,
            url,
            &request,
            self.timeout,
            self.api_key.as_deref(),
        )
        .await?;

        match response.into_parts() {
            (Some(text), usage) => Ok(Generation {
                text,
                backend: self.name.to_string(),
                usage,
            }),
            (None, _) => Err(BackendError::EmptyContent {
                backend: self.name.to_string(),
            }),
        }
    }
}
