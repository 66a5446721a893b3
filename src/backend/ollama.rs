//! Ollama `/api/chat` adapter

use super::error::BackendError;
use super::http::{join_url, post_json};
use super::traits::ChatBackend;
use super::types::{ChatMessage, Generation, TokenUsage};
use crate::core::config::Config;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
    options: Options,
}

#[derive(Debug, Serialize)]
struct Options {
    temperature: f32,
}

#[derive(Debug, Default, Deserialize)]
struct ChatResponse {
    message: Option<Content>,
    content: Option<String>,
    #[serde(default)]
    messages: Vec<Content>,
    prompt_eval_count: Option<i64>,
    eval_count: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct Content {
    content: Option<String>,
}

fn non_empty(text: Option<String>) -> Option<String> {
    text.filter(|t| !t.trim().is_empty())
}

impl ChatResponse {
    /// Text from `message.content`, else `content`, else the last entry of
    /// `messages`
    fn into_parts(self) -> (Option<String>, Option<TokenUsage>) {
        let usage = TokenUsage::from_counts(self.prompt_eval_count, self.eval_count);
        let text = non_empty(self.message.and_then(|m| m.content))
            .or_else(|| non_empty(self.content))
            .or_else(|| non_empty(self.messages.into_iter().last().and_then(|m| m.content)));
        (text, usage)
    }
}

#[derive(Debug, Clone)]
pub struct Ollama {
    client: reqwest::Client,
    url: String,
    temperature: f32,
    timeout: Duration,
}

impl Ollama {
    pub fn new(
        client: reqwest::Client,
        base_url: &str,
        temperature: f32,
        timeout: Duration,
    ) -> Self {
        Self {
            client,
            url: join_url(base_url, "/api/chat"),
            temperature,
            timeout,
        }
    }

    pub fn from_config(client: reqwest::Client, config: &Config) -> Self {
        Self::new(
            client,
            &config.ollama_url,
            config.temperature,
            Duration::from_secs(config.ollama_timeout_secs),
        )
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait::async_trait]
impl ChatBackend for Ollama {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn generate(
        &self,
        messages: &[ChatMessage],
        model: &str,
    ) -> Result<Generation, BackendError> {
        let request = ChatRequest {
            model,
            messages,
            stream: false,
            options: Options {
                temperature: self.temperature,
            },
        };
        let response: ChatResponse =
            post_json(&self.client, self.name(), &self.url, &request, self.timeout, None).await?;

        match response.into_parts() {
            (Some(text), usage) => Ok(Generation {
                text,
                backend: self.name().to_string(),
                usage,
            }),
            (None, _) => Err(BackendError::EmptyContent {
                backend: self.name().to_string(),
            }),
        }
    }
}
