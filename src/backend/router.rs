//! Backend selection and ordered fallback

use super::error::BackendError;
use super::http::build_client;
use super::ollama::Ollama;
use super::openai::OpenAiCompatible;
use super::traits::ChatBackend;
use super::types::{ChatMessage, Generation};
use crate::core::config::{BackendSelection, Config};
use strum_macros::{AsRefStr, Display};

/// The adapters the router knows how to build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
pub enum BackendKind {
    /// Local LM Studio server
    #[strum(to_string = "lmstudio")]
    LocalPrimary,
    /// Local Ollama server
    #[strum(to_string = "ollama")]
    LocalSecondary,
    /// Remote OpenAI-compatible service at `base-url`
    #[strum(to_string = "openai_compat")]
    GenericHttp,
    /// `base-url` + `custom-endpoint`
    #[strum(to_string = "custom")]
    Custom,
}

impl BackendKind {
    /// Attempt order for a configured selection
    pub fn sequence(selection: BackendSelection) -> Vec<BackendKind> {
        match selection {
            BackendSelection::Auto => vec![
                BackendKind::LocalPrimary,
                BackendKind::LocalSecondary,
                BackendKind::GenericHttp,
            ],
            BackendSelection::LmStudio => vec![BackendKind::LocalPrimary],
            BackendSelection::Ollama => vec![BackendKind::LocalSecondary],
            BackendSelection::OpenAiCompat => vec![BackendKind::GenericHttp],
            BackendSelection::Custom => vec![BackendKind::Custom],
        }
    }

    fn build(self, client: reqwest::Client, config: &Config) -> Box<dyn ChatBackend> {
        match self {
            BackendKind::LocalPrimary => Box::new(OpenAiCompatible::lmstudio(client, config)),
            BackendKind::LocalSecondary => Box::new(Ollama::from_config(client, config)),
            BackendKind::GenericHttp => Box::new(OpenAiCompatible::generic(client, config)),
            BackendKind::Custom => Box::new(OpenAiCompatible::custom(client, config)),
        }
    }
}

/// Ordered list of adapters; the first success wins
pub struct BackendRouter {
    backends: Vec<Box<dyn ChatBackend>>,
}

impl BackendRouter {
    pub fn new(backends: Vec<Box<dyn ChatBackend>>) -> Self {
        Self { backends }
    }

    pub fn from_config(config: &Config) -> Result<Self, BackendError> {
        let client = build_client()?;
        let backends = BackendKind::sequence(config.backend)
            .into_iter()
            .map(|kind| kind.build(client.clone(), config))
            .collect();
        Ok(Self::new(backends))
    }

    pub fn names(&self) -> Vec<&str> {
        self.backends.iter().map(|b| b.name()).collect()
    }

    /// Try each adapter in order.
    ///
    /// When all of them fail the error names every adapter attempted and
    /// carries the last failure.
    pub async fn generate(
        &self,
        messages: &[ChatMessage],
        model: &str,
    ) -> Result<Generation, BackendError> {
        let mut tried: Vec<String> = Vec::new();
        let mut last_error: Option<BackendError> = None;

        for backend in &self.backends {
            match backend.generate(messages, model).await {
                Ok(generation) => {
                    if !tried.is_empty() {
                        log::debug!(
                            "Backend {} answered after {} failed",
                            backend.name(),
                            tried.join(", ")
                        );
                    }
                    return Ok(generation);
                }
                Err(e) => {
                    log::debug!("Backend {} failed: {}", backend.name(), e);
                    tried.push(backend.name().to_string());
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(cause) => Err(BackendError::AllFailed {
                tried,
                cause: Box::new(cause),
            }),
            None => Err(BackendError::NotConfigured {
                backend: "router".to_string(),
                reason: "no backends configured".to_string(),
            }),
        }
    }
}
