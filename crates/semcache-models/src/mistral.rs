use std::sync::Arc;

use async_trait::async_trait;
use semcache_core::{ChatProvider, Message, ProviderError};

use crate::backend::ProviderBackend;
use crate::openai::{OpenAiConfig, OpenAiProvider};

pub const MISTRAL_BASE_URL: &str = "https://api.mistral.ai/v1";

#[derive(Debug, Clone)]
pub struct MistralConfig {
    pub api_key: String,
    pub base_url: String,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f64>,
}

impl MistralConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: MISTRAL_BASE_URL.to_string(),
            max_tokens: None,
            temperature: None,
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_max_tokens(mut self, v: u32) -> Self {
        self.max_tokens = Some(v);
        self
    }

    pub fn with_temperature(mut self, v: f64) -> Self {
        self.temperature = Some(v);
        self
    }
}

impl From<MistralConfig> for OpenAiConfig {
    fn from(c: MistralConfig) -> Self {
        let mut cfg = OpenAiConfig::new(c.api_key).with_base_url(c.base_url);
        cfg.max_tokens = c.max_tokens;
        cfg.temperature = c.temperature;
        cfg
    }
}

/// Mistral AI speaks the OpenAI chat-completions wire format.
pub struct MistralProvider {
    inner: OpenAiProvider,
}

impl MistralProvider {
    pub fn new(config: MistralConfig, backend: Arc<dyn ProviderBackend>) -> Self {
        Self {
            inner: OpenAiProvider::compatible("mistral", "Mistral", config.into(), backend),
        }
    }
}

#[async_trait]
impl ChatProvider for MistralProvider {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn generate(&self, model: &str, messages: &[Message]) -> Result<String, ProviderError> {
        self.inner.generate(model, messages).await
    }
}
