use std::sync::Arc;

use async_trait::async_trait;
use semcache_core::{ChatProvider, Message, ProviderError};
use serde_json::{json, Value};

use crate::backend::{ProviderBackend, ProviderRequest, ProviderResponse};

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub base_url: String,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f64>,
}

impl OpenAiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: OPENAI_BASE_URL.to_string(),
            max_tokens: None,
            temperature: None,
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// Chat-completions provider. Also serves OpenAI-compatible vendors under a
/// different registry name.
pub struct OpenAiProvider {
    name: String,
    label: &'static str,
    config: OpenAiConfig,
    backend: Arc<dyn ProviderBackend>,
}

impl OpenAiProvider {
    pub fn new(config: OpenAiConfig, backend: Arc<dyn ProviderBackend>) -> Self {
        Self::compatible("openai", "OpenAI", config, backend)
    }

    pub(crate) fn compatible(
        name: impl Into<String>,
        label: &'static str,
        config: OpenAiConfig,
        backend: Arc<dyn ProviderBackend>,
    ) -> Self {
        Self {
            name: name.into(),
            label,
            config,
            backend,
        }
    }

    pub fn config(&self) -> &OpenAiConfig {
        &self.config
    }

    fn build_request(&self, model: &str, messages: &[Message]) -> ProviderRequest {
        let messages: Vec<Value> = messages.iter().map(message_to_openai).collect();

        let mut body = json!({
            "model": model,
            "messages": messages,
        });

        if let Some(max_tokens) = self.config.max_tokens {
            body["max_tokens"] = json!(max_tokens);
        }
        if let Some(temp) = self.config.temperature {
            body["temperature"] = json!(temp);
        }

        ProviderRequest {
            url: format!("{}/chat/completions", self.config.base_url),
            headers: vec![
                (
                    "Authorization".to_string(),
                    format!("Bearer {}", self.config.api_key),
                ),
                ("Content-Type".to_string(), "application/json".to_string()),
            ],
            body,
        }
    }

    fn parse_response(&self, resp: &ProviderResponse) -> Result<String, ProviderError> {
        check_error_status(resp, self.label)?;

        resp.body["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| {
                ProviderError::Response(format!(
                    "{} response has no choices[0].message.content",
                    self.label
                ))
            })
    }
}

fn message_to_openai(msg: &Message) -> Value {
    json!({
        "role": msg.role().as_str(),
        "content": msg.content(),
    })
}

/// Map a non-success status onto the provider error taxonomy.
pub(crate) fn check_error_status(
    resp: &ProviderResponse,
    label: &str,
) -> Result<(), ProviderError> {
    if resp.status < 400 {
        return Ok(());
    }
    let msg = error_message(&resp.body);
    match resp.status {
        401 | 403 => Err(ProviderError::Auth(format!("{label}: {msg}"))),
        429 => Err(ProviderError::Quota(format!("{label}: {msg}"))),
        status => Err(ProviderError::Api {
            status,
            message: format!("{label}: {msg}"),
        }),
    }
}

fn error_message(body: &Value) -> String {
    body["error"]["message"]
        .as_str()
        .or_else(|| body["message"].as_str())
        .or_else(|| body.as_str())
        .unwrap_or("unknown API error")
        .to_string()
}

#[async_trait]
impl ChatProvider for OpenAiProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(&self, model: &str, messages: &[Message]) -> Result<String, ProviderError> {
        if self.config.api_key.is_empty() {
            return Err(ProviderError::Auth(format!(
                "{} API key must be set to use {} endpoints",
                self.label, self.label
            )));
        }
        let provider_req = self.build_request(model, messages);
        let resp = self.backend.send(provider_req).await?;
        self.parse_response(&resp)
    }
}
