use std::sync::Arc;

use async_trait::async_trait;
use semcache_core::{Embeddings, SemcacheError};
use semcache_models::{ProviderBackend, ProviderRequest, OPENAI_BASE_URL};
use serde_json::json;

pub struct OpenAiEmbeddingsConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
}

impl OpenAiEmbeddingsConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: "text-embedding-3-small".to_string(),
            base_url: OPENAI_BASE_URL.to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

pub struct OpenAiEmbeddings {
    config: OpenAiEmbeddingsConfig,
    backend: Arc<dyn ProviderBackend>,
}

impl OpenAiEmbeddings {
    pub fn new(config: OpenAiEmbeddingsConfig, backend: Arc<dyn ProviderBackend>) -> Self {
        Self { config, backend }
    }
}

#[async_trait]
impl Embeddings for OpenAiEmbeddings {
    async fn embed_documents(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, SemcacheError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = ProviderRequest {
            url: format!("{}/embeddings", self.config.base_url),
            headers: vec![
                (
                    "Authorization".to_string(),
                    format!("Bearer {}", self.config.api_key),
                ),
                ("Content-Type".to_string(), "application/json".to_string()),
            ],
            body: json!({
                "model": self.config.model,
                "input": texts,
            }),
        };

        let response = self.backend.send(request).await?;

        if response.status != 200 {
            return Err(SemcacheError::Embedding(format!(
                "OpenAI API error ({}): {}",
                response.status, response.body
            )));
        }

        let data = response
            .body
            .get("data")
            .and_then(|d| d.as_array())
            .ok_or_else(|| SemcacheError::Embedding("missing 'data' field".to_string()))?;

        let vectors: Vec<Vec<f32>> = data
            .iter()
            .map(|item| {
                item["embedding"]
                    .as_array()
                    .map(|arr| {
                        arr.iter()
                            .map(|v| v.as_f64().unwrap_or(0.0) as f32)
                            .collect()
                    })
                    .ok_or_else(|| {
                        SemcacheError::Embedding("missing 'embedding' field".to_string())
                    })
            })
            .collect::<Result<_, _>>()?;

        if vectors.len() != texts.len() {
            return Err(SemcacheError::Embedding(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                vectors.len()
            )));
        }
        Ok(vectors)
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, SemcacheError> {
        self.embed_documents(&[text])
            .await?
            .pop()
            .ok_or_else(|| SemcacheError::Embedding("empty embedding response".to_string()))
    }
}
