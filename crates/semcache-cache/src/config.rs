use std::path::Path;

use semcache_core::SemcacheError;
use semcache_models::ProvidersConfig;
use serde::{Deserialize, Serialize};

/// Entries kept before the store is flushed.
pub const DEFAULT_CAPACITY: usize = 50;

/// Score a nearest neighbour must strictly exceed to count as a hit.
pub const DEFAULT_SIMILARITY_THRESHOLD: f32 = 0.8;

/// Construction-time settings for a `SemanticCache`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_capacity")]
    pub capacity: usize,
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f32,
    #[serde(default)]
    pub providers: ProvidersConfig,
}

fn default_capacity() -> usize {
    DEFAULT_CAPACITY
}

fn default_similarity_threshold() -> f32 {
    DEFAULT_SIMILARITY_THRESHOLD
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            providers: ProvidersConfig::default(),
        }
    }
}

impl CacheConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_similarity_threshold(mut self, threshold: f32) -> Self {
        self.similarity_threshold = threshold;
        self
    }

    pub fn with_providers(mut self, providers: ProvidersConfig) -> Self {
        self.providers = providers;
        self
    }

    /// Parse a JSON document. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, SemcacheError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| SemcacheError::Config(format!("invalid cache config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a JSON config file.
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, SemcacheError> {
        let path = path.as_ref();
        let json = tokio::fs::read_to_string(path).await.map_err(|e| {
            SemcacheError::Config(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<(), SemcacheError> {
        if self.capacity == 0 {
            return Err(SemcacheError::Config(
                "capacity must be greater than zero".to_string(),
            ));
        }
        check_threshold(self.similarity_threshold)
    }
}

pub(crate) fn check_threshold(threshold: f32) -> Result<(), SemcacheError> {
    if threshold > 0.0 && threshold < 1.0 {
        Ok(())
    } else {
        Err(SemcacheError::Config(format!(
            "similarity threshold must be in (0, 1), got {threshold}"
        )))
    }
}
