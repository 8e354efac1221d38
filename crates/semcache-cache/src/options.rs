use serde::{Deserialize, Serialize};

/// Per-call cache behaviour for `SemanticCache::resolve`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheOptions {
    /// Text to index and look up instead of the last message's content.
    /// Useful when the last message carries a large context block.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_key_override: Option<String>,
    /// Check for a qualifying entry and return `Suppressed` instead of its text.
    #[serde(default)]
    pub probe_only: bool,
    #[serde(default = "default_true")]
    pub write_on_miss: bool,
    #[serde(default = "default_true")]
    pub read_before_generate: bool,
    /// Falls back to the cache-wide threshold when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similarity_threshold: Option<f32>,
}

fn default_true() -> bool {
    true
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            cache_key_override: None,
            probe_only: false,
            write_on_miss: true,
            read_before_generate: true,
            similarity_threshold: None,
        }
    }
}

impl CacheOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cache_key(mut self, key: impl Into<String>) -> Self {
        self.cache_key_override = Some(key.into());
        self
    }

    pub fn with_probe_only(mut self, probe_only: bool) -> Self {
        self.probe_only = probe_only;
        self
    }

    pub fn with_write_on_miss(mut self, write: bool) -> Self {
        self.write_on_miss = write;
        self
    }

    pub fn with_read_before_generate(mut self, read: bool) -> Self {
        self.read_before_generate = read;
        self
    }

    pub fn with_similarity_threshold(mut self, threshold: f32) -> Self {
        self.similarity_threshold = Some(threshold);
        self
    }

    pub(crate) fn lookup_enabled(&self) -> bool {
        self.read_before_generate || self.probe_only
    }
}
