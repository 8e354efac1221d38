use std::sync::Arc;

use semcache_core::{
    validate_conversation, CompletionRequest, RawMessage, SemcacheError, ValidationError,
    VectorStore,
};
use semcache_models::{ProviderBackend, ProviderRegistry};
use serde_json::Value;

use crate::config::{check_threshold, CacheConfig};
use crate::options::CacheOptions;
use crate::outcome::{CacheOutcome, Resolution, WriteStatus};
use crate::stats::{CacheStats, StatsRecorder};
use crate::store::{Admission, BoundedStore, CacheEntry, CACHED_RESPONSE_KEY};

/// Semantic response cache in front of one or more chat providers.
///
/// A request is answered from the store when its cache key has a nearest
/// neighbour scoring strictly above the similarity threshold; otherwise the
/// provider is called and the answer admitted under that key. Share one
/// instance across tasks behind an `Arc`.
pub struct SemanticCache {
    providers: ProviderRegistry,
    store: BoundedStore,
    similarity_threshold: f32,
    stats: StatsRecorder,
}

impl SemanticCache {
    /// Build a cache over `store`. `config.providers` is ignored; the
    /// registry is used as given.
    pub fn new(
        providers: ProviderRegistry,
        store: Arc<dyn VectorStore>,
        config: &CacheConfig,
    ) -> Result<Self, SemcacheError> {
        config.validate()?;
        Ok(Self {
            providers,
            store: BoundedStore::new(store, config.capacity)?,
            similarity_threshold: config.similarity_threshold,
            stats: StatsRecorder::default(),
        })
    }

    /// Build a cache whose providers come from `config.providers`.
    pub fn from_config(
        config: &CacheConfig,
        store: Arc<dyn VectorStore>,
        backend: Arc<dyn ProviderBackend>,
    ) -> Result<Self, SemcacheError> {
        let providers = ProviderRegistry::from_config(&config.providers, backend);
        Self::new(providers, store, config)
    }

    pub fn providers(&self) -> &ProviderRegistry {
        &self.providers
    }

    pub fn capacity(&self) -> usize {
        self.store.capacity()
    }

    pub fn similarity_threshold(&self) -> f32 {
        self.similarity_threshold
    }

    /// Answer `request` from the cache or its provider.
    ///
    /// Validation, provider lookup and key selection happen before any I/O.
    /// Provider failures are returned unchanged. A failed cache write after a
    /// successful generation is reported in `Resolution::write`, never as an
    /// error.
    #[tracing::instrument(skip_all, fields(provider = %request.provider, model = %request.model))]
    pub async fn resolve(
        &self,
        request: &CompletionRequest,
        options: &CacheOptions,
    ) -> Result<Resolution, SemcacheError> {
        validate_conversation(&request.messages)?;
        let provider = self.providers.get(&request.provider)?;
        let threshold = match options.similarity_threshold {
            Some(threshold) => {
                check_threshold(threshold)?;
                threshold
            }
            None => self.similarity_threshold,
        };
        let key = cache_key(request, options)?;

        if options.lookup_enabled() {
            if let Some((doc, score)) = self.store.nearest(&key).await? {
                tracing::debug!(score, threshold, "nearest cached entry");
                if score > threshold {
                    if options.probe_only {
                        self.stats.suppressed();
                        tracing::debug!("probe found cached entry");
                        return Ok(Resolution::without_write(CacheOutcome::Suppressed));
                    }
                    match doc.metadata.get(CACHED_RESPONSE_KEY).and_then(Value::as_str) {
                        Some(text) => {
                            self.stats.hit();
                            tracing::debug!("cache hit");
                            return Ok(Resolution::without_write(CacheOutcome::Hit(
                                text.to_string(),
                            )));
                        }
                        None => {
                            tracing::warn!(id = %doc.id, "cached entry has no response, treating as miss");
                        }
                    }
                }
            }
        }

        self.stats.miss();
        tracing::debug!("cache miss, calling provider");
        let response = provider
            .generate(&request.model, &request.messages)
            .await?;

        let write = if options.write_on_miss {
            self.admit(CacheEntry::new(key, response.clone())).await
        } else {
            WriteStatus::NotAttempted
        };

        Ok(Resolution {
            outcome: CacheOutcome::Miss(response),
            write,
        })
    }

    /// Validate untyped messages, then `resolve`.
    pub async fn resolve_raw(
        &self,
        provider: &str,
        model: &str,
        messages: &[RawMessage],
        options: &CacheOptions,
    ) -> Result<Resolution, SemcacheError> {
        let request = CompletionRequest::from_raw(provider, model, messages)?;
        self.resolve(&request, options).await
    }

    /// `resolve`, reduced to the answer text. A suppressed probe yields `""`.
    pub async fn complete(
        &self,
        request: &CompletionRequest,
        options: &CacheOptions,
    ) -> Result<String, SemcacheError> {
        Ok(self.resolve(request, options).await?.into_text())
    }

    /// Drop every cached entry.
    pub async fn flush(&self) -> Result<(), SemcacheError> {
        self.store.flush().await?;
        self.stats.flush();
        tracing::info!("cache flushed");
        Ok(())
    }

    pub async fn live_count(&self) -> Result<usize, SemcacheError> {
        self.store.live_count().await
    }

    pub fn stats(&self) -> CacheStats {
        self.stats.snapshot()
    }

    async fn admit(&self, entry: CacheEntry) -> WriteStatus {
        match self.store.admit_if_absent(entry).await {
            Ok(Admission::Admitted { flushed }) => {
                self.stats.admission(flushed);
                WriteStatus::Admitted { flushed }
            }
            Ok(Admission::Duplicate) => {
                self.stats.duplicate();
                WriteStatus::Duplicate
            }
            Err(e) => {
                self.stats.write_failure();
                tracing::warn!(error = %e, "failed to cache generated response");
                WriteStatus::Failed(e)
            }
        }
    }
}

/// The override when non-empty, else the last message's content.
fn cache_key(request: &CompletionRequest, options: &CacheOptions) -> Result<String, SemcacheError> {
    if let Some(key) = options.cache_key_override.as_deref().filter(|k| !k.is_empty()) {
        return Ok(key.to_string());
    }
    request
        .last_content()
        .map(str::to_string)
        .ok_or_else(|| ValidationError::EmptyConversation.into())
}
