use std::sync::Arc;

use semcache_core::{CompletionRequest, RawMessage, SemcacheError};
use tokio::runtime::{Builder, Runtime};

use crate::engine::SemanticCache;
use crate::options::CacheOptions;
use crate::outcome::Resolution;
use crate::stats::CacheStats;

/// Synchronous front-end for a `SemanticCache`.
///
/// Each call runs to completion on the caller's thread using a private
/// current-thread runtime. Must not be called from inside an async context.
pub struct BlockingSemanticCache {
    inner: Arc<SemanticCache>,
    runtime: Runtime,
}

impl BlockingSemanticCache {
    pub fn new(cache: SemanticCache) -> Result<Self, SemcacheError> {
        Self::from_shared(Arc::new(cache))
    }

    /// Wrap a cache that async callers also hold.
    pub fn from_shared(cache: Arc<SemanticCache>) -> Result<Self, SemcacheError> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| SemcacheError::Config(format!("failed to start runtime: {e}")))?;
        Ok(Self {
            inner: cache,
            runtime,
        })
    }

    pub fn inner(&self) -> &Arc<SemanticCache> {
        &self.inner
    }

    pub fn resolve(
        &self,
        request: &CompletionRequest,
        options: &CacheOptions,
    ) -> Result<Resolution, SemcacheError> {
        self.runtime.block_on(self.inner.resolve(request, options))
    }

    pub fn resolve_raw(
        &self,
        provider: &str,
        model: &str,
        messages: &[RawMessage],
        options: &CacheOptions,
    ) -> Result<Resolution, SemcacheError> {
        self.runtime
            .block_on(self.inner.resolve_raw(provider, model, messages, options))
    }

    pub fn complete(
        &self,
        request: &CompletionRequest,
        options: &CacheOptions,
    ) -> Result<String, SemcacheError> {
        self.runtime.block_on(self.inner.complete(request, options))
    }

    pub fn flush(&self) -> Result<(), SemcacheError> {
        self.runtime.block_on(self.inner.flush())
    }

    pub fn live_count(&self) -> Result<usize, SemcacheError> {
        self.runtime.block_on(self.inner.live_count())
    }

    pub fn stats(&self) -> CacheStats {
        self.inner.stats()
    }
}
