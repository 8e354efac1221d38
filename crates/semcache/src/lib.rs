//! Semcache: a semantic response cache that sits in front of remote
//! text-generation providers.
//!
//! Requests whose last message is semantically close to one already answered
//! are served from a vector store instead of calling the provider again.
//!
//! # Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `default` | `models`, `embeddings`, `vectorstores` |
//! | `models` | OpenAI and Mistral providers, `ProviderRegistry`, `ScriptedProvider` |
//! | `embeddings` | `OpenAiEmbeddings`, `FakeEmbeddings` |
//! | `vectorstores` | `InMemoryVectorStore` |
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//!
//! use semcache::cache::{CacheConfig, CacheOptions, SemanticCache};
//! use semcache::core::{CompletionRequest, Message};
//! use semcache::embeddings::FakeEmbeddings;
//! use semcache::models::{ProviderRegistry, ScriptedProvider};
//! use semcache::vectorstores::InMemoryVectorStore;
//!
//! let registry = ProviderRegistry::new()
//!     .with(Arc::new(ScriptedProvider::new(["A robot is a machine."])));
//! let store = Arc::new(InMemoryVectorStore::new(Arc::new(FakeEmbeddings::default())));
//! let cache = SemanticCache::new(registry, store, &CacheConfig::default())?;
//!
//! let request = CompletionRequest::new(
//!     "scripted",
//!     "gpt-4",
//!     vec![Message::system("I am a robot"), Message::user("What is a robot?")],
//! );
//! let answer = cache.complete(&request, &CacheOptions::default()).await?;
//! ```

/// Messages, validation, errors and the `ChatProvider`, `Embeddings` and
/// `VectorStore` traits. Always available.
pub use semcache_core as core;

/// `SemanticCache`, its blocking front-end, options and configuration.
/// Always available.
pub use semcache_cache as cache;

/// Chat providers (OpenAI, Mistral), the HTTP backend seam and the registry.
#[cfg(feature = "models")]
pub use semcache_models as models;

/// Embedding models.
#[cfg(feature = "embeddings")]
pub use semcache_embeddings as embeddings;

/// Vector store implementations.
#[cfg(feature = "vectorstores")]
pub use semcache_vectorstores as vectorstores;
