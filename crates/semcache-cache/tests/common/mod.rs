#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use semcache_cache::{CacheConfig, SemanticCache};
use semcache_core::{Document, Message, SemcacheError, VectorStore};
use semcache_models::{ProviderRegistry, ScriptedProvider};
use serde_json::Value;

/// Vector store that reports a fixed similarity for its nearest entry and
/// counts every call.
///
/// The nearest entry is the one whose text equals the query, else the most
/// recently indexed one.
pub struct StubVectorStore {
    entries: Mutex<Vec<Document>>,
    score: Mutex<f32>,
    pub searches: AtomicUsize,
    pub writes: AtomicUsize,
    pub clears: AtomicUsize,
    fail_index: AtomicBool,
    fail_search: AtomicBool,
}

impl StubVectorStore {
    pub fn with_score(score: f32) -> Arc<Self> {
        Arc::new(Self {
            entries: Mutex::new(Vec::new()),
            score: Mutex::new(score),
            searches: AtomicUsize::new(0),
            writes: AtomicUsize::new(0),
            clears: AtomicUsize::new(0),
            fail_index: AtomicBool::new(false),
            fail_search: AtomicBool::new(false),
        })
    }

    pub fn set_score(&self, score: f32) {
        *self.score.lock().unwrap() = score;
    }

    pub fn fail_index(&self) {
        self.fail_index.store(true, Ordering::SeqCst);
    }

    pub fn fail_search(&self) {
        self.fail_search.store(true, Ordering::SeqCst);
    }

    /// Insert directly, bypassing the write counter.
    pub fn seed(&self, text: &str, metadata: HashMap<String, Value>) {
        let mut entries = self.entries.lock().unwrap();
        let id = format!("seed-{}", entries.len());
        entries.push(Document::with_metadata(id, text, metadata));
    }

    pub fn keys(&self) -> Vec<String> {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .map(|d| d.content.clone())
            .collect()
    }

    pub fn searches(&self) -> usize {
        self.searches.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn clears(&self) -> usize {
        self.clears.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VectorStore for StubVectorStore {
    async fn index(
        &self,
        text: &str,
        metadata: HashMap<String, Value>,
    ) -> Result<String, SemcacheError> {
        if self.fail_index.load(Ordering::SeqCst) {
            return Err(SemcacheError::VectorStore("disk full".to_string()));
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        let mut entries = self.entries.lock().unwrap();
        let id = format!("doc-{}", self.writes.load(Ordering::SeqCst));
        entries.push(Document::with_metadata(id.clone(), text, metadata));
        Ok(id)
    }

    async fn search(&self, query: &str, k: usize) -> Result<Vec<(Document, f32)>, SemcacheError> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        if self.fail_search.load(Ordering::SeqCst) {
            return Err(SemcacheError::VectorStore("index unavailable".to_string()));
        }
        if k == 0 {
            return Ok(Vec::new());
        }
        let entries = self.entries.lock().unwrap();
        let nearest = entries
            .iter()
            .find(|d| d.content == query)
            .or_else(|| entries.last())
            .cloned();
        let score = *self.score.lock().unwrap();
        Ok(nearest.into_iter().map(|d| (d, score)).collect())
    }

    async fn contains(&self, text: &str) -> Result<bool, SemcacheError> {
        Ok(self.entries.lock().unwrap().iter().any(|d| d.content == text))
    }

    async fn count(&self) -> Result<usize, SemcacheError> {
        Ok(self.entries.lock().unwrap().len())
    }

    async fn clear(&self) -> Result<(), SemcacheError> {
        self.clears.fetch_add(1, Ordering::SeqCst);
        self.entries.lock().unwrap().clear();
        Ok(())
    }
}

pub fn robot_conversation() -> Vec<Message> {
    vec![
        Message::system("I am a robot"),
        Message::user("What is a robot?"),
    ]
}

pub fn cache_with(
    provider: &ScriptedProvider,
    store: Arc<dyn VectorStore>,
    config: CacheConfig,
) -> SemanticCache {
    let registry = ProviderRegistry::new().with(Arc::new(provider.clone()));
    SemanticCache::new(registry, store, &config).unwrap()
}
