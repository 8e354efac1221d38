use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use semcache_core::{Document, Embeddings, SemcacheError, VectorStore};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::RwLock;

/// Stored document with its embedding vector.
#[derive(Clone, Serialize, Deserialize)]
struct StoredEntry {
    document: Document,
    embedding: Vec<f32>,
}

/// On-disk layout written by `save`.
#[derive(Serialize, Deserialize)]
struct Snapshot {
    entries: Vec<StoredEntry>,
}

/// In-memory vector store using cosine similarity.
pub struct InMemoryVectorStore {
    entries: RwLock<HashMap<String, StoredEntry>>,
    embeddings: Arc<dyn Embeddings>,
}

impl InMemoryVectorStore {
    pub fn new(embeddings: Arc<dyn Embeddings>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            embeddings,
        }
    }

    /// Write every entry, including its vector, to `path` as JSON.
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<(), SemcacheError> {
        let snapshot = Snapshot {
            entries: self.entries.read().await.values().cloned().collect(),
        };
        let bytes = serde_json::to_vec(&snapshot)
            .map_err(|e| SemcacheError::VectorStore(format!("failed to encode snapshot: {e}")))?;
        tokio::fs::write(path.as_ref(), bytes).await.map_err(|e| {
            SemcacheError::VectorStore(format!(
                "failed to write snapshot {}: {e}",
                path.as_ref().display()
            ))
        })?;
        tracing::debug!(path = %path.as_ref().display(), entries = snapshot.entries.len(), "vector store saved");
        Ok(())
    }

    /// Restore a store written by `save`. Stored vectors are reused as-is, so
    /// `embeddings` must be the model that produced them.
    pub async fn load(
        path: impl AsRef<Path>,
        embeddings: Arc<dyn Embeddings>,
    ) -> Result<Self, SemcacheError> {
        let bytes = tokio::fs::read(path.as_ref()).await.map_err(|e| {
            SemcacheError::VectorStore(format!(
                "failed to read snapshot {}: {e}",
                path.as_ref().display()
            ))
        })?;
        let snapshot: Snapshot = serde_json::from_slice(&bytes)
            .map_err(|e| SemcacheError::VectorStore(format!("failed to decode snapshot: {e}")))?;

        let entries = snapshot
            .entries
            .into_iter()
            .map(|entry| (entry.document.id.clone(), entry))
            .collect();
        Ok(Self {
            entries: RwLock::new(entries),
            embeddings,
        })
    }

    /// Load `path` if it exists, otherwise start empty.
    pub async fn open(
        path: impl AsRef<Path>,
        embeddings: Arc<dyn Embeddings>,
    ) -> Result<Self, SemcacheError> {
        if tokio::fs::try_exists(path.as_ref()).await.unwrap_or(false) {
            Self::load(path, embeddings).await
        } else {
            Ok(Self::new(embeddings))
        }
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn index(
        &self,
        text: &str,
        metadata: HashMap<String, Value>,
    ) -> Result<String, SemcacheError> {
        let embedding = self
            .embeddings
            .embed_documents(&[text])
            .await?
            .pop()
            .ok_or_else(|| SemcacheError::VectorStore("embedder returned no vector".to_string()))?;

        let id = uuid::Uuid::new_v4().to_string();
        let document = Document::with_metadata(id.clone(), text, metadata);
        self.entries
            .write()
            .await
            .insert(id.clone(), StoredEntry { document, embedding });
        Ok(id)
    }

    async fn search(&self, query: &str, k: usize) -> Result<Vec<(Document, f32)>, SemcacheError> {
        if k == 0 {
            return Ok(Vec::new());
        }
        let query_vec = self.embeddings.embed_query(query).await?;
        let entries = self.entries.read().await;

        let mut scored: Vec<(Document, f32)> = entries
            .values()
            .map(|entry| {
                let score = cosine_similarity(&query_vec, &entry.embedding);
                (entry.document.clone(), score)
            })
            .collect();

        // Sort by score descending
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);

        Ok(scored)
    }

    async fn contains(&self, text: &str) -> Result<bool, SemcacheError> {
        let entries = self.entries.read().await;
        Ok(entries.values().any(|entry| entry.document.content == text))
    }

    async fn count(&self) -> Result<usize, SemcacheError> {
        Ok(self.entries.read().await.len())
    }

    async fn clear(&self) -> Result<(), SemcacheError> {
        self.entries.write().await.clear();
        Ok(())
    }
}

/// Compute cosine similarity between two vectors.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let mag_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let mag_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if mag_a == 0.0 || mag_b == 0.0 {
        return 0.0;
    }

    dot / (mag_a * mag_b)
}
