mod in_memory;

pub use in_memory::InMemoryVectorStore;

// Re-export core traits/types for convenience.
pub use semcache_core::{Document, Embeddings, VectorStore};
