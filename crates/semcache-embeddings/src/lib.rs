mod fake;
mod openai;

pub use fake::FakeEmbeddings;
pub use openai::{OpenAiEmbeddings, OpenAiEmbeddingsConfig};

// Re-export the Embeddings trait from core.
pub use semcache_core::Embeddings;
