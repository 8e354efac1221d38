use std::sync::Arc;

use semcache::cache::{CacheConfig, CacheOptions, SemanticCache};
use semcache::core::{CompletionRequest, Embeddings, Message, SemcacheError};
use semcache::embeddings::{FakeEmbeddings, OpenAiEmbeddings, OpenAiEmbeddingsConfig};
use semcache::models::{
    HttpBackend, ProviderBackend, ProviderRegistry, ProvidersConfig, ScriptedProvider,
};
use semcache::vectorstores::InMemoryVectorStore;

#[tokio::main]
async fn main() -> Result<(), SemcacheError> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    // --- Setup: real OpenAI when a key is present, scripted otherwise ---
    let providers = ProvidersConfig::from_env();
    let (cache, provider_name) = match providers.openai.clone() {
        Some(credentials) => {
            let backend: Arc<dyn ProviderBackend> = Arc::new(HttpBackend::new());
            let embeddings: Arc<dyn Embeddings> = Arc::new(OpenAiEmbeddings::new(
                OpenAiEmbeddingsConfig::new(credentials.api_key),
                backend.clone(),
            ));
            let store = Arc::new(InMemoryVectorStore::new(embeddings));
            let config = CacheConfig::default().with_providers(providers);
            (SemanticCache::from_config(&config, store, backend)?, "openai")
        }
        None => {
            println!("OPENAI_API_KEY not set, using a scripted provider");
            let registry = ProviderRegistry::new().with(Arc::new(ScriptedProvider::new([
                "A robot is a machine that carries out tasks automatically.",
                "Tides are driven by the Moon's gravity.",
            ])));
            let store = Arc::new(InMemoryVectorStore::new(Arc::new(FakeEmbeddings::default())));
            (
                SemanticCache::new(registry, store, &CacheConfig::default())?,
                "scripted",
            )
        }
    };

    let robot = CompletionRequest::new(
        provider_name,
        "gpt-4",
        vec![Message::system("I am a robot"), Message::user("What is a robot?")],
    );

    // --- First call: cache miss ---
    println!("=== Cache Miss (first call) ===");
    let first = cache.resolve(&robot, &CacheOptions::default()).await?;
    println!("Outcome: {:?}", first.outcome);
    println!("Write: {:?}", first.write);

    // --- Same question again: cache hit ---
    println!("\n=== Cache Hit (same question) ===");
    let second = cache.resolve(&robot, &CacheOptions::default()).await?;
    println!("Outcome: {:?}", second.outcome);

    // --- Probe: ask whether an answer is cached without reading it ---
    println!("\n=== Probe ===");
    let probe = cache
        .resolve(&robot, &CacheOptions::default().with_probe_only(true))
        .await?;
    println!("Outcome: {:?}", probe.outcome);

    // --- Unrelated question: cache miss ---
    println!("\n=== Cache Miss (different question) ===");
    let tides = CompletionRequest::new(
        provider_name,
        "gpt-4",
        vec![Message::user("How do ocean tides work?")],
    );
    let answer = cache.complete(&tides, &CacheOptions::default()).await?;
    println!("Response: {answer}");

    // --- Flush ---
    println!("\n=== Flush ===");
    println!("Live entries before: {}", cache.live_count().await?);
    cache.flush().await?;
    println!("Live entries after: {}", cache.live_count().await?);

    println!("\nStats: {:?}", cache.stats());
    Ok(())
}
