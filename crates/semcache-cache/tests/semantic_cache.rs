mod common;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use common::{cache_with, robot_conversation, StubVectorStore};
use semcache_cache::{CacheConfig, CacheOptions, CacheOutcome, SemanticCache, WriteStatus};
use semcache_core::{
    ChatProvider, CompletionRequest, Message, ProviderError, RawMessage, SemcacheError,
    ValidationError,
};
use semcache_embeddings::FakeEmbeddings;
use semcache_models::{ProviderRegistry, ScriptedProvider};
use semcache_vectorstores::InMemoryVectorStore;
use serde_json::json;

fn robot_request() -> CompletionRequest {
    CompletionRequest::new("scripted", "gpt-4", robot_conversation())
}

// ---------------------------------------------------------------------------
// Miss / hit
// ---------------------------------------------------------------------------

#[tokio::test]
async fn empty_cache_misses_and_admits_last_message() {
    let provider = ScriptedProvider::new(["A robot is a machine."]);
    let store = StubVectorStore::with_score(0.95);
    let cache = cache_with(&provider, store.clone(), CacheConfig::default());

    let resolution = cache
        .resolve(&robot_request(), &CacheOptions::default())
        .await
        .unwrap();

    assert_eq!(
        resolution.outcome,
        CacheOutcome::Miss("A robot is a machine.".to_string())
    );
    assert!(matches!(
        resolution.write,
        WriteStatus::Admitted { flushed: false }
    ));
    assert_eq!(provider.calls(), 1);
    assert_eq!(store.keys(), vec!["What is a robot?".to_string()]);
    assert_eq!(cache.live_count().await.unwrap(), 1);
}

#[tokio::test]
async fn repeated_query_above_threshold_hits() {
    let provider = ScriptedProvider::new(["A robot is a machine."]);
    let store = StubVectorStore::with_score(0.95);
    let cache = cache_with(
        &provider,
        store.clone(),
        CacheConfig::default().with_similarity_threshold(0.8),
    );

    let first = cache
        .resolve(&robot_request(), &CacheOptions::default())
        .await
        .unwrap();
    let second = cache
        .resolve(&robot_request(), &CacheOptions::default())
        .await
        .unwrap();

    assert_eq!(
        second.outcome,
        CacheOutcome::Hit("A robot is a machine.".to_string())
    );
    assert_eq!(first.text(), second.text());
    assert!(matches!(second.write, WriteStatus::NotAttempted));
    assert_eq!(provider.calls(), 1);
    assert_eq!(store.writes(), 1);

    let stats = cache.stats();
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.admissions, 1);
}

#[tokio::test]
async fn score_equal_to_threshold_is_a_miss() {
    let provider = ScriptedProvider::new(["first", "second"]);
    let store = StubVectorStore::with_score(0.8);
    let cache = cache_with(
        &provider,
        store.clone(),
        CacheConfig::default().with_similarity_threshold(0.8),
    );

    cache
        .resolve(&robot_request(), &CacheOptions::default())
        .await
        .unwrap();
    let second = cache
        .resolve(&robot_request(), &CacheOptions::default())
        .await
        .unwrap();

    assert_eq!(second.outcome, CacheOutcome::Miss("second".to_string()));
    assert_eq!(provider.calls(), 2);
    // The key is already live, so the second answer is not stored again.
    assert!(matches!(second.write, WriteStatus::Duplicate));
    assert_eq!(store.writes(), 1);
}

#[tokio::test]
async fn score_below_threshold_is_a_miss() {
    let provider = ScriptedProvider::new(["first", "second"]);
    let store = StubVectorStore::with_score(0.5);
    let cache = cache_with(&provider, store, CacheConfig::default());

    cache
        .resolve(&robot_request(), &CacheOptions::default())
        .await
        .unwrap();
    let second = cache
        .resolve(&robot_request(), &CacheOptions::default())
        .await
        .unwrap();
    assert!(second.outcome.is_miss());
}

#[tokio::test]
async fn per_call_threshold_overrides_default() {
    let provider = ScriptedProvider::new(["first", "second"]);
    let store = StubVectorStore::with_score(0.75);
    let cache = cache_with(
        &provider,
        store,
        CacheConfig::default().with_similarity_threshold(0.8),
    );

    cache
        .resolve(&robot_request(), &CacheOptions::default())
        .await
        .unwrap();

    let strict = cache
        .resolve(&robot_request(), &CacheOptions::default())
        .await
        .unwrap();
    assert!(strict.outcome.is_miss());

    let lenient = cache
        .resolve(
            &robot_request(),
            &CacheOptions::default().with_similarity_threshold(0.7),
        )
        .await
        .unwrap();
    assert_eq!(lenient.outcome, CacheOutcome::Hit("first".to_string()));
    assert_eq!(provider.calls(), 2);
}

#[tokio::test]
async fn invalid_per_call_threshold_is_rejected_before_io() {
    let provider = ScriptedProvider::new(["unused"]);
    let store = StubVectorStore::with_score(0.9);
    let cache = cache_with(&provider, store.clone(), CacheConfig::default());

    let err = cache
        .resolve(
            &robot_request(),
            &CacheOptions::default().with_similarity_threshold(1.5),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, SemcacheError::Config(_)));
    assert_eq!(store.searches(), 0);
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn hit_without_response_metadata_falls_back_to_provider() {
    let provider = ScriptedProvider::new(["fresh"]);
    let store = StubVectorStore::with_score(0.99);
    store.seed("What is a robot?", HashMap::new());
    let cache = cache_with(&provider, store, CacheConfig::default());

    let resolution = cache
        .resolve(&robot_request(), &CacheOptions::default())
        .await
        .unwrap();
    assert_eq!(resolution.outcome, CacheOutcome::Miss("fresh".to_string()));
    assert!(matches!(resolution.write, WriteStatus::Duplicate));
}

// ---------------------------------------------------------------------------
// Probe-only
// ---------------------------------------------------------------------------

#[tokio::test]
async fn probe_on_qualifying_entry_is_suppressed() {
    let provider = ScriptedProvider::new(Vec::<String>::new());
    let store = StubVectorStore::with_score(0.95);
    store.seed(
        "What is a robot?",
        HashMap::from([("cached_response".to_string(), json!("stored"))]),
    );
    let cache = cache_with(&provider, store.clone(), CacheConfig::default());

    let options = CacheOptions::default().with_probe_only(true);
    let resolution = cache.resolve(&robot_request(), &options).await.unwrap();

    assert_eq!(resolution.outcome, CacheOutcome::Suppressed);
    assert_eq!(resolution.text(), None);
    assert_eq!(provider.calls(), 0);
    assert_eq!(store.writes(), 0);
    assert_eq!(cache.stats().suppressed, 1);

    assert_eq!(cache.complete(&robot_request(), &options).await.unwrap(), "");
}

#[tokio::test]
async fn probe_looks_up_even_when_reads_are_disabled() {
    let provider = ScriptedProvider::new(Vec::<String>::new());
    let store = StubVectorStore::with_score(0.95);
    store.seed(
        "What is a robot?",
        HashMap::from([("cached_response".to_string(), json!("stored"))]),
    );
    let cache = cache_with(&provider, store.clone(), CacheConfig::default());

    let options = CacheOptions::default()
        .with_probe_only(true)
        .with_read_before_generate(false);
    let resolution = cache.resolve(&robot_request(), &options).await.unwrap();
    assert!(resolution.outcome.is_suppressed());
    assert_eq!(store.searches(), 1);
}

#[tokio::test]
async fn probe_without_qualifying_entry_generates() {
    let provider = ScriptedProvider::new(["generated"]);
    let store = StubVectorStore::with_score(0.95);
    let cache = cache_with(&provider, store, CacheConfig::default());

    let resolution = cache
        .resolve(
            &robot_request(),
            &CacheOptions::default().with_probe_only(true),
        )
        .await
        .unwrap();
    assert_eq!(
        resolution.outcome,
        CacheOutcome::Miss("generated".to_string())
    );
    assert_eq!(provider.calls(), 1);
}

// ---------------------------------------------------------------------------
// Read / write switches and cache key
// ---------------------------------------------------------------------------

#[tokio::test]
async fn write_disabled_leaves_store_untouched() {
    let provider = ScriptedProvider::new(["answer"]);
    let store = StubVectorStore::with_score(0.95);
    let cache = cache_with(&provider, store.clone(), CacheConfig::default());

    let resolution = cache
        .resolve(
            &robot_request(),
            &CacheOptions::default().with_write_on_miss(false),
        )
        .await
        .unwrap();
    assert!(resolution.outcome.is_miss());
    assert!(matches!(resolution.write, WriteStatus::NotAttempted));
    assert_eq!(store.writes(), 0);
}

#[tokio::test]
async fn read_disabled_skips_lookup() {
    let provider = ScriptedProvider::new(["one", "two"]);
    let store = StubVectorStore::with_score(0.99);
    let cache = cache_with(&provider, store.clone(), CacheConfig::default());
    let options = CacheOptions::default().with_read_before_generate(false);

    cache.resolve(&robot_request(), &options).await.unwrap();
    let second = cache.resolve(&robot_request(), &options).await.unwrap();

    assert_eq!(second.outcome, CacheOutcome::Miss("two".to_string()));
    assert_eq!(store.searches(), 0);
    assert_eq!(provider.calls(), 2);
    assert!(matches!(second.write, WriteStatus::Duplicate));
}

#[tokio::test]
async fn cache_key_override_is_used_for_lookup_and_storage() {
    let provider = ScriptedProvider::new(["answer"]);
    let store = StubVectorStore::with_score(0.0);
    let cache = cache_with(&provider, store.clone(), CacheConfig::default());

    let request = CompletionRequest::new(
        "scripted",
        "gpt-4",
        vec![
            Message::system("Answer from the context."),
            Message::user("CONTEXT: <long document> QUESTION: what is a robot?"),
        ],
    );
    cache
        .resolve(
            &request,
            &CacheOptions::default().with_cache_key("what is a robot?"),
        )
        .await
        .unwrap();
    assert_eq!(store.keys(), vec!["what is a robot?".to_string()]);
}

#[tokio::test]
async fn empty_cache_key_override_falls_back_to_last_message() {
    let provider = ScriptedProvider::new(["answer"]);
    let store = StubVectorStore::with_score(0.0);
    let cache = cache_with(&provider, store.clone(), CacheConfig::default());

    cache
        .resolve(&robot_request(), &CacheOptions::default().with_cache_key(""))
        .await
        .unwrap();
    assert_eq!(store.keys(), vec!["What is a robot?".to_string()]);
}

// ---------------------------------------------------------------------------
// Validation and errors
// ---------------------------------------------------------------------------

#[tokio::test]
async fn assistant_first_fails_without_io() {
    let provider = ScriptedProvider::new(["unused"]);
    let store = StubVectorStore::with_score(0.95);
    let cache = cache_with(&provider, store.clone(), CacheConfig::default());

    let request = CompletionRequest::new(
        "scripted",
        "gpt-4",
        vec![Message::assistant("hello"), Message::user("hi")],
    );
    let err = cache
        .resolve(&request, &CacheOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        SemcacheError::Validation(ValidationError::InvalidFirstRole { .. })
    ));
    assert_eq!(store.searches(), 0);
    assert_eq!(store.writes(), 0);
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn unrecognized_role_fails_without_io() {
    let provider = ScriptedProvider::new(["unused"]);
    let store = StubVectorStore::with_score(0.95);
    let cache = cache_with(&provider, store.clone(), CacheConfig::default());

    let err = cache
        .resolve_raw(
            "scripted",
            "gpt-4",
            &[
                RawMessage::new("user", "hi"),
                RawMessage::new("wizard", "abracadabra"),
            ],
            &CacheOptions::default(),
        )
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        SemcacheError::Validation(ValidationError::InvalidRole { index: 1, .. })
    ));
    assert_eq!(store.searches(), 0);
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn empty_conversation_fails() {
    let provider = ScriptedProvider::new(["unused"]);
    let cache = cache_with(
        &provider,
        StubVectorStore::with_score(0.9),
        CacheConfig::default(),
    );
    let err = cache
        .resolve(
            &CompletionRequest::new("scripted", "gpt-4", vec![]),
            &CacheOptions::default(),
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        SemcacheError::Validation(ValidationError::EmptyConversation)
    ));
}

#[tokio::test]
async fn resolve_raw_accepts_mixed_case_roles() {
    let provider = ScriptedProvider::new(["ok"]);
    let cache = cache_with(
        &provider,
        StubVectorStore::with_score(0.0),
        CacheConfig::default(),
    );
    let resolution = cache
        .resolve_raw(
            "scripted",
            "gpt-4",
            &[
                RawMessage::new("System", "I am a robot"),
                RawMessage::new("USER", "What is a robot?"),
            ],
            &CacheOptions::default(),
        )
        .await
        .unwrap();
    assert_eq!(resolution.text(), Some("ok"));
}

#[tokio::test]
async fn unknown_provider_fails_without_io() {
    let provider = ScriptedProvider::new(["unused"]);
    let store = StubVectorStore::with_score(0.95);
    let cache = cache_with(&provider, store.clone(), CacheConfig::default());

    let request = CompletionRequest::new("cohere", "command", robot_conversation());
    let err = cache
        .resolve(&request, &CacheOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, SemcacheError::UnknownProvider(ref n) if n == "cohere"));
    assert_eq!(store.searches(), 0);
}

#[tokio::test]
async fn provider_error_propagates_unchanged_and_nothing_is_stored() {
    let provider = ScriptedProvider::new(Vec::<String>::new());
    provider.push_error(ProviderError::Quota("monthly limit reached".into()));
    let store = StubVectorStore::with_score(0.0);
    let cache = cache_with(&provider, store.clone(), CacheConfig::default());

    let err = cache
        .resolve(&robot_request(), &CacheOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        SemcacheError::Provider(ProviderError::Quota(ref m)) if m == "monthly limit reached"
    ));
    assert_eq!(store.writes(), 0);
    assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn store_failure_does_not_mask_generated_answer() {
    let provider = ScriptedProvider::new(["still here"]);
    let store = StubVectorStore::with_score(0.0);
    store.fail_index();
    let cache = cache_with(&provider, store, CacheConfig::default());

    let resolution = cache
        .resolve(&robot_request(), &CacheOptions::default())
        .await
        .unwrap();
    assert_eq!(
        resolution.outcome,
        CacheOutcome::Miss("still here".to_string())
    );
    assert!(matches!(
        resolution.write,
        WriteStatus::Failed(SemcacheError::VectorStore(_))
    ));
    assert_eq!(cache.stats().write_failures, 1);
}

#[tokio::test]
async fn lookup_failure_is_terminal() {
    let provider = ScriptedProvider::new(["unused"]);
    let store = StubVectorStore::with_score(0.0);
    store.fail_search();
    let cache = cache_with(&provider, store, CacheConfig::default());

    let err = cache
        .resolve(&robot_request(), &CacheOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, SemcacheError::VectorStore(_)));
    assert_eq!(provider.calls(), 0);
}

// ---------------------------------------------------------------------------
// Capacity and flush
// ---------------------------------------------------------------------------

#[tokio::test]
async fn capacity_reached_flushes_before_admitting() {
    let provider = ScriptedProvider::new(["robots", "tides", "painters"]);
    let store = Arc::new(InMemoryVectorStore::new(Arc::new(FakeEmbeddings::default())));
    let cache = cache_with(
        &provider,
        store,
        CacheConfig::default().with_capacity(2),
    );

    let questions = [
        "What is a robot?",
        "How do ocean tides work?",
        "Who painted the Mona Lisa?",
    ];
    let mut writes = Vec::new();
    for question in questions {
        let request = CompletionRequest::new("scripted", "gpt-4", vec![Message::user(question)]);
        let resolution = cache
            .resolve(&request, &CacheOptions::default())
            .await
            .unwrap();
        assert!(resolution.outcome.is_miss());
        writes.push(resolution.write);
    }

    assert!(matches!(writes[0], WriteStatus::Admitted { flushed: false }));
    assert!(matches!(writes[1], WriteStatus::Admitted { flushed: false }));
    assert!(matches!(writes[2], WriteStatus::Admitted { flushed: true }));
    assert_eq!(cache.live_count().await.unwrap(), 1);
    assert_eq!(cache.stats().flushes, 1);
}

#[tokio::test]
async fn capacity_flush_with_stub_store() {
    let provider = ScriptedProvider::new(["a", "b", "c"]);
    let store = StubVectorStore::with_score(0.0);
    let cache = cache_with(
        &provider,
        store.clone(),
        CacheConfig::default().with_capacity(2),
    );

    for question in ["q1", "q2", "q3"] {
        let request = CompletionRequest::new("scripted", "m", vec![Message::user(question)]);
        cache
            .resolve(&request, &CacheOptions::default())
            .await
            .unwrap();
    }

    assert_eq!(store.clears(), 1);
    assert_eq!(store.keys(), vec!["q3".to_string()]);
}

#[tokio::test]
async fn manual_flush_empties_cache() {
    let provider = ScriptedProvider::new(["before", "after"]);
    let store = StubVectorStore::with_score(0.95);
    let cache = cache_with(&provider, store, CacheConfig::default());

    cache
        .resolve(&robot_request(), &CacheOptions::default())
        .await
        .unwrap();
    cache.flush().await.unwrap();
    assert_eq!(cache.live_count().await.unwrap(), 0);

    let again = cache
        .resolve(&robot_request(), &CacheOptions::default())
        .await
        .unwrap();
    assert_eq!(again.outcome, CacheOutcome::Miss("after".to_string()));
    assert_eq!(cache.stats().flushes, 1);
}

#[tokio::test]
async fn semantic_neighbour_hits_with_real_store() {
    let provider = ScriptedProvider::new(["A robot is a machine."]);
    let store = Arc::new(InMemoryVectorStore::new(Arc::new(FakeEmbeddings::default())));
    let cache = cache_with(&provider, store, CacheConfig::default());

    cache
        .resolve(&robot_request(), &CacheOptions::default())
        .await
        .unwrap();

    let rephrased = CompletionRequest::new(
        "scripted",
        "gpt-4",
        vec![Message::user("what is a robot")],
    );
    let resolution = cache
        .resolve(&rephrased, &CacheOptions::default())
        .await
        .unwrap();
    assert_eq!(
        resolution.outcome,
        CacheOutcome::Hit("A robot is a machine.".to_string())
    );
    assert_eq!(provider.calls(), 1);
}

// ---------------------------------------------------------------------------
// Concurrency
// ---------------------------------------------------------------------------

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_misses_on_same_key_store_one_entry() {
    let replies: Vec<String> = (0..8).map(|i| format!("answer {i}")).collect();
    let provider = ScriptedProvider::new(replies);
    let store = StubVectorStore::with_score(0.0);
    let cache = Arc::new(cache_with(&provider, store.clone(), CacheConfig::default()));

    let tasks = (0..8).map(|_| {
        let cache = cache.clone();
        tokio::spawn(async move {
            cache
                .resolve(&robot_request(), &CacheOptions::default())
                .await
        })
    });
    let results = futures::future::join_all(tasks).await;

    for result in results {
        assert!(result.unwrap().unwrap().outcome.is_miss());
    }
    assert_eq!(store.writes(), 1);
    assert_eq!(cache.live_count().await.unwrap(), 1);
    assert_eq!(cache.stats().duplicates, 7);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_distinct_keys_never_exceed_capacity() {
    let replies: Vec<String> = (0..20).map(|i| format!("answer {i}")).collect();
    let provider = ScriptedProvider::new(replies);
    let store = StubVectorStore::with_score(0.0);
    let cache = Arc::new(cache_with(
        &provider,
        store.clone(),
        CacheConfig::default().with_capacity(5),
    ));

    let tasks = (0..20).map(|i| {
        let cache = cache.clone();
        tokio::spawn(async move {
            let request = CompletionRequest::new(
                "scripted",
                "m",
                vec![Message::user(format!("question {i}"))],
            );
            cache.resolve(&request, &CacheOptions::default()).await
        })
    });
    for result in futures::future::join_all(tasks).await {
        assert!(result.unwrap().unwrap().write.is_admitted());
    }

    let live = cache.live_count().await.unwrap();
    assert!((1..=5).contains(&live), "live count {live} out of bounds");
    assert_eq!(cache.stats().admissions, 20);
    assert_eq!(cache.stats().flushes, 3);
}

struct SlowProvider;

#[async_trait]
impl ChatProvider for SlowProvider {
    fn name(&self) -> &str {
        "slow"
    }

    async fn generate(&self, _model: &str, _messages: &[Message]) -> Result<String, ProviderError> {
        tokio::time::sleep(Duration::from_secs(60)).await;
        Ok("too late".to_string())
    }
}

#[tokio::test]
async fn abandoned_resolve_admits_nothing() {
    let store = StubVectorStore::with_score(0.0);
    let registry = ProviderRegistry::new().with(Arc::new(SlowProvider));
    let cache = SemanticCache::new(registry, store.clone(), &CacheConfig::default()).unwrap();

    let request = CompletionRequest::new("slow", "m", robot_conversation());
    let options = CacheOptions::default();
    let abandoned =
        tokio::time::timeout(Duration::from_millis(20), cache.resolve(&request, &options)).await;

    assert!(abandoned.is_err());
    assert_eq!(store.writes(), 0);
    assert_eq!(cache.live_count().await.unwrap(), 0);
}
