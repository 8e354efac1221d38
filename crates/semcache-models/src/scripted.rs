use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use async_trait::async_trait;
use semcache_core::{ChatProvider, Message, ProviderError};
use tokio::sync::Mutex;

/// Provider that replays queued replies in order and counts how often it was asked.
#[derive(Clone)]
pub struct ScriptedProvider {
    name: String,
    replies: Arc<Mutex<VecDeque<Result<String, ProviderError>>>>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedProvider {
    pub fn new<S: Into<String>>(replies: impl IntoIterator<Item = S>) -> Self {
        Self {
            name: "scripted".to_string(),
            replies: Arc::new(Mutex::new(
                replies.into_iter().map(|r| Ok(r.into())).collect(),
            )),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Queue a failure behind the already scripted replies.
    pub fn push_error(&self, error: ProviderError) -> &Self {
        self.replies
            .try_lock()
            .expect("not concurrent during setup")
            .push_back(Err(error));
        self
    }

    /// Number of `generate` calls made so far, including failed ones.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatProvider for ScriptedProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(&self, _model: &str, _messages: &[Message]) -> Result<String, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut replies = self.replies.lock().await;
        replies.pop_front().unwrap_or_else(|| {
            Err(ProviderError::Response(
                "scripted provider exhausted replies".to_string(),
            ))
        })
    }
}
