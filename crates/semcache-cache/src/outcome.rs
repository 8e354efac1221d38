use semcache_core::SemcacheError;

/// What `resolve` decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheOutcome {
    /// A stored answer was reused.
    Hit(String),
    /// The provider generated a fresh answer.
    Miss(String),
    /// A probe found a qualifying entry. No text is returned.
    Suppressed,
}

impl CacheOutcome {
    pub fn text(&self) -> Option<&str> {
        match self {
            CacheOutcome::Hit(text) | CacheOutcome::Miss(text) => Some(text),
            CacheOutcome::Suppressed => None,
        }
    }

    /// The answer text, or an empty string for `Suppressed`.
    pub fn into_text(self) -> String {
        match self {
            CacheOutcome::Hit(text) | CacheOutcome::Miss(text) => text,
            CacheOutcome::Suppressed => String::new(),
        }
    }

    pub fn is_hit(&self) -> bool {
        matches!(self, CacheOutcome::Hit(_))
    }

    pub fn is_miss(&self) -> bool {
        matches!(self, CacheOutcome::Miss(_))
    }

    pub fn is_suppressed(&self) -> bool {
        matches!(self, CacheOutcome::Suppressed)
    }
}

/// What happened to the cache write after a miss.
#[derive(Debug)]
pub enum WriteStatus {
    /// Hit, probe, or writes disabled for this call.
    NotAttempted,
    /// The key was already live.
    Duplicate,
    Admitted {
        /// The store was at capacity and was flushed first.
        flushed: bool,
    },
    /// Admission failed. The generated answer is still in the outcome.
    Failed(SemcacheError),
}

impl WriteStatus {
    pub fn is_admitted(&self) -> bool {
        matches!(self, WriteStatus::Admitted { .. })
    }
}

/// Result of a successful `resolve`.
#[derive(Debug)]
pub struct Resolution {
    pub outcome: CacheOutcome,
    pub write: WriteStatus,
}

impl Resolution {
    pub(crate) fn without_write(outcome: CacheOutcome) -> Self {
        Self {
            outcome,
            write: WriteStatus::NotAttempted,
        }
    }

    pub fn text(&self) -> Option<&str> {
        self.outcome.text()
    }

    pub fn into_text(self) -> String {
        self.outcome.into_text()
    }
}
