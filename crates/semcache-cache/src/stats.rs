use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Counters since the cache was built.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub suppressed: u64,
    pub admissions: u64,
    pub duplicates: u64,
    pub flushes: u64,
    pub write_failures: u64,
}

#[derive(Default)]
pub(crate) struct StatsRecorder {
    hits: AtomicU64,
    misses: AtomicU64,
    suppressed: AtomicU64,
    admissions: AtomicU64,
    duplicates: AtomicU64,
    flushes: AtomicU64,
    write_failures: AtomicU64,
}

fn bump(counter: &AtomicU64) {
    counter.fetch_add(1, Ordering::Relaxed);
}

impl StatsRecorder {
    pub(crate) fn hit(&self) {
        bump(&self.hits);
    }

    pub(crate) fn miss(&self) {
        bump(&self.misses);
    }

    pub(crate) fn suppressed(&self) {
        bump(&self.suppressed);
    }

    pub(crate) fn admission(&self, flushed: bool) {
        bump(&self.admissions);
        if flushed {
            bump(&self.flushes);
        }
    }

    pub(crate) fn duplicate(&self) {
        bump(&self.duplicates);
    }

    pub(crate) fn flush(&self) {
        bump(&self.flushes);
    }

    pub(crate) fn write_failure(&self) {
        bump(&self.write_failures);
    }

    pub(crate) fn snapshot(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            suppressed: self.suppressed.load(Ordering::Relaxed),
            admissions: self.admissions.load(Ordering::Relaxed),
            duplicates: self.duplicates.load(Ordering::Relaxed),
            flushes: self.flushes.load(Ordering::Relaxed),
            write_failures: self.write_failures.load(Ordering::Relaxed),
        }
    }
}
