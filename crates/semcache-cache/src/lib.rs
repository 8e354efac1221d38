mod blocking;
mod config;
mod engine;
mod options;
mod outcome;
mod stats;
mod store;

pub use blocking::BlockingSemanticCache;
pub use config::{CacheConfig, DEFAULT_CAPACITY, DEFAULT_SIMILARITY_THRESHOLD};
pub use engine::SemanticCache;
pub use options::CacheOptions;
pub use outcome::{CacheOutcome, Resolution, WriteStatus};
pub use stats::CacheStats;
pub use store::{Admission, BoundedStore, CacheEntry, CACHED_RESPONSE_KEY};
