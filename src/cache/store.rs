//! Timed cache for fetched headlines
//!
//! Holds the most recently fetched headline batch as a single JSON record
//! with a timestamp, and answers "is it still fresh" without any network
//! access. Staleness is a read-time judgment: entries persist until they are
//! overwritten or explicitly cleared.
//!
//! The cache is an optimization, never a dependency. Every operation
//! swallows storage failures: an unreadable entry reads as a miss and a
//! failed write leaves the caller's in-memory result unaffected.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::storage::{FileStorage, MemoryStorage, Storage};
use crate::clock::{Clock, SystemClock};
use crate::data::NewsItem;

/// Storage key for the cached headline record
pub const CACHE_KEY: &str = "crypto_news_cache";

/// How long a cached headline batch stays fresh
pub const DEFAULT_TTL: Duration = Duration::from_secs(6 * 60 * 60);

/// Persisted cache record
#[derive(Debug, Serialize, Deserialize)]
struct CachedNews {
    /// The cached headlines, in relevance order
    data: Vec<NewsItem>,
    /// Epoch milliseconds at which the batch was stored
    timestamp: i64,
    /// Which source produced the batch (diagnostic only)
    source: String,
}

/// Diagnostic snapshot of the cache state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheInfo {
    /// Whether the entry is within its TTL
    pub is_valid: bool,
    /// Age of the entry in whole minutes
    pub age_minutes: i64,
    /// Number of cached headlines
    pub count: usize,
    /// Source label recorded at write time, or "none" when empty
    pub source: String,
}

/// Cache for the most recently fetched headline batch.
///
/// A written entry is immutable; refreshing replaces it wholesale, so readers
/// never observe a partially updated record. Validity is judged strictly
/// against the TTL: an entry aged exactly the TTL is already stale.
#[derive(Clone)]
pub struct NewsCache {
    storage: Arc<dyn Storage>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl NewsCache {
    /// Creates a cache persisted to the XDG-compliant cache directory with
    /// the default 6-hour TTL.
    ///
    /// Returns `None` if the cache directory cannot be determined.
    pub fn new() -> Option<Self> {
        let storage = FileStorage::new()?;
        Some(Self::with_parts(
            Arc::new(storage),
            Arc::new(SystemClock),
            DEFAULT_TTL,
        ))
    }

    /// Creates a cache that lives only in process memory.
    ///
    /// Used as a fallback when no cache directory is available; entries do
    /// not survive the process.
    pub fn in_memory() -> Self {
        Self::with_parts(
            Arc::new(MemoryStorage::new()),
            Arc::new(SystemClock),
            DEFAULT_TTL,
        )
    }

    /// Creates a cache from an explicit storage backend, clock, and TTL.
    pub fn with_parts(storage: Arc<dyn Storage>, clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self {
            storage,
            clock,
            ttl,
        }
    }

    fn load(&self) -> Option<CachedNews> {
        let raw = self.storage.get(CACHE_KEY)?;
        match serde_json::from_str(&raw) {
            Ok(entry) => Some(entry),
            Err(err) => {
                warn!(%err, "discarding unreadable cache entry");
                None
            }
        }
    }

    fn age_millis(&self, entry: &CachedNews) -> i64 {
        self.clock.now().timestamp_millis() - entry.timestamp
    }

    fn ttl_millis(&self) -> i64 {
        self.ttl.as_millis() as i64
    }

    /// Returns true iff an entry exists and is younger than the TTL.
    pub fn is_valid(&self) -> bool {
        match self.load() {
            Some(entry) => {
                let age = self.age_millis(&entry);
                let valid = age < self.ttl_millis();
                debug!(
                    valid,
                    age_minutes = age / 60_000,
                    "checked headline cache"
                );
                valid
            }
            None => false,
        }
    }

    /// Returns the cached headlines, or an empty list if no entry exists.
    ///
    /// Staleness is not checked here: a stale-but-present batch remains
    /// readable for callers that prefer old data over none.
    pub fn read(&self) -> Vec<NewsItem> {
        self.load().map(|entry| entry.data).unwrap_or_default()
    }

    /// Replaces the stored entry with `items`, stamped with the current time.
    ///
    /// Write failures are logged and swallowed.
    pub fn write(&self, items: &[NewsItem], source: &str) {
        let entry = CachedNews {
            data: items.to_vec(),
            timestamp: self.clock.now().timestamp_millis(),
            source: source.to_string(),
        };
        let json = match serde_json::to_string(&entry) {
            Ok(json) => json,
            Err(err) => {
                warn!(%err, "failed to serialize cache entry");
                return;
            }
        };
        match self.storage.set(CACHE_KEY, &json) {
            Ok(()) => debug!(count = items.len(), source, "cached headlines"),
            Err(err) => warn!(%err, "failed to persist cache entry"),
        }
    }

    /// Deletes the stored entry. Clearing an empty cache is a no-op.
    pub fn clear(&self) {
        if let Err(err) = self.storage.remove(CACHE_KEY) {
            warn!(%err, "failed to clear cache entry");
        }
    }

    /// Returns a diagnostic snapshot of the cache state.
    pub fn info(&self) -> CacheInfo {
        match self.load() {
            Some(entry) => {
                let age = self.age_millis(&entry);
                CacheInfo {
                    is_valid: age < self.ttl_millis(),
                    age_minutes: age / 60_000,
                    count: entry.data.len(),
                    source: entry.source,
                }
            }
            None => CacheInfo {
                is_valid: false,
                age_minutes: 0,
                count: 0,
                source: "none".to_string(),
            },
        }
    }
}
