//! In-memory query cache
//!
//! A process-local read-through accelerator for search/stats responses.
//! Never authoritative: a miss always falls through to the database. Entries
//! expire lazily on read and are swept periodically to bound memory.

use serde::Serialize;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::debug;

/// Cache TTL tiers in seconds. Callers pick per endpoint based on how
/// volatile the underlying data is.
pub mod ttl {
    use std::time::Duration;

    /// 15 minutes
    pub const SHORT: Duration = Duration::from_secs(900);
    /// 1 hour
    pub const MEDIUM: Duration = Duration::from_secs(3600);
    /// 6 hours
    pub const LONG: Duration = Duration::from_secs(21600);
    /// 24 hours
    pub const DAY: Duration = Duration::from_secs(86400);
}

/// Interval between periodic sweeps of expired entries
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(3600);

struct CacheEntry {
    value: serde_json::Value,
    expires_at: Instant,
}

/// TTL-bounded key/value cache over JSON values
pub struct QueryCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Derive a deterministic cache key from a serializable filter set.
    ///
    /// The full filter struct participates, so distinct filter combinations
    /// never collide.
    pub fn key_for<T: Serialize>(prefix: &str, filters: &T) -> String {
        let serialized =
            serde_json::to_string(filters).unwrap_or_else(|_| "unserializable".to_string());
        format!("{}:{}", prefix, serialized)
    }

    /// Get a cached value if present and not expired; expired entries are
    /// evicted on the spot.
    pub async fn get(&self, key: &str) -> Option<serde_json::Value> {
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some(entry) if Instant::now() <= entry.expires_at => {
                    return Some(entry.value.clone());
                }
                Some(_) => {} // expired, evict below
                None => return None,
            }
        }

        let mut entries = self.entries.write().await;
        entries.remove(key);
        None
    }

    /// Store a value with the given time-to-live
    pub async fn set(&self, key: &str, value: serde_json::Value, ttl: Duration) {
        let entry = CacheEntry {
            value,
            expires_at: Instant::now() + ttl,
        };
        let mut entries = self.entries.write().await;
        entries.insert(key.to_string(), entry);
    }

    /// Drop everything. Called after each ingestion run so subsequent
    /// queries observe fresh data (coarse invalidation, no key granularity).
    pub async fn invalidate_all(&self) {
        let mut entries = self.entries.write().await;
        let dropped = entries.len();
        entries.clear();
        if dropped > 0 {
            debug!(dropped, "Query cache invalidated");
        }
    }

    /// Remove expired entries. Run periodically to bound memory between reads.
    pub async fn sweep(&self) {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| now <= entry.expires_at);
        let swept = before - entries.len();
        if swept > 0 {
            debug!(swept, remaining = entries.len(), "Swept expired cache entries");
        }
    }

    /// Number of live (possibly expired but unswept) entries
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new()
    }
}
