//! TTL-bounded cache for computed distributions.
//!
//! Every computation is a pure function of its inputs, so a cached value is
//! interchangeable with a fresh one. Entries expire after the configured TTL
//! and the cache never holds more than `max_entries` values; inserting into a
//! full cache evicts the oldest entry.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;

/// A thread-safe cache with time-to-live expiration and a size bound.
///
/// Expired entries are never returned, but are not removed until
/// `cleanup_expired()` runs or an insert needs the room.
pub struct TtlCache<K, V> {
    entries: RwLock<HashMap<K, TtlEntry<V>>>,
    ttl: Duration,
    max_entries: usize,
}

struct TtlEntry<V> {
    value: V,
    inserted_at: Instant,
}

impl<V> TtlEntry<V> {
    fn is_live(&self, ttl: Duration) -> bool {
        self.inserted_at.elapsed() < ttl
    }
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone + Send + Sync,
    V: Clone + Send + Sync,
{
    /// Create a cache holding at most `max_entries` values for `ttl` each.
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
            max_entries: max_entries.max(1),
        }
    }

    /// Insert a value, replacing any existing entry and resetting its TTL.
    pub async fn insert(&self, key: K, value: V) {
        self.insert_at(key, value, Instant::now()).await;
    }

    async fn insert_at(&self, key: K, value: V, inserted_at: Instant) {
        let mut guard = self.entries.write().await;
        if !guard.contains_key(&key) && guard.len() >= self.max_entries {
            let ttl = self.ttl;
            guard.retain(|_, entry| entry.is_live(ttl));
            if guard.len() >= self.max_entries {
                let oldest = guard
                    .iter()
                    .min_by_key(|(_, entry)| entry.inserted_at)
                    .map(|(k, _)| k.clone());
                if let Some(oldest) = oldest {
                    guard.remove(&oldest);
                }
            }
        }
        guard.insert(key, TtlEntry { value, inserted_at });
    }

    /// Get a value if it exists and hasn't expired.
    pub async fn get(&self, key: &K) -> Option<V> {
        let guard = self.entries.read().await;
        guard
            .get(key)
            .filter(|entry| entry.is_live(self.ttl))
            .map(|entry| entry.value.clone())
    }

    /// Remove all expired entries and return how many were dropped.
    pub async fn cleanup_expired(&self) -> usize {
        let mut guard = self.entries.write().await;
        let before_count = guard.len();
        let ttl = self.ttl;
        guard.retain(|_, entry| entry.is_live(ttl));
        before_count - guard.len()
    }

    /// Current number of entries, including expired ones not yet cleaned.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}
