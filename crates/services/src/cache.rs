use std::collections::HashMap;
use std::fmt::Debug;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use vocab_core::Clock;

struct CacheEntry<V> {
    value: V,
    stored_at: DateTime<Utc>,
}

/// Keyed cache for read-only query results.
///
/// Entries never expire when `ttl` is `None`. Failed fetches are not cached.
pub struct QueryCache<K, V> {
    name: &'static str,
    entries: Mutex<HashMap<K, CacheEntry<V>>>,
    ttl: Option<Duration>,
    clock: Clock,
}

impl<K, V> QueryCache<K, V>
where
    K: Eq + Hash + Clone + Debug,
    V: Clone,
{
    #[must_use]
    pub fn new(name: &'static str, clock: Clock) -> Self {
        Self {
            name,
            entries: Mutex::new(HashMap::new()),
            ttl: None,
            clock,
        }
    }

    /// Treat entries older than `ttl` as missing.
    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Fresh cached value for `key`, if any.
    #[must_use]
    pub fn get(&self, key: &K) -> Option<V> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let entry = entries.get(key)?;
        let expired = self
            .ttl
            .is_some_and(|ttl| self.clock.now() - entry.stored_at >= ttl);
        if expired {
            return None;
        }
        Some(entry.value.clone())
    }

    /// Store `value`, dropping any entries that have outlived the TTL.
    pub fn insert(&self, key: K, value: V) {
        let stored_at = self.clock.now();
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(ttl) = self.ttl {
            let before = entries.len();
            entries.retain(|_, entry| stored_at - entry.stored_at < ttl);
            let pruned = before - entries.len();
            if pruned > 0 {
                debug!(cache = self.name, pruned, "expired entries dropped");
            }
        }
        entries.insert(key, CacheEntry { value, stored_at });
    }

    /// Return the cached value or run `fetch` and cache its success.
    ///
    /// # Errors
    ///
    /// Propagates the error from `fetch`; nothing is cached in that case.
    pub async fn get_or_fetch<E, F, Fut>(&self, key: K, fetch: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.get(&key) {
            debug!(cache = self.name, ?key, "cache hit");
            return Ok(value);
        }
        debug!(cache = self.name, ?key, "cache miss");
        let value = fetch().await?;
        self.insert(key, value.clone());
        Ok(value)
    }

    pub fn invalidate(&self, key: &K) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
    }

    pub fn invalidate_all(&self) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
