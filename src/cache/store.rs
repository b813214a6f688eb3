use std::time::{Duration, Instant};

use dashmap::DashMap;

struct CacheEntry<V> {
    created_at: Instant,
    last_access: Instant,
    value: V,
}

/// TTL map with a capacity bound.
///
/// Expired entries read as misses but stay in place until overwritten, swept
/// by [`TtlCache::purge_expired`], or pushed out when the map is full. When
/// full, expired entries go first, then the least recently read one.
pub struct TtlCache<V> {
    entries: DashMap<String, CacheEntry<V>>,
    ttl: Duration,
    max_entries: usize,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            max_entries: max_entries.max(1),
        }
    }

    pub fn get(&self, key: &str) -> Option<V> {
        self.get_at(key, Instant::now())
    }

    pub fn get_at(&self, key: &str, now: Instant) -> Option<V> {
        let mut entry = self.entries.get_mut(key)?;
        if now.saturating_duration_since(entry.created_at) >= self.ttl {
            tracing::debug!(key, "Cache entry expired");
            return None;
        }
        entry.last_access = now;
        Some(entry.value.clone())
    }

    pub fn put(&self, key: String, value: V) {
        self.put_at(key, value, Instant::now());
    }

    pub fn put_at(&self, key: String, value: V, now: Instant) {
        if !self.entries.contains_key(&key) && self.entries.len() >= self.max_entries {
            self.purge_expired_at(now);
            if self.entries.len() >= self.max_entries {
                self.evict_least_recent();
            }
        }

        self.entries.insert(
            key,
            CacheEntry {
                created_at: now,
                last_access: now,
                value,
            },
        );
    }

    pub fn purge_expired(&self) -> usize {
        self.purge_expired_at(Instant::now())
    }

    pub fn purge_expired_at(&self, now: Instant) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| now.saturating_duration_since(entry.created_at) < self.ttl);
        before.saturating_sub(self.entries.len())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn evict_least_recent(&self) {
        let victim = self
            .entries
            .iter()
            .min_by_key(|entry| entry.last_access)
            .map(|entry| entry.key().clone());
        if let Some(key) = victim {
            tracing::debug!(key, "Evicting least recently used cache entry");
            self.entries.remove(&key);
        }
    }
}
