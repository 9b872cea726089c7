//! In-process time-to-live cache for catalog reads.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;

/// Component and system listings change often enough to refresh hourly.
pub const LISTING_TTL: Duration = Duration::from_secs(60 * 60);

/// Type lists (component types, system type groups) are refreshed every
/// six hours.
pub const TYPE_LIST_TTL: Duration = Duration::from_secs(6 * 60 * 60);

/// Listing keys come from caller-supplied filters; this bounds how many
/// distinct filter combinations are held at once.
pub const LISTING_MAX_ENTRIES: usize = 256;

/// Type lists are keyed by a fixed handful of names.
pub const TYPE_LIST_MAX_ENTRIES: usize = 8;

/// A keyed cache whose entries expire `ttl` after insertion.
///
/// At most `max_entries` entries are held; inserting into a full cache
/// evicts the oldest entry.
pub struct TtlCache<V> {
    ttl: Duration,
    max_entries: usize,
    entries: RwLock<HashMap<String, (Instant, V)>>,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            ttl,
            max_entries: max_entries.max(1),
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Return a live entry, if present.
    pub async fn get(&self, key: &str) -> Option<V> {
        let entries = self.entries.read().await;
        entries
            .get(key)
            .filter(|(stored_at, _)| stored_at.elapsed() < self.ttl)
            .map(|(_, value)| value.clone())
    }

    pub async fn insert(&self, key: impl Into<String>, value: V) {
        let key = key.into();
        let mut entries = self.entries.write().await;
        entries.retain(|_, (stored_at, _)| stored_at.elapsed() < self.ttl);

        while entries.len() >= self.max_entries && !entries.contains_key(&key) {
            let Some(oldest) = entries
                .iter()
                .min_by_key(|(_, (stored_at, _))| *stored_at)
                .map(|(k, _)| k.clone())
            else {
                break;
            };
            entries.remove(&oldest);
        }
        entries.insert(key, (Instant::now(), value));
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn live_entries_are_returned() {
        let cache = TtlCache::new(LISTING_TTL, LISTING_MAX_ENTRIES);
        cache.insert("motor", vec![1, 2]).await;
        assert_eq!(cache.get("motor").await, Some(vec![1, 2]));
        assert_eq!(cache.get("belt").await, None);
    }

    #[tokio::test]
    async fn expired_entries_are_ignored() {
        let cache = TtlCache::new(Duration::ZERO, 1);
        cache.insert("motor", 1).await;
        assert_eq!(cache.get("motor").await, None);
    }

    #[tokio::test]
    async fn full_cache_evicts_oldest_entry() {
        let cache = TtlCache::new(TYPE_LIST_TTL, 2);
        cache.insert("a", 1).await;
        cache.insert("b", 2).await;
        cache.insert("c", 3).await;

        assert_eq!(cache.len().await, 2);
        assert_eq!(cache.get("a").await, None);
        assert_eq!(cache.get("b").await, Some(2));
        assert_eq!(cache.get("c").await, Some(3));
    }

    #[tokio::test]
    async fn replacing_a_key_in_a_full_cache_keeps_the_others() {
        let cache = TtlCache::new(TYPE_LIST_TTL, 2);
        cache.insert("a", 1).await;
        cache.insert("b", 2).await;
        cache.insert("b", 20).await;

        assert_eq!(cache.len().await, 2);
        assert_eq!(cache.get("a").await, Some(1));
        assert_eq!(cache.get("b").await, Some(20));
    }
}
