//! Bounded, expiring memo caches for resolved post context and usernames.

use crate::config::CacheConfig;
use crate::posts::PostContext;

use moka::policy::EvictionPolicy;
use moka::sync::Cache;

use std::sync::Arc;
use std::time::Duration;

/// A string-keyed LRU cache with an optional time-to-live.
///
/// Reads and writes both refresh recency. Expired entries read as absent.
/// Concurrent fills for the same key are allowed; the last write wins.
#[derive(Clone)]
pub struct MemoCache<V: Clone + Send + Sync + 'static> {
    inner: Cache<String, V>,
}

impl<V: Clone + Send + Sync + 'static> MemoCache<V> {
    pub fn new(max_entries: u64, ttl: Option<Duration>) -> Self {
        let mut builder = Cache::builder()
            .max_capacity(max_entries)
            .eviction_policy(EvictionPolicy::lru());
        if let Some(ttl) = ttl {
            builder = builder.time_to_live(ttl);
        }
        Self {
            inner: builder.build(),
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.max_entries, config.ttl())
    }

    pub fn get(&self, key: &str) -> Option<V> {
        self.inner.get(key)
    }

    /// Insert or overwrite, evicting the least recently used entry when the
    /// cache is over capacity.
    pub fn set(&self, key: impl Into<String>, value: V) {
        self.inner.insert(key.into(), value);
        // apply pending reads/writes so the capacity bound holds on return
        self.inner.run_pending_tasks();
    }

    /// Number of live entries.
    pub fn len(&self) -> u64 {
        self.inner.run_pending_tasks();
        self.inner.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The two caches consulted during context resolution.
#[derive(Clone)]
pub struct ContextCache {
    /// Post id to resolved context.
    pub posts: MemoCache<Arc<PostContext>>,
    /// Author id to username.
    pub usernames: MemoCache<String>,
}

impl ContextCache {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            posts: MemoCache::from_config(config),
            usernames: MemoCache::from_config(config),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn returns_what_was_set() {
        let cache = MemoCache::new(4, None);
        cache.set("1", "alice".to_string());
        assert_eq!(cache.get("1").as_deref(), Some("alice"));
        assert_eq!(cache.get("2"), None);
    }

    #[test]
    fn overwrite_keeps_one_entry() {
        let cache = MemoCache::new(4, None);
        cache.set("1", "alice".to_string());
        cache.set("1", "bob".to_string());
        assert_eq!(cache.get("1").as_deref(), Some("bob"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn never_exceeds_capacity() {
        let cache = MemoCache::new(3, None);
        for i in 0..10 {
            cache.set(i.to_string(), i);
            assert!(cache.len() <= 3);
        }
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn evicts_least_recently_used() {
        let cache = MemoCache::new(2, None);
        cache.set("a", 1);
        cache.set("b", 2);
        // touching "a" leaves "b" as the eviction candidate
        assert_eq!(cache.get("a"), Some(1));
        cache.set("c", 3);

        assert_eq!(cache.get("b"), None);
        assert_eq!(cache.get("a"), Some(1));
        assert_eq!(cache.get("c"), Some(3));
    }

    #[test]
    fn expired_entries_read_as_missing() {
        let cache = MemoCache::new(4, Some(Duration::from_millis(50)));
        cache.set("1", 1);
        assert_eq!(cache.get("1"), Some(1));

        std::thread::sleep(Duration::from_millis(120));
        assert_eq!(cache.get("1"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn context_cache_stores_are_independent() {
        let cache = ContextCache::new(&CacheConfig::default());
        cache.usernames.set("42", "bob".to_string());
        assert!(cache.posts.get("42").is_none());
        assert_eq!(cache.usernames.get("42").as_deref(), Some("bob"));
    }

    #[test]
    fn concurrent_fills_stay_consistent() {
        let cache = MemoCache::new(8, None);

        std::thread::scope(|scope| {
            for worker in 0..4 {
                let cache = &cache;
                scope.spawn(move || {
                    for round in 0..200 {
                        let key = (round % 12).to_string();
                        if cache.get(&key).is_none() {
                            cache.set(key.clone(), format!("value-{key}"));
                        }
                        // overlapping overwrites with an equivalent value
                        if round % (worker + 2) == 0 {
                            cache.set(key.clone(), format!("value-{key}"));
                        }
                    }
                });
            }
        });

        assert!(cache.len() <= 8);
        for key in 0..12 {
            let key = key.to_string();
            if let Some(value) = cache.get(&key) {
                assert_eq!(value, format!("value-{key}"));
            }
        }
    }
}
