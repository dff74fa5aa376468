//! TTL-based cache of cleaned page content, keyed by URL

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use std::time::Duration;
use tokio::time::Instant;

/// Default lifetime of a cached page
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(10 * 60);

struct CacheEntry {
    content: String,
    fetched_at: Instant,
}

/// Cache statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Entries currently held, expired ones included
    pub count: usize,
    /// Cached URLs, sorted
    pub keys: Vec<String>,
    /// Entries past their TTL that have not been purged yet
    pub expired: usize,
}

/// In-memory content cache
///
/// Expired entries are ignored by [`get`](Self::get) but stay in memory until
/// they are overwritten, purged with [`purge_expired`](Self::purge_expired),
/// or displaced when the optional entry bound is reached.
pub struct ContentCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    ttl: Duration,
    max_entries: Option<usize>,
}

impl Default for ContentCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_TTL)
    }
}

impl ContentCache {
    /// Create an unbounded cache with the given TTL
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
            max_entries: None,
        }
    }

    /// Create a cache holding at most `max_entries` URLs
    pub fn bounded(ttl: Duration, max_entries: usize) -> Self {
        Self {
            max_entries: Some(max_entries.max(1)),
            ..Self::new(ttl)
        }
    }

    /// Configured TTL
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Get fresh content for a URL
    pub fn get(&self, url: &str) -> Option<String> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        let entry = entries.get(url)?;

        if self.is_expired(entry) {
            return None;
        }

        Some(entry.content.clone())
    }

    /// Store content for a URL, replacing any previous entry
    pub fn put(&self, url: &str, content: impl Into<String>) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);

        if let Some(max) = self.max_entries {
            if entries.len() >= max && !entries.contains_key(url) {
                entries.retain(|_, entry| entry.fetched_at.elapsed() < self.ttl);
                if entries.len() >= max {
                    evict_oldest(&mut entries);
                }
            }
        }

        entries.insert(
            url.to_string(),
            CacheEntry {
                content: content.into(),
                fetched_at: Instant::now(),
            },
        );
    }

    /// Clear all cache entries
    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Remove expired entries, returning how many were dropped
    pub fn purge_expired(&self) -> usize {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|_, entry| entry.fetched_at.elapsed() < self.ttl);
        before - entries.len()
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);

        let mut keys: Vec<String> = entries.keys().cloned().collect();
        keys.sort();

        CacheStats {
            count: entries.len(),
            keys,
            expired: entries.values().filter(|e| self.is_expired(e)).count(),
        }
    }

    fn is_expired(&self, entry: &CacheEntry) -> bool {
        entry.fetched_at.elapsed() >= self.ttl
    }
}

fn evict_oldest(entries: &mut HashMap<String, CacheEntry>) {
    if let Some(oldest_key) = entries
        .iter()
        .min_by_key(|(_, v)| v.fetched_at)
        .map(|(k, _)| k.clone())
    {
        tracing::debug!(url = %oldest_key, "Evicting oldest cache entry");
        entries.remove(&oldest_key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_put_and_get() {
        let cache = ContentCache::default();
        cache.put("https://example.com", "Hello");

        assert_eq!(cache.get("https://example.com"), Some("Hello".to_string()));
        assert_eq!(cache.ttl(), DEFAULT_CACHE_TTL);
    }

    #[test]
    fn test_cache_miss() {
        let cache = ContentCache::default();
        assert!(cache.get("https://nonexistent.example").is_none());
    }

    #[test]
    fn test_cache_overwrite() {
        let cache = ContentCache::default();
        cache.put("https://example.com", "old");
        cache.put("https://example.com", "new");

        assert_eq!(cache.get("https://example.com"), Some("new".to_string()));
        assert_eq!(cache.stats().count, 1);
    }

    #[test]
    fn test_cache_clear() {
        let cache = ContentCache::default();
        cache.put("https://a.example", "a");
        cache.clear();

        assert!(cache.get("https://a.example").is_none());
        assert_eq!(cache.stats(), CacheStats::default());
    }

    #[test]
    fn test_cache_stats() {
        let cache = ContentCache::default();
        cache.put("https://b.example", "b");
        cache.put("https://a.example", "a");

        let stats = cache.stats();
        assert_eq!(stats.count, 2);
        assert_eq!(stats.keys, vec!["https://a.example", "https://b.example"]);
        assert_eq!(stats.expired, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_expires_after_ttl() {
        let cache = ContentCache::new(Duration::from_secs(60));
        cache.put("https://example.com", "content");

        tokio::time::advance(Duration::from_secs(59)).await;
        assert!(cache.get("https://example.com").is_some());

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(cache.get("https://example.com").is_none());

        // Still held in memory until purged
        let stats = cache.stats();
        assert_eq!(stats.count, 1);
        assert_eq!(stats.expired, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_put_refreshes_timestamp() {
        let cache = ContentCache::new(Duration::from_secs(60));
        cache.put("https://example.com", "v1");

        tokio::time::advance(Duration::from_secs(45)).await;
        cache.put("https://example.com", "v2");

        tokio::time::advance(Duration::from_secs(45)).await;
        assert_eq!(cache.get("https://example.com"), Some("v2".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_purge_expired() {
        let cache = ContentCache::new(Duration::from_secs(60));
        cache.put("https://old.example", "old");

        tokio::time::advance(Duration::from_secs(61)).await;
        cache.put("https://fresh.example", "fresh");

        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(cache.stats().keys, vec!["https://fresh.example"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_bounded_cache_evicts_oldest() {
        let cache = ContentCache::bounded(Duration::from_secs(600), 2);

        cache.put("https://one.example", "1");
        tokio::time::advance(Duration::from_secs(1)).await;
        cache.put("https://two.example", "2");
        tokio::time::advance(Duration::from_secs(1)).await;
        cache.put("https://three.example", "3");

        let stats = cache.stats();
        assert_eq!(stats.count, 2);
        assert!(cache.get("https://one.example").is_none());
        assert!(cache.get("https://two.example").is_some());
        assert!(cache.get("https://three.example").is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_bounded_cache_prefers_purging_expired() {
        let cache = ContentCache::bounded(Duration::from_secs(60), 2);

        cache.put("https://stale.example", "s");
        tokio::time::advance(Duration::from_secs(30)).await;
        cache.put("https://keep.example", "k");
        tokio::time::advance(Duration::from_secs(31)).await;
        cache.put("https://new.example", "n");

        assert_eq!(
            cache.stats().keys,
            vec!["https://keep.example", "https://new.example"]
        );
    }

    #[test]
    fn test_bounded_cache_overwrite_does_not_evict() {
        let cache = ContentCache::bounded(Duration::from_secs(600), 1);
        cache.put("https://example.com", "a");
        cache.put("https://example.com", "b");

        assert_eq!(cache.get("https://example.com"), Some("b".to_string()));
    }
}
