//! Short-lived response cache for GET requests
//!
//! Keys are `path?query`. Writes invalidate by collection prefix and callers
//! can prune explicitly through [`MyrasecApi::prune_cache`](crate::MyrasecApi::prune_cache).

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;

/// Default lifetime of a cached response.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(10);

struct Entry {
    body: String,
    stored_at: Instant,
}

pub struct ResponseCache {
    ttl: Duration,
    entries: RwLock<HashMap<String, Entry>>,
}

impl ResponseCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// A zero TTL disables caching.
    pub fn is_enabled(&self) -> bool {
        !self.ttl.is_zero()
    }

    pub async fn get(&self, key: &str) -> Option<String> {
        if !self.is_enabled() {
            return None;
        }
        let entries = self.entries.read().await;
        entries
            .get(key)
            .filter(|e| e.stored_at.elapsed() < self.ttl)
            .map(|e| e.body.clone())
    }

    pub async fn put(&self, key: String, body: String) {
        if !self.is_enabled() {
            return;
        }
        let mut entries = self.entries.write().await;
        let ttl = self.ttl;
        entries.retain(|_, e| e.stored_at.elapsed() < ttl);
        entries.insert(
            key,
            Entry {
                body,
                stored_at: Instant::now(),
            },
        );
    }

    /// Drop every entry whose key starts with `prefix`. Returns the number removed.
    pub async fn prune(&self, prefix: &str) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|key, _| !key.starts_with(prefix));
        let removed = before - entries.len();
        if removed > 0 {
            log::debug!("[myrasec] pruned {removed} cached response(s) under '{prefix}'");
        }
        removed
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_TTL)
    }
}

/// Collection prefix a write to `path` invalidates.
///
/// `/domain/1/www.example.com/redirects/7` → `/domain/1/www.example.com/redirects`
pub fn collection_prefix(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    match trimmed.rsplit_once('/') {
        Some((head, last)) if !head.is_empty() && last.bytes().all(|b| b.is_ascii_digit()) => {
            head
        }
        _ => trimmed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn returns_fresh_entries() {
        let cache = ResponseCache::default();
        cache.put("/domains?page=1".into(), "body".into()).await;
        assert_eq!(cache.get("/domains?page=1").await.as_deref(), Some("body"));
    }

    #[tokio::test]
    async fn zero_ttl_disables_cache() {
        let cache = ResponseCache::new(Duration::ZERO);
        cache.put("/domains".into(), "body".into()).await;
        assert!(cache.get("/domains").await.is_none());
        assert_eq!(cache.len().await, 0);
    }

    #[tokio::test]
    async fn expired_entries_are_not_served() {
        let cache = ResponseCache::new(Duration::from_millis(20));
        cache.put("/tags".into(), "body".into()).await;
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert!(cache.get("/tags").await.is_none());
    }

    #[tokio::test]
    async fn prune_removes_by_prefix() {
        let cache = ResponseCache::default();
        cache.put("/domain/1/errorpages?page=1".into(), "a".into()).await;
        cache.put("/domain/1/errorpages?page=2".into(), "b".into()).await;
        cache.put("/domain/2/errorpages?page=1".into(), "c".into()).await;

        assert_eq!(cache.prune("/domain/1/errorpages").await, 2);
        assert_eq!(cache.len().await, 1);
        assert_eq!(cache.prune("").await, 1);
        assert_eq!(cache.len().await, 0);
    }

    #[test]
    fn collection_prefix_strips_trailing_id() {
        assert_eq!(
            collection_prefix("/domain/1/www.example.com/redirects/7"),
            "/domain/1/www.example.com/redirects"
        );
        assert_eq!(collection_prefix("/tags"), "/tags");
        assert_eq!(collection_prefix("/tags/"), "/tags");
    }
}
