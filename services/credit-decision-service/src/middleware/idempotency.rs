use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use sha2::{Digest, Sha256};
use tokio::sync::RwLock;

/// One cached response, keyed by the client-supplied idempotency key.
#[derive(Debug, Clone)]
pub struct CachedResponse {
    pub body_hash: String,
    pub status_code: u16,
    pub response_body: Vec<u8>,
    pub headers: Vec<(String, String)>,
    pub created_at: DateTime<Utc>,
}

/// Result of looking a key up against the cache.
pub enum Lookup {
    /// No entry, or the entry expired.
    Miss,
    /// Entry found and the body hash matches: replay it.
    Hit(CachedResponse),
    /// Entry found but the body hash differs: same key, different request.
    Conflict,
}

struct Inner {
    entries: HashMap<String, CachedResponse>,
    last_cleanup: DateTime<Utc>,
}

/// In-memory, single-process idempotency cache. Grounded in the same
/// `Arc<RwLock<HashMap<...>>>` shared-state shape
/// `middleware::rate_limit::RateLimiter` uses.
#[derive(Clone)]
pub struct IdempotencyCache {
    inner: Arc<RwLock<Inner>>,
    ttl: Duration,
    max_entries: usize,
}

impl IdempotencyCache {
    pub fn new(max_entries: usize, ttl_seconds: i64) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner {
                entries: HashMap::new(),
                last_cleanup: Utc::now(),
            })),
            ttl: Duration::seconds(ttl_seconds),
            max_entries,
        }
    }

    pub fn hash_body(body: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(body);
        hex::encode(hasher.finalize())
    }

    pub async fn get(&self, key: &str, body_hash: &str) -> Lookup {
        let now = Utc::now();
        let mut inner = self.inner.write().await;

        if now - inner.last_cleanup > Duration::minutes(5) {
            let ttl = self.ttl;
            inner.entries.retain(|_, entry| now - entry.created_at < ttl);
            inner.last_cleanup = now;
        }

        match inner.entries.get(key) {
            None => Lookup::Miss,
            Some(entry) if now - entry.created_at >= self.ttl => Lookup::Miss,
            Some(entry) if entry.body_hash == body_hash => Lookup::Hit(entry.clone()),
            Some(_) => Lookup::Conflict,
        }
    }

    pub async fn set(&self, key: String, entry: CachedResponse) {
        let mut inner = self.inner.write().await;

        if inner.entries.len() >= self.max_entries {
            let evict_count = (self.max_entries / 5).max(1);
            let mut by_age: Vec<(String, DateTime<Utc>)> = inner
                .entries
                .iter()
                .map(|(k, v)| (k.clone(), v.created_at))
                .collect();
            by_age.sort_by_key(|(_, created_at)| *created_at);
            for (stale_key, _) in by_age.into_iter().take(evict_count) {
                inner.entries.remove(&stale_key);
            }
        }

        inner.entries.insert(key, entry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(body_hash: &str) -> CachedResponse {
        CachedResponse {
            body_hash: body_hash.to_string(),
            status_code: 200,
            response_body: b"{}".to_vec(),
            headers: vec![],
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn miss_on_unseen_key() {
        let cache = IdempotencyCache::new(100, 3600);
        assert!(matches!(cache.get("key-1", "hash-a").await, Lookup::Miss));
    }

    #[tokio::test]
    async fn hit_on_matching_body_hash() {
        let cache = IdempotencyCache::new(100, 3600);
        cache.set("key-1".to_string(), entry("hash-a")).await;
        assert!(matches!(cache.get("key-1", "hash-a").await, Lookup::Hit(_)));
    }

    #[tokio::test]
    async fn conflict_on_mismatched_body_hash() {
        let cache = IdempotencyCache::new(100, 3600);
        cache.set("key-1".to_string(), entry("hash-a")).await;
        assert!(matches!(cache.get("key-1", "hash-b").await, Lookup::Conflict));
    }

    #[tokio::test]
    async fn same_input_yields_same_hash() {
        let a = IdempotencyCache::hash_body(b"hello");
        let b = IdempotencyCache::hash_body(b"hello");
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn eviction_removes_oldest_entries_at_capacity() {
        let cache = IdempotencyCache::new(5, 3600);
        for i in 0..5 {
            cache.set(format!("key-{i}"), entry("hash")).await;
        }
        cache.set("key-5".to_string(), entry("hash")).await;
        let inner = cache.inner.read().await;
        assert!(inner.entries.len() <= 5);
    }
}
