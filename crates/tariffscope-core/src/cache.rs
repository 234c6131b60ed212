//! Time-bounded in-memory cache for derived country profiles.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;

/// Default lifetime of a cached profile (one hour).
pub const DEFAULT_PROFILE_TTL: Duration = Duration::from_secs(3_600);

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    /// `None` when the TTL reaches past what `Instant` can represent.
    expires_at: Option<Instant>,
}

impl<V> CacheEntry<V> {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |expires_at| now < expires_at)
    }
}

#[derive(Debug)]
struct CacheInner<K, V> {
    map: HashMap<K, CacheEntry<V>>,
    default_ttl: Duration,
}

impl<K, V> CacheInner<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    fn get(&self, key: &K) -> Option<V> {
        let now = Instant::now();
        self.map
            .get(key)
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.value.clone())
    }

    fn put(&mut self, key: K, value: V, ttl_override: Option<Duration>) {
        let ttl = ttl_override.unwrap_or(self.default_ttl);
        let expires_at = Instant::now().checked_add(ttl);
        self.map.insert(key, CacheEntry { value, expires_at });
    }

    fn clear_expired(&mut self) {
        let now = Instant::now();
        self.map.retain(|_, entry| entry.is_live(now));
    }
}

/// Shared TTL cache. Clones share the same underlying map.
///
/// A zero TTL disables the cache: `put` becomes a no-op.
#[derive(Debug)]
pub struct TtlCache<K, V> {
    inner: Arc<RwLock<CacheInner<K, V>>>,
}

impl<K, V> Clone for TtlCache<K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            inner: Arc::new(RwLock::new(CacheInner {
                map: HashMap::new(),
                default_ttl,
            })),
        }
    }

    /// Returns the value for `key` unless it is missing or expired.
    pub async fn get(&self, key: &K) -> Option<V> {
        self.inner.read().await.get(key)
    }

    pub async fn put(&self, key: K, value: V, ttl_override: Option<Duration>) {
        let mut store = self.inner.write().await;
        if store.default_ttl.is_zero() && ttl_override.is_none() {
            return;
        }
        store.put(key, value, ttl_override);
    }

    /// Drops every expired entry; returns how many were removed.
    pub async fn clear_expired(&self) -> usize {
        let mut store = self.inner.write().await;
        let before = store.map.len();
        store.clear_expired();
        before - store.map.len()
    }

    pub async fn clear(&self) {
        self.inner.write().await.map.clear();
    }

    /// Number of stored entries, expired ones included until swept.
    pub async fn len(&self) -> usize {
        self.inner.read().await.map.len()
    }
}

impl<K, V> Default for TtlCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    fn default() -> Self {
        Self::new(DEFAULT_PROFILE_TTL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_then_get_and_overwrite() {
        let cache: TtlCache<String, u32> = TtlCache::new(Duration::from_secs(60));

        assert!(cache.get(&String::from("USA")).await.is_none());

        cache.put(String::from("USA"), 1, None).await;
        assert_eq!(cache.get(&String::from("USA")).await, Some(1));

        cache.put(String::from("USA"), 2, None).await;
        assert_eq!(cache.get(&String::from("USA")).await, Some(2));
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn entries_expire_after_ttl() {
        let cache: TtlCache<&'static str, u32> = TtlCache::new(Duration::from_millis(50));

        cache.put("CHN", 7, None).await;
        assert!(cache.get(&"CHN").await.is_some());

        tokio::time::sleep(Duration::from_millis(80)).await;
        assert!(cache.get(&"CHN").await.is_none());

        assert_eq!(cache.clear_expired().await, 1);
        assert_eq!(cache.len().await, 0);
    }

    #[tokio::test]
    async fn ttl_override_wins_over_default() {
        let cache: TtlCache<&'static str, u32> = TtlCache::new(Duration::from_secs(60));

        cache.put("JPN", 3, Some(Duration::from_millis(30))).await;
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(cache.get(&"JPN").await.is_none());
    }

    #[tokio::test]
    async fn clear_drops_everything_and_is_shared_by_clones() {
        let cache: TtlCache<&'static str, u32> = TtlCache::default();
        let handle = cache.clone();

        cache.put("DEU", 1, None).await;
        cache.put("FRA", 2, None).await;
        assert_eq!(handle.len().await, 2);

        handle.clear().await;
        assert_eq!(cache.len().await, 0);
    }

    #[tokio::test]
    async fn zero_ttl_cache_stores_nothing() {
        let cache: TtlCache<&'static str, u32> = TtlCache::new(Duration::ZERO);

        cache.put("GBR", 1, None).await;
        assert!(cache.get(&"GBR").await.is_none());
        assert_eq!(cache.len().await, 0);
    }

    #[tokio::test]
    async fn unrepresentable_ttl_never_expires() {
        let cache: TtlCache<&'static str, u32> = TtlCache::new(Duration::from_secs(u64::MAX));

        cache.put("CHN", 9, None).await;
        cache.put("IND", 4, Some(Duration::MAX)).await;

        assert_eq!(cache.get(&"CHN").await, Some(9));
        assert_eq!(cache.get(&"IND").await, Some(4));
        assert_eq!(cache.clear_expired().await, 0);
    }
}
