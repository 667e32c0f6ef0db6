/// Store for grounded summaries, keyed by `cache_key::compute_summary_cache_key`.
///
/// The backing store's TTL mirrors the logical TTL, but expiry is still checked on read
/// against `created_at` so a clock-driven caller (tests, evals) sees the same answer Redis
/// would.
use std::future::Future;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::cache_key::is_cache_expired;
use crate::error::CommonError;
use crate::model::SummaryResult;
use crate::redis::RedisCache;

const KEY_PREFIX: &str = "digest:v1:summary:";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CachedSummary {
    pub model: String,
    pub created_at: DateTime<Utc>,
    pub result: SummaryResult,
}

impl CachedSummary {
    pub fn encode(&self) -> Result<String, CommonError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn is_expired(&self, ttl_secs: u64, now: DateTime<Utc>) -> bool {
        is_cache_expired(self.created_at, i64::try_from(ttl_secs).unwrap_or(i64::MAX), now)
    }
}

/// String key/value store with per-key TTL. Misses and failures both read as `None`/`false`.
pub trait CacheStore {
    fn get(&self, key: &str) -> impl Future<Output = Option<String>> + Send;

    fn set_with_ttl(&self, key: &str, value: &str, ttl_secs: u64) -> impl Future<Output = bool> + Send;

    fn delete(&self, key: &str) -> impl Future<Output = bool> + Send;
}

impl CacheStore for RedisCache {
    fn get(&self, key: &str) -> impl Future<Output = Option<String>> + Send {
        RedisCache::get(self, key)
    }

    fn set_with_ttl(&self, key: &str, value: &str, ttl_secs: u64) -> impl Future<Output = bool> + Send {
        RedisCache::set_with_ttl(self, key, value, ttl_secs)
    }

    fn delete(&self, key: &str) -> impl Future<Output = bool> + Send {
        RedisCache::delete(self, key)
    }
}

#[derive(Clone)]
pub struct SummaryCache<S = RedisCache> {
    store: S,
    ttl_secs: u64,
}

impl<S: CacheStore> SummaryCache<S> {
    pub fn new(store: S, ttl_secs: u64) -> Self {
        Self { store, ttl_secs }
    }

    pub fn redis_key(cache_key: &str) -> String {
        format!("{KEY_PREFIX}{cache_key}")
    }

    /// A fresh entry, or `None` on miss, expiry or an undecodable payload.
    pub async fn get(&self, cache_key: &str, now: DateTime<Utc>) -> Option<CachedSummary> {
        let key = Self::redis_key(cache_key);
        let raw = self.store.get(&key).await?;

        let entry: CachedSummary = serde_json::from_str(&raw)
            .inspect_err(|e| warn!(error = %e, key, "discarding undecodable summary cache entry"))
            .ok()?;

        if entry.is_expired(self.ttl_secs, now) {
            debug!(key, created_at = %entry.created_at, "summary cache entry expired");
            return None;
        }
        Some(entry)
    }

    pub async fn put(&self, cache_key: &str, entry: &CachedSummary) -> bool {
        let key = Self::redis_key(cache_key);
        let Ok(payload) = entry
            .encode()
            .inspect_err(|e| warn!(error = %e, key, "failed to encode summary cache entry"))
        else {
            return false;
        };
        self.store.set_with_ttl(&key, &payload, self.ttl_secs).await
    }

    pub async fn invalidate(&self, cache_key: &str) -> bool {
        self.store.delete(&Self::redis_key(cache_key)).await
    }
}

/// In-process store for tests. TTLs are ignored; logical expiry still applies on read.
#[cfg(test)]
#[derive(Clone, Default)]
pub(crate) struct MemoryStore {
    entries: std::sync::Arc<std::sync::Mutex<std::collections::HashMap<String, String>>>,
}

#[cfg(test)]
impl MemoryStore {
    pub(crate) fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }
}

#[cfg(test)]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().unwrap().get(key).cloned()
    }

    async fn set_with_ttl(&self, key: &str, value: &str, _ttl_secs: u64) -> bool {
        self.entries.lock().unwrap().insert(key.to_string(), value.to_string());
        true
    }

    async fn delete(&self, key: &str) -> bool {
        self.entries.lock().unwrap().remove(key).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Citation;
    use chrono::{Duration, TimeZone};

    fn entry(created_at: DateTime<Utc>) -> CachedSummary {
        CachedSummary {
            model: "gpt-4o-mini".to_string(),
            created_at,
            result: SummaryResult::summary(
                "Acme had a record quarter.",
                vec!["business".to_string()],
                vec![Citation::new("https://e.com/a", "record quarter")],
                None,
            )
            .unwrap(),
        }
    }

    #[test]
    fn test_redis_key_is_namespaced() {
        assert_eq!(SummaryCache::<RedisCache>::redis_key("abc"), "digest:v1:summary:abc");
    }

    #[test]
    fn test_entry_expiry_uses_created_at() {
        let created = Utc.with_ymd_and_hms(2026, 1, 14, 0, 0, 0).unwrap();
        let e = entry(created);
        assert!(!e.is_expired(3600, created + Duration::minutes(59)));
        assert!(e.is_expired(3600, created + Duration::hours(1)));
    }

    #[test]
    fn test_entry_round_trips_through_json() {
        let e = entry(Utc.with_ymd_and_hms(2026, 1, 14, 0, 0, 0).unwrap());
        let json = e.encode().unwrap();
        assert_eq!(serde_json::from_str::<CachedSummary>(&json).unwrap(), e);
    }

    #[tokio::test]
    async fn test_disabled_cache_misses() {
        let cache = SummaryCache::new(RedisCache::disabled(), 60);
        let now = Utc.with_ymd_and_hms(2026, 1, 14, 0, 0, 0).unwrap();
        assert!(!cache.put("k", &entry(now)).await);
        assert_eq!(cache.get("k", now).await, None);
    }

    #[tokio::test]
    async fn test_stored_entry_is_served_until_ttl() {
        let store = MemoryStore::default();
        let cache = SummaryCache::new(store.clone(), 3600);
        let created = Utc.with_ymd_and_hms(2026, 1, 14, 0, 0, 0).unwrap();

        assert!(cache.put("k", &entry(created)).await);
        assert_eq!(store.len(), 1);
        assert_eq!(cache.get("k", created + Duration::minutes(30)).await, Some(entry(created)));
        assert_eq!(cache.get("k", created + Duration::hours(1)).await, None);
        assert_eq!(cache.get("other", created).await, None);
    }

    #[tokio::test]
    async fn test_undecodable_entry_is_a_miss() {
        let store = MemoryStore::default();
        store.set_with_ttl(&SummaryCache::<MemoryStore>::redis_key("k"), "{not json", 60).await;
        let cache = SummaryCache::new(store, 60);
        let now = Utc.with_ymd_and_hms(2026, 1, 14, 0, 0, 0).unwrap();
        assert_eq!(cache.get("k", now).await, None);
    }

    #[tokio::test]
    async fn test_invalidate_removes_entry() {
        let cache = SummaryCache::new(MemoryStore::default(), 60);
        let now = Utc.with_ymd_and_hms(2026, 1, 14, 0, 0, 0).unwrap();
        cache.put("k", &entry(now)).await;
        assert!(cache.invalidate("k").await);
        assert_eq!(cache.get("k", now).await, None);
        assert!(!cache.invalidate("k").await);
    }
}
