/// Redis wrapper with graceful degradation.
///
/// Every operation returns `Option<T>` or `bool`. On any Redis error the operation logs a
/// warning and reports a miss, so callers simply recompute. Nothing in the digest depends on
/// Redis being up.
use redis::AsyncCommands;
use redis::aio::MultiplexedConnection;
use tracing::warn;

use crate::error::CommonError;

#[derive(Clone)]
pub struct RedisCache {
    client: Option<redis::Client>,
}

impl RedisCache {
    /// A `None` URL, or one the client rejects, yields a cache that always misses.
    pub fn new(url: Option<&str>) -> Self {
        let client = url.and_then(|u| {
            redis::Client::open(u)
                .inspect_err(|e| warn!(error = %e, url = u, "failed to create redis client, cache disabled"))
                .ok()
        });
        Self { client }
    }

    pub fn disabled() -> Self {
        Self { client: None }
    }

    pub fn is_configured(&self) -> bool {
        self.client.is_some()
    }

    /// PING the server, surfacing the failure for startup diagnostics.
    pub async fn ping(&self) -> Result<(), CommonError> {
        let client = self.client.as_ref().ok_or(CommonError::RedisUnavailable)?;
        let mut conn = client.get_multiplexed_async_connection().await?;
        let _pong: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }

    pub async fn is_available(&self) -> bool {
        self.ping().await.is_ok()
    }

    async fn connection(&self) -> Option<MultiplexedConnection> {
        let client = self.client.as_ref()?;
        client
            .get_multiplexed_async_connection()
            .await
            .inspect_err(|e| warn!(error = %e, "redis connection failed"))
            .ok()
    }

    pub async fn get(&self, key: &str) -> Option<String> {
        let mut conn = self.connection().await?;
        let value: Option<String> = conn
            .get(key)
            .await
            .inspect_err(|e| warn!(error = %e, key, "redis GET failed"))
            .ok()?;
        value
    }

    /// SETEX. Returns `true` if the value was stored.
    pub async fn set_with_ttl(&self, key: &str, value: &str, ttl_secs: u64) -> bool {
        let Some(mut conn) = self.connection().await else {
            return false;
        };
        conn.set_ex::<_, _, ()>(key, value, ttl_secs)
            .await
            .inspect_err(|e| warn!(error = %e, key, "redis SETEX failed"))
            .is_ok()
    }

    pub async fn delete(&self, key: &str) -> bool {
        let Some(mut conn) = self.connection().await else {
            return false;
        };
        conn.del::<_, ()>(key)
            .await
            .inspect_err(|e| warn!(error = %e, key, "redis DEL failed"))
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unconfigured_cache_degrades() {
        let cache = RedisCache::new(None);
        assert!(!cache.is_configured());
        assert!(!cache.is_available().await);
        assert!(matches!(cache.ping().await, Err(CommonError::RedisUnavailable)));
        assert_eq!(cache.get("k").await, None);
        assert!(!cache.set_with_ttl("k", "v", 60).await);
        assert!(!cache.delete("k").await);
    }

    #[tokio::test]
    async fn test_invalid_url_disables_cache() {
        let cache = RedisCache::new(Some("not-a-redis-url"));
        assert!(!cache.is_configured());
        assert_eq!(cache.get("k").await, None);
    }
}
