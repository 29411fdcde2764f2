//! Product list caching.
//!
//! Product list pages are cached as JSON under keys built by
//! [`ProductListQuery::cache_key`]. Any product mutation drops every key under
//! [`PRODUCT_LIST_PREFIX`]; stale reads in between are accepted.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use moka::Expiry;
use moka::future::Cache;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::query::ProductListQuery;

/// Prefix shared by every cached product list page.
pub const PRODUCT_LIST_PREFIX: &str = "products:list:";

/// Key/value cache with per-entry TTL.
#[async_trait]
pub trait CacheProvider: Send + Sync + 'static {
    async fn get(&self, key: &str) -> Option<serde_json::Value>;

    async fn set(&self, key: &str, value: serde_json::Value, ttl: Duration);

    async fn remove(&self, key: &str);

    /// Drop every entry whose key starts with `prefix`.
    async fn remove_by_prefix(&self, prefix: &str);
}

/// Read and decode a cached value. Undecodable entries count as misses.
pub async fn get_json<T: DeserializeOwned>(cache: &dyn CacheProvider, key: &str) -> Option<T> {
    let value = cache.get(key).await?;
    match serde_json::from_value(value) {
        Ok(decoded) => Some(decoded),
        Err(e) => {
            tracing::warn!(key, error = %e, "Discarding undecodable cache entry");
            cache.remove(key).await;
            None
        }
    }
}

/// Encode and store a value. Encoding failures are logged and skipped.
pub async fn set_json<T: Serialize + Sync>(
    cache: &dyn CacheProvider,
    key: &str,
    value: &T,
    ttl: Duration,
) {
    match serde_json::to_value(value) {
        Ok(json) => cache.set(key, json, ttl).await,
        Err(e) => tracing::warn!(key, error = %e, "Failed to encode cache entry"),
    }
}

impl ProductListQuery {
    /// Cache key covering every parameter that changes the result.
    #[must_use]
    pub fn cache_key(&self) -> String {
        let category = self
            .category_id
            .map_or_else(|| "all".to_string(), |id| id.to_string());
        let search = self.search_term().map(str::to_lowercase).unwrap_or_default();
        let active = self
            .is_active
            .map_or_else(|| "all".to_string(), |a| a.to_string());
        format!(
            "{PRODUCT_LIST_PREFIX}page={}:size={}:category={category}:search={search}:active={active}:sort={}:{}",
            self.page.page,
            self.page.page_size,
            self.sort().column(),
            self.page.sort_direction.as_str(),
        )
    }
}

// =============================================================================
// Moka implementation
// =============================================================================

#[derive(Clone)]
struct CachedValue {
    value: Arc<serde_json::Value>,
    ttl: Duration,
}

/// Expire each entry after the TTL it was stored with.
struct PerEntryTtl;

impl Expiry<String, CachedValue> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &CachedValue,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &CachedValue,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// In-process cache backed by `moka`.
#[derive(Clone)]
pub struct MokaCacheProvider {
    cache: Cache<String, CachedValue>,
}

impl MokaCacheProvider {
    /// Create a cache holding at most `max_capacity` entries.
    #[must_use]
    pub fn new(max_capacity: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .expire_after(PerEntryTtl)
            .support_invalidation_closures()
            .build();
        Self { cache }
    }

    /// Number of live entries (approximate until pending tasks run).
    #[must_use]
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }
}

impl std::fmt::Debug for MokaCacheProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MokaCacheProvider")
            .field("entry_count", &self.cache.entry_count())
            .finish()
    }
}

#[async_trait]
impl CacheProvider for MokaCacheProvider {
    async fn get(&self, key: &str) -> Option<serde_json::Value> {
        let hit = self.cache.get(key).await;
        tracing::trace!(key, hit = hit.is_some(), "cache lookup");
        hit.map(|entry| entry.value.as_ref().clone())
    }

    async fn set(&self, key: &str, value: serde_json::Value, ttl: Duration) {
        self.cache
            .insert(
                key.to_string(),
                CachedValue {
                    value: Arc::new(value),
                    ttl,
                },
            )
            .await;
    }

    async fn remove(&self, key: &str) {
        self.cache.invalidate(key).await;
    }

    async fn remove_by_prefix(&self, prefix: &str) {
        let owned = prefix.to_string();
        if let Err(e) = self
            .cache
            .invalidate_entries_if(move |key, _| key.starts_with(&owned))
        {
            tracing::warn!(prefix, error = %e, "Prefix invalidation failed, clearing cache");
            self.cache.invalidate_all();
        }
        self.cache.run_pending_tasks().await;
        tracing::debug!(prefix, "Invalidated cache prefix");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use emporium_core::{CategoryId, PageRequest, SortDirection};
    use serde_json::json;

    use super::*;

    const TTL: Duration = Duration::from_secs(60);

    #[tokio::test]
    async fn test_set_get_remove() {
        let cache = MokaCacheProvider::new(100);
        cache.set("a", json!({"n": 1}), TTL).await;
        assert_eq!(cache.get("a").await, Some(json!({"n": 1})));

        cache.remove("a").await;
        assert_eq!(cache.get("a").await, None);
    }

    #[tokio::test]
    async fn test_remove_by_prefix_keeps_other_keys() {
        let cache = MokaCacheProvider::new(100);
        cache.set("products:list:page=1", json!(1), TTL).await;
        cache.set("products:list:page=2", json!(2), TTL).await;
        cache.set("categories:all", json!(3), TTL).await;

        cache.remove_by_prefix(PRODUCT_LIST_PREFIX).await;

        assert_eq!(cache.get("products:list:page=1").await, None);
        assert_eq!(cache.get("products:list:page=2").await, None);
        assert_eq!(cache.get("categories:all").await, Some(json!(3)));

        cache.set("products:list:page=1", json!(4), TTL).await;
        assert_eq!(cache.get("products:list:page=1").await, Some(json!(4)));
    }

    #[tokio::test]
    async fn test_entries_expire_after_their_ttl() {
        let cache = MokaCacheProvider::new(100);
        cache.set("short", json!(true), Duration::from_millis(20)).await;
        cache.set("long", json!(true), TTL).await;
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(cache.get("short").await, None);
        assert_eq!(cache.get("long").await, Some(json!(true)));
    }

    #[tokio::test]
    async fn test_typed_helpers() {
        let cache = MokaCacheProvider::new(100);
        set_json(&cache, "nums", &vec![1, 2, 3], TTL).await;
        let nums: Option<Vec<i32>> = get_json(&cache, "nums").await;
        assert_eq!(nums, Some(vec![1, 2, 3]));

        let wrong: Option<String> = get_json(&cache, "nums").await;
        assert!(wrong.is_none());
        assert_eq!(cache.get("nums").await, None);
    }

    #[test]
    fn test_cache_key_covers_every_parameter() {
        let base = ProductListQuery::new(PageRequest::new(2, 20));
        let key = base.cache_key();
        assert!(key.starts_with(PRODUCT_LIST_PREFIX));
        assert_eq!(
            key,
            "products:list:page=2:size=20:category=all:search=:active=all:sort=id:asc"
        );

        let filtered = ProductListQuery {
            page: PageRequest::new(2, 20).sorted_by("price", SortDirection::Desc),
            category_id: Some(CategoryId::new(3)),
            search: Some("  Desk ".to_string()),
            is_active: Some(true),
        };
        assert_eq!(
            filtered.cache_key(),
            "products:list:page=2:size=20:category=3:search=desk:active=true:sort=price:desc"
        );
    }
}
