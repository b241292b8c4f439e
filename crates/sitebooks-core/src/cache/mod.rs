//! Report cache
//!
//! Reports are derived values, so the cache is strictly best-effort: every
//! backend failure is logged and treated as a miss, and a missing
//! configuration yields a disabled client whose operations do nothing.
//!
//! # Architecture
//!
//! - `CacheBackend` trait: raw string get/set/del against a store
//! - `CacheClient` enum: concrete wrapper providing Clone and the typed API
//! - Backend implementations: `RestCache`, `MemoryCache`, `NoopCache`
//!
//! # Configuration
//!
//! Environment variables:
//! - `SITEBOOKS_CACHE_BACKEND`: Backend to use (rest, memory, none). Default: rest
//! - `SITEBOOKS_CACHE_URL`: REST key-value endpoint (required for rest)
//! - `SITEBOOKS_CACHE_TOKEN`: Bearer token for the endpoint (required for rest)

mod memory;
mod rest;

pub use memory::MemoryCache;
pub use rest::RestCache;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, info, warn};

use crate::error::Result;

/// Cache lifetimes in seconds
pub mod ttl {
    pub const INSTANT: u64 = 10;
    pub const SHORT: u64 = 60;
    pub const MEDIUM: u64 = 300;
    pub const LONG: u64 = 3600;
    pub const DAY: u64 = 86400;
}

/// Raw key-value operations a cache store must support
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Fetch a value (None when absent or expired)
    async fn get_raw(&self, key: &str) -> Result<Option<String>>;

    /// Store a value that expires after `ttl_secs`
    async fn set_raw(&self, key: &str, value: &str, ttl_secs: u64) -> Result<()>;

    /// Remove a value (absent keys are fine)
    async fn del(&self, key: &str) -> Result<()>;

    /// Backend name for logs and health output
    fn name(&self) -> &'static str;

    /// Whether this backend actually stores anything
    fn is_configured(&self) -> bool {
        true
    }
}

/// Null-object backend used when no cache is configured
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCache;

#[async_trait]
impl CacheBackend for NoopCache {
    async fn get_raw(&self, _key: &str) -> Result<Option<String>> {
        Ok(None)
    }

    async fn set_raw(&self, _key: &str, _value: &str, _ttl_secs: u64) -> Result<()> {
        Ok(())
    }

    async fn del(&self, _key: &str) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "none"
    }

    fn is_configured(&self) -> bool {
        false
    }
}

/// Concrete cache client
///
/// Cloning is cheap; clones of a memory cache share the same entries.
#[derive(Clone)]
pub enum CacheClient {
    /// Remote REST key-value store
    Rest(RestCache),
    /// In-process store
    Memory(MemoryCache),
    /// Caching turned off
    Disabled(NoopCache),
}

impl CacheClient {
    /// Create a cache client from environment variables
    ///
    /// Falls back to [`CacheClient::Disabled`] when the selected backend is
    /// not configured.
    pub fn from_env() -> Self {
        let backend =
            std::env::var("SITEBOOKS_CACHE_BACKEND").unwrap_or_else(|_| "rest".to_string());

        match backend.trim().to_lowercase().as_str() {
            "rest" => Self::rest_from_env(),
            "memory" => Self::memory(),
            "none" | "off" | "disabled" => Self::disabled(),
            _ => {
                warn!(backend = %backend, "Unknown SITEBOOKS_CACHE_BACKEND, falling back to rest");
                Self::rest_from_env()
            }
        }
    }

    fn rest_from_env() -> Self {
        match RestCache::from_env() {
            Some(cache) => CacheClient::Rest(cache),
            None => {
                info!("Cache endpoint not configured, report caching disabled");
                Self::disabled()
            }
        }
    }

    pub fn rest(url: &str, token: &str) -> Self {
        CacheClient::Rest(RestCache::new(url, token))
    }

    pub fn memory() -> Self {
        CacheClient::Memory(MemoryCache::new())
    }

    pub fn disabled() -> Self {
        CacheClient::Disabled(NoopCache)
    }

    fn backend(&self) -> &dyn CacheBackend {
        match self {
            CacheClient::Rest(b) => b,
            CacheClient::Memory(b) => b,
            CacheClient::Disabled(b) => b,
        }
    }

    pub fn name(&self) -> &'static str {
        self.backend().name()
    }

    pub fn is_configured(&self) -> bool {
        self.backend().is_configured()
    }

    /// Read and decode a cached value
    ///
    /// Returns None on a miss, on a backend failure, or when the stored value
    /// no longer decodes as `T`.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        if !self.is_configured() {
            return None;
        }

        match self.backend().get_raw(key).await {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(value) => {
                    debug!(key, "Cache hit");
                    Some(value)
                }
                Err(e) => {
                    warn!(key, error = %e, "Discarding undecodable cache entry");
                    None
                }
            },
            Ok(None) => {
                debug!(key, "Cache miss");
                None
            }
            Err(e) => {
                warn!(key, backend = self.name(), error = %e, "Cache read failed");
                None
            }
        }
    }

    /// Encode and store a value for `ttl_secs`
    pub async fn set<T: Serialize>(&self, key: &str, value: &T, ttl_secs: u64) {
        if !self.is_configured() {
            return;
        }

        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(key, error = %e, "Failed to encode cache value");
                return;
            }
        };

        if let Err(e) = self.backend().set_raw(key, &raw, ttl_secs).await {
            warn!(key, backend = self.name(), error = %e, "Cache write failed");
        }
    }

    /// Remove a cached value
    pub async fn del(&self, key: &str) {
        if !self.is_configured() {
            return;
        }

        if let Err(e) = self.backend().del(key).await {
            warn!(key, backend = self.name(), error = %e, "Cache delete failed");
        }
    }
}

/// Build a cache key from a prefix and named parameters
///
/// Parameters are sorted by name, so the order they are supplied in never
/// changes the key: `prefix:a:2|b:1`.
pub fn generate_cache_key<K, V>(prefix: &str, params: &[(K, V)]) -> String
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut pairs: Vec<(&str, &str)> = params
        .iter()
        .map(|(k, v)| (k.as_ref(), v.as_ref()))
        .collect();
    pairs.sort();

    let joined = pairs
        .iter()
        .map(|(k, v)| format!("{}:{}", k, v))
        .collect::<Vec<_>>()
        .join("|");

    format!("{}:{}", prefix, joined)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MockCacheServer;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Sample {
        label: String,
        amounts: Vec<f64>,
    }

    fn sample() -> Sample {
        Sample {
            label: "pnl".into(),
            amounts: vec![1000.0, 400.0, 85.71428571428571],
        }
    }

    #[test]
    fn test_cache_key_order_independent() {
        let a = generate_cache_key("x", &[("b", "1"), ("a", "2")]);
        let b = generate_cache_key("x", &[("a", "2"), ("b", "1")]);
        assert_eq!(a, b);
        assert_eq!(a, "x:a:2|b:1");
    }

    #[test]
    fn test_cache_key_distinguishes_values() {
        let a = generate_cache_key("report:profit-loss", &[("startDate", "2024-01-01")]);
        let b = generate_cache_key("report:profit-loss", &[("startDate", "2024-02-01")]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_cache_key_from_owned_pairs() {
        let params: Vec<(&str, String)> = vec![("groupBy", "month".to_string())];
        assert_eq!(generate_cache_key("p", &params), "p:groupBy:month");
    }

    #[tokio::test]
    async fn test_disabled_cache_is_noop() {
        let cache = CacheClient::disabled();
        assert!(!cache.is_configured());
        assert_eq!(cache.name(), "none");

        cache.set("k", &sample(), ttl::SHORT).await;
        let value: Option<Sample> = cache.get("k").await;
        assert!(value.is_none());
        cache.del("k").await;
    }

    #[tokio::test]
    async fn test_memory_round_trip() {
        let cache = CacheClient::memory();
        cache.set("k", &sample(), ttl::MEDIUM).await;

        let value: Option<Sample> = cache.get("k").await;
        assert_eq!(value, Some(sample()));

        cache.del("k").await;
        let value: Option<Sample> = cache.get("k").await;
        assert!(value.is_none());
    }

    #[tokio::test]
    async fn test_memory_clones_share_entries() {
        let cache = CacheClient::memory();
        let other = cache.clone();
        cache.set("shared", &sample(), ttl::SHORT).await;
        assert_eq!(other.get::<Sample>("shared").await, Some(sample()));
    }

    #[tokio::test]
    async fn test_undecodable_entry_is_a_miss() {
        let cache = CacheClient::memory();
        cache.set("k", &"just a string", ttl::SHORT).await;
        let value: Option<Sample> = cache.get("k").await;
        assert!(value.is_none());
    }

    #[tokio::test]
    async fn test_rest_round_trip() {
        let server = MockCacheServer::start().await;
        let cache = CacheClient::rest(&server.url(), MockCacheServer::TOKEN);
        assert_eq!(cache.name(), "rest");

        cache.set("report:x", &sample(), ttl::MEDIUM).await;
        let value: Option<Sample> = cache.get("report:x").await;
        assert_eq!(value, Some(sample()));
        assert_eq!(server.ttl_of("report:x").await, Some(ttl::MEDIUM));

        cache.del("report:x").await;
        let value: Option<Sample> = cache.get("report:x").await;
        assert!(value.is_none());
    }

    #[tokio::test]
    async fn test_rest_bad_token_degrades_to_miss() {
        let server = MockCacheServer::start().await;
        let cache = CacheClient::rest(&server.url(), "wrong-token");

        cache.set("k", &sample(), ttl::SHORT).await;
        let value: Option<Sample> = cache.get("k").await;
        assert!(value.is_none());
        assert_eq!(server.len().await, 0);
    }

    #[tokio::test]
    async fn test_rest_unreachable_degrades_to_miss() {
        // Bind then release a port so nothing is listening on it
        let addr = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap();
        let cache = CacheClient::rest(&format!("http://{}", addr), MockCacheServer::TOKEN);

        cache.set("k", &sample(), ttl::SHORT).await;
        let value: Option<Sample> = cache.get("k").await;
        assert!(value.is_none());
    }
}
