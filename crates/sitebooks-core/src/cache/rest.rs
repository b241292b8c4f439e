//! REST key-value cache backend
//!
//! Speaks the command-array protocol used by hosted Redis REST gateways:
//! each call POSTs a JSON array such as `["SET", key, value, "EX", ttl]` to
//! the endpoint with a bearer token and gets back `{"result": ...}` or
//! `{"error": "..."}`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use super::CacheBackend;
use crate::error::{Error, Result};

/// Request timeout for cache calls
const CACHE_TIMEOUT: Duration = Duration::from_secs(5);

/// REST cache backend
#[derive(Clone)]
pub struct RestCache {
    http_client: Client,
    base_url: String,
    token: String,
}

impl RestCache {
    pub fn new(base_url: &str, token: &str) -> Self {
        let http_client = Client::builder()
            .timeout(CACHE_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        }
    }

    /// Create from environment variables
    ///
    /// Returns None unless both `SITEBOOKS_CACHE_URL` and
    /// `SITEBOOKS_CACHE_TOKEN` are set and non-empty.
    pub fn from_env() -> Option<Self> {
        let url = std::env::var("SITEBOOKS_CACHE_URL")
            .ok()
            .filter(|v| !v.trim().is_empty())?;
        let token = std::env::var("SITEBOOKS_CACHE_TOKEN")
            .ok()
            .filter(|v| !v.trim().is_empty())?;
        Some(Self::new(url.trim(), token.trim()))
    }

    pub fn url(&self) -> &str {
        &self.base_url
    }

    async fn command(&self, command: Value) -> Result<Value> {
        let response = self
            .http_client
            .post(&self.base_url)
            .bearer_auth(&self.token)
            .json(&command)
            .send()
            .await?
            .error_for_status()?;

        let reply: CommandReply = response.json().await?;
        match reply.error {
            Some(error) => Err(Error::Cache(error)),
            None => Ok(reply.result),
        }
    }
}

/// Response from the REST endpoint
#[derive(Debug, Deserialize)]
struct CommandReply {
    #[serde(default)]
    result: Value,
    #[serde(default)]
    error: Option<String>,
}

#[async_trait]
impl CacheBackend for RestCache {
    async fn get_raw(&self, key: &str) -> Result<Option<String>> {
        match self.command(json!(["GET", key])).await? {
            Value::Null => Ok(None),
            Value::String(s) => Ok(Some(s)),
            other => Err(Error::Cache(format!("Unexpected GET result: {}", other))),
        }
    }

    async fn set_raw(&self, key: &str, value: &str, ttl_secs: u64) -> Result<()> {
        self.command(json!(["SET", key, value, "EX", ttl_secs])).await?;
        debug!(key, ttl_secs, "Stored cache entry");
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<()> {
        self.command(json!(["DEL", key])).await?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "rest"
    }
}
