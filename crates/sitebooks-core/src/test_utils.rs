//! Test utilities for sitebooks-core
//!
//! This module provides a mock REST cache server speaking the same command
//! protocol as [`crate::RestCache`], for unit and integration tests.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{Json, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::post,
    Router,
};
use serde_json::{json, Value};
use tokio::sync::{oneshot, RwLock};

/// Stored value and the TTL it was written with
type Store = Arc<RwLock<HashMap<String, (String, u64)>>>;

/// Mock REST cache server
///
/// Keeps entries in memory and never expires them; the TTL of each write is
/// recorded so tests can assert on it.
pub struct MockCacheServer {
    addr: SocketAddr,
    store: Store,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockCacheServer {
    /// Bearer token the server accepts
    pub const TOKEN: &'static str = "test-cache-token";

    /// Start the mock server on an available port
    pub async fn start() -> Self {
        let store: Store = Arc::new(RwLock::new(HashMap::new()));
        let app = Router::new()
            .route("/", post(handle_command))
            .with_state(store.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .unwrap();
        });

        Self {
            addr,
            store,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Get the base URL for this mock server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Number of stored keys
    pub async fn len(&self) -> usize {
        self.store.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Stored keys, sorted
    pub async fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.store.read().await.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// TTL the key was last written with
    pub async fn ttl_of(&self, key: &str) -> Option<u64> {
        self.store.read().await.get(key).map(|(_, ttl)| *ttl)
    }

    /// Stop the mock server
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockCacheServer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Command endpoint: `["GET", k]`, `["SET", k, v, "EX", ttl]`, `["DEL", k]`
async fn handle_command(
    State(store): State<Store>,
    headers: HeaderMap,
    Json(command): Json<Vec<Value>>,
) -> impl IntoResponse {
    let expected = format!("Bearer {}", MockCacheServer::TOKEN);
    let authorized = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(|v| v == expected)
        .unwrap_or(false);
    if !authorized {
        return (StatusCode::UNAUTHORIZED, Json(json!({"error": "Unauthorized"})));
    }

    let args: Vec<String> = command
        .iter()
        .map(|v| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .collect();

    let reply = match args.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
        ["GET", key] => {
            let store = store.read().await;
            json!({"result": store.get(*key).map(|(value, _)| value.clone())})
        }
        ["SET", key, value, "EX", ttl] => match ttl.parse::<u64>() {
            Ok(ttl) => {
                store
                    .write()
                    .await
                    .insert(key.to_string(), (value.to_string(), ttl));
                json!({"result": "OK"})
            }
            Err(_) => json!({"error": "ERR value is not an integer or out of range"}),
        },
        ["DEL", key] => {
            let removed = store.write().await.remove(*key).is_some();
            json!({"result": if removed { 1 } else { 0 }})
        }
        _ => json!({"error": format!("ERR unsupported command {:?}", args)}),
    };

    (StatusCode::OK, Json(reply))
}
