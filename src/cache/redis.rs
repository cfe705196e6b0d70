use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

use super::{backend::CacheBackend, CacheError};

// ============================================================================
// Redis Backend
// ============================================================================
//
// Shared ConnectionManager, one per process, reconnecting on its own. The
// connectivity flag flips on observed command results so the layer can skip
// a backend that has gone away instead of stacking up timeouts.
//
// ============================================================================

pub struct RedisBackend {
    manager: ConnectionManager,
    connected: Arc<AtomicBool>,
}

impl RedisBackend {
    /// Connect to Redis. Failure here means no backend at all; callers run
    /// uncached in that case rather than aborting startup.
    pub async fn connect(url: &str) -> Result<Self, CacheError> {
        let client = redis::Client::open(url)
            .map_err(|e| CacheError::Backend(format!("invalid redis url: {e}")))?;
        let manager = ConnectionManager::new(client)
            .await
            .map_err(|e| CacheError::Backend(format!("redis connect failed: {e}")))?;

        tracing::info!(url = %url, "Redis cache connected");

        Ok(Self {
            manager,
            connected: Arc::new(AtomicBool::new(true)),
        })
    }

    fn observe<T>(&self, result: Result<T, redis::RedisError>) -> Result<T, CacheError> {
        match result {
            Ok(value) => {
                self.connected.store(true, Ordering::SeqCst);
                Ok(value)
            }
            Err(err) => {
                if err.is_io_error() || err.is_connection_dropped() || err.is_connection_refusal() {
                    self.connected.store(false, Ordering::SeqCst);
                }
                Err(CacheError::Backend(err.to_string()))
            }
        }
    }
}

#[async_trait]
impl CacheBackend for RedisBackend {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.manager.clone();
        self.observe(conn.get(key).await)
    }

    async fn set_ex(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), CacheError> {
        let mut conn = self.manager.clone();
        self.observe(conn.set_ex(key, value, ttl_secs).await)
    }

    async fn del(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self.manager.clone();
        self.observe(conn.del(key).await)
    }

    async fn del_by_pattern(&self, pattern: &str) -> Result<u64, CacheError> {
        // SCAN instead of KEYS so a large keyspace never blocks the server.
        let mut scan_conn = self.manager.clone();
        let mut keys: Vec<String> = Vec::new();
        {
            let mut iter = match scan_conn.scan_match::<_, String>(pattern).await {
                Ok(iter) => {
                    self.connected.store(true, Ordering::SeqCst);
                    iter
                }
                Err(err) => {
                    if err.is_io_error() || err.is_connection_dropped() {
                        self.connected.store(false, Ordering::SeqCst);
                    }
                    return Err(CacheError::Backend(err.to_string()));
                }
            };
            // Scan errors surface on the scan_match call above; the
            // iterator itself just ends when the cursor is exhausted.
            while let Some(key) = iter.next_item().await {
                keys.push(key);
            }
        }

        if keys.is_empty() {
            return Ok(0);
        }

        let mut del_conn = self.manager.clone();
        let removed: u64 = self.observe(del_conn.del(&keys).await)?;
        Ok(removed)
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}
