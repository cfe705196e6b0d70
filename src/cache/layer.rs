use std::future::Future;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::mpsc;

use super::backend::CacheBackend;
use super::DEFAULT_NAMESPACE;

// ============================================================================
// Cache-Aside Wrapper
// ============================================================================

/// A value read through the layer, flagged with where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheLookup<T> {
    pub data: T,
    pub from_cache: bool,
}

/// A failed background write-back, reported on the error sink.
#[derive(Debug, Clone)]
pub struct CacheWriteError {
    pub key: String,
    pub reason: String,
}

/// Get-or-compute-and-cache wrapper with entity-scoped invalidation.
///
/// The backend is an explicit constructor dependency; `None` means "no
/// cache configured" and every read goes straight to the fetch function.
/// Two concurrent misses on one key will both fetch and both write back;
/// there is no single-flight de-duplication because cached values are
/// always re-derivable from the store.
pub struct CacheAside {
    backend: Option<Arc<dyn CacheBackend>>,
    namespace: String,
    write_errors: Option<mpsc::UnboundedSender<CacheWriteError>>,
}

impl CacheAside {
    pub fn new(backend: Option<Arc<dyn CacheBackend>>) -> Self {
        Self {
            backend,
            namespace: DEFAULT_NAMESPACE.to_string(),
            write_errors: None,
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Route background write-back failures to a channel so tests (and
    /// monitoring) can observe them; they are never surfaced to callers.
    pub fn with_write_error_sink(mut self, sink: mpsc::UnboundedSender<CacheWriteError>) -> Self {
        self.write_errors = Some(sink);
        self
    }

    /// Build a namespaced key: `<ns>:<entity>:<part>:<part>...`, or just
    /// `<ns>:<entity>` when there are no parts, so a trailing colon never
    /// leaks into the keyspace.
    pub fn key(&self, entity: &str, parts: &[&str]) -> String {
        if parts.is_empty() {
            return format!("{}:{}", self.namespace, entity);
        }
        format!("{}:{}:{}", self.namespace, entity, parts.join(":"))
    }

    pub fn is_available(&self) -> bool {
        self.backend
            .as_ref()
            .map(|backend| backend.is_connected())
            .unwrap_or(false)
    }

    fn live_backend(&self) -> Option<&Arc<dyn CacheBackend>> {
        self.backend.as_ref().filter(|backend| backend.is_connected())
    }

    /// Cache-aside read: hit returns the cached value, miss runs `fetch`
    /// and writes the result back without blocking on that write. Fetch
    /// errors propagate verbatim; cache errors only ever degrade to a miss.
    pub async fn get_or_set<T, E, F, Fut>(
        &self,
        key: &str,
        ttl_secs: u64,
        fetch: F,
    ) -> Result<CacheLookup<T>, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(backend) = self.live_backend() {
            match backend.get(key).await {
                Ok(Some(raw)) => match serde_json::from_str::<T>(&raw) {
                    Ok(data) => {
                        tracing::debug!(key = %key, "Cache HIT");
                        return Ok(CacheLookup {
                            data,
                            from_cache: true,
                        });
                    }
                    Err(err) => {
                        // Corrupt entry; fall through to a fresh fetch.
                        tracing::warn!(key = %key, error = %err, "Cache entry undecodable");
                    }
                },
                Ok(None) => {
                    tracing::debug!(key = %key, "Cache MISS");
                }
                Err(err) => {
                    tracing::warn!(key = %key, error = %err, "Cache read failed, falling back");
                }
            }
        }

        let data = fetch().await?;

        if let Some(backend) = self.live_backend() {
            match serde_json::to_string(&data) {
                Ok(raw) => self.spawn_write_back(backend.clone(), key.to_string(), raw, ttl_secs),
                Err(err) => {
                    tracing::warn!(key = %key, error = %err, "Cache value unserializable, not caching")
                }
            }
        }

        Ok(CacheLookup {
            data,
            from_cache: false,
        })
    }

    fn spawn_write_back(
        &self,
        backend: Arc<dyn CacheBackend>,
        key: String,
        raw: String,
        ttl_secs: u64,
    ) {
        let sink = self.write_errors.clone();
        tokio::spawn(async move {
            match backend.set_ex(&key, &raw, ttl_secs).await {
                Ok(()) => {
                    tracing::debug!(key = %key, ttl_secs = ttl_secs, "Cache SET");
                }
                Err(err) => {
                    tracing::warn!(key = %key, error = %err, "Cache write-back failed");
                    if let Some(sink) = sink {
                        let _ = sink.send(CacheWriteError {
                            key,
                            reason: err.to_string(),
                        });
                    }
                }
            }
        });
    }

    /// Delete exactly one key. Errors are logged and swallowed.
    pub async fn del(&self, key: &str) {
        if let Some(backend) = self.live_backend() {
            if let Err(err) = backend.del(key).await {
                tracing::warn!(key = %key, error = %err, "Cache DEL failed");
            } else {
                tracing::debug!(key = %key, "Cache DEL");
            }
        }
    }

    /// Delete every cached view of an entity (`<ns>:<entity>:*`), the only
    /// consistency mechanism between mutations and cached reads. Returns
    /// how many keys were removed (0 when the backend is down).
    pub async fn invalidate_entity(&self, entity: &str) -> u64 {
        let Some(backend) = self.live_backend() else {
            return 0;
        };

        let pattern = format!("{}:{}:*", self.namespace, entity);
        match backend.del_by_pattern(&pattern).await {
            Ok(removed) => {
                tracing::debug!(entity = %entity, removed = removed, "Cache invalidated");
                removed
            }
            Err(err) => {
                tracing::warn!(entity = %entity, error = %err, "Cache invalidation failed");
                0
            }
        }
    }
}
