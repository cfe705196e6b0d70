use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;

use super::CacheError;

// ============================================================================
// Cache Backend Trait
// ============================================================================

/// String key/value backend with TTLs and pattern deletion. Implementations
/// must be safe for concurrent use by many in-flight requests.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    async fn set_ex(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), CacheError>;

    async fn del(&self, key: &str) -> Result<(), CacheError>;

    /// Delete every key matching `pattern` (trailing-`*` glob), returning
    /// how many were removed.
    async fn del_by_pattern(&self, pattern: &str) -> Result<u64, CacheError>;

    /// Live connectivity; `false` makes the layer skip the backend entirely.
    fn is_connected(&self) -> bool;
}

// ============================================================================
// In-Process Backend
// ============================================================================
//
// Used by tests and as a zero-dependency local fallback. Expiry is checked
// lazily on read.
//
// ============================================================================

#[derive(Default)]
pub struct MemoryBackend {
    entries: Mutex<HashMap<String, (String, Option<Instant>)>>,
    disconnected: AtomicBool,
    fail_writes: AtomicBool,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate the backend dropping off the network.
    pub fn set_connected(&self, connected: bool) {
        self.disconnected.store(!connected, Ordering::SeqCst);
    }

    /// Make subsequent writes fail while reads keep working.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains_key(&self, key: &str) -> bool {
        let mut entries = self.entries.lock().unwrap();
        match entries.get(key) {
            Some((_, Some(expires))) if *expires <= Instant::now() => {
                entries.remove(key);
                false
            }
            Some(_) => true,
            None => false,
        }
    }

    fn check_connected(&self) -> Result<(), CacheError> {
        if self.disconnected.load(Ordering::SeqCst) {
            Err(CacheError::Backend("backend disconnected".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl CacheBackend for MemoryBackend {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        self.check_connected()?;
        let mut entries = self.entries.lock().unwrap();
        match entries.get(key) {
            Some((_, Some(expires))) if *expires <= Instant::now() => {
                entries.remove(key);
                Ok(None)
            }
            Some((value, _)) => Ok(Some(value.clone())),
            None => Ok(None),
        }
    }

    async fn set_ex(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), CacheError> {
        self.check_connected()?;
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(CacheError::Backend("injected write failure".to_string()));
        }
        let expires = Some(Instant::now() + Duration::from_secs(ttl_secs));
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), (value.to_string(), expires));
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<(), CacheError> {
        self.check_connected()?;
        self.entries.lock().unwrap().remove(key);
        Ok(())
    }

    async fn del_by_pattern(&self, pattern: &str) -> Result<u64, CacheError> {
        self.check_connected()?;
        let prefix = pattern.strip_suffix('*').unwrap_or(pattern);
        let mut entries = self.entries.lock().unwrap();
        let before = entries.len();
        entries.retain(|key, _| !key.starts_with(prefix));
        Ok((before - entries.len()) as u64)
    }

    fn is_connected(&self) -> bool {
        !self.disconnected.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_get_del() {
        let backend = MemoryBackend::new();
        backend.set_ex("k", "v", 60).await.unwrap();
        assert_eq!(backend.get("k").await.unwrap(), Some("v".to_string()));

        backend.del("k").await.unwrap();
        assert_eq!(backend.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_pattern_delete_only_touches_prefix() {
        let backend = MemoryBackend::new();
        backend.set_ex("ns:orders:a", "1", 60).await.unwrap();
        backend.set_ex("ns:orders:b", "2", 60).await.unwrap();
        backend.set_ex("ns:drivers:a", "3", 60).await.unwrap();

        let removed = backend.del_by_pattern("ns:orders:*").await.unwrap();
        assert_eq!(removed, 2);
        assert_eq!(backend.get("ns:orders:a").await.unwrap(), None);
        assert_eq!(
            backend.get("ns:drivers:a").await.unwrap(),
            Some("3".to_string())
        );
    }

    #[tokio::test]
    async fn test_expired_entries_read_as_miss() {
        let backend = MemoryBackend::new();
        backend.set_ex("k", "v", 0).await.unwrap();
        assert_eq!(backend.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_disconnected_backend_errors() {
        let backend = MemoryBackend::new();
        backend.set_connected(false);
        assert!(!backend.is_connected());
        assert!(backend.get("k").await.is_err());
        assert!(backend.set_ex("k", "v", 1).await.is_err());
    }
}
