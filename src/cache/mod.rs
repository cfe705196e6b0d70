// ============================================================================
// Cache-Aside Layer
// ============================================================================
//
// Read endpoints wrap their store queries in `CacheAside::get_or_set`;
// every mutation invalidates whole entity namespaces. Keys are namespaced
// `<prefix>:<entity>:<...parts>` so one wildcard delete removes every
// cached view of an entity regardless of filters or pagination.
//
// The cache is never a source of truth: with the backend absent or down
// the layer stays fully functional, just uncached.
//
// ============================================================================

pub mod backend;
pub mod layer;
pub mod redis;

pub use backend::{CacheBackend, MemoryBackend};
pub use layer::{CacheAside, CacheLookup, CacheWriteError};
pub use redis::RedisBackend;

pub const DEFAULT_NAMESPACE: &str = "logistics";

/// Entity namespaces used in cache keys and entity-scoped invalidation.
pub mod entity {
    pub const DASHBOARD: &str = "dashboard";
    pub const ORDERS: &str = "orders";
    pub const DRIVERS: &str = "drivers";
    pub const CUSTOMERS: &str = "customers";
    pub const USER: &str = "user";
    pub const WALLET: &str = "wallet";
}

/// TTLs per read-endpoint category, in seconds. Configuration data, but the
/// values are part of the observable contract.
pub mod ttl {
    /// Dashboard refreshes often.
    pub const DASHBOARD_STATS: u64 = 30;
    /// Orders change frequently.
    pub const ORDERS_LIST: u64 = 15;
    /// Drivers change less often.
    pub const DRIVERS_LIST: u64 = 60;
    /// Customers change rarely.
    pub const CUSTOMERS_LIST: u64 = 120;
    /// Profile changes rarely.
    pub const USER_PROFILE: u64 = 300;
    /// Order details need to be current.
    pub const ORDER_DETAIL: u64 = 30;
    /// Wallet balance.
    pub const WALLET: u64 = 60;
}

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("cache backend error: {0}")]
    Backend(String),
}
