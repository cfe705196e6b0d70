use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::order::models::{
    DropRecord, NewDrop, NewOrder, NewOrderItem, OrderItemRecord, OrderRecord, PersistedOrder,
    PricingMode, VehicleType,
};
use crate::domain::pricing::PriceCard;

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

// ============================================================================
// Persistent Store Collaborators
// ============================================================================
//
// Typed insert/update/select surfaces over the relational store. This core
// never issues multi-table transactions: order creation performs three
// separate inserts and compensates explicitly when a later one fails.
//
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("query failed: {0}")]
    Query(String),

    #[error("record not found: {0}")]
    NotFound(String),
}

/// Audit trail row; writes are best-effort only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub user_id: Uuid,
    pub action: String,
    pub entity_type: String,
    pub entity_id: Uuid,
    pub changes: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn insert_order(&self, order: NewOrder) -> Result<OrderRecord, StoreError>;

    async fn insert_items(
        &self,
        items: Vec<NewOrderItem>,
    ) -> Result<Vec<OrderItemRecord>, StoreError>;

    async fn insert_drops(&self, drops: Vec<NewDrop>) -> Result<Vec<DropRecord>, StoreError>;

    /// Compensation deletes, used when a later insert in the creation
    /// sequence fails.
    async fn delete_items(&self, order_id: Uuid) -> Result<u64, StoreError>;
    async fn delete_drops(&self, order_id: Uuid) -> Result<u64, StoreError>;
    async fn delete_order(&self, order_id: Uuid) -> Result<(), StoreError>;

    /// The joined order with items and drops (drops in sequence order).
    async fn get_with_relations(&self, order_id: Uuid) -> Result<PersistedOrder, StoreError>;

    async fn list_recent(&self, limit: i64, offset: i64) -> Result<Vec<OrderRecord>, StoreError>;
}

#[async_trait]
pub trait PriceCardStore: Send + Sync {
    /// The applicable card for the given scope: active, valid_from <= now,
    /// latest valid_from first. `company_id: None` selects the default
    /// (company-independent) card; precedence between the two scopes lives
    /// in the resolver, not here.
    async fn find_active_card(
        &self,
        company_id: Option<Uuid>,
        vehicle_type: VehicleType,
        pricing_mode: PricingMode,
    ) -> Result<Option<PriceCard>, StoreError>;
}

#[async_trait]
pub trait AuditStore: Send + Sync {
    async fn insert_audit(&self, entry: AuditEntry) -> Result<(), StoreError>;
}
