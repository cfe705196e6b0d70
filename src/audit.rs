use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::store::{AuditEntry, AuditStore};

// ============================================================================
// Audit Sink
// ============================================================================
//
// Best-effort audit trail. A failed audit write must never fail or block
// the operation being audited.
//
// ============================================================================

#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(
        &self,
        actor_id: Uuid,
        action: &str,
        entity_type: &str,
        entity_id: Uuid,
        details: serde_json::Value,
    );
}

pub struct StoreAuditSink {
    store: Arc<dyn AuditStore>,
}

impl StoreAuditSink {
    pub fn new(store: Arc<dyn AuditStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl AuditSink for StoreAuditSink {
    async fn record(
        &self,
        actor_id: Uuid,
        action: &str,
        entity_type: &str,
        entity_id: Uuid,
        details: serde_json::Value,
    ) {
        let entry = AuditEntry {
            user_id: actor_id,
            action: action.to_string(),
            entity_type: entity_type.to_string(),
            entity_id,
            changes: details,
            created_at: Utc::now(),
        };

        if let Err(err) = self.store.insert_audit(entry).await {
            tracing::error!(
                action = %action,
                entity_type = %entity_type,
                entity_id = %entity_id,
                error = %err,
                "Failed to write audit record"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::json;

    #[tokio::test]
    async fn test_audit_record_is_persisted() {
        let store = Arc::new(MemoryStore::new());
        let sink = StoreAuditSink::new(store.clone());
        let entity_id = Uuid::new_v4();

        sink.record(
            Uuid::new_v4(),
            "order_created",
            "orders",
            entity_id,
            json!({"order_number": "ORD-2026-000001"}),
        )
        .await;

        let audits = store.audits();
        assert_eq!(audits.len(), 1);
        assert_eq!(audits[0].action, "order_created");
        assert_eq!(audits[0].entity_id, entity_id);
    }

    #[tokio::test]
    async fn test_audit_failure_is_swallowed() {
        let store = Arc::new(MemoryStore::new());
        store.fail_inserts_into("audit_logs");
        let sink = StoreAuditSink::new(store.clone());

        // must not panic or propagate
        sink.record(
            Uuid::new_v4(),
            "order_created",
            "orders",
            Uuid::new_v4(),
            json!({}),
        )
        .await;

        assert_eq!(store.audit_count(), 0);
    }
}
