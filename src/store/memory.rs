use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::domain::order::models::{
    DropRecord, DropStatus, NewDrop, NewOrder, NewOrderItem, OrderItemRecord, OrderRecord,
    OrderStatus, PaymentStatus, PersistedOrder, PricingMode, VehicleType,
};
use crate::domain::pricing::PriceCard;

use super::{AuditEntry, AuditStore, OrderStore, PriceCardStore, StoreError};

// ============================================================================
// In-Memory Store
// ============================================================================
//
// Backs unit tests and local development. Mirrors the Postgres store's
// observable behavior, and can inject per-table insert failures to
// exercise the compensation path in order creation.
//
// ============================================================================

#[derive(Default)]
struct Inner {
    orders: Vec<OrderRecord>,
    items: Vec<OrderItemRecord>,
    drops: Vec<DropRecord>,
    cards: Vec<PriceCard>,
    audits: Vec<AuditEntry>,
    failing_tables: HashSet<String>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_card(&self, card: PriceCard) {
        self.inner.lock().unwrap().cards.push(card);
    }

    /// Make every insert into `table` fail until cleared.
    pub fn fail_inserts_into(&self, table: &str) {
        self.inner
            .lock()
            .unwrap()
            .failing_tables
            .insert(table.to_string());
    }

    pub fn clear_failures(&self) {
        self.inner.lock().unwrap().failing_tables.clear();
    }

    pub fn order_count(&self) -> usize {
        self.inner.lock().unwrap().orders.len()
    }

    pub fn item_count(&self) -> usize {
        self.inner.lock().unwrap().items.len()
    }

    pub fn drop_count(&self) -> usize {
        self.inner.lock().unwrap().drops.len()
    }

    pub fn audit_count(&self) -> usize {
        self.inner.lock().unwrap().audits.len()
    }

    pub fn audits(&self) -> Vec<AuditEntry> {
        self.inner.lock().unwrap().audits.clone()
    }

    fn check_insert(inner: &Inner, table: &str) -> Result<(), StoreError> {
        if inner.failing_tables.contains(table) {
            Err(StoreError::Query(format!(
                "injected insert failure for table {table}"
            )))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn insert_order(&self, order: NewOrder) -> Result<OrderRecord, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        Self::check_insert(&inner, "orders")?;

        let now = Utc::now();
        let record = OrderRecord {
            id: Uuid::new_v4(),
            order_number: order.order_number,
            customer_id: order.customer_id,
            company_id: order.company_id,
            vehicle_type: order.vehicle_type,
            pricing_mode: order.pricing_mode,
            pickup_address: order.pickup_address,
            total_distance_km: order.total_distance_km,
            base_price: order.base_price,
            total_price: order.total_price,
            price_card_id: order.price_card_id,
            status: OrderStatus::Pending,
            payment_status: PaymentStatus::Pending,
            payment_method: order.payment_method,
            scheduled_pickup_time: order.scheduled_pickup_time,
            created_at: now,
            updated_at: now,
        };
        inner.orders.push(record.clone());
        Ok(record)
    }

    async fn insert_items(
        &self,
        items: Vec<NewOrderItem>,
    ) -> Result<Vec<OrderItemRecord>, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        Self::check_insert(&inner, "order_items")?;

        let records: Vec<OrderItemRecord> = items
            .into_iter()
            .map(|item| OrderItemRecord {
                id: Uuid::new_v4(),
                order_id: item.order_id,
                description: item.description,
                quantity: item.quantity,
                unit_price: item.unit_price,
                total_price: item.total_price,
            })
            .collect();
        inner.items.extend(records.clone());
        Ok(records)
    }

    async fn insert_drops(&self, drops: Vec<NewDrop>) -> Result<Vec<DropRecord>, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        Self::check_insert(&inner, "drops")?;

        let records: Vec<DropRecord> = drops
            .into_iter()
            .map(|drop| DropRecord {
                id: Uuid::new_v4(),
                order_id: drop.order_id,
                drop_sequence: drop.drop_sequence,
                recipient_name: drop.recipient_name,
                recipient_phone: drop.recipient_phone,
                address: drop.address,
                delivery_instructions: drop.delivery_instructions,
                status: DropStatus::Pending,
            })
            .collect();
        inner.drops.extend(records.clone());
        Ok(records)
    }

    async fn delete_items(&self, order_id: Uuid) -> Result<u64, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let before = inner.items.len();
        inner.items.retain(|item| item.order_id != order_id);
        Ok((before - inner.items.len()) as u64)
    }

    async fn delete_drops(&self, order_id: Uuid) -> Result<u64, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let before = inner.drops.len();
        inner.drops.retain(|drop| drop.order_id != order_id);
        Ok((before - inner.drops.len()) as u64)
    }

    async fn delete_order(&self, order_id: Uuid) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.orders.retain(|order| order.id != order_id);
        Ok(())
    }

    async fn get_with_relations(&self, order_id: Uuid) -> Result<PersistedOrder, StoreError> {
        let inner = self.inner.lock().unwrap();
        let order = inner
            .orders
            .iter()
            .find(|order| order.id == order_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("order {order_id}")))?;

        let items = inner
            .items
            .iter()
            .filter(|item| item.order_id == order_id)
            .cloned()
            .collect();

        let mut drops: Vec<DropRecord> = inner
            .drops
            .iter()
            .filter(|drop| drop.order_id == order_id)
            .cloned()
            .collect();
        drops.sort_by_key(|drop| drop.drop_sequence);

        Ok(PersistedOrder {
            order,
            items,
            drops,
        })
    }

    async fn list_recent(&self, limit: i64, offset: i64) -> Result<Vec<OrderRecord>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let mut orders = inner.orders.clone();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }
}

#[async_trait]
impl PriceCardStore for MemoryStore {
    async fn find_active_card(
        &self,
        company_id: Option<Uuid>,
        vehicle_type: VehicleType,
        pricing_mode: PricingMode,
    ) -> Result<Option<PriceCard>, StoreError> {
        let now = Utc::now();
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .cards
            .iter()
            .filter(|card| {
                card.company_id == company_id
                    && card.vehicle_type == vehicle_type
                    && card.pricing_mode == pricing_mode
                    && card.is_applicable_at(now)
            })
            .max_by_key(|card| card.valid_from)
            .cloned())
    }
}

#[async_trait]
impl AuditStore for MemoryStore {
    async fn insert_audit(&self, entry: AuditEntry) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        Self::check_insert(&inner, "audit_logs")?;
        inner.audits.push(entry);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::LatLng;
    use crate::domain::order::models::Address;
    use rust_decimal_macros::dec;

    fn new_order(number: &str) -> NewOrder {
        NewOrder {
            order_number: number.to_string(),
            customer_id: Uuid::new_v4(),
            company_id: None,
            vehicle_type: VehicleType::Small,
            pricing_mode: PricingMode::DistanceBased,
            pickup_address: Address {
                line: "1 Depot Rd".to_string(),
                location: LatLng { lat: 13.75, lng: 100.5 },
            },
            total_distance_km: Some(2.0),
            base_price: dec!(300),
            total_price: dec!(400),
            price_card_id: Uuid::new_v4(),
            payment_method: None,
            scheduled_pickup_time: None,
        }
    }

    #[tokio::test]
    async fn test_insert_and_join_round_trip() {
        let store = MemoryStore::new();
        let order = store.insert_order(new_order("ORD-1")).await.unwrap();

        store
            .insert_drops(vec![
                NewDrop {
                    order_id: order.id,
                    drop_sequence: 2,
                    recipient_name: "B".to_string(),
                    recipient_phone: "2".to_string(),
                    address: order.pickup_address.clone(),
                    delivery_instructions: None,
                },
                NewDrop {
                    order_id: order.id,
                    drop_sequence: 1,
                    recipient_name: "A".to_string(),
                    recipient_phone: "1".to_string(),
                    address: order.pickup_address.clone(),
                    delivery_instructions: None,
                },
            ])
            .await
            .unwrap();

        let joined = store.get_with_relations(order.id).await.unwrap();
        assert_eq!(joined.order.order_number, "ORD-1");
        assert_eq!(joined.order.status, OrderStatus::Pending);
        // drops come back in sequence order regardless of insert order
        assert_eq!(joined.drops[0].drop_sequence, 1);
        assert_eq!(joined.drops[1].drop_sequence, 2);
    }

    #[tokio::test]
    async fn test_injected_failure_and_compensation_deletes() {
        let store = MemoryStore::new();
        store.fail_inserts_into("drops");

        let order = store.insert_order(new_order("ORD-2")).await.unwrap();
        let result = store
            .insert_drops(vec![NewDrop {
                order_id: order.id,
                drop_sequence: 1,
                recipient_name: "A".to_string(),
                recipient_phone: "1".to_string(),
                address: order.pickup_address.clone(),
                delivery_instructions: None,
            }])
            .await;
        assert!(matches!(result, Err(StoreError::Query(_))));

        store.delete_order(order.id).await.unwrap();
        assert_eq!(store.order_count(), 0);
    }

    #[tokio::test]
    async fn test_get_missing_order_is_not_found() {
        let store = MemoryStore::new();
        let result = store.get_with_relations(Uuid::new_v4()).await;
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }
}
