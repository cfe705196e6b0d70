use std::sync::Arc;

use serde_json::json;
use uuid::Uuid;

use crate::audit::AuditSink;
use crate::cache::{entity, ttl, CacheAside, CacheLookup};
use crate::domain::order::models::{
    CustomerClass, NewDrop, NewOrder, NewOrderItem, OrderDraft, OrderRecord, PersistedOrder,
    MAX_RETAIL_DROPS,
};
use crate::domain::order::OrderError;
use crate::domain::pricing::PricingEngine;
use crate::store::OrderStore;
use crate::utils::line_total;

pub mod sequence;

pub use sequence::{fallback_order_number, PostgresSequence, SequenceGenerator};

// ============================================================================
// Order Creation Orchestrator
// ============================================================================
//
// create_order pipeline:
//   validate shape -> price -> order number -> insert order/items/drops
//   -> best-effort audit -> invalidate order & dashboard caches
//
// The three inserts are separate statements, not a transaction. If a later
// insert fails, previously inserted rows are removed by explicit
// compensating deletes before the failure propagates.
//
// ============================================================================

pub struct OrderService {
    store: Arc<dyn OrderStore>,
    pricing: PricingEngine,
    sequence: Arc<dyn SequenceGenerator>,
    audit: Arc<dyn AuditSink>,
    cache: Arc<CacheAside>,
}

impl OrderService {
    pub fn new(
        store: Arc<dyn OrderStore>,
        pricing: PricingEngine,
        sequence: Arc<dyn SequenceGenerator>,
        audit: Arc<dyn AuditSink>,
        cache: Arc<CacheAside>,
    ) -> Self {
        Self {
            store,
            pricing,
            sequence,
            audit,
            cache,
        }
    }

    /// Create an order from a customer draft, returning the joined order
    /// with items and drops.
    pub async fn create_order(
        &self,
        draft: OrderDraft,
        customer_id: Uuid,
    ) -> Result<PersistedOrder, OrderError> {
        if draft.customer_class() == CustomerClass::Retail
            && draft.drops.len() > MAX_RETAIL_DROPS
        {
            return Err(OrderError::DropLimitExceeded(draft.drops.len()));
        }
        if draft.drops.is_empty() {
            return Err(OrderError::NoDrops);
        }

        // Pricing failures (missing card, unreachable drop) abort before
        // anything is written.
        let quote = self.pricing.compute_price(&draft).await?;

        let order_number = match self.sequence.next().await {
            Ok(number) => number,
            Err(err) => {
                let fallback = fallback_order_number(chrono::Utc::now());
                tracing::warn!(
                    error = %err,
                    order_number = %fallback,
                    "Order number sequence unavailable, using timestamp-derived fallback \
                     (small collision risk accepted)"
                );
                fallback
            }
        };

        let order = self
            .store
            .insert_order(NewOrder {
                order_number,
                customer_id,
                company_id: draft.company_id,
                vehicle_type: draft.vehicle_type,
                pricing_mode: draft.pricing_mode,
                pickup_address: draft.pickup.clone(),
                total_distance_km: quote.total_distance_km,
                base_price: quote.base_price,
                total_price: quote.total_price,
                price_card_id: quote.price_card_id,
                payment_method: draft.payment_method.clone(),
                scheduled_pickup_time: draft.scheduled_pickup_time,
            })
            .await?;

        if let Err(err) = self.insert_children(&order, &draft).await {
            self.compensate(order.id).await;
            return Err(err);
        }

        self.audit
            .record(
                customer_id,
                "order_created",
                "orders",
                order.id,
                json!({
                    "order_number": order.order_number,
                    "total_price": order.total_price,
                }),
            )
            .await;

        tracing::info!(
            order_id = %order.id,
            order_number = %order.order_number,
            customer_id = %customer_id,
            total_price = %order.total_price,
            "Order created"
        );

        self.cache.invalidate_entity(entity::ORDERS).await;
        self.cache.invalidate_entity(entity::DASHBOARD).await;

        self.store
            .get_with_relations(order.id)
            .await
            .map_err(OrderError::from)
    }

    /// Order detail read through the cache-aside layer.
    pub async fn get_order(&self, order_id: Uuid) -> Result<CacheLookup<PersistedOrder>, OrderError> {
        let key = self
            .cache
            .key(entity::ORDERS, &["detail", &order_id.to_string()]);
        self.cache
            .get_or_set(&key, ttl::ORDER_DETAIL, || async {
                self.store
                    .get_with_relations(order_id)
                    .await
                    .map_err(OrderError::from)
            })
            .await
    }

    /// Admin order list read through the cache-aside layer.
    pub async fn list_orders(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<CacheLookup<Vec<OrderRecord>>, OrderError> {
        let key = self.cache.key(
            entity::ORDERS,
            &["admin", "all", &limit.to_string(), &offset.to_string()],
        );
        self.cache
            .get_or_set(&key, ttl::ORDERS_LIST, || async {
                self.store
                    .list_recent(limit, offset)
                    .await
                    .map_err(OrderError::from)
            })
            .await
    }

    async fn insert_children(
        &self,
        order: &OrderRecord,
        draft: &OrderDraft,
    ) -> Result<(), OrderError> {
        if !draft.items.is_empty() {
            let items = draft
                .items
                .iter()
                .map(|item| NewOrderItem {
                    order_id: order.id,
                    description: item.description.clone(),
                    quantity: item.quantity,
                    unit_price: item.unit_price,
                    total_price: line_total(item.quantity, item.unit_price),
                })
                .collect();
            self.store.insert_items(items).await?;
        }

        let drops = draft
            .drops
            .iter()
            .enumerate()
            .map(|(index, drop)| NewDrop {
                order_id: order.id,
                drop_sequence: index as i32 + 1,
                recipient_name: drop.recipient_name.clone(),
                recipient_phone: drop.recipient_phone.clone(),
                address: drop.address.clone(),
                delivery_instructions: drop.delivery_instructions.clone(),
            })
            .collect();
        self.store.insert_drops(drops).await?;

        Ok(())
    }

    /// Undo a partially created order. Best effort: each delete failure is
    /// logged, and the original insert error still propagates to the caller.
    async fn compensate(&self, order_id: Uuid) {
        tracing::warn!(order_id = %order_id, "Compensating partially created order");

        if let Err(err) = self.store.delete_drops(order_id).await {
            tracing::error!(order_id = %order_id, error = %err, "Compensation: drop delete failed");
        }
        if let Err(err) = self.store.delete_items(order_id).await {
            tracing::error!(order_id = %order_id, error = %err, "Compensation: item delete failed");
        }
        if let Err(err) = self.store.delete_order(order_id).await {
            tracing::error!(order_id = %order_id, error = %err, "Compensation: order delete failed");
        }
    }
}
