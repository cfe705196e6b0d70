use std::str::FromStr;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::{PgPool, PgRow};
use sqlx::types::Json;
use sqlx::Row;
use uuid::Uuid;

use crate::domain::order::models::{
    Address, DropRecord, DropStatus, NewDrop, NewOrder, NewOrderItem, OrderItemRecord,
    OrderRecord, OrderStatus, PaymentStatus, PersistedOrder, PricingMode, VehicleType,
};
use crate::domain::pricing::PriceCard;

use super::{AuditEntry, AuditStore, OrderStore, PriceCardStore, StoreError};

// ============================================================================
// Postgres Store
// ============================================================================
//
// Plain per-statement SQL over a shared PgPool. No multi-statement
// transactions here: the order orchestrator compensates explicitly instead.
// Enums travel as text, addresses as jsonb.
//
// ============================================================================

pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StoreError::NotFound(err.to_string()),
            sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
                StoreError::Unavailable(err.to_string())
            }
            other => StoreError::Query(other.to_string()),
        }
    }
}

fn parse_enum<T>(value: &str) -> Result<T, StoreError>
where
    T: FromStr<Err = String>,
{
    value.parse().map_err(StoreError::Query)
}

fn map_order(row: &PgRow) -> Result<OrderRecord, StoreError> {
    Ok(OrderRecord {
        id: row.try_get("id")?,
        order_number: row.try_get("order_number")?,
        customer_id: row.try_get("customer_id")?,
        company_id: row.try_get("company_id")?,
        vehicle_type: parse_enum(row.try_get::<&str, _>("vehicle_type")?)?,
        pricing_mode: parse_enum(row.try_get::<&str, _>("pricing_mode")?)?,
        pickup_address: row.try_get::<Json<Address>, _>("pickup_address")?.0,
        total_distance_km: row.try_get("total_distance_km")?,
        base_price: row.try_get("base_price")?,
        total_price: row.try_get("total_price")?,
        price_card_id: row.try_get("price_card_id")?,
        status: parse_enum(row.try_get::<&str, _>("status")?)?,
        payment_status: parse_enum(row.try_get::<&str, _>("payment_status")?)?,
        payment_method: row.try_get("payment_method")?,
        scheduled_pickup_time: row.try_get("scheduled_pickup_time")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn map_item(row: &PgRow) -> Result<OrderItemRecord, StoreError> {
    Ok(OrderItemRecord {
        id: row.try_get("id")?,
        order_id: row.try_get("order_id")?,
        description: row.try_get("description")?,
        quantity: row.try_get("quantity")?,
        unit_price: row.try_get("unit_price")?,
        total_price: row.try_get("total_price")?,
    })
}

fn map_drop(row: &PgRow) -> Result<DropRecord, StoreError> {
    Ok(DropRecord {
        id: row.try_get("id")?,
        order_id: row.try_get("order_id")?,
        drop_sequence: row.try_get("drop_sequence")?,
        recipient_name: row.try_get("recipient_name")?,
        recipient_phone: row.try_get("recipient_phone")?,
        address: row.try_get::<Json<Address>, _>("address")?.0,
        delivery_instructions: row.try_get("delivery_instructions")?,
        status: parse_enum(row.try_get::<&str, _>("status")?)?,
    })
}

fn map_card(row: &PgRow) -> Result<PriceCard, StoreError> {
    Ok(PriceCard {
        id: row.try_get("id")?,
        company_id: row.try_get("company_id")?,
        vehicle_type: parse_enum(row.try_get::<&str, _>("vehicle_type")?)?,
        pricing_mode: parse_enum(row.try_get::<&str, _>("pricing_mode")?)?,
        base_price: row.try_get("base_price")?,
        price_per_km: row.try_get("price_per_km")?,
        min_price: row.try_get("min_price")?,
        valid_from: row.try_get("valid_from")?,
        is_active: row.try_get("is_active")?,
    })
}

#[async_trait]
impl OrderStore for PostgresStore {
    async fn insert_order(&self, order: NewOrder) -> Result<OrderRecord, StoreError> {
        let id = Uuid::new_v4();
        let now = Utc::now();

        sqlx::query(
            "INSERT INTO orders (
                id, order_number, customer_id, company_id, vehicle_type, pricing_mode,
                pickup_address, total_distance_km, base_price, total_price, price_card_id,
                status, payment_status, payment_method, scheduled_pickup_time,
                created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)",
        )
        .bind(id)
        .bind(&order.order_number)
        .bind(order.customer_id)
        .bind(order.company_id)
        .bind(order.vehicle_type.as_str())
        .bind(order.pricing_mode.as_str())
        .bind(Json(&order.pickup_address))
        .bind(order.total_distance_km)
        .bind(order.base_price)
        .bind(order.total_price)
        .bind(order.price_card_id)
        .bind(OrderStatus::Pending.as_str())
        .bind(PaymentStatus::Pending.as_str())
        .bind(&order.payment_method)
        .bind(order.scheduled_pickup_time)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(OrderRecord {
            id,
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
        })
    }

    async fn insert_items(
        &self,
        items: Vec<NewOrderItem>,
    ) -> Result<Vec<OrderItemRecord>, StoreError> {
        let mut records = Vec::with_capacity(items.len());

        for item in items {
            let id = Uuid::new_v4();
            sqlx::query(
                "INSERT INTO order_items (id, order_id, description, quantity, unit_price, total_price)
                 VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(id)
            .bind(item.order_id)
            .bind(&item.description)
            .bind(item.quantity)
            .bind(item.unit_price)
            .bind(item.total_price)
            .execute(&self.pool)
            .await?;

            records.push(OrderItemRecord {
                id,
                order_id: item.order_id,
                description: item.description,
                quantity: item.quantity,
                unit_price: item.unit_price,
                total_price: item.total_price,
            });
        }

        Ok(records)
    }

    async fn insert_drops(&self, drops: Vec<NewDrop>) -> Result<Vec<DropRecord>, StoreError> {
        let mut records = Vec::with_capacity(drops.len());

        for drop in drops {
            let id = Uuid::new_v4();
            sqlx::query(
                "INSERT INTO drops (
                    id, order_id, drop_sequence, recipient_name, recipient_phone,
                    address, delivery_instructions, status
                ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
            )
            .bind(id)
            .bind(drop.order_id)
            .bind(drop.drop_sequence)
            .bind(&drop.recipient_name)
            .bind(&drop.recipient_phone)
            .bind(Json(&drop.address))
            .bind(&drop.delivery_instructions)
            .bind(DropStatus::Pending.as_str())
            .execute(&self.pool)
            .await?;

            records.push(DropRecord {
                id,
                order_id: drop.order_id,
                drop_sequence: drop.drop_sequence,
                recipient_name: drop.recipient_name,
                recipient_phone: drop.recipient_phone,
                address: drop.address,
                delivery_instructions: drop.delivery_instructions,
                status: DropStatus::Pending,
            });
        }

        Ok(records)
    }

    async fn delete_items(&self, order_id: Uuid) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM order_items WHERE order_id = $1")
            .bind(order_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn delete_drops(&self, order_id: Uuid) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM drops WHERE order_id = $1")
            .bind(order_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn delete_order(&self, order_id: Uuid) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(order_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get_with_relations(&self, order_id: Uuid) -> Result<PersistedOrder, StoreError> {
        let order_row = sqlx::query("SELECT * FROM orders WHERE id = $1")
            .bind(order_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("order {order_id}")))?;
        let order = map_order(&order_row)?;

        let item_rows = sqlx::query("SELECT * FROM order_items WHERE order_id = $1 ORDER BY id")
            .bind(order_id)
            .fetch_all(&self.pool)
            .await?;
        let items = item_rows
            .iter()
            .map(map_item)
            .collect::<Result<Vec<_>, _>>()?;

        let drop_rows =
            sqlx::query("SELECT * FROM drops WHERE order_id = $1 ORDER BY drop_sequence")
                .bind(order_id)
                .fetch_all(&self.pool)
                .await?;
        let drops = drop_rows
            .iter()
            .map(map_drop)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(PersistedOrder {
            order,
            items,
            drops,
        })
    }

    async fn list_recent(&self, limit: i64, offset: i64) -> Result<Vec<OrderRecord>, StoreError> {
        let rows = sqlx::query(
            "SELECT * FROM orders ORDER BY created_at DESC LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_order).collect()
    }
}

#[async_trait]
impl PriceCardStore for PostgresStore {
    async fn find_active_card(
        &self,
        company_id: Option<Uuid>,
        vehicle_type: VehicleType,
        pricing_mode: PricingMode,
    ) -> Result<Option<PriceCard>, StoreError> {
        let row = sqlx::query(
            "SELECT * FROM price_cards
             WHERE vehicle_type = $1
               AND pricing_mode = $2
               AND is_active
               AND valid_from <= now()
               AND company_id IS NOT DISTINCT FROM $3
             ORDER BY valid_from DESC
             LIMIT 1",
        )
        .bind(vehicle_type.as_str())
        .bind(pricing_mode.as_str())
        .bind(company_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_card).transpose()
    }
}

#[async_trait]
impl AuditStore for PostgresStore {
    async fn insert_audit(&self, entry: AuditEntry) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO audit_logs (id, user_id, action, entity_type, entity_id, changes, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(Uuid::new_v4())
        .bind(entry.user_id)
        .bind(&entry.action)
        .bind(&entry.entity_type)
        .bind(entry.entity_id)
        .bind(Json(&entry.changes))
        .bind(entry.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
