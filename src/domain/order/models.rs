use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::distance::LatLng;

// ============================================================================
// Order Models
// ============================================================================

/// Retail customers (no company) are limited to this many drops per order.
pub const MAX_RETAIL_DROPS: usize = 4;

macro_rules! string_enum {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant,)+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    other => Err(format!(
                        concat!("unknown ", stringify!($name), ": {}"),
                        other
                    )),
                }
            }
        }
    };
}

string_enum!(VehicleType {
    Small => "small",
    Medium => "medium",
    Large => "large",
});

string_enum!(PricingMode {
    DistanceBased => "distance_based",
    PerBox => "per_box",
});

string_enum!(OrderStatus {
    Pending => "pending",
    Assigned => "assigned",
    InTransit => "in_transit",
    Delivered => "delivered",
    Cancelled => "cancelled",
});

string_enum!(PaymentStatus {
    Pending => "pending",
    Paid => "paid",
    Failed => "failed",
});

string_enum!(DropStatus {
    Pending => "pending",
    Delivered => "delivered",
    Failed => "failed",
});

/// Customer class, derived from company presence on the draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CustomerClass {
    Retail,
    Corporate,
}

/// A street address with resolved coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub line: String,
    pub location: LatLng,
}

/// One delivery destination as submitted by the customer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DropDraft {
    pub recipient_name: String,
    pub recipient_phone: String,
    pub address: Address,
    pub delivery_instructions: Option<String>,
}

/// One itemized line as submitted by the customer (per-box pricing only).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemDraft {
    pub description: String,
    pub quantity: i32,
    pub unit_price: Decimal,
}

/// The order as submitted, before pricing and persistence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderDraft {
    pub company_id: Option<Uuid>,
    pub vehicle_type: VehicleType,
    pub pricing_mode: PricingMode,
    pub pickup: Address,
    #[serde(default)]
    pub drops: Vec<DropDraft>,
    #[serde(default)]
    pub items: Vec<ItemDraft>,
    pub payment_method: Option<String>,
    pub scheduled_pickup_time: Option<DateTime<Utc>>,
}

impl OrderDraft {
    pub fn customer_class(&self) -> CustomerClass {
        if self.company_id.is_some() {
            CustomerClass::Corporate
        } else {
            CustomerClass::Retail
        }
    }
}

/// The persisted order row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRecord {
    pub id: Uuid,
    pub order_number: String,
    pub customer_id: Uuid,
    pub company_id: Option<Uuid>,
    pub vehicle_type: VehicleType,
    pub pricing_mode: PricingMode,
    pub pickup_address: Address,
    pub total_distance_km: Option<f64>,
    pub base_price: Decimal,
    pub total_price: Decimal,
    pub price_card_id: Uuid,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub payment_method: Option<String>,
    pub scheduled_pickup_time: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A persisted itemized line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItemRecord {
    pub id: Uuid,
    pub order_id: Uuid,
    pub description: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub total_price: Decimal,
}

/// A persisted drop; `drop_sequence` is 1-based and contiguous per order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DropRecord {
    pub id: Uuid,
    pub order_id: Uuid,
    pub drop_sequence: i32,
    pub recipient_name: String,
    pub recipient_phone: String,
    pub address: Address,
    pub delivery_instructions: Option<String>,
    pub status: DropStatus,
}

/// The joined read model returned by order creation and detail reads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedOrder {
    pub order: OrderRecord,
    pub items: Vec<OrderItemRecord>,
    pub drops: Vec<DropRecord>,
}

// ----------------------------------------------------------------------------
// Insert shapes passed to the store
// ----------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct NewOrder {
    pub order_number: String,
    pub customer_id: Uuid,
    pub company_id: Option<Uuid>,
    pub vehicle_type: VehicleType,
    pub pricing_mode: PricingMode,
    pub pickup_address: Address,
    pub total_distance_km: Option<f64>,
    pub base_price: Decimal,
    pub total_price: Decimal,
    pub price_card_id: Uuid,
    pub payment_method: Option<String>,
    pub scheduled_pickup_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub order_id: Uuid,
    pub description: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub total_price: Decimal,
}

#[derive(Debug, Clone)]
pub struct NewDrop {
    pub order_id: Uuid,
    pub drop_sequence: i32,
    pub recipient_name: String,
    pub recipient_phone: String,
    pub address: Address,
    pub delivery_instructions: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enum_round_trip_through_text() {
        assert_eq!(VehicleType::Small.as_str(), "small");
        assert_eq!("large".parse::<VehicleType>().unwrap(), VehicleType::Large);
        assert_eq!(
            "distance_based".parse::<PricingMode>().unwrap(),
            PricingMode::DistanceBased
        );
        assert_eq!("per_box".parse::<PricingMode>().unwrap(), PricingMode::PerBox);
        assert!("bicycle".parse::<VehicleType>().is_err());
    }

    #[test]
    fn test_enum_serde_uses_snake_case() {
        let json = serde_json::to_string(&PricingMode::DistanceBased).unwrap();
        assert_eq!(json, "\"distance_based\"");
        let back: PricingMode = serde_json::from_str(&json).unwrap();
        assert_eq!(back, PricingMode::DistanceBased);
    }

    #[test]
    fn test_customer_class_from_company_presence() {
        let mut draft = OrderDraft {
            company_id: None,
            vehicle_type: VehicleType::Small,
            pricing_mode: PricingMode::DistanceBased,
            pickup: Address {
                line: "1 Depot Rd".to_string(),
                location: LatLng { lat: 13.75, lng: 100.5 },
            },
            drops: vec![],
            items: vec![],
            payment_method: None,
            scheduled_pickup_time: None,
        };
        assert_eq!(draft.customer_class(), CustomerClass::Retail);

        draft.company_id = Some(Uuid::new_v4());
        assert_eq!(draft.customer_class(), CustomerClass::Corporate);
    }
}
