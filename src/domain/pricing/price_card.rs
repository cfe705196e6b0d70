use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::order::models::{PricingMode, VehicleType};
use crate::store::PriceCardStore;

use super::errors::PricingError;

// ============================================================================
// Price Cards
// ============================================================================
//
// A price card is a versioned pricing policy. At most one card is applicable
// per (company-or-none, vehicle type, pricing mode) at any instant: the
// active card with the latest valid_from <= now. A company-specific card
// always wins over the company-independent default card.
//
// Cards are created and retired administratively; this core only reads them.
//
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceCard {
    pub id: Uuid,
    /// None marks the company-independent default card.
    pub company_id: Option<Uuid>,
    pub vehicle_type: VehicleType,
    pub pricing_mode: PricingMode,
    pub base_price: Decimal,
    pub price_per_km: Decimal,
    pub min_price: Decimal,
    pub valid_from: DateTime<Utc>,
    pub is_active: bool,
}

impl PriceCard {
    pub fn is_applicable_at(&self, instant: DateTime<Utc>) -> bool {
        self.is_active && self.valid_from <= instant
    }
}

/// Resolve the applicable price card for an order.
///
/// A company order first looks for a card scoped to that company, then
/// falls back to the default card. Pricing never defaults to zero: a
/// missing card is a hard `NoPriceCardFound` error.
pub async fn resolve_price_card(
    store: &dyn PriceCardStore,
    company_id: Option<Uuid>,
    vehicle_type: VehicleType,
    pricing_mode: PricingMode,
) -> Result<PriceCard, PricingError> {
    if let Some(company) = company_id {
        if let Some(card) = store
            .find_active_card(Some(company), vehicle_type, pricing_mode)
            .await?
        {
            tracing::debug!(
                price_card_id = %card.id,
                company_id = %company,
                "Resolved company-specific price card"
            );
            return Ok(card);
        }
    }

    match store
        .find_active_card(None, vehicle_type, pricing_mode)
        .await?
    {
        Some(card) => {
            tracing::debug!(price_card_id = %card.id, "Resolved default price card");
            Ok(card)
        }
        None => Err(PricingError::NoPriceCardFound {
            vehicle_type,
            pricing_mode,
        }),
    }
}
