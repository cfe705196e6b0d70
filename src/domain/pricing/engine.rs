use std::sync::Arc;

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::distance::{DistanceService, LatLng};
use crate::domain::order::models::{OrderDraft, PricingMode};
use crate::store::PriceCardStore;
use crate::utils::round2;

use super::errors::PricingError;
use super::price_card::{resolve_price_card, PriceCard};

// ============================================================================
// Pricing Engine
// ============================================================================
//
// distance_based: one distance-matrix call covering every drop, then
//                 total = base_price + total_km * price_per_km
// per_box:        total = sum(quantity * unit_price), base_price = 0
//
// Either way the card's min_price is a floor on the total (the base price
// is left untouched), and monetary outputs are rounded to two decimals
// half-away-from-zero exactly once, at the end.
//
// ============================================================================

/// Outcome of a price computation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceQuote {
    pub base_price: Decimal,
    pub total_distance_km: Option<f64>,
    pub total_price: Decimal,
    pub price_card_id: Uuid,
}

pub struct PricingEngine {
    cards: Arc<dyn PriceCardStore>,
    distance: Arc<dyn DistanceService>,
}

impl PricingEngine {
    pub fn new(cards: Arc<dyn PriceCardStore>, distance: Arc<dyn DistanceService>) -> Self {
        Self { cards, distance }
    }

    /// Compute the price of an order draft.
    pub async fn compute_price(&self, draft: &OrderDraft) -> Result<PriceQuote, PricingError> {
        let card = resolve_price_card(
            self.cards.as_ref(),
            draft.company_id,
            draft.vehicle_type,
            draft.pricing_mode,
        )
        .await?;

        let (base_price, total_distance_km, raw_total) = match draft.pricing_mode {
            PricingMode::DistanceBased => self.distance_total(draft, &card).await?,
            PricingMode::PerBox => per_box_total(draft)?,
        };

        let total_price = if raw_total < card.min_price {
            card.min_price
        } else {
            raw_total
        };

        let quote = PriceQuote {
            base_price: round2(base_price),
            total_distance_km,
            total_price: round2(total_price),
            price_card_id: card.id,
        };

        tracing::debug!(
            price_card_id = %card.id,
            pricing_mode = %draft.pricing_mode,
            total_price = %quote.total_price,
            total_distance_km = ?quote.total_distance_km,
            "Price computed"
        );

        Ok(quote)
    }

    async fn distance_total(
        &self,
        draft: &OrderDraft,
        card: &PriceCard,
    ) -> Result<(Decimal, Option<f64>, Decimal), PricingError> {
        if draft.drops.is_empty() {
            return Err(PricingError::MissingDrops);
        }

        validate_point(&draft.pickup.location)?;
        let destinations: Vec<LatLng> = draft
            .drops
            .iter()
            .map(|drop| {
                validate_point(&drop.address.location)?;
                Ok(drop.address.location)
            })
            .collect::<Result<_, PricingError>>()?;

        let matrix = self
            .distance
            .calculate(draft.pickup.location, &destinations)
            .await?;

        let km = Decimal::from_f64(matrix.total_distance_km)
            .filter(|d| !d.is_sign_negative())
            .ok_or(PricingError::InvalidDistance(matrix.total_distance_km))?;

        let total = card.base_price + km * card.price_per_km;
        Ok((card.base_price, Some(matrix.total_distance_km), total))
    }
}

fn per_box_total(draft: &OrderDraft) -> Result<(Decimal, Option<f64>, Decimal), PricingError> {
    if draft.items.is_empty() {
        return Err(PricingError::MissingItems);
    }

    let mut total = Decimal::ZERO;
    for item in &draft.items {
        if item.quantity < 1 {
            return Err(PricingError::InvalidQuantity(item.quantity));
        }
        if item.unit_price.is_sign_negative() {
            return Err(PricingError::NegativeUnitPrice(item.unit_price));
        }
        total += Decimal::from(item.quantity) * item.unit_price;
    }

    Ok((Decimal::ZERO, None, total))
}

fn validate_point(point: &LatLng) -> Result<(), PricingError> {
    if point.is_valid() {
        Ok(())
    } else {
        Err(PricingError::InvalidCoordinates {
            lat: point.lat,
            lng: point.lng,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::{DistanceError, DistanceMatrix, Leg, LegStatus};
    use crate::domain::order::models::{Address, DropDraft, ItemDraft, VehicleType};
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use chrono::{Duration, Utc};
    use rust_decimal_macros::dec;

    /// Distance collaborator returning a canned matrix or a canned failure.
    struct FakeDistance {
        result: Result<f64, String>,
    }

    impl FakeDistance {
        fn returning_km(km: f64) -> Self {
            Self { result: Ok(km) }
        }

        fn failing(status: &str) -> Self {
            Self {
                result: Err(status.to_string()),
            }
        }
    }

    #[async_trait]
    impl DistanceService for FakeDistance {
        async fn calculate(
            &self,
            _origin: LatLng,
            destinations: &[LatLng],
        ) -> Result<DistanceMatrix, DistanceError> {
            match &self.result {
                Ok(total) => Ok(DistanceMatrix {
                    total_distance_km: *total,
                    legs: destinations
                        .iter()
                        .enumerate()
                        .map(|(i, _)| Leg {
                            drop_index: i,
                            distance_km: total / destinations.len() as f64,
                            duration_secs: 60,
                            status: LegStatus::Ok,
                        })
                        .collect(),
                }),
                Err(status) => Err(DistanceError::UnreachableDrop {
                    drop_index: 1,
                    status: status.clone(),
                }),
            }
        }
    }

    fn seeded_store(mode: PricingMode) -> (Arc<MemoryStore>, Uuid) {
        let store = Arc::new(MemoryStore::new());
        let card_id = Uuid::new_v4();
        store.seed_card(PriceCard {
            id: card_id,
            company_id: None,
            vehicle_type: VehicleType::Small,
            pricing_mode: mode,
            base_price: dec!(300),
            price_per_km: dec!(50),
            min_price: dec!(300),
            valid_from: Utc::now() - Duration::days(1),
            is_active: true,
        });
        (store, card_id)
    }

    fn address(lat: f64, lng: f64) -> Address {
        Address {
            line: "somewhere".to_string(),
            location: LatLng { lat, lng },
        }
    }

    fn drop_at(lat: f64, lng: f64) -> DropDraft {
        DropDraft {
            recipient_name: "Recipient".to_string(),
            recipient_phone: "+66000000000".to_string(),
            address: address(lat, lng),
            delivery_instructions: None,
        }
    }

    fn distance_draft(drops: Vec<DropDraft>) -> OrderDraft {
        OrderDraft {
            company_id: None,
            vehicle_type: VehicleType::Small,
            pricing_mode: PricingMode::DistanceBased,
            pickup: address(13.75, 100.5),
            drops,
            items: vec![],
            payment_method: None,
            scheduled_pickup_time: None,
        }
    }

    fn per_box_draft(items: Vec<ItemDraft>) -> OrderDraft {
        OrderDraft {
            company_id: None,
            vehicle_type: VehicleType::Small,
            pricing_mode: PricingMode::PerBox,
            pickup: address(13.75, 100.5),
            drops: vec![drop_at(13.76, 100.52)],
            items,
            payment_method: None,
            scheduled_pickup_time: None,
        }
    }

    #[tokio::test]
    async fn test_distance_based_price() {
        // base 300 + 2 km * 50 = 400
        let (store, card_id) = seeded_store(PricingMode::DistanceBased);
        let engine = PricingEngine::new(store, Arc::new(FakeDistance::returning_km(2.0)));

        let quote = engine
            .compute_price(&distance_draft(vec![drop_at(13.76, 100.52)]))
            .await
            .unwrap();

        assert_eq!(quote.base_price, dec!(300.00));
        assert_eq!(quote.total_price, dec!(400.00));
        assert_eq!(quote.total_distance_km, Some(2.0));
        assert_eq!(quote.price_card_id, card_id);
    }

    #[tokio::test]
    async fn test_zero_distance_lands_on_the_floor() {
        let (store, _) = seeded_store(PricingMode::DistanceBased);
        let engine = PricingEngine::new(store, Arc::new(FakeDistance::returning_km(0.0)));

        let quote = engine
            .compute_price(&distance_draft(vec![drop_at(13.76, 100.52)]))
            .await
            .unwrap();

        // computed 300 == base price, exactly at the floor
        assert_eq!(quote.total_price, dec!(300.00));
        assert_eq!(quote.base_price, dec!(300.00));
    }

    #[tokio::test]
    async fn test_per_box_below_minimum_is_floored() {
        let (store, _) = seeded_store(PricingMode::PerBox);
        let engine = PricingEngine::new(store, Arc::new(FakeDistance::returning_km(0.0)));

        let quote = engine
            .compute_price(&per_box_draft(vec![ItemDraft {
                description: "box".to_string(),
                quantity: 2,
                unit_price: dec!(20),
            }]))
            .await
            .unwrap();

        // raw total 40 < min 300
        assert_eq!(quote.total_price, dec!(300.00));
        assert_eq!(quote.base_price, dec!(0.00));
        assert_eq!(quote.total_distance_km, None);
    }

    #[tokio::test]
    async fn test_per_box_sums_line_totals() {
        let (store, _) = seeded_store(PricingMode::PerBox);
        let engine = PricingEngine::new(store, Arc::new(FakeDistance::returning_km(0.0)));

        let quote = engine
            .compute_price(&per_box_draft(vec![
                ItemDraft {
                    description: "small box".to_string(),
                    quantity: 10,
                    unit_price: dec!(25.50),
                },
                ItemDraft {
                    description: "large box".to_string(),
                    quantity: 3,
                    unit_price: dec!(40),
                },
            ]))
            .await
            .unwrap();

        assert_eq!(quote.total_price, dec!(375.00));
    }

    #[tokio::test]
    async fn test_per_box_requires_items() {
        let (store, _) = seeded_store(PricingMode::PerBox);
        let engine = PricingEngine::new(store, Arc::new(FakeDistance::returning_km(0.0)));

        let result = engine.compute_price(&per_box_draft(vec![])).await;
        assert!(matches!(result, Err(PricingError::MissingItems)));
    }

    #[tokio::test]
    async fn test_unreachable_drop_fails_whole_computation() {
        let (store, _) = seeded_store(PricingMode::DistanceBased);
        let engine = PricingEngine::new(store, Arc::new(FakeDistance::failing("ZERO_RESULTS")));

        let result = engine
            .compute_price(&distance_draft(vec![
                drop_at(13.76, 100.52),
                drop_at(14.00, 101.00),
            ]))
            .await;

        assert!(matches!(
            result,
            Err(PricingError::Distance(DistanceError::UnreachableDrop { .. }))
        ));
    }

    #[tokio::test]
    async fn test_invalid_drop_coordinates_rejected() {
        let (store, _) = seeded_store(PricingMode::DistanceBased);
        let engine = PricingEngine::new(store, Arc::new(FakeDistance::returning_km(1.0)));

        let result = engine
            .compute_price(&distance_draft(vec![drop_at(123.0, 100.52)]))
            .await;

        assert!(matches!(
            result,
            Err(PricingError::InvalidCoordinates { lat, .. }) if lat == 123.0
        ));
    }

    #[tokio::test]
    async fn test_rounding_applied_once_at_the_end() {
        // 300 + 2.345 km * 50 = 417.25; a per-leg rounding pass would drift
        let (store, _) = seeded_store(PricingMode::DistanceBased);
        let engine = PricingEngine::new(store, Arc::new(FakeDistance::returning_km(2.345)));

        let quote = engine
            .compute_price(&distance_draft(vec![drop_at(13.76, 100.52)]))
            .await
            .unwrap();

        assert_eq!(quote.total_price, dec!(417.25));
    }
}
