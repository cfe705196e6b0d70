use rust_decimal::Decimal;

use crate::distance::DistanceError;
use crate::domain::order::models::{PricingMode, VehicleType};
use crate::domain::order::ErrorKind;
use crate::store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum PricingError {
    #[error("no price card found for vehicle type: {vehicle_type}, pricing mode: {pricing_mode}")]
    NoPriceCardFound {
        vehicle_type: VehicleType,
        pricing_mode: PricingMode,
    },

    #[error("per-box pricing requires at least one item")]
    MissingItems,

    #[error("distance-based pricing requires at least one drop")]
    MissingDrops,

    #[error("invalid item quantity: {0}")]
    InvalidQuantity(i32),

    #[error("invalid unit price: {0}")]
    NegativeUnitPrice(Decimal),

    #[error("invalid coordinates: lat {lat}, lng {lng}")]
    InvalidCoordinates { lat: f64, lng: f64 },

    #[error("invalid computed distance: {0}")]
    InvalidDistance(f64),

    #[error(transparent)]
    Distance(#[from] DistanceError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl PricingError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PricingError::NoPriceCardFound { .. } => ErrorKind::Configuration,
            PricingError::MissingItems
            | PricingError::MissingDrops
            | PricingError::InvalidQuantity(_)
            | PricingError::NegativeUnitPrice(_)
            | PricingError::InvalidCoordinates { .. } => ErrorKind::Validation,
            PricingError::Distance(DistanceError::InvalidCoordinates { .. }) => {
                ErrorKind::Validation
            }
            PricingError::InvalidDistance(_)
            | PricingError::Distance(_)
            | PricingError::Store(_) => ErrorKind::Upstream,
        }
    }
}
