use crate::domain::order::models::MAX_RETAIL_DROPS;
use crate::domain::pricing::PricingError;
use crate::store::StoreError;

// ============================================================================
// Order Error Taxonomy
// ============================================================================
//
// Three caller-visible classes:
// - Validation: malformed input, nothing persisted, safe to show the user
// - Configuration: no applicable price card, an operator problem
// - Upstream: distance service or store failure, reported generically
//
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("retail customers can have maximum {MAX_RETAIL_DROPS} drops (got {0})")]
    DropLimitExceeded(usize),

    #[error("order must contain at least one drop")]
    NoDrops,

    #[error(transparent)]
    Pricing(#[from] PricingError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Coarse classification used by the calling boundary to decide what a
/// client is allowed to see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Configuration,
    Upstream,
}

impl OrderError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            OrderError::DropLimitExceeded(_) | OrderError::NoDrops => ErrorKind::Validation,
            OrderError::Pricing(e) => e.kind(),
            OrderError::Store(_) => ErrorKind::Upstream,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::models::{PricingMode, VehicleType};

    #[test]
    fn test_drop_limit_message_names_the_limit() {
        let err = OrderError::DropLimitExceeded(5);
        assert_eq!(
            err.to_string(),
            "retail customers can have maximum 4 drops (got 5)"
        );
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_no_price_card_is_a_configuration_error() {
        let err = OrderError::from(PricingError::NoPriceCardFound {
            vehicle_type: VehicleType::Small,
            pricing_mode: PricingMode::PerBox,
        });
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_store_failures_are_upstream() {
        let err = OrderError::from(StoreError::Unavailable("connection refused".into()));
        assert_eq!(err.kind(), ErrorKind::Upstream);
    }
}
