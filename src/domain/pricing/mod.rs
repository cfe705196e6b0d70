// ============================================================================
// Pricing Domain
// ============================================================================
//
// - Price cards: versioned pricing policies keyed by vehicle type and
//   pricing mode, optionally scoped to one company
// - The pricing engine: distance-based and per-box price computation with
//   a minimum-price floor
// - Driver payment math: proportional commission / insurance / tax
//
// ============================================================================

pub mod engine;
pub mod errors;
pub mod payment;
pub mod price_card;

pub use engine::{PriceQuote, PricingEngine};
pub use errors::PricingError;
pub use payment::{DriverPaymentCalculator, PaymentBreakdown, PaymentRates};
pub use price_card::{resolve_price_card, PriceCard};
