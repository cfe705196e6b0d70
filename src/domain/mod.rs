// ============================================================================
// Domain Layer - Business Logic
// ============================================================================
//
// Domain-specific models and business rules, kept separate from the
// store / cache / distance infrastructure:
// - `order`: order shapes (drafts, persisted records) and order errors
// - `pricing`: price cards, the pricing engine and driver payment math
//
// ============================================================================

pub mod order;
pub mod pricing;
