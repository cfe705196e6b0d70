// ============================================================================
// logistics-core
// ============================================================================
//
// Pricing and cache-aside core of a multi-drop delivery platform:
//
// - `domain::pricing`: price-card resolution, the pricing engine and the
//   driver payment calculator
// - `orders`: order creation orchestration (validation, pricing, persistence
//   with compensation, audit, cache invalidation)
// - `cache`: generic cache-aside layer with entity-scoped invalidation
// - `store` / `distance`: collaborator traits plus the Postgres, in-memory
//   and Google Distance Matrix implementations
//
// ============================================================================

pub mod audit;
pub mod cache;
pub mod config;
pub mod distance;
pub mod domain;
pub mod orders;
pub mod store;
pub mod utils;
