// ============================================================================
// Order Domain
// ============================================================================
//
// Order shapes and rules:
// - Drafts submitted by customers and the persisted records derived from them
// - Vehicle type / pricing mode / status vocabularies
// - The retail multi-drop limit and the order error taxonomy
//
// ============================================================================

pub mod errors;
pub mod models;

pub use errors::{ErrorKind, OrderError};
pub use models::*;
