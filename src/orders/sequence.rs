use async_trait::async_trait;
use chrono::{DateTime, Datelike, Utc};
use sqlx::postgres::PgPool;
use sqlx::Row;

use crate::store::StoreError;

// ============================================================================
// Order Number Generation
// ============================================================================

/// Collaborator producing unique, human-readable order numbers.
#[async_trait]
pub trait SequenceGenerator: Send + Sync {
    async fn next(&self) -> Result<String, StoreError>;
}

/// Database-backed generator: `ORD-<year>-<seq:06>` off a Postgres sequence,
/// so uniqueness is the database's problem.
pub struct PostgresSequence {
    pool: PgPool,
}

impl PostgresSequence {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SequenceGenerator for PostgresSequence {
    async fn next(&self) -> Result<String, StoreError> {
        let row = sqlx::query("SELECT nextval('order_number_seq') AS n")
            .fetch_one(&self.pool)
            .await?;
        let n: i64 = row.try_get("n")?;
        Ok(format!("ORD-{}-{:06}", Utc::now().year(), n))
    }
}

/// Timestamp-derived fallback used when the sequence collaborator is down.
///
/// Derived from the current millisecond, so two orders created in the same
/// millisecond (or exactly 1,000 seconds apart) can collide. That small
/// risk is accepted and logged by the caller rather than hidden.
pub fn fallback_order_number(now: DateTime<Utc>) -> String {
    format!("ORD-{}-{:06}", now.year(), now.timestamp_millis() % 1_000_000)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_fallback_format() {
        let instant = Utc.with_ymd_and_hms(2026, 3, 14, 9, 26, 53).unwrap();
        let number = fallback_order_number(instant);
        assert!(number.starts_with("ORD-2026-"));
        assert_eq!(number.len(), "ORD-2026-000000".len());
    }

    #[test]
    fn test_fallback_is_zero_padded() {
        // a millisecond value ending in 000001
        let instant = Utc.timestamp_millis_opt(1_000_001).unwrap();
        let number = fallback_order_number(instant);
        assert!(number.ends_with("-000001"), "got {number}");
    }
}
