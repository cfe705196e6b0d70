use rust_decimal::Decimal;

use crate::cache::DEFAULT_NAMESPACE;
use crate::domain::pricing::PaymentRates;

// ============================================================================
// Configuration
// ============================================================================

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    /// None disables caching entirely; the read path runs uncached.
    pub redis_url: Option<String>,
    pub google_maps_api_key: Option<String>,
    pub cache_namespace: String,
    pub payment_rates: PaymentRates,
}

impl Config {
    /// Read configuration from the environment, with the platform's
    /// historical variable names and defaults.
    pub fn from_env() -> Self {
        let defaults = PaymentRates::default();
        Self {
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgres://localhost/logistics".to_string()),
            redis_url: std::env::var("REDIS_URL").ok(),
            google_maps_api_key: std::env::var("GOOGLE_MAPS_API_KEY").ok(),
            cache_namespace: std::env::var("CACHE_NAMESPACE")
                .unwrap_or_else(|_| DEFAULT_NAMESPACE.to_string()),
            payment_rates: PaymentRates {
                commission_percent: percent_var(
                    "PLATFORM_COMMISSION_PERCENT",
                    defaults.commission_percent,
                ),
                insurance_percent: percent_var("INSURANCE_PERCENT", defaults.insurance_percent),
                withholding_tax_percent: percent_var(
                    "WITHHOLDING_TAX_PERCENT",
                    defaults.withholding_tax_percent,
                ),
            },
        }
    }
}

fn percent_var(name: &str, default: Decimal) -> Decimal {
    match std::env::var(name) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::warn!(var = %name, value = %raw, "Unparseable percentage, using default");
            default
        }),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_percent_var_defaults_when_unset() {
        assert_eq!(
            percent_var("LOGISTICS_CORE_TEST_UNSET_PERCENT", dec!(10)),
            dec!(10)
        );
    }
}
