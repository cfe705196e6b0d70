use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::utils::round2;

// ============================================================================
// Driver Payment Calculator
// ============================================================================
//
// Net payout from a gross order amount. Each deduction is a simple
// proportion of the gross, applied independently (never compounded).
//
// ============================================================================

/// Externally configured deduction percentages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRates {
    pub commission_percent: Decimal,
    pub insurance_percent: Decimal,
    pub withholding_tax_percent: Decimal,
}

impl Default for PaymentRates {
    fn default() -> Self {
        Self {
            commission_percent: Decimal::from(10),
            insurance_percent: Decimal::from(2),
            withholding_tax_percent: Decimal::from(5),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentBreakdown {
    pub gross_amount: Decimal,
    pub commission: Decimal,
    pub insurance: Decimal,
    pub withholding_tax: Decimal,
    pub net_amount: Decimal,
}

pub struct DriverPaymentCalculator {
    rates: PaymentRates,
}

impl DriverPaymentCalculator {
    pub fn new(rates: PaymentRates) -> Self {
        Self { rates }
    }

    /// Break a gross amount down into deductions and net payout.
    /// All outputs are rounded to two decimals.
    pub fn compute_net_payment(&self, gross_amount: Decimal) -> PaymentBreakdown {
        let commission = gross_amount * self.rates.commission_percent / Decimal::ONE_HUNDRED;
        let insurance = gross_amount * self.rates.insurance_percent / Decimal::ONE_HUNDRED;
        let withholding_tax =
            gross_amount * self.rates.withholding_tax_percent / Decimal::ONE_HUNDRED;
        let net_amount = gross_amount - commission - insurance - withholding_tax;

        PaymentBreakdown {
            gross_amount: round2(gross_amount),
            commission: round2(commission),
            insurance: round2(insurance),
            withholding_tax: round2(withholding_tax),
            net_amount: round2(net_amount),
        }
    }
}
