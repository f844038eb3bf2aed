//! Sale amount arithmetic.
//!
//! All amounts are [`Decimal`] with two fractional digits, matching the
//! `NUMERIC(12,2)` columns they are stored in.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Largest amount a `NUMERIC(12,2)` column holds: 9,999,999,999.99.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(0xD4A5_0FFF, 0xE8, 0, false, 2);

/// Whether `amount`, rounded to cents, is too large to store.
#[must_use]
pub fn exceeds_max_amount(amount: Decimal) -> bool {
    amount.round_dp(2) > MAX_AMOUNT
}

/// Why a set of sale amounts was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TotalsError {
    #[error("unit price must be greater than zero")]
    InvalidPrice,
    #[error("quantity must be greater than zero")]
    InvalidQuantity,
    #[error("amount paid {paid} is less than total {total}")]
    Underpaid { total: Decimal, paid: Decimal },
    #[error("amount exceeds the maximum of {MAX_AMOUNT}")]
    AmountTooLarge,
}

/// Total, tendered amount and change for a single-line sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleTotals {
    pub unit_price: Decimal,
    pub quantity: i32,
    pub total_amount: Decimal,
    pub amount_paid: Decimal,
    pub change_amount: Decimal,
}

impl SaleTotals {
    /// Compute totals for `quantity` units at `unit_price`.
    ///
    /// `amount_paid` defaults to the exact total (no change).
    ///
    /// # Errors
    ///
    /// Returns [`TotalsError`] if the price or quantity is not positive, if
    /// any amount is larger than [`MAX_AMOUNT`], or if the tendered amount
    /// does not cover the total.
    pub fn compute(
        unit_price: Decimal,
        quantity: i32,
        amount_paid: Option<Decimal>,
    ) -> Result<Self, TotalsError> {
        if unit_price <= Decimal::ZERO {
            return Err(TotalsError::InvalidPrice);
        }
        if quantity <= 0 {
            return Err(TotalsError::InvalidQuantity);
        }

        let unit_price = unit_price.round_dp(2);
        if unit_price > MAX_AMOUNT {
            return Err(TotalsError::AmountTooLarge);
        }
        let total_amount = unit_price
            .checked_mul(Decimal::from(quantity))
            .map(|total| total.round_dp(2))
            .filter(|total| *total <= MAX_AMOUNT)
            .ok_or(TotalsError::AmountTooLarge)?;
        let amount_paid = amount_paid.map_or(total_amount, |paid| paid.round_dp(2));
        if amount_paid > MAX_AMOUNT {
            return Err(TotalsError::AmountTooLarge);
        }
        if amount_paid < total_amount {
            return Err(TotalsError::Underpaid {
                total: total_amount,
                paid: amount_paid,
            });
        }

        Ok(Self {
            unit_price,
            quantity,
            total_amount,
            amount_paid,
            change_amount: amount_paid - total_amount,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_payment_has_no_change() {
        let totals = SaleTotals::compute(Decimal::new(10, 0), 2, None).unwrap();
        assert_eq!(totals.total_amount, Decimal::new(20, 0));
        assert_eq!(totals.amount_paid, Decimal::new(20, 0));
        assert_eq!(totals.change_amount, Decimal::ZERO);
    }

    #[test]
    fn test_overpayment_returns_change() {
        let totals =
            SaleTotals::compute(Decimal::new(1250, 2), 3, Some(Decimal::new(50, 0))).unwrap();
        assert_eq!(totals.total_amount, Decimal::new(3750, 2));
        assert_eq!(totals.change_amount, Decimal::new(1250, 2));
    }

    #[test]
    fn test_rejects_non_positive_price() {
        assert_eq!(
            SaleTotals::compute(Decimal::ZERO, 1, None),
            Err(TotalsError::InvalidPrice)
        );
        assert_eq!(
            SaleTotals::compute(Decimal::new(-5, 0), 1, None),
            Err(TotalsError::InvalidPrice)
        );
    }

    #[test]
    fn test_rejects_non_positive_quantity() {
        assert_eq!(
            SaleTotals::compute(Decimal::ONE, 0, None),
            Err(TotalsError::InvalidQuantity)
        );
    }

    #[test]
    fn test_max_amount_matches_column() {
        assert_eq!(MAX_AMOUNT, Decimal::new(999_999_999_999, 2));
        assert!(!exceeds_max_amount(MAX_AMOUNT));
        assert!(!exceeds_max_amount(Decimal::new(9_999_999_999_994, 3)));
        assert!(exceeds_max_amount(Decimal::new(9_999_999_999_995, 3)));
    }

    #[test]
    fn test_rejects_overflowing_total() {
        assert_eq!(
            SaleTotals::compute(Decimal::MAX, 2, None),
            Err(TotalsError::AmountTooLarge)
        );
        assert_eq!(
            SaleTotals::compute(MAX_AMOUNT, 2, None),
            Err(TotalsError::AmountTooLarge)
        );
        assert_eq!(
            SaleTotals::compute(MAX_AMOUNT, 1, Some(Decimal::MAX)),
            Err(TotalsError::AmountTooLarge)
        );
        assert!(SaleTotals::compute(MAX_AMOUNT, 1, None).is_ok());
    }

    #[test]
    fn test_rejects_underpayment() {
        let err = SaleTotals::compute(Decimal::new(10, 0), 2, Some(Decimal::new(15, 0)));
        assert!(matches!(err, Err(TotalsError::Underpaid { .. })));
    }
}
