//! Number and field checks shared by the billing components.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::{BillingError, Result};

pub const CURRENCY_SCALE: u32 = 2;

/// Decimal places kept for input amounts; matches the `DECIMAL(20, 6)` columns.
pub const AMOUNT_SCALE: u32 = 6;

/// Input amounts must stay below 10^14 so they fit the amount columns.
pub fn amount_limit() -> Decimal {
    Decimal::from(100_000_000_000_000_u64)
}

/// Rounds to cents, half away from zero, and pins the scale to two places so
/// `2400` renders as `2400.00`.
pub fn round_currency(amount: Decimal) -> Decimal {
    let mut rounded =
        amount.round_dp_with_strategy(CURRENCY_SCALE, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(CURRENCY_SCALE);
    rounded
}

pub fn require<T>(field: &'static str, value: Option<T>) -> Result<T> {
    value.ok_or_else(|| BillingError::validation(field, "is required"))
}

pub fn non_negative_amount(field: &'static str, value: Option<Decimal>) -> Result<Decimal> {
    let amount = require(field, value)?;
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(BillingError::validation(
            field,
            format!("must not be negative (got {amount})"),
        ));
    }
    if amount >= amount_limit() {
        return Err(BillingError::validation(
            field,
            format!("must be below {} (got {amount})", amount_limit()),
        ));
    }
    if amount.normalize().scale() > AMOUNT_SCALE {
        return Err(BillingError::validation(
            field,
            format!("must have at most {AMOUNT_SCALE} decimal places (got {amount})"),
        ));
    }
    Ok(amount)
}

pub fn month(value: Option<u32>) -> Result<u32> {
    let month = require("month", value)?;
    if !(1..=12).contains(&month) {
        return Err(BillingError::validation(
            "month",
            format!("must be between 1 and 12 (got {month})"),
        ));
    }
    Ok(month)
}

pub fn year(value: Option<i32>) -> Result<i32> {
    let year = require("year", value)?;
    if !(1..=9999).contains(&year) {
        return Err(BillingError::validation(
            "year",
            format!("must be between 1 and 9999 (got {year})"),
        ));
    }
    Ok(year)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(value: &str) -> Decimal {
        Decimal::from_str(value).expect("valid decimal")
    }

    #[test]
    fn rounds_half_away_from_zero() {
        assert_eq!(round_currency(dec("1180.555")).to_string(), "1180.56");
        assert_eq!(round_currency(dec("-0.005")).to_string(), "-0.01");
        assert_eq!(round_currency(dec("2.345")).to_string(), "2.35");
        assert_eq!(round_currency(dec("2400")).to_string(), "2400.00");
    }

    #[test]
    fn negative_zero_is_accepted() {
        assert_eq!(non_negative_amount("x", Some(dec("-0.00"))).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn amounts_must_fit_the_columns() {
        let err = non_negative_amount("net_salary", Some(Decimal::MAX)).unwrap_err();
        assert!(matches!(err, BillingError::Validation { field: "net_salary", .. }));
        assert!(non_negative_amount("net_salary", Some(amount_limit())).is_err());
        assert_eq!(
            non_negative_amount("net_salary", Some(dec("99999999999999.999999"))).unwrap(),
            dec("99999999999999.999999")
        );
    }

    #[test]
    fn amounts_keep_at_most_six_places() {
        let err = non_negative_amount("social_security", Some(dec("0.0000001"))).unwrap_err();
        assert!(matches!(err, BillingError::Validation { field: "social_security", .. }));
        assert_eq!(non_negative_amount("x", Some(dec("150.555"))).unwrap(), dec("150.555"));
        // trailing zeros do not count
        assert_eq!(non_negative_amount("x", Some(dec("1.50000000"))).unwrap(), dec("1.5"));
    }

    #[test]
    fn rejects_out_of_range_month() {
        for bad in [0, 13] {
            let err = month(Some(bad)).unwrap_err();
            assert!(matches!(err, BillingError::Validation { field: "month", .. }));
        }
        assert_eq!(month(Some(12)).unwrap(), 12);
    }

    #[test]
    fn missing_field_names_the_field() {
        let err = non_negative_amount("union_contribution", None).unwrap_err();
        assert_eq!(err.to_string(), "invalid union_contribution: is required");
    }
}
