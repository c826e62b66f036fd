//! Money helpers.
//!
//! Amounts are exact [`Decimal`] values in the engine and signed integer
//! **minor units** (cents) in the store. Every amount a user can enter has at
//! most 2 fractional digits; derived values (balances) may carry more and are
//! only rounded when they are read.
//!
//! # Examples
//!
//! ```rust
//! use engine::{parse_amount, round_cents};
//! use rust_decimal::Decimal;
//!
//! assert_eq!(parse_amount("10,5").unwrap(), Decimal::new(1050, 2));
//! assert!(parse_amount("12.345").is_err());
//! assert_eq!(round_cents(Decimal::new(5, 3)), Decimal::new(1, 2));
//! ```

use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};

use crate::{EngineError, ResultEngine};

/// Fraction digits used by stored amounts.
pub const MINOR_UNITS: u32 = 2;

/// Parses a decimal string into an amount.
///
/// Accepts `.` or `,` as decimal separator and an optional leading `+`/`-`.
/// Rejects empty strings and more than 2 fractional digits.
pub fn parse_amount(s: &str) -> ResultEngine<Decimal> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(EngineError::InvalidAmount("empty amount".to_string()));
    }

    let normalized = trimmed.replace(',', ".");
    let digits = normalized.trim_start_matches(['+', '-']);
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return Err(EngineError::InvalidAmount("invalid amount".to_string()));
    }

    let value: Decimal = normalized
        .trim_start_matches('+')
        .parse()
        .map_err(|_| EngineError::InvalidAmount("invalid amount".to_string()))?;
    if value.scale() > MINOR_UNITS {
        return Err(EngineError::InvalidAmount("too many decimals".to_string()));
    }
    Ok(value)
}

/// Rounds to cents, midpoints away from zero.
#[must_use]
pub fn round_cents(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(MINOR_UNITS, RoundingStrategy::MidpointAwayFromZero)
}

/// Converts an amount into store minor units.
pub(crate) fn to_minor(value: Decimal) -> ResultEngine<i64> {
    let scaled = value * Decimal::ONE_HUNDRED;
    if !scaled.fract().is_zero() {
        return Err(EngineError::InvalidAmount(format!(
            "{value} has more than {MINOR_UNITS} decimals"
        )));
    }
    scaled
        .to_i64()
        .ok_or_else(|| EngineError::InvalidAmount("amount too large".to_string()))
}

/// Converts store minor units into an amount.
#[must_use]
pub(crate) fn from_minor(minor: i64) -> Decimal {
    Decimal::new(minor, MINOR_UNITS)
}

/// Ensures an amount is strictly positive and representable in cents.
pub(crate) fn ensure_positive(value: Decimal, label: &str) -> ResultEngine<i64> {
    if value <= Decimal::ZERO {
        return Err(EngineError::InvalidAmount(format!("{label} must be > 0")));
    }
    to_minor(value)
}

/// Divides `amount` into equal shares, one per member.
///
/// Shares are whole cents. Leftover cents go one each to the first members,
/// so the shares always sum to `amount`.
pub fn split_equally(amount: Decimal, members: &[String]) -> ResultEngine<Vec<(String, Decimal)>> {
    if members.is_empty() {
        return Err(EngineError::Validation(
            "at least one member is required".to_string(),
        ));
    }
    let total = ensure_positive(amount, "amount")?;
    let count = members.len() as i64;
    let base = total / count;
    let remainder = total % count;

    Ok(members
        .iter()
        .enumerate()
        .map(|(idx, member)| {
            let extra = i64::from((idx as i64) < remainder);
            (member.clone(), from_minor(base + extra))
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_dot_or_comma() {
        assert_eq!(parse_amount("10").unwrap(), Decimal::new(10, 0));
        assert_eq!(parse_amount("10.5").unwrap(), Decimal::new(105, 1));
        assert_eq!(parse_amount("10,50").unwrap(), Decimal::new(1050, 2));
        assert_eq!(parse_amount("-0.01").unwrap(), Decimal::new(-1, 2));
        assert_eq!(parse_amount("+1.00").unwrap(), Decimal::new(100, 2));
        assert_eq!(parse_amount("  2.30 ").unwrap(), Decimal::new(230, 2));
    }

    #[test]
    fn parse_rejects_garbage_and_extra_decimals() {
        assert!(parse_amount("").is_err());
        assert!(parse_amount("-").is_err());
        assert!(parse_amount("1e3").is_err());
        assert!(parse_amount("12.345").is_err());
        assert!(parse_amount("1.2.3").is_err());
    }

    #[test]
    fn minor_units_round_trip_and_reject_sub_cent() {
        assert_eq!(to_minor(Decimal::new(1234, 2)).unwrap(), 1234);
        assert_eq!(to_minor(Decimal::new(12_340, 3)).unwrap(), 1234);
        assert_eq!(from_minor(1234), Decimal::new(1234, 2));
        assert!(to_minor(Decimal::new(5, 3)).is_err());
    }

    #[test]
    fn rounding_is_symmetric() {
        assert_eq!(round_cents(Decimal::new(5, 3)), Decimal::new(1, 2));
        assert_eq!(round_cents(Decimal::new(-5, 3)), Decimal::new(-1, 2));
        assert_eq!(round_cents(Decimal::new(4, 3)), Decimal::ZERO);
    }

    #[test]
    fn split_equally_hands_out_leftover_cents() {
        let members = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let shares = split_equally(Decimal::new(100, 0), &members).unwrap();
        let amounts: Vec<Decimal> = shares.iter().map(|(_, amount)| *amount).collect();
        assert_eq!(
            amounts,
            vec![
                Decimal::new(3334, 2),
                Decimal::new(3333, 2),
                Decimal::new(3333, 2)
            ]
        );
        assert_eq!(amounts.iter().sum::<Decimal>(), Decimal::new(100, 0));
    }

    #[test]
    fn split_equally_rejects_empty_members() {
        assert!(split_equally(Decimal::ONE, &[]).is_err());
    }
}
