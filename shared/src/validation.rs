//! Validation and price rounding rules for the Scrap Shop POS
//!
//! Pure functions only: the backend calls these inside its transaction
//! scripts, and the test suites exercise them without a database.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// How a manually overridden line price is rounded.
///
/// `NoRounding` still quantizes to 2 decimal places (the storage precision
/// for money) but applies no other adjustment and accepts no step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RoundingPolicy {
    #[default]
    HalfUp,
    Up,
    Down,
    NoRounding,
}

impl RoundingPolicy {
    fn strategy(self) -> RoundingStrategy {
        match self {
            RoundingPolicy::HalfUp | RoundingPolicy::NoRounding => {
                RoundingStrategy::MidpointAwayFromZero
            }
            RoundingPolicy::Up => RoundingStrategy::AwayFromZero,
            RoundingPolicy::Down => RoundingStrategy::ToZero,
        }
    }
}

/// Round a monetary amount according to `policy`, optionally snapping to the
/// nearest `step` (e.g. 0.25) first, then quantizing to 2 decimal places.
pub fn round_price(
    amount: Decimal,
    policy: RoundingPolicy,
    step: Option<Decimal>,
) -> Result<Decimal, &'static str> {
    if amount < Decimal::ZERO {
        return Err("Price cannot be negative");
    }

    let snapped = match step {
        Some(step) => {
            if step <= Decimal::ZERO {
                return Err("Rounding step must be positive");
            }
            if policy == RoundingPolicy::NoRounding {
                return Err("Rounding step requires a rounding policy");
            }
            let quanta = (amount / step).round_dp_with_strategy(0, policy.strategy());
            quanta * step
        }
        None => amount,
    };

    Ok(snapped.round_dp_with_strategy(2, policy.strategy()))
}

/// Line price at item creation: weight x unit price, half-up to 2 decimals.
pub fn compute_line_price(weight: Decimal, unit_price: Decimal) -> Decimal {
    (weight * unit_price).round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Validate a purchase item weight (zero allowed: an unweighed placeholder)
pub fn validate_weight(weight: Decimal) -> Result<(), &'static str> {
    if weight < Decimal::ZERO {
        return Err("Weight cannot be negative");
    }
    Ok(())
}

/// Validate a monetary amount
pub fn validate_price(price: Decimal) -> Result<(), &'static str> {
    if price < Decimal::ZERO {
        return Err("Price cannot be negative");
    }
    Ok(())
}
