//! Rounding and display of amounts at output boundaries.
//!
//! Calculations keep full `Decimal` precision; only reports round, half-up,
//! to cents for EUR and to 8 places for quantities.

use rust_decimal::{Decimal, RoundingStrategy};

pub const EUR_DP: u32 = 2;
pub const QUANTITY_DP: u32 = 8;

/// Round half-up to cents, always carrying two decimal places.
pub fn round_eur(amount: Decimal) -> Decimal {
    let mut rounded = amount.round_dp_with_strategy(EUR_DP, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(EUR_DP);
    rounded
}

pub fn round_quantity(quantity: Decimal) -> Decimal {
    quantity
        .round_dp_with_strategy(QUANTITY_DP, RoundingStrategy::MidpointAwayFromZero)
        .normalize()
}

pub fn format_eur(amount: Decimal) -> String {
    format!("€{:.2}", round_eur(amount))
}

pub fn format_eur_signed(amount: Decimal) -> String {
    let amount = round_eur(amount);
    if amount < Decimal::ZERO {
        format!("-€{:.2}", amount.abs())
    } else {
        format!("€{:.2}", amount)
    }
}

pub fn format_quantity(quantity: Decimal) -> String {
    round_quantity(quantity).to_string()
}

pub fn format_percent(percent: Decimal) -> String {
    format!("{:.2}%", round_eur(percent))
}
