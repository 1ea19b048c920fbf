//! Cross-rate conversion between supported assets.
//!
//! Prices in a [`RateTable`] are quotes in one shared reference currency, so
//! converting `A -> B` is `amount * price(A) / price(B)`. Results keep full
//! `Decimal` precision; rounding for display lives in `core::format`.

use crate::core::asset::AssetSymbol;
use crate::core::error::{CoreError, CoreResult};
use crate::core::rates::RateTable;
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use std::str::FromStr;

/// Converts `amount` of `from` into units of `to`.
pub fn convert(
    amount: Decimal,
    from: AssetSymbol,
    to: AssetSymbol,
    table: &RateTable,
) -> CoreResult<Decimal> {
    ensure_non_negative(amount)?;
    if from == to {
        return Ok(amount);
    }

    let from_price = table.price(from)?;
    let to_price = table.price(to)?;

    amount
        .checked_mul(from_price)
        .and_then(|value| value.checked_div(to_price))
        .ok_or_else(|| CoreError::InvalidAmount(format!("{amount} {from} overflows conversion")))
}

/// Units of `to` received for one unit of `from`.
pub fn exchange_rate(from: AssetSymbol, to: AssetSymbol, table: &RateTable) -> CoreResult<Decimal> {
    convert(Decimal::ONE, from, to, table)
}

/// Total value of a set of balances in the reference currency.
pub fn portfolio_value(holdings: &[(AssetSymbol, Decimal)], table: &RateTable) -> CoreResult<Decimal> {
    holdings.iter().try_fold(Decimal::ZERO, |total, (symbol, amount)| {
        ensure_non_negative(*amount)?;
        let value = amount
            .checked_mul(table.price(*symbol)?)
            .ok_or_else(|| CoreError::InvalidAmount(format!("{amount} {symbol} overflows")))?;
        total
            .checked_add(value)
            .ok_or_else(|| CoreError::InvalidAmount("portfolio total overflows".to_string()))
    })
}

/// Accepts a float from an untyped boundary, rejecting NaN, infinities and
/// negative values.
pub fn amount_from_f64(value: f64) -> CoreResult<Decimal> {
    if !value.is_finite() {
        return Err(CoreError::InvalidAmount(format!("{value} is not finite")));
    }
    let amount = Decimal::from_f64(value)
        .ok_or_else(|| CoreError::InvalidAmount(format!("{value} is out of range")))?;
    ensure_non_negative(amount)?;
    Ok(amount)
}

pub fn parse_amount(text: &str) -> CoreResult<Decimal> {
    let amount = Decimal::from_str(text.trim())
        .map_err(|e| CoreError::InvalidAmount(format!("'{text}': {e}")))?;
    ensure_non_negative(amount)?;
    Ok(amount)
}

fn ensure_non_negative(amount: Decimal) -> CoreResult<()> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(CoreError::InvalidAmount(format!("{amount} is negative")));
    }
    Ok(())
}
