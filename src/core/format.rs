//! Presentation rounding. Amounts are only rounded here, never while they are
//! still being computed on.

use crate::core::asset::AssetSymbol;
use rust_decimal::{Decimal, RoundingStrategy};

/// Rounds an amount of `symbol` to its class precision.
pub fn round_for_display(amount: Decimal, symbol: AssetSymbol) -> Decimal {
    amount.round_dp_with_strategy(
        symbol.class().display_decimals(),
        RoundingStrategy::MidpointAwayFromZero,
    )
}

/// `0.05000000 BTC`, `1000.00 USDT`
pub fn format_asset(amount: Decimal, symbol: AssetSymbol) -> String {
    let decimals = symbol.class().display_decimals() as usize;
    format!("{:.decimals$} {symbol}", round_for_display(amount, symbol))
}

/// Reference-currency values always use two decimals.
pub fn format_fiat(amount: Decimal, currency: &str) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    format!("{rounded:.2} {currency}")
}

/// `+2.34%` / `-0.87%`
pub fn format_percent(value: Decimal) -> String {
    let rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let sign = if rounded >= Decimal::ZERO { "+" } else { "" };
    format!("{sign}{rounded:.2}%")
}

/// Formats a `[0, 1]` fraction as a percentage with one decimal.
pub fn format_progress(fraction: Decimal) -> String {
    let percent = (fraction * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero);
    format!("{percent:.1}%")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_crypto_uses_eight_decimals() {
        assert_eq!(
            format_asset(dec!(1631.795887568383323901150726), AssetSymbol::Eth),
            "1631.79588757 ETH"
        );
        assert_eq!(format_asset(dec!(0.05), AssetSymbol::Btc), "0.05000000 BTC");
    }

    #[test]
    fn test_stable_uses_two_decimals() {
        assert_eq!(format_asset(dec!(1000.005), AssetSymbol::Usdt), "1000.01 USDT");
        assert_eq!(round_for_display(dec!(2.344), AssetSymbol::Usdc), dec!(2.34));
    }

    #[test]
    fn test_percent_and_progress() {
        assert_eq!(format_percent(dec!(2.344)), "+2.34%");
        assert_eq!(format_percent(dec!(-0.87)), "-0.87%");
        assert_eq!(format_percent(dec!(0)), "+0.00%");
        assert_eq!(format_progress(dec!(0.4945054945)), "49.5%");
        assert_eq!(format_fiat(dec!(31.296389), "USD"), "31.30 USD");
    }
}
