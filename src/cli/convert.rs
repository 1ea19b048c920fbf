use super::ui;
use crate::core::asset::AssetSymbol;
use crate::core::conversion::{convert, exchange_rate, portfolio_value};
use crate::core::format::{format_asset, format_fiat};
use crate::core::rates::RateTable;
use anyhow::Result;
use rust_decimal::Decimal;

pub fn render_conversion(
    amount: Decimal,
    from: AssetSymbol,
    to: AssetSymbol,
    table: &RateTable,
    currency: &str,
) -> Result<String> {
    let converted = convert(amount, from, to, table)?;
    let rate = exchange_rate(from, to, table)?;
    let value = portfolio_value(&[(from, amount)], table)?;

    let mut output = format!(
        "{} = {}\n",
        format_asset(amount, from),
        ui::style_text(&format_asset(converted, to), ui::StyleType::TotalValue)
    );
    output.push_str(&ui::style_text(
        &format!(
            "1 {from} = {} | value {}",
            format_asset(rate, to),
            format_fiat(value, currency)
        ),
        ui::StyleType::Subtle,
    ));
    Ok(output)
}

pub fn run(
    amount: Decimal,
    from: AssetSymbol,
    to: AssetSymbol,
    table: &RateTable,
    currency: &str,
) -> Result<()> {
    println!("{}", render_conversion(amount, from, to, table, currency)?);
    Ok(())
}
