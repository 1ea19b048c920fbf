use super::ui;
use crate::core::accrual::Plan;
use crate::core::format::format_fiat;
use anyhow::{Result, bail};
use chrono::{DateTime, Utc};
use comfy_table::Cell;
use rust_decimal::Decimal;

pub fn render_plans(plans: &[Plan], currency: &str) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Plan"),
        ui::header_cell("APY"),
        ui::header_cell("Term"),
        ui::header_cell(&format!("Min ({currency})")),
        ui::header_cell(&format!("Max ({currency})")),
    ]);

    for plan in plans {
        let max = plan
            .max_amount
            .map_or_else(|| "No limit".to_string(), |m| format!("{m:.2}"));
        table.add_row(vec![
            Cell::new(format!("{} ({})", plan.name, plan.id)),
            ui::highlight_cell(format!("{:.2}%", plan.apy_percent)),
            ui::right_cell(format!("{} days", plan.duration_days)),
            ui::right_cell(format!("{:.2}", plan.min_amount)),
            ui::right_cell(max),
        ]);
    }

    format!(
        "{}\n\n{}",
        ui::style_text("Staking Plans", ui::StyleType::Title),
        table
    )
}

/// What `amount` earns over the full term of `plan`, starting at `start`.
pub fn render_projection(
    plan: &Plan,
    amount: Decimal,
    start: DateTime<Utc>,
    currency: &str,
) -> Result<String> {
    if !plan.accepts(amount) {
        let max = plan
            .max_amount
            .map_or_else(|| "no limit".to_string(), |m| format_fiat(m, currency));
        bail!(
            "{} accepts between {} and {}, got {}",
            plan.name,
            format_fiat(plan.min_amount, currency),
            max,
            format_fiat(amount, currency)
        );
    }

    let subscription = plan.subscribe(amount, start)?;
    let earned = plan.projected_return(amount)?;
    let gain = earned / amount * Decimal::ONE_HUNDRED;

    let mut table = ui::new_styled_table();
    table.set_header(vec![ui::header_cell("Item"), ui::header_cell("Value")]);
    table.add_row(vec![
        Cell::new("Principal"),
        ui::right_cell(format_fiat(amount, currency)),
    ]);
    table.add_row(vec![
        Cell::new("APY"),
        ui::right_cell(format!("{:.2}%", plan.apy_percent)),
    ]);
    table.add_row(vec![
        Cell::new("Daily earning"),
        ui::right_cell(format_fiat(subscription.daily_earning()?, currency)),
    ]);
    table.add_row(vec![
        Cell::new("Matures on"),
        ui::right_cell(subscription.end_date().format("%Y-%m-%d").to_string()),
    ]);
    table.add_row(vec![
        Cell::new("Projected return"),
        ui::change_cell(gain),
    ]);

    Ok(format!(
        "{}\n\n{}\n\n{}: {} (+{})",
        ui::style_text(
            &format!("{} over {} days", plan.name, plan.duration_days),
            ui::StyleType::Title
        ),
        table,
        ui::style_text("Value at maturity", ui::StyleType::TotalLabel),
        ui::style_text(
            &format_fiat(subscription.maturity_value()?, currency),
            ui::StyleType::TotalValue
        ),
        format_fiat(earned, currency),
    ))
}

pub fn run(plans: &[Plan], currency: &str) {
    if plans.is_empty() {
        println!("No plans configured.");
        return;
    }
    println!("{}", render_plans(plans, currency));
}

pub fn run_projection(plan: &Plan, amount: Decimal, currency: &str) -> Result<()> {
    println!("{}", render_projection(plan, amount, Utc::now(), currency)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::default_plans;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    #[test]
    fn test_render_default_plans() {
        let output = render_plans(&default_plans(), "USD");

        assert!(output.contains("Growth (growth)"));
        assert!(output.contains("12.50%"));
        assert!(output.contains("180 days"));
        assert!(output.contains("100000.00"));
    }

    #[test]
    fn test_render_projection() {
        let plans = default_plans();
        let growth = &plans[1];
        let start = Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap();

        let output = render_projection(growth, dec!(1000), start, "USD").unwrap();

        assert!(output.contains("1031.30 USD"));
        assert!(output.contains("+31.30 USD"));
        assert!(output.contains("0.34 USD"));
        assert!(output.contains("2024-04-14"));
    }

    #[test]
    fn test_projection_outside_limits() {
        let plans = default_plans();
        let start = Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap();

        let err = render_projection(&plans[0], dec!(50), start, "USD").unwrap_err();
        assert!(err.to_string().contains("between 100.00 USD"), "{err}");
    }
}
