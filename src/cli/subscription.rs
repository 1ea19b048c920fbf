use super::ui;
use crate::core::accrual::{Subscription, SubscriptionStatus};
use crate::core::format::{format_fiat, format_progress};
use anyhow::Result;
use chrono::{DateTime, Utc};
use comfy_table::Cell;

/// Status card for one subscription as of `now`.
pub fn render_subscription(
    subscription: &Subscription,
    now: DateTime<Utc>,
    currency: &str,
) -> Result<String> {
    let status = subscription.status_at(now);
    let earned = subscription.earned_at(now)?;

    let status_text = match status {
        SubscriptionStatus::Active => ui::style_text(&status.to_string(), ui::StyleType::TotalValue),
        SubscriptionStatus::Completed => ui::style_text(&status.to_string(), ui::StyleType::Subtle),
        SubscriptionStatus::Cancelled => ui::style_text(&status.to_string(), ui::StyleType::Error),
    };

    let mut table = ui::new_styled_table();
    table.set_header(vec![ui::header_cell("Item"), ui::header_cell("Value")]);
    let rows = [
        ("Principal", format_fiat(subscription.principal(), currency)),
        ("APY", format!("{:.2}%", subscription.apy_percent())),
        ("Started", subscription.start_date().format("%Y-%m-%d").to_string()),
        ("Ends", subscription.end_date().format("%Y-%m-%d").to_string()),
        (
            "Days remaining",
            subscription.days_remaining(now).to_string(),
        ),
        ("Progress", format_progress(subscription.progress(now))),
        (
            "Daily earning",
            format_fiat(subscription.daily_earning()?, currency),
        ),
    ];
    for (label, value) in rows {
        table.add_row(vec![Cell::new(label), ui::right_cell(value)]);
    }

    Ok(format!(
        "Subscription: {}\n\n{}\n\n{}: {}",
        status_text,
        table,
        ui::style_text("Total earned", ui::StyleType::TotalLabel),
        ui::style_text(&format_fiat(earned, currency), ui::StyleType::TotalValue),
    ))
}

pub fn run(subscription: &Subscription, currency: &str) -> Result<()> {
    println!("{}", render_subscription(subscription, Utc::now(), currency)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn subscription() -> Subscription {
        Subscription::new(
            dec!(10000),
            dec!(12.5),
            Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 4, 15, 0, 0, 0).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_render_active_subscription() {
        let now = Utc.with_ymd_and_hms(2024, 2, 29, 0, 0, 0).unwrap();
        let output = render_subscription(&subscription(), now, "USD").unwrap();

        assert!(output.contains("ACTIVE"));
        assert!(output.contains("49.5%"));
        assert!(output.contains("3.42 USD"));
        assert!(output.contains("46"));
    }

    #[test]
    fn test_render_completed_subscription() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let output = render_subscription(&subscription(), now, "USD").unwrap();

        assert!(output.contains("COMPLETED"));
        assert!(output.contains("100.0%"));
        assert!(output.contains("316.50 USD"));
    }
}
