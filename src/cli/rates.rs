use super::ui;
use crate::core::cache::{CacheStatus, RateCache};
use crate::core::format::format_fiat;
use crate::core::rates::RateTable;
use comfy_table::Cell;

/// Renders the current rate table with its freshness footer.
pub fn render_rates(table: &RateTable, status: &CacheStatus, currency: &str) -> String {
    let mut out = ui::new_styled_table();
    out.set_header(vec![
        ui::header_cell("Asset"),
        ui::header_cell("Name"),
        ui::header_cell(&format!("Price ({currency})")),
        ui::header_cell("24h"),
        ui::header_cell("Updated"),
    ]);

    for snapshot in table.snapshots() {
        out.add_row(vec![
            Cell::new(snapshot.symbol.code()),
            Cell::new(snapshot.symbol.name()),
            ui::right_cell(format_fiat(snapshot.price, currency)),
            ui::change_cell(snapshot.change_24h),
            ui::right_cell(snapshot.last_updated.format("%Y-%m-%d %H:%M:%S UTC").to_string()),
        ]);
    }

    let mut output = format!("{}\n\n", ui::style_text("Market Rates", ui::StyleType::Title));
    output.push_str(&out.to_string());
    output.push_str("\n\n");
    output.push_str(&freshness_line(status));
    output
}

fn freshness_line(status: &CacheStatus) -> String {
    if status.last_fetch == chrono::DateTime::<chrono::Utc>::UNIX_EPOCH {
        return ui::style_text(
            "Showing default rates, no upstream data has been fetched yet",
            ui::StyleType::Warning,
        );
    }

    let age = format!("Last fetch {} ago", ui::format_age(status.age));
    let mut line = if status.stale {
        ui::style_text(&format!("{age} (stale)"), ui::StyleType::Warning)
    } else {
        ui::style_text(&age, ui::StyleType::Subtle)
    };
    if status.consecutive_failures > 0 {
        line.push_str(&format!(
            "\n{}",
            ui::style_text(
                &format!("{} refresh attempt(s) failed", status.consecutive_failures),
                ui::StyleType::Error,
            )
        ));
    }
    line
}

pub fn run(cache: &RateCache, currency: &str) {
    println!("{}", render_rates(&cache.table(), &cache.status(), currency));
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn status(last_fetch: chrono::DateTime<Utc>, age: Duration, stale: bool) -> CacheStatus {
        CacheStatus {
            last_fetch,
            age,
            stale,
            refreshing: false,
            consecutive_failures: 0,
        }
    }

    #[test]
    fn test_render_fallback_rates() {
        let table = RateTable::fallback();
        let output = render_rates(
            &table,
            &status(table.last_fetch(), Duration::days(1), true),
            "USD",
        );

        assert!(output.contains("Bitcoin"));
        assert!(output.contains("39875.50 USD"));
        assert!(output.contains("-0.87%"));
        assert!(output.contains("default rates"));
    }

    #[test]
    fn test_render_marks_stale() {
        let at = Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap();
        let mut table_status = status(at, Duration::minutes(7), true);
        table_status.consecutive_failures = 2;
        let output = render_rates(&RateTable::fallback(), &table_status, "USD");

        assert!(output.contains("7m 0s ago"));
        assert!(output.contains("(stale)"));
        assert!(output.contains("2 refresh attempt(s) failed"));
    }
}
