//! Daily-compounding yield accrual for plan subscriptions.
//!
//! ```plain
//! Subscription states:
//!
//!   ACTIVE ──(now >= end_date)──► COMPLETED
//!     │
//!     └──(cancel)──► CANCELLED
//! ```
//!
//! COMPLETED is derived from the clock, nothing has to fire it. Both end
//! states are terminal.

use crate::core::error::{CoreError, CoreResult};
use chrono::{DateTime, Duration, Utc};
use rust_decimal::{Decimal, MathematicalOps};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

pub const DAYS_PER_YEAR: u32 = 365;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SubscriptionStatus {
    Active,
    Completed,
    Cancelled,
}

impl Display for SubscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            SubscriptionStatus::Active => "ACTIVE",
            SubscriptionStatus::Completed => "COMPLETED",
            SubscriptionStatus::Cancelled => "CANCELLED",
        };
        write!(f, "{label}")
    }
}

/// `apy_percent / 365 / 100`
pub fn daily_rate(apy_percent: Decimal) -> CoreResult<Decimal> {
    ensure_apy(apy_percent)?;
    Ok(apy_percent / Decimal::from(DAYS_PER_YEAR) / Decimal::ONE_HUNDRED)
}

/// Interest earned after `elapsed_days` of daily compounding. Growth stops
/// at `term_days`.
pub fn compute_accrued(
    principal: Decimal,
    apy_percent: Decimal,
    elapsed_days: u32,
    term_days: u32,
) -> CoreResult<Decimal> {
    ensure_principal(principal)?;
    let rate = daily_rate(apy_percent)?;
    let days = elapsed_days.min(term_days);

    let growth = (Decimal::ONE + rate)
        .checked_powu(u64::from(days))
        .ok_or_else(|| {
            CoreError::InvalidAmount(format!("{apy_percent}% over {days} days overflows"))
        })?;
    principal
        .checked_mul(growth)
        .map(|value| value - principal)
        .ok_or_else(|| CoreError::InvalidAmount(format!("{principal} overflows accrual")))
}

/// Return over a full term, as shown by the plan calculator.
pub fn projected_return(principal: Decimal, apy_percent: Decimal, days: u32) -> CoreResult<Decimal> {
    compute_accrued(principal, apy_percent, days, days)
}

/// Fraction of the term elapsed at `now`, clamped to `[0, 1]`.
pub fn progress(start: DateTime<Utc>, end: DateTime<Utc>, now: DateTime<Utc>) -> CoreResult<Decimal> {
    ensure_range(start, end)?;
    let total = (end - start).num_milliseconds();
    let elapsed = (now - start).num_milliseconds();
    let fraction = Decimal::from(elapsed) / Decimal::from(total);
    Ok(fraction.clamp(Decimal::ZERO, Decimal::ONE))
}

/// Earnings per day at the simple daily rate, independent of elapsed time.
pub fn daily_run_rate(principal: Decimal, apy_percent: Decimal) -> CoreResult<Decimal> {
    ensure_principal(principal)?;
    principal
        .checked_mul(daily_rate(apy_percent)?)
        .ok_or_else(|| {
            CoreError::InvalidAmount(format!(
                "{principal} at {apy_percent}% overflows daily earning"
            ))
        })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    principal: Decimal,
    apy_percent: Decimal,
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
    status: SubscriptionStatus,
    total_earned: Decimal,
}

impl Subscription {
    pub fn new(
        principal: Decimal,
        apy_percent: Decimal,
        start_date: DateTime<Utc>,
        end_date: DateTime<Utc>,
    ) -> CoreResult<Self> {
        if principal <= Decimal::ZERO {
            return Err(CoreError::InvalidAmount(format!(
                "principal must be positive, got {principal}"
            )));
        }
        ensure_apy(apy_percent)?;
        ensure_range(start_date, end_date)?;

        Ok(Self {
            principal,
            apy_percent,
            start_date,
            end_date,
            status: SubscriptionStatus::Active,
            total_earned: Decimal::ZERO,
        })
    }

    pub fn principal(&self) -> Decimal {
        self.principal
    }

    pub fn apy_percent(&self) -> Decimal {
        self.apy_percent
    }

    pub fn start_date(&self) -> DateTime<Utc> {
        self.start_date
    }

    pub fn end_date(&self) -> DateTime<Utc> {
        self.end_date
    }

    /// Earned amount as of the last `accrue` (or frozen by `cancel`).
    pub fn total_earned(&self) -> Decimal {
        self.total_earned
    }

    /// Whole days in the term.
    pub fn term_days(&self) -> u32 {
        whole_days(self.end_date - self.start_date)
    }

    /// Whole days since start, never negative.
    pub fn elapsed_days(&self, now: DateTime<Utc>) -> u32 {
        whole_days(now - self.start_date)
    }

    /// Days left until the end date, rounded up.
    pub fn days_remaining(&self, now: DateTime<Utc>) -> u32 {
        let left = self.end_date - now;
        if left <= Duration::zero() {
            return 0;
        }
        let days = left.num_days();
        let partial = left > Duration::days(days);
        u32::try_from(days + i64::from(partial)).unwrap_or(u32::MAX)
    }

    pub fn progress(&self, now: DateTime<Utc>) -> Decimal {
        let total = (self.end_date - self.start_date).num_milliseconds();
        let elapsed = (now - self.start_date).num_milliseconds();
        (Decimal::from(elapsed) / Decimal::from(total)).clamp(Decimal::ZERO, Decimal::ONE)
    }

    pub fn status_at(&self, now: DateTime<Utc>) -> SubscriptionStatus {
        match self.status {
            SubscriptionStatus::Active if now >= self.end_date => SubscriptionStatus::Completed,
            status => status,
        }
    }

    /// Earned amount at `now`. Cancelled subscriptions report their frozen
    /// total.
    pub fn earned_at(&self, now: DateTime<Utc>) -> CoreResult<Decimal> {
        if self.status == SubscriptionStatus::Cancelled {
            return Ok(self.total_earned);
        }
        compute_accrued(
            self.principal,
            self.apy_percent,
            self.elapsed_days(now),
            self.term_days(),
        )
    }

    /// Recomputes `total_earned` and applies the derived status.
    pub fn accrue(&mut self, now: DateTime<Utc>) -> CoreResult<Decimal> {
        if self.status == SubscriptionStatus::Cancelled {
            return Ok(self.total_earned);
        }
        self.total_earned = self.earned_at(now)?;
        self.status = self.status_at(now);
        Ok(self.total_earned)
    }

    pub fn cancel(&mut self, now: DateTime<Utc>) -> CoreResult<()> {
        match self.status_at(now) {
            SubscriptionStatus::Active => {
                self.status = SubscriptionStatus::Cancelled;
                Ok(())
            }
            status => Err(CoreError::InvalidSubscription(format!(
                "cannot cancel a {status} subscription"
            ))),
        }
    }

    pub fn daily_earning(&self) -> CoreResult<Decimal> {
        daily_run_rate(self.principal, self.apy_percent)
    }

    /// Principal plus everything earned over the full term.
    pub fn maturity_value(&self) -> CoreResult<Decimal> {
        let earned = compute_accrued(
            self.principal,
            self.apy_percent,
            self.term_days(),
            self.term_days(),
        )?;
        Ok(self.principal + earned)
    }
}

/// An investment offer a user can subscribe to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub id: String,
    pub name: String,
    pub apy_percent: Decimal,
    pub duration_days: u32,
    pub min_amount: Decimal,
    #[serde(default)]
    pub max_amount: Option<Decimal>,
}

impl Plan {
    pub fn accepts(&self, amount: Decimal) -> bool {
        amount >= self.min_amount && self.max_amount.is_none_or(|max| amount <= max)
    }

    pub fn projected_return(&self, amount: Decimal) -> CoreResult<Decimal> {
        projected_return(amount, self.apy_percent, self.duration_days)
    }

    pub fn subscribe(&self, amount: Decimal, start: DateTime<Utc>) -> CoreResult<Subscription> {
        if !self.accepts(amount) {
            let max = self
                .max_amount
                .map_or_else(|| "unlimited".to_string(), |m| m.to_string());
            return Err(CoreError::InvalidAmount(format!(
                "{amount} is outside plan '{}' limits [{}, {max}]",
                self.name, self.min_amount
            )));
        }
        if self.duration_days == 0 {
            return Err(CoreError::InvalidSubscription(format!(
                "plan '{}' has no duration",
                self.name
            )));
        }
        let end = start + Duration::days(i64::from(self.duration_days));
        Subscription::new(amount, self.apy_percent, start, end)
    }
}

fn whole_days(span: Duration) -> u32 {
    u32::try_from(span.num_days().max(0)).unwrap_or(u32::MAX)
}

fn ensure_principal(principal: Decimal) -> CoreResult<()> {
    if principal < Decimal::ZERO {
        return Err(CoreError::InvalidAmount(format!(
            "principal must not be negative, got {principal}"
        )));
    }
    Ok(())
}

fn ensure_apy(apy_percent: Decimal) -> CoreResult<()> {
    if apy_percent < Decimal::ZERO {
        return Err(CoreError::InvalidAmount(format!(
            "APY must not be negative, got {apy_percent}"
        )));
    }
    Ok(())
}

fn ensure_range(start: DateTime<Utc>, end: DateTime<Utc>) -> CoreResult<()> {
    if end <= start {
        return Err(CoreError::InvalidSubscription(format!(
            "end date {end} must be after start date {start}"
        )));
    }
    Ok(())
}
