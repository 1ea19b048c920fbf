//! Process-wide market rate cache.
//!
//! ```plain
//! Refresh flow:
//!
//!   refresh_if_due ──(age >= ttl, guard free, not cooling down)──► spawn task
//!                                                  │
//!                        fetch all symbols under timeout
//!                         │                      │
//!                      success               failure/timeout
//!                         │                      │
//!            swap Arc<RateTable>, persist   keep table, last_fetch unchanged
//!                         │                      │
//!                         └──── release guard ───┘
//! ```
//!
//! After a failure `refresh_if_due` waits `retry_after`, doubling per
//! consecutive failure up to the TTL, before calling upstream again.
//! `spawn_refresh` ignores the cool-down.
//!
//! Readers clone the current `Arc<RateTable>` and never wait on the network.
//! The table pointer is only replaced by the refresh path, and never by a
//! table older than the one installed.

use crate::core::asset::AssetSymbol;
use crate::core::clock::{Clock, SystemClock};
use crate::core::error::CoreError;
use crate::core::provider::{RateProvider, RateStore};
use crate::core::rates::{RateSnapshot, RateTable};
use chrono::{DateTime, Duration, Utc};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Clone)]
pub struct RefreshPolicy {
    /// Age after which the table is eligible for refresh.
    pub ttl: Duration,
    /// Age after which the table is reported stale.
    pub stale_after: Duration,
    /// Upper bound on one upstream call.
    pub timeout: std::time::Duration,
    /// Wait after the first failed refresh before `refresh_if_due` retries.
    pub retry_after: Duration,
}

impl Default for RefreshPolicy {
    fn default() -> Self {
        Self {
            ttl: Duration::seconds(60),
            stale_after: Duration::minutes(5),
            timeout: std::time::Duration::from_secs(5),
            retry_after: Duration::seconds(5),
        }
    }
}

#[derive(Debug)]
pub enum RefreshOutcome {
    /// A new table was installed.
    Updated { last_fetch: DateTime<Utc> },
    /// The fetch failed; the previous table is still served.
    Failed(CoreError),
    /// The fetched table was older than the installed one.
    Discarded { fetched_at: DateTime<Utc> },
}

impl RefreshOutcome {
    pub fn is_updated(&self) -> bool {
        matches!(self, RefreshOutcome::Updated { .. })
    }
}

#[derive(Debug, Clone)]
pub struct CacheStatus {
    pub last_fetch: DateTime<Utc>,
    pub age: Duration,
    pub stale: bool,
    pub refreshing: bool,
    pub consecutive_failures: u32,
}

pub struct RateCache {
    table: RwLock<Arc<RateTable>>,
    refreshing: AtomicBool,
    consecutive_failures: AtomicU32,
    last_failure: Mutex<Option<DateTime<Utc>>>,
    provider: Arc<dyn RateProvider>,
    store: Arc<dyn RateStore>,
    clock: Arc<dyn Clock>,
    policy: RefreshPolicy,
}

/// Handle passed to every consumer of the cache.
pub type SharedRateCache = Arc<RateCache>;

/// Single-flight token. Dropping it, on any path, frees the next refresh.
struct RefreshGuard {
    cache: Arc<RateCache>,
}

impl RefreshGuard {
    fn acquire(cache: &Arc<RateCache>) -> Option<Self> {
        cache
            .refreshing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;
        Some(Self {
            cache: Arc::clone(cache),
        })
    }
}

impl Drop for RefreshGuard {
    fn drop(&mut self) {
        self.cache.refreshing.store(false, Ordering::Release);
    }
}

impl RateCache {
    /// Creates a cache serving the fallback table until the first refresh.
    pub fn new(
        provider: Arc<dyn RateProvider>,
        store: Arc<dyn RateStore>,
        policy: RefreshPolicy,
    ) -> Self {
        Self::with_clock(provider, store, policy, Arc::new(SystemClock))
    }

    pub fn with_clock(
        provider: Arc<dyn RateProvider>,
        store: Arc<dyn RateStore>,
        policy: RefreshPolicy,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            table: RwLock::new(Arc::new(RateTable::fallback())),
            refreshing: AtomicBool::new(false),
            consecutive_failures: AtomicU32::new(0),
            last_failure: Mutex::new(None),
            provider,
            store,
            clock,
            policy,
        }
    }

    pub fn policy(&self) -> &RefreshPolicy {
        &self.policy
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Installs the last known table from the durable store, if it is newer
    /// than what the cache holds. Tables dated after the current time are
    /// ignored. Returns whether a table was installed.
    pub async fn seed_from_store(&self) -> bool {
        match self.store.load_last_known().await {
            Ok(Some(table)) => {
                let last_fetch = table.last_fetch();
                let now = self.clock.now();
                if last_fetch > now {
                    warn!(%last_fetch, %now, "Ignoring stored rate table dated in the future");
                    return false;
                }
                if self.install(Arc::new(table)) {
                    info!(%last_fetch, "Seeded rate cache from store");
                    true
                } else {
                    debug!(%last_fetch, "Stored rate table is older than cache");
                    false
                }
            }
            Ok(None) => {
                debug!("No stored rate table");
                false
            }
            Err(e) => {
                warn!(error = %e, "Failed to load stored rate table");
                false
            }
        }
    }

    /// The whole current table, consistent across symbols.
    pub fn table(&self) -> Arc<RateTable> {
        Arc::clone(&self.table.read())
    }

    pub fn snapshot(&self, symbol: AssetSymbol) -> RateSnapshot {
        self.table()
            .get(symbol)
            .cloned()
            .unwrap_or_else(|| RateSnapshot::fallback(symbol))
    }

    pub fn last_fetch(&self) -> DateTime<Utc> {
        self.table.read().last_fetch()
    }

    pub fn is_due(&self) -> bool {
        self.clock.now() - self.last_fetch() >= self.policy.ttl
    }

    /// Advisory flag for "rates may be outdated". Never blocks reads.
    pub fn is_stale(&self) -> bool {
        self.clock.now() - self.last_fetch() > self.policy.stale_after
    }

    pub fn is_refreshing(&self) -> bool {
        self.refreshing.load(Ordering::Acquire)
    }

    pub fn status(&self) -> CacheStatus {
        let last_fetch = self.last_fetch();
        let age = self.clock.now() - last_fetch;
        CacheStatus {
            last_fetch,
            age,
            stale: age > self.policy.stale_after,
            refreshing: self.is_refreshing(),
            consecutive_failures: self.consecutive_failures.load(Ordering::Relaxed),
        }
    }

    /// Starts a background refresh when the table has outlived its TTL and
    /// no refresh is running. Returns the handle of the started refresh.
    pub fn refresh_if_due(self: &Arc<Self>) -> Option<JoinHandle<RefreshOutcome>> {
        if !self.is_due() || self.is_cooling_down() {
            return None;
        }
        self.spawn_refresh()
    }

    /// Starts a background refresh regardless of the TTL, unless one is
    /// already running.
    pub fn spawn_refresh(self: &Arc<Self>) -> Option<JoinHandle<RefreshOutcome>> {
        let Some(guard) = RefreshGuard::acquire(self) else {
            debug!("Refresh already in flight");
            return None;
        };
        let runtime = match Handle::try_current() {
            Ok(handle) => handle,
            Err(e) => {
                warn!(error = %e, "No async runtime to refresh rates on");
                return None;
            }
        };

        Some(runtime.spawn(async move {
            let outcome = guard.cache.run_refresh().await;
            drop(guard);
            outcome
        }))
    }

    /// Polls `refresh_if_due` every `period` until the cache is dropped.
    /// Must be called from within a tokio runtime.
    pub fn start_auto_refresh(self: &Arc<Self>, period: std::time::Duration) -> JoinHandle<()> {
        let cache = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                let Some(cache) = cache.upgrade() else {
                    debug!("Rate cache dropped, stopping auto refresh");
                    break;
                };
                cache.refresh_if_due();
            }
        })
    }

    /// True while the backoff after the last failed refresh has not elapsed.
    fn is_cooling_down(&self) -> bool {
        let failures = self.consecutive_failures.load(Ordering::Relaxed);
        let Some(failed_at) = *self.last_failure.lock() else {
            return false;
        };
        if failures == 0 {
            return false;
        }
        let wait = self
            .policy
            .retry_after
            .checked_mul(1 << (failures - 1).min(16))
            .map_or(self.policy.ttl, |wait| wait.min(self.policy.ttl));
        self.clock.now() - failed_at < wait
    }

    #[instrument(name = "RateRefresh", skip(self), fields(provider = self.provider.name()))]
    async fn run_refresh(&self) -> RefreshOutcome {
        let fetched = tokio::time::timeout(
            self.policy.timeout,
            self.provider.fetch_rates(&AssetSymbol::ALL),
        )
        .await;

        let table = match fetched {
            Err(_) => Err(CoreError::UpstreamTimeout(self.policy.timeout)),
            Ok(Err(e)) => Err(CoreError::UpstreamError(format!("{e:#}"))),
            Ok(Ok(quotes)) => RateTable::from_quotes(&quotes, self.clock.now()),
        };

        let table = match table {
            Ok(table) => Arc::new(table),
            Err(e) => {
                *self.last_failure.lock() = Some(self.clock.now());
                let failures = self.consecutive_failures.fetch_add(1, Ordering::Relaxed) + 1;
                warn!(error = %e, failures, stale = self.is_stale(), "Rate refresh failed");
                return RefreshOutcome::Failed(e);
            }
        };

        let fetched_at = table.last_fetch();
        if !self.install(Arc::clone(&table)) {
            debug!(%fetched_at, "Discarding rate table older than the installed one");
            return RefreshOutcome::Discarded { fetched_at };
        }
        self.consecutive_failures.store(0, Ordering::Relaxed);
        *self.last_failure.lock() = None;
        info!(%fetched_at, "Rate table refreshed");

        if let Err(e) = self.store.save(&table).await {
            warn!(error = %e, "Failed to persist rate table");
        }

        RefreshOutcome::Updated {
            last_fetch: fetched_at,
        }
    }

    fn install(&self, table: Arc<RateTable>) -> bool {
        let mut current = self.table.write();
        if table.last_fetch() < current.last_fetch() {
            return false;
        }
        *current = table;
        true
    }
}
