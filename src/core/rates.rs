//! Rate snapshots and the complete rate table

use crate::core::asset::AssetSymbol;
use crate::core::error::{CoreError, CoreResult};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Price and daily change as reported by a rate provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub price: Decimal,
    pub change_24h: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateSnapshot {
    pub symbol: AssetSymbol,
    /// Price in the reference currency, always positive.
    pub price: Decimal,
    /// Signed 24h change in percent.
    pub change_24h: Decimal,
    pub last_updated: DateTime<Utc>,
}

impl RateSnapshot {
    pub fn new(
        symbol: AssetSymbol,
        price: Decimal,
        change_24h: Decimal,
        last_updated: DateTime<Utc>,
    ) -> CoreResult<Self> {
        if price <= Decimal::ZERO {
            return Err(CoreError::InvalidAmount(format!(
                "price for {symbol} must be positive, got {price}"
            )));
        }
        Ok(Self {
            symbol,
            price,
            change_24h,
            last_updated,
        })
    }

    pub fn from_quote(symbol: AssetSymbol, quote: Quote, at: DateTime<Utc>) -> CoreResult<Self> {
        Self::new(symbol, quote.price, quote.change_24h, at)
    }

    /// Documented default for `symbol`, dated at the epoch.
    pub fn fallback(symbol: AssetSymbol) -> Self {
        let quote = fallback_quote(symbol);
        Self {
            symbol,
            price: quote.price,
            change_24h: quote.change_24h,
            last_updated: DateTime::<Utc>::UNIX_EPOCH,
        }
    }
}

/// Rates for every supported asset, replaced as a whole on refresh.
///
/// A table can only be built complete; deserialization goes through the
/// same check so a truncated record in the durable store is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawRateTable", into = "RawRateTable")]
pub struct RateTable {
    rates: BTreeMap<AssetSymbol, RateSnapshot>,
    last_fetch: DateTime<Utc>,
}

#[derive(Serialize, Deserialize)]
struct RawRateTable {
    rates: Vec<RateSnapshot>,
    last_fetch: DateTime<Utc>,
}

impl TryFrom<RawRateTable> for RateTable {
    type Error = CoreError;

    fn try_from(raw: RawRateTable) -> Result<Self, Self::Error> {
        RateTable::new(raw.rates, raw.last_fetch)
    }
}

impl From<RateTable> for RawRateTable {
    fn from(table: RateTable) -> Self {
        RawRateTable {
            rates: table.rates.into_values().collect(),
            last_fetch: table.last_fetch,
        }
    }
}

impl RateTable {
    pub fn new(snapshots: Vec<RateSnapshot>, last_fetch: DateTime<Utc>) -> CoreResult<Self> {
        let mut rates = BTreeMap::new();
        for snapshot in snapshots {
            if snapshot.price <= Decimal::ZERO {
                return Err(CoreError::InvalidAmount(format!(
                    "price for {} must be positive, got {}",
                    snapshot.symbol, snapshot.price
                )));
            }
            let symbol = snapshot.symbol;
            if rates.insert(symbol, snapshot).is_some() {
                return Err(CoreError::UpstreamError(format!(
                    "duplicate rate for {symbol}"
                )));
            }
        }

        if let Some(missing) = AssetSymbol::ALL.iter().find(|s| !rates.contains_key(s)) {
            return Err(CoreError::RateUnavailable(*missing));
        }

        Ok(Self { rates, last_fetch })
    }

    /// Builds a table from a provider batch. Any missing symbol fails the
    /// whole batch.
    pub fn from_quotes(
        quotes: &HashMap<AssetSymbol, Quote>,
        fetched_at: DateTime<Utc>,
    ) -> CoreResult<Self> {
        let snapshots = AssetSymbol::ALL
            .iter()
            .map(|symbol| {
                let quote = quotes.get(symbol).ok_or_else(|| {
                    CoreError::UpstreamError(format!("provider returned no quote for {symbol}"))
                })?;
                RateSnapshot::from_quote(*symbol, *quote, fetched_at)
            })
            .collect::<CoreResult<Vec<_>>>()?;
        Self::new(snapshots, fetched_at)
    }

    /// Defaults served before the first successful fetch.
    ///
    /// `last_fetch` is the epoch so the table is immediately due for refresh
    /// and reports itself stale.
    pub fn fallback() -> Self {
        let rates = AssetSymbol::ALL
            .iter()
            .map(|symbol| (*symbol, RateSnapshot::fallback(*symbol)))
            .collect();
        Self {
            rates,
            last_fetch: DateTime::<Utc>::UNIX_EPOCH,
        }
    }

    pub fn get(&self, symbol: AssetSymbol) -> Option<&RateSnapshot> {
        self.rates.get(&symbol)
    }

    pub fn price(&self, symbol: AssetSymbol) -> CoreResult<Decimal> {
        self.get(symbol)
            .map(|s| s.price)
            .ok_or(CoreError::RateUnavailable(symbol))
    }

    pub fn last_fetch(&self) -> DateTime<Utc> {
        self.last_fetch
    }

    pub fn snapshots(&self) -> impl Iterator<Item = &RateSnapshot> {
        self.rates.values()
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

/// Documented default quote for each asset, in USD.
pub fn fallback_quote(symbol: AssetSymbol) -> Quote {
    let (price, change_24h) = match symbol {
        AssetSymbol::Btc => (Decimal::new(3_987_550, 2), Decimal::new(234, 2)),
        AssetSymbol::Eth => (Decimal::new(245_075, 2), Decimal::new(-87, 2)),
        AssetSymbol::Usdt => (Decimal::ONE, Decimal::new(1, 2)),
        AssetSymbol::Usdc => (Decimal::ONE, Decimal::new(-1, 2)),
    };
    Quote { price, change_24h }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn quotes() -> HashMap<AssetSymbol, Quote> {
        AssetSymbol::ALL
            .iter()
            .map(|s| {
                (
                    *s,
                    Quote {
                        price: dec!(10),
                        change_24h: dec!(0.5),
                    },
                )
            })
            .collect()
    }

    #[test]
    fn test_fallback_is_complete_and_epoch_fetched() {
        let table = RateTable::fallback();
        assert_eq!(table.len(), AssetSymbol::ALL.len());
        assert_eq!(table.last_fetch(), DateTime::<Utc>::UNIX_EPOCH);
        assert_eq!(table.price(AssetSymbol::Btc).unwrap(), dec!(39875.50));
        assert_eq!(table.price(AssetSymbol::Usdc).unwrap(), dec!(1));
    }

    #[test]
    fn test_from_quotes_rejects_partial_batch() {
        let mut partial = quotes();
        partial.remove(&AssetSymbol::Eth);
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

        let err = RateTable::from_quotes(&partial, now).unwrap_err();
        assert!(matches!(err, CoreError::UpstreamError(_)));
    }

    #[test]
    fn test_rejects_non_positive_price() {
        let mut bad = quotes();
        bad.insert(
            AssetSymbol::Usdt,
            Quote {
                price: dec!(0),
                change_24h: dec!(0),
            },
        );
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

        assert!(matches!(
            RateTable::from_quotes(&bad, now),
            Err(CoreError::InvalidAmount(_))
        ));
    }

    #[test]
    fn test_deserialize_rejects_missing_symbol() {
        let table = RateTable::fallback();
        let mut value = serde_json::to_value(&table).unwrap();
        value["rates"].as_array_mut().unwrap().pop();

        let parsed: Result<RateTable, _> = serde_json::from_value(value);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_json_round_trip_keeps_table() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let table = RateTable::from_quotes(&quotes(), now).unwrap();

        let json = serde_json::to_vec(&table).unwrap();
        let parsed: RateTable = serde_json::from_slice(&json).unwrap();
        assert_eq!(parsed, table);
    }
}
