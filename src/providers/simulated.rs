use crate::core::asset::AssetSymbol;
use crate::core::provider::RateProvider;
use crate::core::rates::{Quote, fallback_quote};
use anyhow::Result;
use async_trait::async_trait;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use std::collections::HashMap;
use tracing::debug;

/// Random walk around the last simulated prices, for running without an
/// upstream feed.
pub struct SimulatedProvider {
    state: Mutex<Walk>,
}

struct Walk {
    rng: StdRng,
    prices: HashMap<AssetSymbol, Decimal>,
}

/// Per-asset step size, floor and 24h change spread.
struct Movement {
    step: f64,
    floor: f64,
    change_spread: f64,
    /// Stable assets jitter around this peg instead of walking.
    peg: Option<f64>,
}

fn movement(symbol: AssetSymbol) -> Movement {
    match symbol {
        AssetSymbol::Btc => Movement {
            step: 100.0,
            floor: 1000.0,
            change_spread: 10.0,
            peg: None,
        },
        AssetSymbol::Eth => Movement {
            step: 50.0,
            floor: 100.0,
            change_spread: 8.0,
            peg: None,
        },
        AssetSymbol::Usdt => Movement {
            step: 0.001,
            floor: 0.0,
            change_spread: 0.1,
            peg: Some(1.0001),
        },
        AssetSymbol::Usdc => Movement {
            step: 0.001,
            floor: 0.0,
            change_spread: 0.1,
            peg: Some(0.9999),
        },
    }
}

impl SimulatedProvider {
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_entropy())
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    fn from_rng(rng: StdRng) -> Self {
        let prices = AssetSymbol::ALL
            .iter()
            .map(|s| (*s, fallback_quote(*s).price))
            .collect();
        Self {
            state: Mutex::new(Walk { rng, prices }),
        }
    }

    fn step(&self, symbols: &[AssetSymbol]) -> HashMap<AssetSymbol, Quote> {
        let mut walk = self.state.lock();
        let Walk { rng, prices } = &mut *walk;

        symbols
            .iter()
            .map(|symbol| {
                let m = movement(*symbol);
                let jitter = rng.gen_range(-0.5..0.5) * m.step;
                let previous = prices.get(symbol).copied().unwrap_or(Decimal::ONE);

                let next = match m.peg {
                    Some(peg) => Decimal::from_f64(peg + jitter),
                    None => {
                        let floor = Decimal::from_f64(m.floor).unwrap_or(Decimal::ONE);
                        Decimal::from_f64(jitter).map(|delta| (previous + delta).max(floor))
                    }
                }
                .unwrap_or(previous)
                .round_dp(8);
                prices.insert(*symbol, next);

                let change = Decimal::from_f64(rng.gen_range(-0.5..0.5) * m.change_spread)
                    .unwrap_or(Decimal::ZERO)
                    .round_dp(4);
                (
                    *symbol,
                    Quote {
                        price: next,
                        change_24h: change,
                    },
                )
            })
            .collect()
    }
}

impl Default for SimulatedProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RateProvider for SimulatedProvider {
    fn name(&self) -> &str {
        "simulated"
    }

    async fn fetch_rates(&self, symbols: &[AssetSymbol]) -> Result<HashMap<AssetSymbol, Quote>> {
        let quotes = self.step(symbols);
        debug!(count = quotes.len(), "Simulated rates");
        Ok(quotes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_simulated_rates_are_complete_and_positive() {
        let provider = SimulatedProvider::with_seed(42);

        for _ in 0..50 {
            let quotes = provider.fetch_rates(&AssetSymbol::ALL).await.unwrap();
            assert_eq!(quotes.len(), AssetSymbol::ALL.len());
            for quote in quotes.values() {
                assert!(quote.price > Decimal::ZERO);
            }
            assert!(quotes[&AssetSymbol::Btc].price >= dec!(1000));
            assert!(quotes[&AssetSymbol::Eth].price >= dec!(100));
            let usdt = quotes[&AssetSymbol::Usdt].price;
            assert!(usdt > dec!(0.999) && usdt < dec!(1.002), "{usdt}");
        }
    }

    #[tokio::test]
    async fn test_same_seed_same_walk() {
        let a = SimulatedProvider::with_seed(7);
        let b = SimulatedProvider::with_seed(7);

        let first = a.fetch_rates(&AssetSymbol::ALL).await.unwrap();
        let second = b.fetch_rates(&AssetSymbol::ALL).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_walk_moves_from_previous_price() {
        let provider = SimulatedProvider::with_seed(1);
        let quotes = provider.fetch_rates(&[AssetSymbol::Btc]).await.unwrap();

        let moved = quotes[&AssetSymbol::Btc].price - dec!(39875.50);
        assert!(moved.abs() <= dec!(50), "{moved}");
    }
}
