//! Supported assets and their display classes

use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AssetSymbol {
    Btc,
    Eth,
    Usdt,
    Usdc,
}

/// Groups assets by how their amounts are presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetClass {
    /// Volatile crypto assets, shown with 8 decimals.
    Crypto,
    /// Fiat-pegged stable assets, shown with 2 decimals.
    Stable,
}

impl AssetClass {
    pub fn display_decimals(&self) -> u32 {
        match self {
            AssetClass::Crypto => 8,
            AssetClass::Stable => 2,
        }
    }
}

impl AssetSymbol {
    /// Every supported asset, in display order.
    pub const ALL: [AssetSymbol; 4] = [
        AssetSymbol::Btc,
        AssetSymbol::Eth,
        AssetSymbol::Usdt,
        AssetSymbol::Usdc,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            AssetSymbol::Btc => "BTC",
            AssetSymbol::Eth => "ETH",
            AssetSymbol::Usdt => "USDT",
            AssetSymbol::Usdc => "USDC",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            AssetSymbol::Btc => "Bitcoin",
            AssetSymbol::Eth => "Ethereum",
            AssetSymbol::Usdt => "Tether",
            AssetSymbol::Usdc => "USD Coin",
        }
    }

    pub fn class(&self) -> AssetClass {
        match self {
            AssetSymbol::Btc | AssetSymbol::Eth => AssetClass::Crypto,
            AssetSymbol::Usdt | AssetSymbol::Usdc => AssetClass::Stable,
        }
    }
}

impl Display for AssetSymbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for AssetSymbol {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "BTC" => Ok(AssetSymbol::Btc),
            "ETH" => Ok(AssetSymbol::Eth),
            "USDT" => Ok(AssetSymbol::Usdt),
            "USDC" => Ok(AssetSymbol::Usdc),
            _ => Err(anyhow!("Unsupported asset: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("btc".parse::<AssetSymbol>().unwrap(), AssetSymbol::Btc);
        assert_eq!(" Usdc ".parse::<AssetSymbol>().unwrap(), AssetSymbol::Usdc);
        assert!("DOGE".parse::<AssetSymbol>().is_err());
    }

    #[test]
    fn test_asset_classes() {
        assert_eq!(AssetSymbol::Btc.class().display_decimals(), 8);
        assert_eq!(AssetSymbol::Eth.class(), AssetClass::Crypto);
        assert_eq!(AssetSymbol::Usdt.class().display_decimals(), 2);
    }

    #[test]
    fn test_serde_uses_codes() {
        let json = serde_json::to_string(&AssetSymbol::Usdt).unwrap();
        assert_eq!(json, "\"USDT\"");
        let parsed: AssetSymbol = serde_json::from_str("\"ETH\"").unwrap();
        assert_eq!(parsed, AssetSymbol::Eth);
    }
}
