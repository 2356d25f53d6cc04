use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The fixed whitelist of assets the tool knows how to load and analyse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CryptoSymbol {
    Ada,
    Avax,
    Bnb,
    Btc,
    Doge,
    Dot,
    Eth,
    Shib,
    Sol,
    Xrp,
}

impl CryptoSymbol {
    pub const ALL: [CryptoSymbol; 10] = [
        CryptoSymbol::Ada,
        CryptoSymbol::Avax,
        CryptoSymbol::Bnb,
        CryptoSymbol::Btc,
        CryptoSymbol::Doge,
        CryptoSymbol::Dot,
        CryptoSymbol::Eth,
        CryptoSymbol::Shib,
        CryptoSymbol::Sol,
        CryptoSymbol::Xrp,
    ];

    pub fn ticker(&self) -> &'static str {
        match self {
            CryptoSymbol::Ada => "ADA",
            CryptoSymbol::Avax => "AVAX",
            CryptoSymbol::Bnb => "BNB",
            CryptoSymbol::Btc => "BTC",
            CryptoSymbol::Doge => "DOGE",
            CryptoSymbol::Dot => "DOT",
            CryptoSymbol::Eth => "ETH",
            CryptoSymbol::Shib => "SHIB",
            CryptoSymbol::Sol => "SOL",
            CryptoSymbol::Xrp => "XRP",
        }
    }

    /// File name of the asset's daily history inside the data directory
    pub fn file_name(&self) -> String {
        format!("{}.csv", self.ticker())
    }
}

impl FromStr for CryptoSymbol {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_uppercase();
        // Accept pair notation such as BTC/USDT or BTCUSDT
        let base = wanted
            .split('/')
            .next()
            .unwrap_or_default()
            .trim_end_matches("USDT")
            .to_string();

        CryptoSymbol::ALL
            .iter()
            .copied()
            .find(|sym| sym.ticker() == base)
            .ok_or_else(|| {
                anyhow!(
                    "Unknown crypto symbol: '{}'. Valid options: {}",
                    s,
                    CryptoSymbol::ALL
                        .iter()
                        .map(|sym| sym.ticker())
                        .collect::<Vec<_>>()
                        .join(", ")
                )
            })
    }
}

impl fmt::Display for CryptoSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.ticker())
    }
}
