//! Market map snapshot
//!
//! Read-only description of every tradable pair: its precision, its minimum
//! provider policy, and the provider quotes that can price it. Replaced
//! wholesale between rounds by its owner; nothing in this crate mutates it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::MarketMapError;
use crate::types::Pair;

/// A pair plus precision and minimum-provider-count policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticker {
    pub pair: Pair,
    /// Scale exponent: on-chain prices are price * 10^decimals
    pub decimals: u32,
    /// Minimum independent provider observations before the pair resolves
    pub min_provider_count: usize,
}

/// One provider quote that can contribute to a ticker's price
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Provider source name (e.g. "coinbase")
    pub source: String,
    /// Symbol the provider quotes under (e.g. "btc-usdt")
    pub off_chain_symbol: String,
    /// Multiply the (possibly inverted) quote by this pair's resolved index
    /// price to reach the ticker's terms
    #[serde(default)]
    pub normalize_by_pair: Option<Pair>,
    /// Reciprocate the raw quote before use
    #[serde(default)]
    pub invert: bool,
}

/// A ticker and its ordered provider configs. Order is insertion order, not
/// significance-ranked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Market {
    pub ticker: Ticker,
    pub provider_configs: Vec<ProviderConfig>,
}

/// Immutable per-round snapshot of all markets, keyed by canonical pair
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketMap {
    pub markets: BTreeMap<Pair, Market>,
}

impl MarketMap {
    pub fn new(markets: impl IntoIterator<Item = Market>) -> Self {
        Self {
            markets: markets
                .into_iter()
                .map(|m| (m.ticker.pair.clone(), m))
                .collect(),
        }
    }

    pub fn get(&self, pair: &Pair) -> Option<&Market> {
        self.markets.get(pair)
    }

    pub fn len(&self) -> usize {
        self.markets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markets.is_empty()
    }

    /// Pairs in canonical (sorted) order. This ordering also assigns the
    /// per-height pair ids used by the market-map currency-pair strategy.
    pub fn pairs(&self) -> impl Iterator<Item = &Pair> {
        self.markets.keys()
    }

    /// Structural validation, run once at snapshot load time.
    ///
    /// Catches configuration mistakes that would otherwise surface as silent
    /// per-round provider drops: dangling normalization references, duplicate
    /// provider rows, and zero minimum-provider counts.
    pub fn validate(&self) -> Result<(), MarketMapError> {
        for (pair, market) in &self.markets {
            if *pair != market.ticker.pair {
                return Err(MarketMapError::KeyMismatch {
                    key: pair.to_string(),
                    pair: market.ticker.pair.clone(),
                });
            }

            if market.ticker.min_provider_count == 0 {
                return Err(MarketMapError::ZeroMinProviderCount {
                    market: pair.clone(),
                });
            }

            let mut seen = std::collections::BTreeSet::new();
            for config in &market.provider_configs {
                if !seen.insert((config.source.as_str(), config.off_chain_symbol.as_str())) {
                    return Err(MarketMapError::DuplicateProvider {
                        market: pair.clone(),
                        provider: config.source.clone(),
                        symbol: config.off_chain_symbol.clone(),
                    });
                }

                if let Some(target) = &config.normalize_by_pair {
                    if !self.markets.contains_key(target) {
                        return Err(MarketMapError::UnknownNormalizePair {
                            market: pair.clone(),
                            target: target.clone(),
                        });
                    }
                }
            }
        }

        Ok(())
    }
}
