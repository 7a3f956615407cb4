//! Oracle vote validation
//!
//! Shape/range checks over a single decoded vote extension. A vote extension
//! is cryptographically signed as one unit, so one bad entry rejects the
//! whole vote; there is no partial acceptance.

use num_bigint::Sign;

use crate::codec::DecodedVoteExtension;
use crate::error::MalformedVoteError;
use crate::market::MarketMap;
use crate::types::Pair;

/// Maximum byte width of a single price magnitude inside a vote extension.
/// Bounds the signed payload size independently of ticker decimals.
pub const MAX_PRICE_BYTES: usize = 33;

/// Maps strategy-specific pair ids to canonical pairs and bounds price
/// widths. Strategies are versioned per height: pair ids may be remapped
/// over time as markets are added and removed.
pub trait CurrencyPairStrategy: Send + Sync {
    /// The canonical pair for `id` at `height`, if any
    fn pair_from_id(&self, height: i64, id: u64) -> Option<Pair>;

    /// Maximum price magnitude width, in bytes, at `height`
    fn max_price_bytes(&self, height: i64) -> usize;
}

/// Strategy backed by a market-map snapshot: ids are indices into the
/// canonically sorted pair list.
#[derive(Debug, Clone)]
pub struct MarketMapStrategy {
    pairs: Vec<Pair>,
}

impl MarketMapStrategy {
    pub fn new(market_map: &MarketMap) -> Self {
        Self {
            pairs: market_map.pairs().cloned().collect(),
        }
    }

    /// The id assigned to `pair`, if it is in the snapshot
    pub fn id_of(&self, pair: &Pair) -> Option<u64> {
        self.pairs.iter().position(|p| p == pair).map(|i| i as u64)
    }
}

impl CurrencyPairStrategy for MarketMapStrategy {
    fn pair_from_id(&self, _height: i64, id: u64) -> Option<Pair> {
        self.pairs.get(id as usize).cloned()
    }

    fn max_price_bytes(&self, _height: i64) -> usize {
        MAX_PRICE_BYTES
    }
}

/// Validate a single decoded vote extension against the height's currency
/// pair strategy.
///
/// Every entry must reference a known pair, carry a non-negative price, and
/// fit the strategy's configured width. Pure: no side effects.
pub fn validate_oracle_vote_extension(
    vote: &DecodedVoteExtension,
    height: i64,
    strategy: &dyn CurrencyPairStrategy,
) -> Result<(), MalformedVoteError> {
    let max_bytes = strategy.max_price_bytes(height);

    for (id, price) in &vote.prices {
        if strategy.pair_from_id(height, *id).is_none() {
            return Err(MalformedVoteError::UnknownPairId { id: *id });
        }

        if price.sign() == Sign::Minus {
            return Err(MalformedVoteError::NegativePrice { id: *id });
        }

        let got = (price.bits() as usize + 7) / 8;
        if got > max_bytes {
            return Err(MalformedVoteError::PriceTooLarge {
                id: *id,
                got,
                max: max_bytes,
            });
        }
    }

    Ok(())
}
