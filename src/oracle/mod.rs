//! Price aggregation
//!
//! Folds one round's raw per-provider observations into a single scaled
//! consensus price per pair, using median combination over a resolved
//! normalization graph.

pub mod aggregator;
pub mod math;

pub use aggregator::aggregate;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single provider's reported price for one off-chain symbol.
/// Ephemeral: produced per round, consumed once by the aggregation engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawObservation {
    pub price: Decimal,
    pub ts: DateTime<Utc>,
}

impl RawObservation {
    pub fn new(price: Decimal, ts: DateTime<Utc>) -> Self {
        Self { price, ts }
    }
}

/// A frozen per-round set of raw observations, keyed by (source, off-chain
/// symbol). Callers freeze the set before invoking the engine; the engine
/// never observes partial or late-arriving data.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObservationSet {
    entries: BTreeMap<(String, String), RawObservation>,
}

impl ObservationSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an observation, replacing any earlier one for the same
    /// (source, symbol)
    pub fn insert(&mut self, source: &str, symbol: &str, observation: RawObservation) {
        self.entries
            .insert((source.to_string(), symbol.to_string()), observation);
    }

    pub fn get(&self, source: &str, symbol: &str) -> Option<&RawObservation> {
        self.entries
            .get(&(source.to_string(), symbol.to_string()))
    }

    /// Drop observations older than `cutoff` before the set is frozen
    pub fn retain_fresh(&mut self, cutoff: DateTime<Utc>) {
        self.entries.retain(|_, obs| obs.ts >= cutoff);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    #[test]
    fn test_insert_replaces_same_key() {
        let ts = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let mut set = ObservationSet::new();
        set.insert("coinbase", "btc-usd", RawObservation::new(dec!(100), ts));
        set.insert("coinbase", "btc-usd", RawObservation::new(dec!(101), ts));

        assert_eq!(set.len(), 1);
        assert_eq!(set.get("coinbase", "btc-usd").unwrap().price, dec!(101));
    }

    #[test]
    fn test_retain_fresh_drops_stale() {
        let old = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let new = Utc.timestamp_opt(1_700_000_060, 0).unwrap();
        let mut set = ObservationSet::new();
        set.insert("coinbase", "btc-usd", RawObservation::new(dec!(100), old));
        set.insert("binance", "btc-usdt", RawObservation::new(dec!(100), new));

        set.retain_fresh(Utc.timestamp_opt(1_700_000_030, 0).unwrap());

        assert!(set.get("coinbase", "btc-usd").is_none());
        assert!(set.get("binance", "btc-usdt").is_some());
    }
}
