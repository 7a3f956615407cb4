//! Aggregation engine
//!
//! Two-pass resolution: normalization dependencies between tickers form a
//! directed graph (edge: index pair -> ticker that normalizes by it), which
//! is processed in topological order so every index price is resolved before
//! the tickers that consume it. Per ticker, the surviving per-provider
//! candidates are combined by median: insensitive to a few manipulated or
//! misreporting providers, which is the fault-tolerance goal.
//!
//! The call never aborts wholesale. A provider with a missing or malformed
//! observation is dropped from its ticker's candidate set; a ticker below
//! its minimum provider count, or caught in a normalization cycle, is
//! reported in the per-pair error map and omitted from the result map.

use num_rational::BigRational;
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::BTreeMap;

use crate::error::TickerError;
use crate::market::{Market, MarketMap};
use crate::oracle::math;
use crate::oracle::ObservationSet;
use crate::types::{Pair, ScaledPrice};

/// Fold one round's observations into final consensus prices.
///
/// Partial-success model: callers must inspect both maps. Every pair in the
/// market map lands in exactly one of them.
pub fn aggregate(
    market_map: &MarketMap,
    observations: &ObservationSet,
) -> (BTreeMap<Pair, ScaledPrice>, BTreeMap<Pair, TickerError>) {
    let mut resolved = BTreeMap::new();
    let mut errors = BTreeMap::new();

    // Index prices available to downstream tickers, in the rational form of
    // their already-rounded scaled value.
    let mut index_prices: BTreeMap<Pair, BigRational> = BTreeMap::new();

    let graph = build_dependency_graph(market_map);

    // Tarjan emits SCCs in reverse topological order; reversed, every
    // normalization target comes before the tickers that depend on it.
    let components = tarjan_scc(&graph);
    for component in components.iter().rev() {
        let is_cycle = component.len() > 1
            || graph.find_edge(component[0], component[0]).is_some();

        if is_cycle {
            for node in component {
                let pair = graph[*node].clone();
                tracing::error!(pair = %pair, "normalization dependencies form a cycle");
                errors.insert(pair, TickerError::NormalizationCycle);
            }
            continue;
        }

        let pair = graph[component[0]].clone();
        let market = match market_map.get(&pair) {
            Some(market) => market,
            None => continue,
        };

        match resolve_market(market, observations, &index_prices) {
            Ok(price) => {
                index_prices.insert(
                    pair.clone(),
                    math::scaled_to_rational(&price, market.ticker.decimals),
                );
                resolved.insert(pair, price);
            }
            Err(err) => {
                tracing::debug!(pair = %pair, err = %err, "ticker did not resolve this round");
                errors.insert(pair, err);
            }
        }
    }

    (resolved, errors)
}

/// Build the normalization dependency graph over the market map's pairs.
/// Edges point from a normalization target to each ticker that consumes it;
/// targets outside the map get no node and simply never resolve.
fn build_dependency_graph(market_map: &MarketMap) -> DiGraph<Pair, ()> {
    let mut graph = DiGraph::new();
    let mut nodes: BTreeMap<Pair, NodeIndex> = BTreeMap::new();

    for pair in market_map.pairs() {
        let idx = graph.add_node(pair.clone());
        nodes.insert(pair.clone(), idx);
    }

    for (pair, market) in &market_map.markets {
        for config in &market.provider_configs {
            if let Some(target) = &config.normalize_by_pair {
                if let (Some(&from), Some(&to)) = (nodes.get(target), nodes.get(pair)) {
                    graph.update_edge(from, to, ());
                }
            }
        }
    }

    graph
}

/// Resolve one ticker from its provider configs and the index prices
/// already resolved this round.
fn resolve_market(
    market: &Market,
    observations: &ObservationSet,
    index_prices: &BTreeMap<Pair, BigRational>,
) -> Result<ScaledPrice, TickerError> {
    let ticker = &market.ticker;
    let mut candidates = Vec::with_capacity(market.provider_configs.len());

    for config in &market.provider_configs {
        let observation = match observations.get(&config.source, &config.off_chain_symbol) {
            Some(obs) => obs,
            None => continue,
        };

        let mut price = math::decimal_to_rational(observation.price);
        if !math::is_positive_price(&price) {
            // Malformed report; dropped, never treated as zero.
            continue;
        }

        if config.invert {
            price = price.recip();
        }

        if let Some(target) = &config.normalize_by_pair {
            match index_prices.get(target) {
                Some(index) => price = &price * index,
                // Unresolved index this round: the contribution is dropped.
                None => continue,
            }
        }

        candidates.push(price);
    }

    if candidates.len() < ticker.min_provider_count {
        return Err(TickerError::InsufficientProviders {
            got: candidates.len(),
            want: ticker.min_provider_count,
        });
    }

    match math::median(candidates) {
        Some(median) => Ok(math::to_scaled_price(&median, ticker.decimals)),
        None => Err(TickerError::InsufficientProviders {
            got: 0,
            want: ticker.min_provider_count,
        }),
    }
}
