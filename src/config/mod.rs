//! Market-map snapshot loading
//!
//! Loads from a YAML/JSON file + environment overrides. The loaded snapshot
//! is validated once here; the core components consume it read-only and it
//! is replaced wholesale between rounds by its owner.

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use std::path::Path;

use crate::market::MarketMap;

/// Environment prefix for overrides (e.g. `QUORUM_ORACLE__MARKETS__...`)
const ENV_PREFIX: &str = "QUORUM_ORACLE";

/// Load and validate a market-map snapshot from `path`.
///
/// The file format is inferred from the extension (YAML, JSON, TOML).
pub fn load_market_map(path: impl AsRef<Path>) -> Result<MarketMap> {
    let path = path.as_ref();

    let settings = Config::builder()
        .add_source(File::from(path))
        .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
        .build()
        .with_context(|| format!("failed to read market map from {}", path.display()))?;

    let market_map: MarketMap = settings
        .try_deserialize()
        .with_context(|| format!("failed to parse market map from {}", path.display()))?;

    market_map
        .validate()
        .context("market map failed validation")?;

    Ok(market_map)
}
