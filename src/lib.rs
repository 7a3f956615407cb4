//! Quorum Oracle Library
//!
//! BFT price oracle core for a blockchain validator: vote-extension
//! proposal gating and index-price aggregation.
//!
//! Two tightly coupled parts: the extended-commit-info validator
//! ([`proposals`]) rejects proposals whose per-validator price votes do not
//! comprise a voting-power supermajority or carry malformed prices, and the
//! aggregation engine ([`oracle`]) folds per-provider exchange rates into
//! one scaled integer price per pair via graph-resolved normalization and a
//! median combination rule.

pub mod codec;
pub mod config;
pub mod error;
pub mod market;
pub mod oracle;
pub mod proposals;
pub mod types;
pub mod votes;
