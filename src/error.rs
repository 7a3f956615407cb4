//! Error taxonomy
//!
//! Proposal-path errors (protocol violations, malformed votes) are fatal to
//! the proposal and bubble to the caller. Aggregation errors are scoped to a
//! single ticker and reported per pair, never aborting the round.

use crate::types::Pair;
use thiserror::Error;

/// A single vote entry failing shape/range validation. One bad entry
/// invalidates the entire vote: the payload is signed as one unit.
#[derive(Debug, Error)]
pub enum MalformedVoteError {
    #[error("unknown currency pair id {id}")]
    UnknownPairId { id: u64 },

    #[error("negative price for currency pair id {id}")]
    NegativePrice { id: u64 },

    #[error("price for currency pair id {id} is {got} bytes, exceeds maximum of {max}")]
    PriceTooLarge { id: u64, got: usize, max: usize },
}

/// Vote-extension codec failures
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("failed to encode vote extension: {reason}")]
    Encode { reason: String },

    #[error("failed to decode vote extension: {reason}")]
    Decode { reason: String },
}

/// Fatal proposal-validation failures. A rejected proposal is simply not
/// advanced by the consensus engine; nothing here is retried.
#[derive(Debug, Error)]
pub enum ProposalError {
    /// Vote extensions do not comprise >= 2/3 of total voting power
    #[error("vote extensions do not comprise a supermajority at height {height}: {reason}")]
    Supermajority { height: i64, reason: anyhow::Error },

    /// A vote extension payload failed to decode
    #[error("vote extension from validator {validator} is malformed: {source}")]
    VoteDecode {
        validator: String,
        #[source]
        source: CodecError,
    },

    /// A decoded vote failed price validation
    #[error("invalid oracle vote extension from validator {validator}: {source}")]
    InvalidVote {
        validator: String,
        #[source]
        source: MalformedVoteError,
    },

    /// Process path only: an extended-commit vote with no matching entry in
    /// the proposer's last-commit record
    #[error("no vote for validator {validator} in extended commit found in proposed last commit")]
    MissingLastCommitVote { validator: String },
}

/// Per-ticker aggregation failures. Non-fatal: the ticker is omitted from
/// the round's result map and other tickers still resolve.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TickerError {
    #[error("only {got} of {want} required provider prices resolved")]
    InsufficientProviders { got: usize, want: usize },

    #[error("normalization dependencies form a cycle")]
    NormalizationCycle,
}

/// Structural market-map configuration errors, surfaced at load time
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MarketMapError {
    #[error("market {market} normalizes by {target}, which is not in the market map")]
    UnknownNormalizePair { market: Pair, target: Pair },

    #[error("market {market} has duplicate provider entry ({provider}, {symbol})")]
    DuplicateProvider {
        market: Pair,
        provider: String,
        symbol: String,
    },

    #[error("market {market} has a minimum provider count of zero")]
    ZeroMinProviderCount { market: Pair },

    #[error("market map key {key} does not match ticker pair {pair}")]
    KeyMismatch { key: String, pair: Pair },
}
