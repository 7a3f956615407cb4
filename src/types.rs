//! Core types used throughout the oracle
//!
//! Defines currency pairs, scaled prices, and the consensus-side commit
//! structures consumed by proposal validation.

use num_bigint::BigInt;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// An integer price scaled by 10^decimals. Canonical on-chain representation.
///
/// Negative values are representable (a vote can carry anything) but are
/// rejected by vote validation and never produced by aggregation.
pub type ScaledPrice = BigInt;

/// An ordered base/quote trading-symbol identity (e.g. BTC against USD).
///
/// Symbols are normalized to uppercase on construction; the canonical string
/// form is `BASE/QUOTE` and is unique within a round.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Pair {
    base: String,
    quote: String,
}

impl Pair {
    /// # Panics
    ///
    /// Panics if either symbol is empty or contains `/`: both would make
    /// the canonical `BASE/QUOTE` form ambiguous.
    pub fn new(base: &str, quote: &str) -> Self {
        assert!(
            !base.is_empty() && !quote.is_empty() && !base.contains('/') && !quote.contains('/'),
            "invalid currency pair symbols: {base:?}/{quote:?}"
        );
        Self {
            base: base.to_uppercase(),
            quote: quote.to_uppercase(),
        }
    }

    /// Parse from the canonical `BASE/QUOTE` form
    pub fn parse(s: &str) -> Option<Self> {
        let (base, quote) = s.split_once('/')?;
        if base.is_empty() || quote.is_empty() || quote.contains('/') {
            return None;
        }
        Some(Self::new(base, quote))
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn quote(&self) -> &str {
        &self.quote
    }
}

impl fmt::Display for Pair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.quote)
    }
}

// Pairs serialize as their canonical string form so they can key maps in
// JSON/YAML market-map snapshots.
impl Serialize for Pair {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Pair {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Pair::parse(&s).ok_or_else(|| de::Error::custom(format!("invalid currency pair: {s:?}")))
    }
}

/// How a validator's vote relates to the referenced block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockIdFlag {
    /// Vote was not received
    Absent,
    /// Voted for the block that received the majority
    Commit,
    /// Voted for nil
    Nil,
}

impl Default for BlockIdFlag {
    fn default() -> Self {
        BlockIdFlag::Absent
    }
}

/// A validator's consensus identity and voting power
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validator {
    /// Raw consensus address bytes
    #[serde(with = "hex")]
    pub address: Vec<u8>,
    /// Voting power at the referenced height
    pub power: i64,
}

impl Validator {
    pub fn new(address: Vec<u8>, power: i64) -> Self {
        Self { address, power }
    }

    /// Hex rendering of the address, for logs and errors
    pub fn address_hex(&self) -> String {
        hex::encode(&self.address)
    }
}

/// One validator's entry in the extended commit: identity, voting power,
/// and the opaque vote-extension payload carrying its observed prices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtendedVoteInfo {
    pub validator: Validator,
    /// Opaque signed payload; decoded by the vote-extension codec
    #[serde(with = "hex")]
    pub vote_extension: Vec<u8>,
    pub block_id_flag: BlockIdFlag,
}

/// The consensus engine's per-height bundle of all validators' vote
/// extensions plus voting-power metadata. Ephemeral: lives for the duration
/// of one proposal validation call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtendedCommitInfo {
    pub round: i32,
    pub votes: Vec<ExtendedVoteInfo>,
}

/// A validator's entry in a (non-extended) commit record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteInfo {
    pub validator: Validator,
    pub block_id_flag: BlockIdFlag,
}

/// The proposer's record of the previous block's commit
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitInfo {
    pub round: i32,
    pub votes: Vec<VoteInfo>,
}

/// The slice of a process-proposal request this crate consumes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessProposalRequest {
    pub height: i64,
    pub proposed_last_commit: CommitInfo,
}
