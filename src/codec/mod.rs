//! Vote-extension codec
//!
//! The wire format of vote-extension payloads is pluggable: the proposal
//! handler only depends on the [`VoteExtensionCodec`] contract. A JSON
//! reference implementation is provided for embedders and tests.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::CodecError;
use crate::types::ScaledPrice;

/// A validator's decoded price observations: strategy-specific pair id to
/// scaled integer price. This is exactly the signed unit; the validator's
/// address travels in the enclosing extended-commit vote entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodedVoteExtension {
    pub prices: BTreeMap<u64, ScaledPrice>,
}

/// Encode/decode contract for vote-extension payloads. Any decode error is
/// fatal to that vote's validation.
pub trait VoteExtensionCodec: Send + Sync {
    fn encode(&self, vote: &DecodedVoteExtension) -> Result<Vec<u8>, CodecError>;
    fn decode(&self, bytes: &[u8]) -> Result<DecodedVoteExtension, CodecError>;
}

/// JSON reference codec
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonVoteExtensionCodec;

impl VoteExtensionCodec for JsonVoteExtensionCodec {
    fn encode(&self, vote: &DecodedVoteExtension) -> Result<Vec<u8>, CodecError> {
        serde_json::to_vec(vote).map_err(|e| CodecError::Encode {
            reason: e.to_string(),
        })
    }

    fn decode(&self, bytes: &[u8]) -> Result<DecodedVoteExtension, CodecError> {
        serde_json::from_slice(bytes).map_err(|e| CodecError::Decode {
            reason: e.to_string(),
        })
    }
}
