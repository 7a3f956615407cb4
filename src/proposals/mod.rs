//! Extended commit info validation
//!
//! The proposal-path gate: confirms that the vote extensions attached to a
//! proposal comprise a voting-power supermajority and that every extension
//! decodes to valid prices. Read-only and deterministic; every validator
//! must reach the same accept/reject decision for the same inputs.

use std::collections::HashMap;
use std::sync::Arc;

use crate::codec::VoteExtensionCodec;
use crate::error::ProposalError;
use crate::types::{BlockIdFlag, ExtendedCommitInfo, ProcessProposalRequest, VoteInfo};
use crate::votes::{validate_oracle_vote_extension, CurrencyPairStrategy};

/// Supermajority predicate over an extended commit. Encapsulates the
/// consensus engine's voting-power weighting rules.
pub trait SupermajorityCheck: Send + Sync {
    fn validate(&self, height: i64, commit_info: &ExtendedCommitInfo) -> anyhow::Result<()>;
}

/// Power-sum supermajority check: votes flagged `Commit` must carry at least
/// 2/3 of the total voting power at the height.
#[derive(Debug, Clone, Copy)]
pub struct PowerThresholdCheck {
    total_power: i64,
}

impl PowerThresholdCheck {
    pub fn new(total_power: i64) -> Self {
        Self { total_power }
    }
}

impl SupermajorityCheck for PowerThresholdCheck {
    fn validate(&self, _height: i64, commit_info: &ExtendedCommitInfo) -> anyhow::Result<()> {
        // Wide arithmetic: the sum and the 3x scaling must not overflow for
        // adversarially large powers.
        let signed_power: i128 = commit_info
            .votes
            .iter()
            .filter(|v| v.block_id_flag == BlockIdFlag::Commit)
            .map(|v| i128::from(v.validator.power))
            .sum();

        if 3 * signed_power < 2 * i128::from(self.total_power) {
            anyhow::bail!(
                "insufficient cumulative voting power: got {}, total {}",
                signed_power,
                self.total_power
            );
        }

        Ok(())
    }
}

/// Validates the extended commit info attached to prepare/process proposal
/// requests. Both entry points share one core: supermajority first, then
/// per-vote decode + price validation, failing fast on the first violation.
pub struct ProposalHandler {
    codec: Arc<dyn VoteExtensionCodec>,
    strategy: Arc<dyn CurrencyPairStrategy>,
    supermajority: Arc<dyn SupermajorityCheck>,
}

impl ProposalHandler {
    pub fn new(
        codec: Arc<dyn VoteExtensionCodec>,
        strategy: Arc<dyn CurrencyPairStrategy>,
        supermajority: Arc<dyn SupermajorityCheck>,
    ) -> Self {
        Self {
            codec,
            strategy,
            supermajority,
        }
    }

    /// Validation run in PrepareProposal: supermajority, then every oracle
    /// vote extension must decode and carry valid prices.
    pub fn validate_extended_commit_info_prepare(
        &self,
        height: i64,
        extended_commit_info: &ExtendedCommitInfo,
    ) -> Result<(), ProposalError> {
        self.check_supermajority(height, extended_commit_info)?;
        self.validate_votes(height, extended_commit_info)
    }

    /// Validation run in ProcessProposal: everything the prepare path does,
    /// plus every extended-commit vote must have a matching entry in the
    /// proposer's own last-commit record. A validator present here but
    /// absent there means the proposer injected or fabricated extension
    /// votes from validators who did not sign the referenced block.
    ///
    /// Assumes the caller has already confirmed the request is well-formed.
    pub fn validate_extended_commit_info_process(
        &self,
        request: &ProcessProposalRequest,
        extended_commit_info: &ExtendedCommitInfo,
    ) -> Result<(), ProposalError> {
        self.check_supermajority(request.height, extended_commit_info)?;

        let request_commits: HashMap<&[u8], &VoteInfo> = request
            .proposed_last_commit
            .votes
            .iter()
            .map(|v| (v.validator.address.as_slice(), v))
            .collect();

        for vote in &extended_commit_info.votes {
            if !request_commits.contains_key(vote.validator.address.as_slice()) {
                tracing::error!(
                    height = request.height,
                    validator = %vote.validator.address_hex(),
                    "no vote for validator in extended commit found in proposed last commit"
                );

                return Err(ProposalError::MissingLastCommitVote {
                    validator: vote.validator.address_hex(),
                });
            }
        }

        self.validate_votes(request.height, extended_commit_info)
    }

    fn check_supermajority(
        &self,
        height: i64,
        extended_commit_info: &ExtendedCommitInfo,
    ) -> Result<(), ProposalError> {
        if let Err(err) = self.supermajority.validate(height, extended_commit_info) {
            tracing::error!(
                height,
                err = %err,
                "failed to validate vote extensions; vote extensions may not comprise a supermajority"
            );

            return Err(ProposalError::Supermajority {
                height,
                reason: err,
            });
        }

        Ok(())
    }

    fn validate_votes(
        &self,
        height: i64,
        extended_commit_info: &ExtendedCommitInfo,
    ) -> Result<(), ProposalError> {
        for vote in &extended_commit_info.votes {
            let address = vote.validator.address_hex();

            // The vote extensions are from the previous block.
            let decoded = self
                .codec
                .decode(&vote.vote_extension)
                .map_err(|source| ProposalError::VoteDecode {
                    validator: address.clone(),
                    source,
                })?;

            if let Err(source) =
                validate_oracle_vote_extension(&decoded, height, self.strategy.as_ref())
            {
                tracing::error!(
                    height,
                    validator = %address,
                    err = %source,
                    "failed to validate oracle vote extension"
                );

                return Err(ProposalError::InvalidVote {
                    validator: address,
                    source,
                });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{DecodedVoteExtension, JsonVoteExtensionCodec};
    use crate::error::CodecError;
    use crate::types::{CommitInfo, ExtendedVoteInfo, Pair, Validator};
    use num_bigint::BigInt;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct AcceptAllPairs;

    impl CurrencyPairStrategy for AcceptAllPairs {
        fn pair_from_id(&self, _height: i64, _id: u64) -> Option<Pair> {
            Some(Pair::new("BTC", "USD"))
        }

        fn max_price_bytes(&self, _height: i64) -> usize {
            crate::votes::MAX_PRICE_BYTES
        }
    }

    /// Codec that counts decode calls, to prove short-circuiting
    struct CountingCodec {
        inner: JsonVoteExtensionCodec,
        decodes: AtomicUsize,
    }

    impl VoteExtensionCodec for CountingCodec {
        fn encode(&self, vote: &DecodedVoteExtension) -> Result<Vec<u8>, CodecError> {
            self.inner.encode(vote)
        }

        fn decode(&self, bytes: &[u8]) -> Result<DecodedVoteExtension, CodecError> {
            self.decodes.fetch_add(1, Ordering::SeqCst);
            self.inner.decode(bytes)
        }
    }

    fn extension(entries: &[(u64, i64)]) -> Vec<u8> {
        let vote = DecodedVoteExtension {
            prices: entries
                .iter()
                .map(|(id, p)| (*id, BigInt::from(*p)))
                .collect::<BTreeMap<_, _>>(),
        };
        JsonVoteExtensionCodec.encode(&vote).unwrap()
    }

    fn vote(address: u8, power: i64, extension_bytes: Vec<u8>) -> ExtendedVoteInfo {
        ExtendedVoteInfo {
            validator: Validator::new(vec![address; 20], power),
            vote_extension: extension_bytes,
            block_id_flag: BlockIdFlag::Commit,
        }
    }

    fn handler(total_power: i64) -> ProposalHandler {
        ProposalHandler::new(
            Arc::new(JsonVoteExtensionCodec),
            Arc::new(AcceptAllPairs),
            Arc::new(PowerThresholdCheck::new(total_power)),
        )
    }

    #[test]
    fn test_prepare_accepts_supermajority_with_valid_votes() {
        let handler = handler(30);
        let commit = ExtendedCommitInfo {
            round: 0,
            votes: vec![
                vote(1, 10, extension(&[(0, 50_000)])),
                vote(2, 10, extension(&[(0, 50_100)])),
                vote(3, 10, extension(&[(0, 49_900)])),
            ],
        };

        assert!(handler
            .validate_extended_commit_info_prepare(5, &commit)
            .is_ok());
    }

    #[test]
    fn test_prepare_rejects_below_supermajority_without_decoding() {
        let codec = Arc::new(CountingCodec {
            inner: JsonVoteExtensionCodec,
            decodes: AtomicUsize::new(0),
        });
        let handler = ProposalHandler::new(
            codec.clone(),
            Arc::new(AcceptAllPairs),
            Arc::new(PowerThresholdCheck::new(100)),
        );

        // 30 of 100 power signed: well below 2/3
        let commit = ExtendedCommitInfo {
            round: 0,
            votes: vec![
                vote(1, 10, extension(&[(0, 1)])),
                vote(2, 10, extension(&[(0, 1)])),
                vote(3, 10, extension(&[(0, 1)])),
            ],
        };

        let err = handler
            .validate_extended_commit_info_prepare(5, &commit)
            .unwrap_err();
        assert!(matches!(err, ProposalError::Supermajority { height: 5, .. }));
        assert_eq!(codec.decodes.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_power_check_survives_extreme_voting_power() {
        let check = PowerThresholdCheck::new(i64::MAX);
        let commit = ExtendedCommitInfo {
            round: 0,
            votes: vec![
                vote(1, i64::MAX / 2, vec![]),
                vote(2, i64::MAX / 2, vec![]),
                vote(3, i64::MAX / 2, vec![]),
            ],
        };

        // 1.5x total power signed; must pass without overflowing
        assert!(check.validate(1, &commit).is_ok());

        let minority = ExtendedCommitInfo {
            round: 0,
            votes: vec![vote(1, i64::MAX / 2, vec![])],
        };
        assert!(check.validate(1, &minority).is_err());
    }

    #[test]
    fn test_non_commit_votes_do_not_count_toward_power() {
        let check = PowerThresholdCheck::new(30);
        let mut absent = vote(1, 30, vec![]);
        absent.block_id_flag = BlockIdFlag::Absent;
        let commit = ExtendedCommitInfo {
            round: 0,
            votes: vec![absent],
        };

        assert!(check.validate(1, &commit).is_err());
    }

    #[test]
    fn test_prepare_rejects_undecodable_extension() {
        let handler = handler(10);
        let commit = ExtendedCommitInfo {
            round: 0,
            votes: vec![vote(1, 10, b"garbage".to_vec())],
        };

        let err = handler
            .validate_extended_commit_info_prepare(5, &commit)
            .unwrap_err();
        assert!(matches!(err, ProposalError::VoteDecode { .. }));
    }

    #[test]
    fn test_prepare_rejects_vote_with_negative_price() {
        let handler = handler(20);
        let commit = ExtendedCommitInfo {
            round: 0,
            votes: vec![
                vote(1, 10, extension(&[(0, 100)])),
                vote(2, 10, extension(&[(0, 100), (1, -5)])),
            ],
        };

        let err = handler
            .validate_extended_commit_info_prepare(5, &commit)
            .unwrap_err();
        match err {
            ProposalError::InvalidVote { validator, .. } => {
                assert_eq!(validator, hex::encode(vec![2u8; 20]));
            }
            other => panic!("expected InvalidVote, got {other:?}"),
        }
    }

    #[test]
    fn test_process_rejects_vote_missing_from_last_commit() {
        let handler = handler(20);
        let commit = ExtendedCommitInfo {
            round: 0,
            votes: vec![
                vote(1, 10, extension(&[(0, 100)])),
                vote(2, 10, extension(&[(0, 100)])),
            ],
        };

        // Proposer's record only contains validator 1
        let request = ProcessProposalRequest {
            height: 9,
            proposed_last_commit: CommitInfo {
                round: 0,
                votes: vec![VoteInfo {
                    validator: Validator::new(vec![1u8; 20], 10),
                    block_id_flag: BlockIdFlag::Commit,
                }],
            },
        };

        let err = handler
            .validate_extended_commit_info_process(&request, &commit)
            .unwrap_err();
        match err {
            ProposalError::MissingLastCommitVote { validator } => {
                assert_eq!(validator, hex::encode(vec![2u8; 20]));
            }
            other => panic!("expected MissingLastCommitVote, got {other:?}"),
        }
    }

    #[test]
    fn test_process_accepts_cross_referenced_votes() {
        let handler = handler(20);
        let commit = ExtendedCommitInfo {
            round: 0,
            votes: vec![
                vote(1, 10, extension(&[(0, 100)])),
                vote(2, 10, extension(&[(0, 101)])),
            ],
        };

        let request = ProcessProposalRequest {
            height: 9,
            proposed_last_commit: CommitInfo {
                round: 0,
                votes: vec![
                    VoteInfo {
                        validator: Validator::new(vec![1u8; 20], 10),
                        block_id_flag: BlockIdFlag::Commit,
                    },
                    VoteInfo {
                        validator: Validator::new(vec![2u8; 20], 10),
                        block_id_flag: BlockIdFlag::Commit,
                    },
                ],
            },
        };

        assert!(handler
            .validate_extended_commit_info_process(&request, &commit)
            .is_ok());
    }
}
