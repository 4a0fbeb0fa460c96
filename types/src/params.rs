//! Consensus parameters — how much agreement finalizes a record and what it pays.

use crate::TallyError;
use serde::{Deserialize, Serialize};

/// Default exclusive threshold: the third matching vote finalizes.
pub const DEFAULT_THRESHOLD: u64 = 2;

/// Default points per contributor per finalized record.
pub const DEFAULT_REWARD_AMOUNT: u64 = 1;

/// Parameters read by the consensus engine.
///
/// Fixed for the lifetime of an engine; not per-record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsensusParams {
    /// A record finalizes once strictly more than this many votes agree.
    #[serde(default = "default_threshold")]
    pub threshold: u64,

    /// Points awarded to each contributing voter on finalization.
    #[serde(default = "default_reward_amount")]
    pub reward_amount: u64,

    /// Record votes on already finalized records (they never change the outcome).
    /// When `false`, a vote on a record already terminal when the vote arrives
    /// is refused without touching the ledger. A vote racing the finalizing vote
    /// may still be appended; it never changes status or rewards.
    #[serde(default = "default_true")]
    pub accept_votes_on_finalized: bool,

    /// Refuse a second vote by the same voter on the same record.
    #[serde(default)]
    pub one_vote_per_voter: bool,
}

fn default_threshold() -> u64 {
    DEFAULT_THRESHOLD
}

fn default_reward_amount() -> u64 {
    DEFAULT_REWARD_AMOUNT
}

fn default_true() -> bool {
    true
}

impl Default for ConsensusParams {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            reward_amount: DEFAULT_REWARD_AMOUNT,
            accept_votes_on_finalized: true,
            one_vote_per_voter: false,
        }
    }
}

impl ConsensusParams {
    pub fn validate(&self) -> Result<(), TallyError> {
        if self.threshold == 0 {
            return Err(TallyError::InvalidParams(
                "threshold must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Whether `matching` same-verdict votes are enough to finalize.
    pub fn is_crossed(&self, matching: u64) -> bool {
        matching > self.threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_threshold_is_exclusive() {
        let params = ConsensusParams::default();
        assert!(!params.is_crossed(2));
        assert!(params.is_crossed(3));
    }

    #[test]
    fn zero_threshold_is_invalid() {
        let params = ConsensusParams {
            threshold: 0,
            ..Default::default()
        };
        assert!(params.validate().is_err());
        assert!(ConsensusParams::default().validate().is_ok());
    }
}
