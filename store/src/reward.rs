//! Reward ledger trait.

use crate::StoreError;
use tally_types::{RecordId, VoterId};

/// Per-user point balances, credited at most once per `(user, record)`.
pub trait RewardLedger {
    /// Credit `amount` points to `user` for `record` unless that pair was
    /// already credited. The history check and the increment are one atomic
    /// step. Returns whether points were added.
    fn award_once(&self, user: &VoterId, record: &RecordId, amount: u64)
        -> Result<bool, StoreError>;

    /// Current balance; `0` for users never rewarded.
    fn points(&self, user: &VoterId) -> Result<u64, StoreError>;

    fn has_award(&self, user: &VoterId, record: &RecordId) -> Result<bool, StoreError>;
}
