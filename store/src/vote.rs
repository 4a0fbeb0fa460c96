//! Vote ledger trait.

use crate::StoreError;
use std::collections::BTreeSet;
use tally_types::{Ballot, RecordId, Vote, VoteId, VoterId};

/// Append-only ledger of votes.
///
/// Writes are visible to reads issued afterwards by the same caller.
pub trait VoteStore {
    /// Append a vote unconditionally.
    fn append(&self, ballot: &Ballot) -> Result<VoteId, StoreError>;

    /// Append a vote only if `ballot.voter` has never voted on `ballot.record`.
    /// Returns `None` (and writes nothing) otherwise.
    fn append_unique(&self, ballot: &Ballot) -> Result<Option<VoteId>, StoreError>;

    /// Number of votes on `record` with the given verdict, repeats included.
    fn count_where(&self, record: &RecordId, verdict: bool) -> Result<u64, StoreError>;

    /// Distinct voters who cast the given verdict on `record`.
    fn voters_where(&self, record: &RecordId, verdict: bool)
        -> Result<BTreeSet<VoterId>, StoreError>;

    /// All votes on `record` in append order.
    fn votes_for(&self, record: &RecordId) -> Result<Vec<Vote>, StoreError>;
}
