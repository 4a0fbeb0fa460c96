//! LMDB implementation of VoteStore.
//!
//! Votes use composite keys `seg(record) ++ vote_seq` so listing all votes on a
//! record is a prefix range-scan in append order. Two side tables are kept in
//! the same write transaction as every append:
//!
//! - `tallies`: `seg(record) ++ verdict` → count, so tallying is a point read;
//! - `voter_index`: `seg(record) ++ seg(voter)` → first vote id, so the
//!   one-vote-per-voter check is a point read inside the append transaction.

use std::collections::BTreeSet;
use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env, RwTxn};

use tally_store::vote::VoteStore;
use tally_store::StoreError;
use tally_types::{Ballot, RecordId, Vote, VoteId, VoterId};

use crate::keys::{push_segment, range_scan, read_u64, segment, NEXT_VOTE_ID_KEY};
use crate::LmdbError;

pub struct LmdbVoteStore {
    pub(crate) env: Arc<Env>,
    pub(crate) votes_db: Database<Bytes, Bytes>,
    pub(crate) voter_index_db: Database<Bytes, Bytes>,
    pub(crate) tallies_db: Database<Bytes, Bytes>,
    pub(crate) meta_db: Database<Bytes, Bytes>,
}

fn tally_key(record: &RecordId, verdict: bool) -> Vec<u8> {
    let mut key = segment(record.as_str().as_bytes());
    key.push(verdict as u8);
    key
}

fn voter_key(record: &RecordId, voter: &VoterId) -> Vec<u8> {
    let mut key = segment(record.as_str().as_bytes());
    push_segment(&mut key, voter.as_str().as_bytes());
    key
}

impl LmdbVoteStore {
    /// Write the vote and its side-table entries. The caller commits.
    fn append_in(&self, wtxn: &mut RwTxn<'_>, ballot: &Ballot) -> Result<VoteId, LmdbError> {
        let seq = read_u64(&self.meta_db, wtxn, NEXT_VOTE_ID_KEY)?.unwrap_or(1);
        let id = VoteId::new(seq);
        let vote = Vote::from_ballot(id, ballot);

        let mut key = segment(ballot.record.as_str().as_bytes());
        key.extend_from_slice(&seq.to_be_bytes());
        let bytes = bincode::serialize(&vote)?;
        self.votes_db.put(wtxn, &key, &bytes)?;

        let tkey = tally_key(&ballot.record, ballot.verdict);
        let count = read_u64(&self.tallies_db, wtxn, &tkey)?.unwrap_or(0) + 1;
        self.tallies_db.put(wtxn, &tkey, &count.to_be_bytes())?;

        let vkey = voter_key(&ballot.record, &ballot.voter);
        if self.voter_index_db.get(wtxn, &vkey)?.is_none() {
            self.voter_index_db.put(wtxn, &vkey, &seq.to_be_bytes())?;
        }

        self.meta_db
            .put(wtxn, NEXT_VOTE_ID_KEY, &(seq + 1).to_be_bytes())?;
        Ok(id)
    }
}

impl VoteStore for LmdbVoteStore {
    fn append(&self, ballot: &Ballot) -> Result<VoteId, StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let id = self.append_in(&mut wtxn, ballot)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(id)
    }

    fn append_unique(&self, ballot: &Ballot) -> Result<Option<VoteId>, StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let vkey = voter_key(&ballot.record, &ballot.voter);
        if self
            .voter_index_db
            .get(&wtxn, &vkey)
            .map_err(LmdbError::from)?
            .is_some()
        {
            return Ok(None);
        }
        let id = self.append_in(&mut wtxn, ballot)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(Some(id))
    }

    fn count_where(&self, record: &RecordId, verdict: bool) -> Result<u64, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let count = read_u64(&self.tallies_db, &rtxn, &tally_key(record, verdict))?;
        Ok(count.unwrap_or(0))
    }

    fn voters_where(
        &self,
        record: &RecordId,
        verdict: bool,
    ) -> Result<BTreeSet<VoterId>, StoreError> {
        Ok(self
            .votes_for(record)?
            .into_iter()
            .filter(|v| v.verdict == verdict)
            .map(|v| v.voter)
            .collect())
    }

    fn votes_for(&self, record: &RecordId) -> Result<Vec<Vote>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let prefix = segment(record.as_str().as_bytes());
        let entries = range_scan(&self.votes_db, &rtxn, &prefix)?;
        let mut votes = Vec::with_capacity(entries.len());
        for (_key, val) in entries {
            let vote: Vote = bincode::deserialize(&val).map_err(LmdbError::from)?;
            votes.push(vote);
        }
        Ok(votes)
    }
}
