//! Nullable store — thread-safe in-memory storage for testing.
//!
//! Each conditional write runs inside one mutex critical section, which gives
//! the same atomicity the LMDB backend gets from its write transactions.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use tally_store::outcome::{CreateOutcome, OutcomeStore};
use tally_store::record::{RecordStore, StatusChange};
use tally_store::reward::RewardLedger;
use tally_store::vote::VoteStore;
use tally_store::StoreError;
use tally_types::{
    ArtifactId, Ballot, OutcomeArtifact, Polarity, Record, RecordId, RecordStatus,
    StoredArtifact, Vote, VoteId, VoterId,
};

#[derive(Default)]
struct VoteLedger {
    votes: Vec<Vote>,
    voted: HashSet<(RecordId, VoterId)>,
}

#[derive(Default)]
struct Outcomes {
    by_key: BTreeMap<(Polarity, RecordId), StoredArtifact>,
    next_id: u64,
}

#[derive(Default)]
struct Rewards {
    balances: HashMap<VoterId, u64>,
    awarded: HashSet<(VoterId, RecordId)>,
}

/// An in-memory record + vote + outcome + reward store for testing.
/// Thread-safe for use with tokio's multi-threaded runtime.
#[derive(Default)]
pub struct NullStore {
    records: Mutex<BTreeMap<RecordId, Record>>,
    votes: Mutex<VoteLedger>,
    outcomes: Mutex<Outcomes>,
    rewards: Mutex<Rewards>,
    fail_next_create: AtomicBool,
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, StoreError> {
    mutex
        .lock()
        .map_err(|_| StoreError::Backend("null store mutex poisoned".to_string()))
}

impl NullStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next [`OutcomeStore::create`] call fail with a backend error,
    /// simulating a storage outage between the status change and the artifact write.
    pub fn fail_next_create(&self) {
        self.fail_next_create.store(true, Ordering::SeqCst);
    }

    /// Total number of votes in the ledger.
    pub fn vote_count(&self) -> usize {
        lock(&self.votes).map(|l| l.votes.len()).unwrap_or(0)
    }
}

impl RecordStore for NullStore {
    fn insert_record(&self, record: &Record) -> Result<(), StoreError> {
        let mut records = lock(&self.records)?;
        if records.contains_key(&record.id) {
            return Err(StoreError::Duplicate(record.id.clone()));
        }
        records.insert(record.id.clone(), record.clone());
        Ok(())
    }

    fn get_record(&self, id: &RecordId) -> Result<Option<Record>, StoreError> {
        Ok(lock(&self.records)?.get(id).cloned())
    }

    fn finalize_status(
        &self,
        id: &RecordId,
        terminal: RecordStatus,
    ) -> Result<StatusChange, StoreError> {
        if terminal.is_pending() {
            return Err(StoreError::Backend(
                "finalize_status requires a terminal status".to_string(),
            ));
        }
        let mut records = lock(&self.records)?;
        let record = records
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(format!("record {id}")))?;
        if record.status.is_terminal() {
            return Ok(StatusChange::Unchanged(record.status));
        }
        record.status = terminal;
        Ok(StatusChange::Transitioned)
    }

    fn next_pending(&self) -> Result<Option<Record>, StoreError> {
        Ok(lock(&self.records)?
            .values()
            .find(|r| r.status.is_pending())
            .cloned())
    }

    fn record_count(&self) -> Result<u64, StoreError> {
        Ok(lock(&self.records)?.len() as u64)
    }
}

impl VoteStore for NullStore {
    fn append(&self, ballot: &Ballot) -> Result<VoteId, StoreError> {
        let mut ledger = lock(&self.votes)?;
        let id = VoteId::new(ledger.votes.len() as u64 + 1);
        ledger.votes.push(Vote::from_ballot(id, ballot));
        ledger
            .voted
            .insert((ballot.record.clone(), ballot.voter.clone()));
        Ok(id)
    }

    fn append_unique(&self, ballot: &Ballot) -> Result<Option<VoteId>, StoreError> {
        let mut ledger = lock(&self.votes)?;
        let key = (ballot.record.clone(), ballot.voter.clone());
        if ledger.voted.contains(&key) {
            return Ok(None);
        }
        let id = VoteId::new(ledger.votes.len() as u64 + 1);
        ledger.votes.push(Vote::from_ballot(id, ballot));
        ledger.voted.insert(key);
        Ok(Some(id))
    }

    fn count_where(&self, record: &RecordId, verdict: bool) -> Result<u64, StoreError> {
        Ok(lock(&self.votes)?
            .votes
            .iter()
            .filter(|v| &v.record == record && v.verdict == verdict)
            .count() as u64)
    }

    fn voters_where(
        &self,
        record: &RecordId,
        verdict: bool,
    ) -> Result<BTreeSet<VoterId>, StoreError> {
        Ok(lock(&self.votes)?
            .votes
            .iter()
            .filter(|v| &v.record == record && v.verdict == verdict)
            .map(|v| v.voter.clone())
            .collect())
    }

    fn votes_for(&self, record: &RecordId) -> Result<Vec<Vote>, StoreError> {
        Ok(lock(&self.votes)?
            .votes
            .iter()
            .filter(|v| &v.record == record)
            .cloned()
            .collect())
    }
}

impl OutcomeStore for NullStore {
    fn exists(&self, record: &RecordId, polarity: Polarity) -> Result<bool, StoreError> {
        Ok(lock(&self.outcomes)?
            .by_key
            .contains_key(&(polarity, record.clone())))
    }

    fn create(&self, artifact: &OutcomeArtifact) -> Result<CreateOutcome, StoreError> {
        if self.fail_next_create.swap(false, Ordering::SeqCst) {
            return Err(StoreError::Backend("injected create failure".to_string()));
        }
        let mut outcomes = lock(&self.outcomes)?;
        let key = (artifact.polarity, artifact.record.clone());
        if outcomes.by_key.contains_key(&key) {
            return Ok(CreateOutcome::AlreadyExists);
        }
        outcomes.next_id += 1;
        let id = ArtifactId::new(outcomes.next_id);
        outcomes.by_key.insert(
            key,
            StoredArtifact {
                id,
                artifact: artifact.clone(),
            },
        );
        Ok(CreateOutcome::Created(id))
    }

    fn get(
        &self,
        record: &RecordId,
        polarity: Polarity,
    ) -> Result<Option<StoredArtifact>, StoreError> {
        Ok(lock(&self.outcomes)?
            .by_key
            .get(&(polarity, record.clone()))
            .cloned())
    }

    fn list(&self, polarity: Polarity) -> Result<Vec<StoredArtifact>, StoreError> {
        Ok(lock(&self.outcomes)?
            .by_key
            .iter()
            .filter(|((p, _), _)| *p == polarity)
            .map(|(_, stored)| stored.clone())
            .collect())
    }
}

impl RewardLedger for NullStore {
    fn award_once(
        &self,
        user: &VoterId,
        record: &RecordId,
        amount: u64,
    ) -> Result<bool, StoreError> {
        let mut rewards = lock(&self.rewards)?;
        if !rewards.awarded.insert((user.clone(), record.clone())) {
            return Ok(false);
        }
        *rewards.balances.entry(user.clone()).or_insert(0) += amount;
        Ok(true)
    }

    fn points(&self, user: &VoterId) -> Result<u64, StoreError> {
        Ok(lock(&self.rewards)?.balances.get(user).copied().unwrap_or(0))
    }

    fn has_award(&self, user: &VoterId, record: &RecordId) -> Result<bool, StoreError> {
        Ok(lock(&self.rewards)?
            .awarded
            .contains(&(user.clone(), record.clone())))
    }
}
