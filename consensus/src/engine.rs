//! Vote submission path.
//!
//! Submissions share no in-process lock. Every step that guards an invariant is
//! a single conditional write in the store:
//!
//! 1. `RecordStore::finalize_status` — pending → terminal, at most once;
//! 2. `OutcomeStore::create` — one artifact per `(record, polarity)`; the caller
//!    that creates it is the one that issues rewards and reports finalization;
//! 3. `RewardLedger::award_once` — one credit per `(voter, record)`.
//!
//! A submission that fails between (1) and (3) leaves a terminal record whose
//! artifact or rewards are missing. The next vote with the finalized polarity
//! completes the missing steps, so retrying a failed submission converges.

use std::collections::BTreeSet;
use std::sync::Arc;

use tally_store::{CreateOutcome, OutcomeStore, RecordStore, RewardLedger, VoteStore};
use tally_types::{
    Ballot, ConsensusParams, OutcomeArtifact, Polarity, Record, RecordId, RecordStatus,
    Timestamp, VoterId,
};

use crate::error::ConsensusError;
use crate::outcome::VoteOutcome;
use crate::transition::next_status;

/// The four stores the engine writes to.
#[derive(Clone)]
pub struct Stores {
    pub records: Arc<dyn RecordStore + Send + Sync>,
    pub votes: Arc<dyn VoteStore + Send + Sync>,
    pub outcomes: Arc<dyn OutcomeStore + Send + Sync>,
    pub rewards: Arc<dyn RewardLedger + Send + Sync>,
}

impl Stores {
    /// Use one backend for all four roles.
    pub fn shared<S>(store: Arc<S>) -> Self
    where
        S: RecordStore + VoteStore + OutcomeStore + RewardLedger + Send + Sync + 'static,
    {
        Self {
            records: store.clone(),
            votes: store.clone(),
            outcomes: store.clone(),
            rewards: store,
        }
    }
}

/// Vote counts and status of one record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordTally {
    pub record: Record,
    pub approvals: u64,
    pub rejections: u64,
}

/// Turns vote submissions into record finalizations.
pub struct ConsensusEngine {
    stores: Stores,
    params: ConsensusParams,
}

impl ConsensusEngine {
    pub fn new(stores: Stores, params: ConsensusParams) -> Result<Self, ConsensusError> {
        params.validate()?;
        Ok(Self { stores, params })
    }

    pub fn stores(&self) -> &Stores {
        &self.stores
    }

    /// Record `voter`'s verdict on `record`, finalizing the record if this vote
    /// pushes its tally over the threshold.
    pub fn submit_vote(
        &self,
        voter: &VoterId,
        record: &RecordId,
        verdict: bool,
    ) -> Result<VoteOutcome, ConsensusError> {
        self.submit_vote_at(voter, record, verdict, Timestamp::now())
    }

    /// [`submit_vote`](Self::submit_vote) with an explicit clock reading.
    pub fn submit_vote_at(
        &self,
        voter: &VoterId,
        record: &RecordId,
        verdict: bool,
        now: Timestamp,
    ) -> Result<VoteOutcome, ConsensusError> {
        let snapshot = self
            .stores
            .records
            .get_record(record)?
            .ok_or_else(|| ConsensusError::RecordNotFound(record.clone()))?;

        // Reads the snapshot, so a concurrent finalization can slip past this
        // check. Such a vote is appended but cannot move status or rewards.
        if snapshot.status.is_terminal() && !self.params.accept_votes_on_finalized {
            return Err(ConsensusError::RecordFinalized {
                record: record.clone(),
                status: snapshot.status,
            });
        }

        let ballot = Ballot {
            voter: voter.clone(),
            record: record.clone(),
            verdict,
            cast_at: now,
        };
        let vote_id = if self.params.one_vote_per_voter {
            self.stores
                .votes
                .append_unique(&ballot)?
                .ok_or_else(|| ConsensusError::DuplicateVote {
                    voter: voter.clone(),
                    record: record.clone(),
                })?
        } else {
            self.stores.votes.append(&ballot)?
        };

        let polarity = ballot.polarity();
        let matching = self.stores.votes.count_where(record, verdict)?;
        tracing::debug!(
            %voter,
            %record,
            verdict,
            %vote_id,
            matching,
            threshold = self.params.threshold,
            "vote recorded"
        );

        if !self.params.is_crossed(matching) {
            return Ok(VoteOutcome::Recorded);
        }

        let status = match next_status(snapshot.status, polarity, matching, self.params.threshold)
        {
            Some(terminal) => self
                .stores
                .records
                .finalize_status(record, terminal)?
                .resulting_status(terminal),
            // Terminal in the snapshot, so terminal now.
            None => snapshot.status,
        };
        if status != polarity.terminal_status() {
            return Ok(VoteOutcome::Recorded);
        }

        self.materialize(&snapshot, polarity, now)
    }

    /// Write the artifact for a record already finalized with `polarity`, and
    /// reward its contributors. Only the caller whose create succeeds reports
    /// the finalization.
    fn materialize(
        &self,
        record: &Record,
        polarity: Polarity,
        now: Timestamp,
    ) -> Result<VoteOutcome, ConsensusError> {
        if let Some(existing) = self.stores.outcomes.get(&record.id, polarity)? {
            self.settle_rewards(&record.id, &existing.artifact.contributors)?;
            return Ok(VoteOutcome::Recorded);
        }

        let contributors = self
            .stores
            .votes
            .voters_where(&record.id, polarity.verdict())?;
        let artifact = OutcomeArtifact::new(record, polarity, contributors, now);

        match self.stores.outcomes.create(&artifact)? {
            CreateOutcome::AlreadyExists => {
                tracing::warn!(
                    record = %record.id,
                    %polarity,
                    "artifact created concurrently, skipping rewards"
                );
                Ok(VoteOutcome::Recorded)
            }
            CreateOutcome::Created(artifact_id) => {
                let awarded = self.settle_rewards(&record.id, &artifact.contributors)?;
                tracing::info!(
                    record = %record.id,
                    %polarity,
                    %artifact_id,
                    contributors = artifact.contributors.len(),
                    awarded,
                    reward = self.params.reward_amount,
                    "record finalized"
                );
                Ok(VoteOutcome::RecordedAndFinalized(polarity))
            }
        }
    }

    /// Credit every contributor that has not been credited for `record` yet.
    /// Returns how many were credited by this call.
    fn settle_rewards(
        &self,
        record: &RecordId,
        contributors: &BTreeSet<VoterId>,
    ) -> Result<usize, ConsensusError> {
        let mut awarded = 0;
        for voter in contributors {
            if self.stores.rewards.has_award(voter, record)? {
                continue;
            }
            if self
                .stores
                .rewards
                .award_once(voter, record, self.params.reward_amount)?
            {
                awarded += 1;
            }
        }
        Ok(awarded)
    }

    /// Current status and vote counts of a record.
    pub fn tally(&self, record: &RecordId) -> Result<RecordTally, ConsensusError> {
        let snapshot = self
            .stores
            .records
            .get_record(record)?
            .ok_or_else(|| ConsensusError::RecordNotFound(record.clone()))?;
        Ok(RecordTally {
            approvals: self.stores.votes.count_where(record, true)?,
            rejections: self.stores.votes.count_where(record, false)?,
            record: snapshot,
        })
    }

    /// Status of a record, if it exists.
    pub fn status(&self, record: &RecordId) -> Result<Option<RecordStatus>, ConsensusError> {
        Ok(self.stores.records.get_record(record)?.map(|r| r.status))
    }
}
