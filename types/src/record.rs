//! Records under review, the votes cast on them, and finalized outcome artifacts.

use crate::{ArtifactId, Polarity, RecordId, RecordStatus, Timestamp, VoteId, VoterId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A record being judged: two opaque payload fields plus its status.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    pub data_1: String,
    pub data_2: String,
    pub status: RecordStatus,
}

impl Record {
    /// A freshly imported record awaiting votes.
    pub fn pending(id: RecordId, data_1: impl Into<String>, data_2: impl Into<String>) -> Self {
        Self {
            id,
            data_1: data_1.into(),
            data_2: data_2.into(),
            status: RecordStatus::Pending,
        }
    }
}

/// A vote that has not been written yet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ballot {
    pub voter: VoterId,
    pub record: RecordId,
    /// `true` = the record is correct.
    pub verdict: bool,
    pub cast_at: Timestamp,
}

impl Ballot {
    pub fn polarity(&self) -> Polarity {
        Polarity::from_verdict(self.verdict)
    }
}

/// A vote as stored in the ledger. Immutable once written.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    pub id: VoteId,
    pub voter: VoterId,
    pub record: RecordId,
    pub verdict: bool,
    pub cast_at: Timestamp,
}

impl Vote {
    pub fn from_ballot(id: VoteId, ballot: &Ballot) -> Self {
        Self {
            id,
            voter: ballot.voter.clone(),
            record: ballot.record.clone(),
            verdict: ballot.verdict,
            cast_at: ballot.cast_at,
        }
    }

    pub fn polarity(&self) -> Polarity {
        Polarity::from_verdict(self.verdict)
    }
}

/// Durable record of a finalized outcome.
///
/// At most one exists per `(record, polarity)`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeArtifact {
    pub record: RecordId,
    pub polarity: Polarity,
    /// Copy of the record's payload at finalization time.
    pub data_1: String,
    pub data_2: String,
    /// Distinct voters whose verdict matched the polarity.
    pub contributors: BTreeSet<VoterId>,
    pub finalized_at: Timestamp,
}

impl OutcomeArtifact {
    pub fn new(
        record: &Record,
        polarity: Polarity,
        contributors: BTreeSet<VoterId>,
        finalized_at: Timestamp,
    ) -> Self {
        Self {
            record: record.id.clone(),
            polarity,
            data_1: record.data_1.clone(),
            data_2: record.data_2.clone(),
            contributors,
            finalized_at,
        }
    }
}

/// An artifact together with the id the store assigned to it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredArtifact {
    pub id: ArtifactId,
    pub artifact: OutcomeArtifact,
}
