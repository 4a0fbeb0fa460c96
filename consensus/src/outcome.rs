//! Submission results.

use serde::{Deserialize, Serialize};
use tally_types::Polarity;

/// What a successful vote submission did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VoteOutcome {
    /// The vote is in the ledger; nothing else changed.
    Recorded,
    /// The vote is in the ledger and this submission finalized the record.
    RecordedAndFinalized(Polarity),
}

impl VoteOutcome {
    pub fn finalized(&self) -> Option<Polarity> {
        match self {
            Self::Recorded => None,
            Self::RecordedAndFinalized(polarity) => Some(*polarity),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStatus {
    Recorded,
    Finalized,
}

/// External representation of a [`VoteOutcome`]:
/// `{"status": "recorded"}` or `{"status": "finalized", "finalPolarity": "verified"}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteResponse {
    pub status: SubmissionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_polarity: Option<Polarity>,
}

impl From<VoteOutcome> for VoteResponse {
    fn from(outcome: VoteOutcome) -> Self {
        match outcome {
            VoteOutcome::Recorded => Self {
                status: SubmissionStatus::Recorded,
                final_polarity: None,
            },
            VoteOutcome::RecordedAndFinalized(polarity) => Self {
                status: SubmissionStatus::Finalized,
                final_polarity: Some(polarity),
            },
        }
    }
}
