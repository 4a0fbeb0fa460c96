//! Record status and outcome polarity.

use crate::TallyError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle status of a record.
///
/// Monotonic: `Pending` moves to exactly one terminal value and never changes again.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    /// Still collecting votes.
    Pending,
    /// Finalized: enough voters agreed the record is correct.
    Verified,
    /// Finalized: enough voters agreed the record is incorrect.
    Rejected,
}

impl RecordStatus {
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    pub fn is_terminal(&self) -> bool {
        !self.is_pending()
    }

    /// The polarity this status was finalized with, if any.
    pub fn polarity(&self) -> Option<Polarity> {
        match self {
            Self::Pending => None,
            Self::Verified => Some(Polarity::Verified),
            Self::Rejected => Some(Polarity::Rejected),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Verified => "verified",
            Self::Rejected => "rejected",
        }
    }
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordStatus {
    type Err = TallyError;

    /// Accepts the legacy `verified_correct` / `verified_incorrect` spellings too.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "verified" | "verified_correct" => Ok(Self::Verified),
            "rejected" | "verified_incorrect" => Ok(Self::Rejected),
            _ => Err(TallyError::UnknownStatus(s.to_string())),
        }
    }
}

/// Which terminal outcome a tally is progressing toward.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
    Verified,
    Rejected,
}

impl Polarity {
    pub const ALL: [Polarity; 2] = [Polarity::Verified, Polarity::Rejected];

    /// `true` verdicts push toward `Verified`, `false` toward `Rejected`.
    pub fn from_verdict(verdict: bool) -> Self {
        if verdict {
            Self::Verified
        } else {
            Self::Rejected
        }
    }

    pub fn verdict(&self) -> bool {
        matches!(self, Self::Verified)
    }

    /// The terminal record status a finalization of this polarity produces.
    pub fn terminal_status(&self) -> RecordStatus {
        match self {
            Self::Verified => RecordStatus::Verified,
            Self::Rejected => RecordStatus::Rejected,
        }
    }

    /// Single-byte tag used in storage keys.
    pub fn tag(&self) -> u8 {
        match self {
            Self::Verified => b'V',
            Self::Rejected => b'R',
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Verified => "verified",
            Self::Rejected => "rejected",
        }
    }
}

impl fmt::Display for Polarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Polarity {
    type Err = TallyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "verified" | "correct" => Ok(Self::Verified),
            "rejected" | "incorrect" => Ok(Self::Rejected),
            _ => Err(TallyError::UnknownPolarity(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verdict_maps_to_polarity_and_status() {
        assert_eq!(Polarity::from_verdict(true).terminal_status(), RecordStatus::Verified);
        assert_eq!(Polarity::from_verdict(false).terminal_status(), RecordStatus::Rejected);
        assert!(Polarity::Verified.verdict());
        assert!(!Polarity::Rejected.verdict());
    }

    #[test]
    fn status_polarity_is_none_only_when_pending() {
        assert_eq!(RecordStatus::Pending.polarity(), None);
        assert_eq!(RecordStatus::Verified.polarity(), Some(Polarity::Verified));
        assert_eq!(RecordStatus::Rejected.polarity(), Some(Polarity::Rejected));
        assert!(RecordStatus::Rejected.is_terminal());
    }

    #[test]
    fn legacy_status_names_parse() {
        assert_eq!("verified_correct".parse(), Ok(RecordStatus::Verified));
        assert_eq!("verified_incorrect".parse(), Ok(RecordStatus::Rejected));
        assert!("done".parse::<RecordStatus>().is_err());
    }

    #[test]
    fn polarity_tags_are_distinct() {
        assert_ne!(Polarity::Verified.tag(), Polarity::Rejected.tag());
    }
}
