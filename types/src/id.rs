//! Identifier types for records, voters, votes and outcome artifacts.
//!
//! Record and voter ids are opaque strings assigned by whoever imports records or
//! manages accounts. They are length-limited so that composite storage keys stay
//! well under LMDB's key size limit.

use crate::TallyError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Maximum byte length of a record or voter id.
pub const MAX_ID_LEN: usize = 200;

fn is_valid_id(s: &str) -> bool {
    !s.is_empty() && s.len() <= MAX_ID_LEN && !s.chars().any(char::is_control)
}

/// Identifies a record under review.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RecordId(String);

impl RecordId {
    /// Create a record id from a raw string.
    ///
    /// # Panics
    /// Panics if the string is empty, longer than [`MAX_ID_LEN`] bytes, or
    /// contains control characters. Use [`RecordId::parse`] for untrusted input.
    pub fn new(raw: impl Into<String>) -> Self {
        let s = raw.into();
        assert!(is_valid_id(&s), "invalid record id: {s:?}");
        Self(s)
    }

    /// Fallible constructor for untrusted input.
    pub fn parse(raw: impl Into<String>) -> Result<Self, TallyError> {
        let s = raw.into();
        if is_valid_id(&s) {
            Ok(Self(s))
        } else {
            Err(TallyError::InvalidRecordId(s))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for RecordId {
    type Err = TallyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Identifies a voter. Credentials live elsewhere; this is only the opaque handle.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VoterId(String);

impl VoterId {
    /// Create a voter id from a raw string.
    ///
    /// # Panics
    /// Same rules as [`RecordId::new`].
    pub fn new(raw: impl Into<String>) -> Self {
        let s = raw.into();
        assert!(is_valid_id(&s), "invalid voter id: {s:?}");
        Self(s)
    }

    /// Fallible constructor for untrusted input.
    pub fn parse(raw: impl Into<String>) -> Result<Self, TallyError> {
        let s = raw.into();
        if is_valid_id(&s) {
            Ok(Self(s))
        } else {
            Err(TallyError::InvalidVoterId(s))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VoterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for VoterId {
    type Err = TallyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Store-assigned sequence number of a vote. Strictly increasing per store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VoteId(u64);

impl VoteId {
    pub fn new(seq: u64) -> Self {
        Self(seq)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for VoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "vote#{}", self.0)
    }
}

/// Store-assigned sequence number of an outcome artifact.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ArtifactId(u64);

impl ArtifactId {
    pub fn new(seq: u64) -> Self {
        Self(seq)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "artifact#{}", self.0)
    }
}
