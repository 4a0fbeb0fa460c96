//! Key encoding shared by the LMDB stores.
//!
//! Variable-length ids are written with a big-endian `u16` length prefix so
//! that a prefix scan for one record can never match a longer id that merely
//! starts with the same bytes (`"r1"` vs `"r10"`).

use std::ops::Bound;

use heed::types::Bytes;
use heed::{Database, RoTxn};

use crate::LmdbError;

pub(crate) const NEXT_VOTE_ID_KEY: &[u8] = b"next_vote_id";
pub(crate) const NEXT_ARTIFACT_ID_KEY: &[u8] = b"next_artifact_id";
pub(crate) const SCHEMA_VERSION_KEY: &[u8] = b"schema_version";

/// Append `len(bytes) ++ bytes` to `key`.
pub(crate) fn push_segment(key: &mut Vec<u8>, bytes: &[u8]) {
    key.extend_from_slice(&(bytes.len() as u16).to_be_bytes());
    key.extend_from_slice(bytes);
}

pub(crate) fn segment(bytes: &[u8]) -> Vec<u8> {
    let mut key = Vec::with_capacity(2 + bytes.len());
    push_segment(&mut key, bytes);
    key
}

/// Turn `prefix` into the smallest key greater than every key starting with it.
/// Returns `false` if no such key exists (prefix was all `0xff`).
pub(crate) fn increment_prefix(prefix: &mut Vec<u8>) -> bool {
    while let Some(last) = prefix.last_mut() {
        if *last < u8::MAX {
            *last += 1;
            return true;
        }
        prefix.pop();
    }
    false
}

/// Prefix range-scan: collect all `(key, value)` pairs whose key starts with `prefix`.
pub(crate) fn range_scan(
    db: &Database<Bytes, Bytes>,
    txn: &RoTxn<'_>,
    prefix: &[u8],
) -> Result<Vec<(Vec<u8>, Vec<u8>)>, LmdbError> {
    let mut upper = prefix.to_vec();
    let upper_bound = if increment_prefix(&mut upper) {
        Bound::Excluded(upper.as_slice())
    } else {
        Bound::Unbounded
    };
    let bounds = (Bound::Included(prefix), upper_bound);
    let iter = db.range(txn, &bounds)?;
    let mut results = Vec::new();
    for result in iter {
        let (key, val) = result?;
        results.push((key.to_vec(), val.to_vec()));
    }
    Ok(results)
}

pub(crate) fn decode_u64(bytes: &[u8]) -> Result<u64, LmdbError> {
    let arr: [u8; 8] = bytes
        .try_into()
        .map_err(|_| LmdbError::Serialization("expected 8-byte counter".to_string()))?;
    Ok(u64::from_be_bytes(arr))
}

pub(crate) fn read_u64(
    db: &Database<Bytes, Bytes>,
    txn: &RoTxn<'_>,
    key: &[u8],
) -> Result<Option<u64>, LmdbError> {
    match db.get(txn, key)? {
        Some(bytes) => Ok(Some(decode_u64(bytes)?)),
        None => Ok(None),
    }
}
