//! LMDB implementation of RewardLedger.
//!
//! `awards` holds one key per `(voter, record)` that was ever credited; the
//! balance in `balances` is only incremented in the transaction that inserts
//! that key.

use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env};

use tally_store::reward::RewardLedger;
use tally_store::StoreError;
use tally_types::{RecordId, VoterId};

use crate::keys::{read_u64, segment};
use crate::LmdbError;

pub struct LmdbRewardLedger {
    pub(crate) env: Arc<Env>,
    pub(crate) balances_db: Database<Bytes, Bytes>,
    pub(crate) awards_db: Database<Bytes, Bytes>,
}

fn award_key(user: &VoterId, record: &RecordId) -> Vec<u8> {
    let mut key = segment(user.as_str().as_bytes());
    key.extend_from_slice(record.as_str().as_bytes());
    key
}

impl RewardLedger for LmdbRewardLedger {
    fn award_once(
        &self,
        user: &VoterId,
        record: &RecordId,
        amount: u64,
    ) -> Result<bool, StoreError> {
        let akey = award_key(user, record);
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        if self
            .awards_db
            .get(&wtxn, &akey)
            .map_err(LmdbError::from)?
            .is_some()
        {
            return Ok(false);
        }

        let bkey = user.as_str().as_bytes();
        let balance = read_u64(&self.balances_db, &wtxn, bkey)?.unwrap_or(0);
        let updated = balance.checked_add(amount).ok_or_else(|| {
            StoreError::Backend(format!("point balance overflow for {user}"))
        })?;
        self.balances_db
            .put(&mut wtxn, bkey, &updated.to_be_bytes())
            .map_err(LmdbError::from)?;
        self.awards_db
            .put(&mut wtxn, &akey, &amount.to_be_bytes())
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(true)
    }

    fn points(&self, user: &VoterId) -> Result<u64, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let balance = read_u64(&self.balances_db, &rtxn, user.as_str().as_bytes())?;
        Ok(balance.unwrap_or(0))
    }

    fn has_award(&self, user: &VoterId, record: &RecordId) -> Result<bool, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let found = self
            .awards_db
            .get(&rtxn, &award_key(user, record))
            .map_err(LmdbError::from)?
            .is_some();
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::tests::open_test_env;

    #[test]
    fn award_once_is_idempotent_per_record() {
        let (_dir, env) = open_test_env();
        let ledger = env.reward_ledger();
        let alice = VoterId::new("alice");
        let r1 = RecordId::new("r1");
        let r2 = RecordId::new("r2");

        assert_eq!(ledger.points(&alice).unwrap(), 0);
        assert!(ledger.award_once(&alice, &r1, 1).unwrap());
        assert!(!ledger.award_once(&alice, &r1, 1).unwrap());
        assert!(ledger.award_once(&alice, &r2, 1).unwrap());

        assert_eq!(ledger.points(&alice).unwrap(), 2);
        assert!(ledger.has_award(&alice, &r1).unwrap());
        assert!(!ledger.has_award(&VoterId::new("bob"), &r1).unwrap());
    }

    #[test]
    fn zero_amount_still_marks_the_award() {
        let (_dir, env) = open_test_env();
        let ledger = env.reward_ledger();
        let bob = VoterId::new("bob");
        let r = RecordId::new("r1");

        assert!(ledger.award_once(&bob, &r, 0).unwrap());
        assert_eq!(ledger.points(&bob).unwrap(), 0);
        assert!(ledger.has_award(&bob, &r).unwrap());
    }

    #[test]
    fn concurrent_awards_credit_once() {
        let (_dir, env) = open_test_env();
        let ledger = env.reward_ledger();
        let carol = VoterId::new("carol");
        let r = RecordId::new("r1");

        let credited = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| s.spawn(|| ledger.award_once(&carol, &r, 3).unwrap()))
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().unwrap())
                .filter(|awarded| *awarded)
                .count()
        });

        assert_eq!(credited, 1);
        assert_eq!(ledger.points(&carol).unwrap(), 3);
    }
}
