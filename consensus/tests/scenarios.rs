//! End-to-end voting scenarios against both storage backends.

use std::collections::BTreeSet;
use std::sync::Arc;

use tally_consensus::{ConsensusEngine, ConsensusError, Stores, VoteOutcome};
use tally_nullables::NullStore;
use tally_store::{OutcomeStore, RecordStore, RewardLedger, VoteStore};
use tally_store_lmdb::environment::DATABASE_COUNT;
use tally_store_lmdb::LmdbEnvironment;
use tally_types::{ConsensusParams, Polarity, Record, RecordId, RecordStatus, VoterId};

struct Harness {
    engine: ConsensusEngine,
    stores: Stores,
    _dir: Option<tempfile::TempDir>,
}

fn null_harness() -> Harness {
    let stores = Stores::shared(Arc::new(NullStore::new()));
    Harness {
        engine: ConsensusEngine::new(stores.clone(), ConsensusParams::default()).unwrap(),
        stores,
        _dir: None,
    }
}

fn lmdb_harness() -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let env = LmdbEnvironment::open(dir.path(), DATABASE_COUNT, 1 << 24).unwrap();
    let stores = Stores {
        records: Arc::new(env.record_store()),
        votes: Arc::new(env.vote_store()),
        outcomes: Arc::new(env.outcome_store()),
        rewards: Arc::new(env.reward_ledger()),
    };
    Harness {
        engine: ConsensusEngine::new(stores.clone(), ConsensusParams::default()).unwrap(),
        stores,
        _dir: Some(dir),
    }
}

fn harnesses() -> Vec<(&'static str, Harness)> {
    vec![("null", null_harness()), ("lmdb", lmdb_harness())]
}

fn seed(h: &Harness, id: &str) -> RecordId {
    let id = RecordId::new(id);
    h.stores
        .records
        .insert_record(&Record::pending(id.clone(), "Paris", "France"))
        .unwrap();
    id
}

fn v(name: &str) -> VoterId {
    VoterId::new(name)
}

fn points(h: &Harness, name: &str) -> u64 {
    h.stores.rewards.points(&v(name)).unwrap()
}

fn status(h: &Harness, id: &RecordId) -> RecordStatus {
    h.stores.records.get_record(id).unwrap().unwrap().status
}

/// Three agreeing votes verify the record and reward all three voters.
fn scenario_a(h: &Harness) -> RecordId {
    let r = seed(h, "rec-a");
    assert_eq!(h.engine.submit_vote(&v("u1"), &r, true).unwrap(), VoteOutcome::Recorded);
    assert_eq!(h.engine.submit_vote(&v("u2"), &r, true).unwrap(), VoteOutcome::Recorded);
    assert_eq!(
        h.engine.submit_vote(&v("u3"), &r, true).unwrap(),
        VoteOutcome::RecordedAndFinalized(Polarity::Verified)
    );
    r
}

#[test]
fn scenario_a_three_true_votes_verify() {
    for (name, h) in harnesses() {
        let r = scenario_a(&h);
        assert_eq!(status(&h, &r), RecordStatus::Verified, "{name}");

        let stored = h.stores.outcomes.get(&r, Polarity::Verified).unwrap().unwrap();
        assert_eq!(
            stored.artifact.contributors,
            BTreeSet::from([v("u1"), v("u2"), v("u3")]),
            "{name}"
        );
        assert_eq!(stored.artifact.data_1, "Paris");
        assert_eq!(stored.artifact.data_2, "France");
        for voter in ["u1", "u2", "u3"] {
            assert_eq!(points(&h, voter), 1, "{name}: {voter}");
        }
    }
}

#[test]
fn scenario_b_late_opposite_vote_is_recorded_only() {
    for (name, h) in harnesses() {
        let r = scenario_a(&h);
        assert_eq!(
            h.engine.submit_vote(&v("u4"), &r, false).unwrap(),
            VoteOutcome::Recorded,
            "{name}"
        );
        assert_eq!(h.stores.votes.votes_for(&r).unwrap().len(), 4, "{name}");
        assert_eq!(status(&h, &r), RecordStatus::Verified, "{name}");
        assert!(!h.stores.outcomes.exists(&r, Polarity::Rejected).unwrap(), "{name}");
        assert_eq!(points(&h, "u4"), 0, "{name}");
    }
}

#[test]
fn scenario_c_rejection_after_mixed_votes() {
    for (name, h) in harnesses() {
        let r = seed(&h, "rec-c");
        h.engine.submit_vote(&v("u1"), &r, true).unwrap();
        h.engine.submit_vote(&v("u2"), &r, false).unwrap();
        assert_eq!(h.engine.submit_vote(&v("u3"), &r, false).unwrap(), VoteOutcome::Recorded);
        assert_eq!(
            h.engine.submit_vote(&v("u4"), &r, false).unwrap(),
            VoteOutcome::RecordedAndFinalized(Polarity::Rejected),
            "{name}"
        );

        assert_eq!(status(&h, &r), RecordStatus::Rejected, "{name}");
        assert!(!h.stores.outcomes.exists(&r, Polarity::Verified).unwrap());
        assert_eq!(points(&h, "u1"), 0, "{name}");
        for voter in ["u2", "u3", "u4"] {
            assert_eq!(points(&h, voter), 1, "{name}: {voter}");
        }
    }
}

#[test]
fn many_late_opposite_votes_never_flip_status() {
    for (name, h) in harnesses() {
        let r = scenario_a(&h);
        for i in 0..6 {
            let outcome = h.engine.submit_vote(&v(&format!("late{i}")), &r, false).unwrap();
            assert_eq!(outcome, VoteOutcome::Recorded, "{name}");
        }
        assert_eq!(status(&h, &r), RecordStatus::Verified, "{name}");
        assert!(h.stores.outcomes.list(Polarity::Rejected).unwrap().is_empty());
    }
}

#[test]
fn later_matching_votes_do_not_refinalize_or_reward() {
    for (name, h) in harnesses() {
        let r = scenario_a(&h);
        assert_eq!(
            h.engine.submit_vote(&v("u5"), &r, true).unwrap(),
            VoteOutcome::Recorded,
            "{name}"
        );
        assert_eq!(points(&h, "u5"), 0, "{name}");
        assert_eq!(points(&h, "u1"), 1, "{name}");
        assert_eq!(h.stores.outcomes.list(Polarity::Verified).unwrap().len(), 1);
    }
}

#[test]
fn unknown_record_is_rejected_without_mutation() {
    for (name, h) in harnesses() {
        let ghost = RecordId::new("ghost");
        let err = h.engine.submit_vote(&v("u1"), &ghost, true).unwrap_err();
        assert!(matches!(err, ConsensusError::RecordNotFound(_)), "{name}");
        assert!(h.stores.votes.votes_for(&ghost).unwrap().is_empty(), "{name}");
    }
}

#[test]
fn points_accumulate_across_records() {
    for (name, h) in harnesses() {
        let r1 = seed(&h, "one");
        let r2 = seed(&h, "two");
        for r in [&r1, &r2] {
            for voter in ["u1", "u2", "u3"] {
                h.engine.submit_vote(&v(voter), r, true).unwrap();
            }
        }
        assert_eq!(points(&h, "u1"), 2, "{name}");
        assert_eq!(h.stores.outcomes.list(Polarity::Verified).unwrap().len(), 2);
    }
}
