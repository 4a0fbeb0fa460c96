//! Racing submissions: finalization, artifacts and rewards happen exactly once.

use std::sync::{Arc, Barrier};

use proptest::prelude::*;

use tally_consensus::{ConsensusEngine, ConsensusError, Stores, VoteOutcome};
use tally_nullables::NullStore;
use tally_store::{OutcomeStore, RecordStore, RewardLedger, VoteStore};
use tally_store_lmdb::environment::DATABASE_COUNT;
use tally_store_lmdb::LmdbEnvironment;
use tally_types::{ConsensusParams, Polarity, Record, RecordId, RecordStatus, VoterId};

const ROUNDS: usize = 40;
const RACERS: usize = 4;

fn lmdb_stores(dir: &tempfile::TempDir) -> Stores {
    let env = LmdbEnvironment::open(dir.path(), DATABASE_COUNT, 1 << 26).unwrap();
    Stores {
        records: Arc::new(env.record_store()),
        votes: Arc::new(env.vote_store()),
        outcomes: Arc::new(env.outcome_store()),
        rewards: Arc::new(env.reward_ledger()),
    }
}

/// Two votes are in; `RACERS` threads deliver the next matching vote at once.
/// Every racer sees the tally crossed, exactly one reports the finalization.
fn race_to_finalize(stores: Stores) {
    let engine = ConsensusEngine::new(stores.clone(), ConsensusParams::default()).unwrap();

    for round in 0..ROUNDS {
        let record = RecordId::new(format!("race-{round}"));
        stores
            .records
            .insert_record(&Record::pending(record.clone(), "a", "b"))
            .unwrap();
        engine.submit_vote(&VoterId::new("early-1"), &record, true).unwrap();
        engine.submit_vote(&VoterId::new("early-2"), &record, true).unwrap();

        let barrier = Barrier::new(RACERS);
        let outcomes: Vec<VoteOutcome> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..RACERS)
                .map(|i| {
                    let engine = &engine;
                    let barrier = &barrier;
                    let record = &record;
                    s.spawn(move || {
                        let voter = VoterId::new(format!("racer-{i}"));
                        barrier.wait();
                        engine.submit_vote(&voter, record, true).unwrap()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let finalized = outcomes
            .iter()
            .filter(|o| **o == VoteOutcome::RecordedAndFinalized(Polarity::Verified))
            .count();
        assert_eq!(finalized, 1, "round {round}: {outcomes:?}");

        let stored = stores
            .outcomes
            .get(&record, Polarity::Verified)
            .unwrap()
            .unwrap();
        assert_eq!(stores.outcomes.list(Polarity::Verified).unwrap().len(), round + 1);
        assert!(!stores.outcomes.exists(&record, Polarity::Rejected).unwrap());
        assert_eq!(
            stores.records.get_record(&record).unwrap().unwrap().status,
            RecordStatus::Verified
        );
        for voter in &stored.artifact.contributors {
            assert!(stores.rewards.has_award(voter, &record).unwrap());
        }
    }

    // One credit per finalized record for the voters present in every round.
    assert_eq!(
        stores.rewards.points(&VoterId::new("early-1")).unwrap(),
        ROUNDS as u64
    );
    assert!(stores.rewards.points(&VoterId::new("racer-0")).unwrap() <= ROUNDS as u64);
}

#[test]
fn concurrent_third_votes_finalize_once_in_memory() {
    race_to_finalize(Stores::shared(Arc::new(NullStore::new())));
}

#[test]
fn concurrent_third_votes_finalize_once_on_lmdb() {
    let dir = tempfile::tempdir().unwrap();
    race_to_finalize(lmdb_stores(&dir));
}

#[test]
fn opposing_racers_finalize_exactly_one_polarity() {
    let dir = tempfile::tempdir().unwrap();
    let stores = lmdb_stores(&dir);
    let engine = ConsensusEngine::new(stores.clone(), ConsensusParams::default()).unwrap();

    for round in 0..ROUNDS {
        let record = RecordId::new(format!("split-{round}"));
        stores
            .records
            .insert_record(&Record::pending(record.clone(), "a", "b"))
            .unwrap();
        for (voter, verdict) in [("t1", true), ("t2", true), ("f1", false), ("f2", false)] {
            engine.submit_vote(&VoterId::new(voter), &record, verdict).unwrap();
        }

        let barrier = Barrier::new(2);
        std::thread::scope(|s| {
            for (voter, verdict) in [("t3", true), ("f3", false)] {
                let (engine, barrier, record) = (&engine, &barrier, &record);
                s.spawn(move || {
                    barrier.wait();
                    engine.submit_vote(&VoterId::new(voter), record, verdict).unwrap();
                });
            }
        });

        let status = stores.records.get_record(&record).unwrap().unwrap().status;
        let winner = status.polarity().expect("one side crossed the threshold");
        let loser = match winner {
            Polarity::Verified => Polarity::Rejected,
            Polarity::Rejected => Polarity::Verified,
        };
        assert!(stores.outcomes.exists(&record, winner).unwrap());
        assert!(!stores.outcomes.exists(&record, loser).unwrap());
    }
}

/// With late votes refused, opposite votes racing the finalizing vote are
/// either refused or appended, and neither kind can move the outcome.
#[test]
fn refused_late_votes_racing_finalization_never_move_the_outcome() {
    let dir = tempfile::tempdir().unwrap();
    let stores = lmdb_stores(&dir);
    let params = ConsensusParams {
        accept_votes_on_finalized: false,
        ..Default::default()
    };
    let engine = ConsensusEngine::new(stores.clone(), params).unwrap();
    // Two opposite votes stay at the threshold, so only the true side can finalize.
    const LATE: usize = 2;

    for round in 0..ROUNDS {
        let record = RecordId::new(format!("late-{round}"));
        stores
            .records
            .insert_record(&Record::pending(record.clone(), "a", "b"))
            .unwrap();
        engine.submit_vote(&VoterId::new("t1"), &record, true).unwrap();
        engine.submit_vote(&VoterId::new("t2"), &record, true).unwrap();

        let barrier = Barrier::new(LATE + 1);
        let results: Vec<Result<VoteOutcome, ConsensusError>> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..=LATE)
                .map(|i| {
                    let (engine, barrier, record) = (&engine, &barrier, &record);
                    s.spawn(move || {
                        // Racer 0 casts the finalizing vote, the rest vote late and opposite.
                        let (voter, verdict) = if i == 0 {
                            ("t3".to_string(), true)
                        } else {
                            (format!("late-{i}"), false)
                        };
                        barrier.wait();
                        engine.submit_vote(&VoterId::new(voter), record, verdict)
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(
            *results[0].as_ref().unwrap(),
            VoteOutcome::RecordedAndFinalized(Polarity::Verified),
            "round {round}"
        );
        for late in &results[1..] {
            match late {
                Ok(outcome) => assert_eq!(*outcome, VoteOutcome::Recorded),
                Err(err) => assert!(matches!(err, ConsensusError::RecordFinalized { .. })),
            }
        }

        assert_eq!(
            stores.records.get_record(&record).unwrap().unwrap().status,
            RecordStatus::Verified
        );
        assert!(!stores.outcomes.exists(&record, Polarity::Rejected).unwrap());
        for i in 1..=LATE {
            let late = VoterId::new(format!("late-{i}"));
            assert!(!stores.rewards.has_award(&late, &record).unwrap());
        }

        // Once finalized, the refusal is exact: nothing more reaches the ledger.
        let before = stores.votes.votes_for(&record).unwrap().len();
        let err = engine
            .submit_vote(&VoterId::new("after"), &record, false)
            .unwrap_err();
        assert!(matches!(err, ConsensusError::RecordFinalized { .. }));
        assert_eq!(stores.votes.votes_for(&record).unwrap().len(), before);
    }
}

fn vote_strategy() -> impl Strategy<Value = Vec<(u8, u8, bool)>> {
    // (voter index, record index, verdict)
    prop::collection::vec((0u8..6, 0u8..3, any::<bool>()), 0..40)
}

proptest! {
    /// Under any sequence of votes: at most one polarity has an artifact per
    /// record, it matches the record status, and no voter earns more than one
    /// point per record.
    #[test]
    fn sequential_votes_preserve_invariants(votes in vote_strategy()) {
        let store = Arc::new(NullStore::new());
        let engine = ConsensusEngine::new(Stores::shared(store.clone()), ConsensusParams::default()).unwrap();
        let records: Vec<RecordId> = (0..3).map(|i| RecordId::new(format!("r{i}"))).collect();
        for r in &records {
            store.insert_record(&Record::pending(r.clone(), "x", "y")).unwrap();
        }

        let mut finalizations = 0;
        for (voter, record, verdict) in votes {
            let outcome = engine
                .submit_vote(&VoterId::new(format!("v{voter}")), &records[record as usize], verdict)
                .unwrap();
            if outcome.finalized().is_some() {
                finalizations += 1;
            }
        }

        let mut artifacts = 0;
        for r in &records {
            let status = store.get_record(r).unwrap().unwrap().status;
            for polarity in Polarity::ALL {
                let exists = store.exists(r, polarity).unwrap();
                prop_assert_eq!(exists, status.polarity() == Some(polarity));
                if exists {
                    artifacts += 1;
                }
            }
        }
        prop_assert_eq!(artifacts, finalizations);

        for voter in 0..6u8 {
            let points = store.points(&VoterId::new(format!("v{voter}"))).unwrap();
            prop_assert!(points <= artifacts as u64);
        }
    }
}
