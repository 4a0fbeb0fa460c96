//! The status transition rule, kept free of storage so it can be tested alone.

use tally_types::{Polarity, RecordStatus};

/// Decide the status a record should move to after a vote.
///
/// `matching` is the number of votes (repeats included) that share the new
/// vote's verdict, counted after the vote was appended. Returns the terminal
/// status when the exclusive `threshold` is crossed while the record is still
/// pending, `None` otherwise. Terminal statuses never change.
pub fn next_status(
    current: RecordStatus,
    polarity: Polarity,
    matching: u64,
    threshold: u64,
) -> Option<RecordStatus> {
    if current.is_pending() && matching > threshold {
        Some(polarity.terminal_status())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn third_matching_vote_finalizes_with_default_threshold() {
        assert_eq!(next_status(RecordStatus::Pending, Polarity::Verified, 2, 2), None);
        assert_eq!(
            next_status(RecordStatus::Pending, Polarity::Verified, 3, 2),
            Some(RecordStatus::Verified)
        );
        assert_eq!(
            next_status(RecordStatus::Pending, Polarity::Rejected, 3, 2),
            Some(RecordStatus::Rejected)
        );
    }

    #[test]
    fn opposite_votes_never_flip_a_finalized_record() {
        assert_eq!(next_status(RecordStatus::Verified, Polarity::Rejected, 100, 2), None);
    }

    fn status() -> impl Strategy<Value = RecordStatus> {
        prop_oneof![
            Just(RecordStatus::Pending),
            Just(RecordStatus::Verified),
            Just(RecordStatus::Rejected),
        ]
    }

    proptest! {
        /// Terminal statuses are fixed points of the transition.
        #[test]
        fn terminal_is_fixed(current in status(), verdict in any::<bool>(), matching in 0u64..50, threshold in 1u64..10) {
            let next = next_status(current, Polarity::from_verdict(verdict), matching, threshold);
            if current.is_terminal() {
                prop_assert_eq!(next, None);
            }
        }

        /// A transition, when it happens, lands on the vote's polarity.
        #[test]
        fn transition_matches_polarity(verdict in any::<bool>(), matching in 0u64..50, threshold in 1u64..10) {
            let polarity = Polarity::from_verdict(verdict);
            match next_status(RecordStatus::Pending, polarity, matching, threshold) {
                Some(next) => {
                    prop_assert!(matching > threshold);
                    prop_assert_eq!(next.polarity(), Some(polarity));
                }
                None => prop_assert!(matching <= threshold),
            }
        }
    }
}
