use std::collections::BTreeMap;

use cairn_consensus_beacon::{
    constants::VALIDATOR_REGISTRY_LIMIT,
    latest_message::{LatestMessage, LatestVote},
};
use parking_lot::Mutex;
use tracing::warn;

/// Latest vote of every validator, keyed by validator index.
///
/// Writers never compare epochs here; [VoteLedger::set_vote] overwrites unconditionally
/// and [VoteLedger::update] lets the caller decide under the ledger lock. Indices at or
/// above [VALIDATOR_REGISTRY_LIMIT] are rejected and leave the ledger untouched.
#[derive(Debug, Default)]
pub struct VoteLedger {
    votes: Mutex<BTreeMap<u64, LatestMessage>>,
}

impl VoteLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the latest vote of `validator_index`. Returns false for an index outside
    /// the validator registry.
    pub fn set_vote(&self, validator_index: u64, message: LatestMessage) -> bool {
        if !is_registry_index(validator_index) {
            return false;
        }
        self.votes.lock().insert(validator_index, message);
        true
    }

    /// Replace the vote of `validator_index` with whatever `f` returns, if anything.
    ///
    /// `f` runs while the ledger is locked, so a read-compare-write through this method
    /// cannot interleave with other writers. Returns whether the vote was written.
    pub fn update(
        &self,
        validator_index: u64,
        f: impl FnOnce(Option<&LatestMessage>) -> Option<LatestMessage>,
    ) -> bool {
        if !is_registry_index(validator_index) {
            return false;
        }
        let mut votes = self.votes.lock();
        match f(votes.get(&validator_index)) {
            Some(message) => {
                votes.insert(validator_index, message);
                true
            }
            None => false,
        }
    }

    pub fn get(&self, validator_index: u64) -> Option<LatestMessage> {
        self.votes.lock().get(&validator_index).copied()
    }

    /// Point in time copy of every recorded vote, in validator index order.
    pub fn all_votes(&self) -> Vec<LatestVote> {
        self.votes
            .lock()
            .iter()
            .map(|(validator_index, message)| LatestVote {
                validator_index: *validator_index,
                message: *message,
            })
            .collect()
    }

    /// Number of validators with a recorded vote.
    pub fn len(&self) -> usize {
        self.votes.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.votes.lock().is_empty()
    }
}

fn is_registry_index(validator_index: u64) -> bool {
    if validator_index >= VALIDATOR_REGISTRY_LIMIT {
        warn!(validator_index, "Ignoring vote for index outside the validator registry");
        return false;
    }
    true
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, thread};

    use tracing_test::traced_test;

    use alloy_primitives::B256;

    use super::*;

    fn message(epoch: u64, byte: u8) -> LatestMessage {
        LatestMessage {
            epoch,
            root: B256::repeat_byte(byte),
        }
    }

    #[test]
    fn test_set_vote_overwrites_single_entry() {
        let ledger = VoteLedger::new();
        ledger.set_vote(3, message(1, 0xa));
        ledger.set_vote(3, message(1, 0xb));

        let votes = ledger.all_votes();
        assert_eq!(votes.len(), 1);
        assert_eq!(votes[0].validator_index, 3);
        assert_eq!(votes[0].message.root, B256::repeat_byte(0xb));
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_set_vote_does_not_compare_epochs() {
        let ledger = VoteLedger::new();
        ledger.set_vote(0, message(5, 0xa));
        ledger.set_vote(0, message(2, 0xb));

        assert_eq!(ledger.get(0), Some(message(2, 0xb)));
    }

    #[test]
    fn test_all_votes_in_index_order() {
        let ledger = VoteLedger::new();
        ledger.set_vote(5, message(0, 5));
        ledger.set_vote(1, message(0, 1));
        ledger.set_vote(3, message(0, 3));

        let indices = ledger
            .all_votes()
            .iter()
            .map(|vote| vote.validator_index)
            .collect::<Vec<_>>();
        assert_eq!(indices, vec![1, 3, 5]);
        assert!(ledger.get(2).is_none());
        assert!(ledger.get(100).is_none());
    }

    #[test]
    #[traced_test]
    fn test_out_of_registry_indices_are_rejected() {
        let ledger = VoteLedger::new();
        for validator_index in 0..10 {
            assert!(ledger.set_vote(validator_index, message(1, validator_index as u8)));
        }

        assert!(!ledger.set_vote(u64::MAX, message(2, 0xff)));
        assert!(!ledger.set_vote(VALIDATOR_REGISTRY_LIMIT, message(2, 0xff)));
        assert!(!ledger.update(u64::MAX, |_| Some(message(2, 0xff))));
        assert!(ledger.set_vote(VALIDATOR_REGISTRY_LIMIT - 1, message(2, 0xee)));

        assert_eq!(ledger.len(), 11);
        assert!(ledger.get(u64::MAX).is_none());
        assert_eq!(ledger.get(9), Some(message(1, 9)));
        assert!(logs_contain("outside the validator registry"));
    }

    #[test]
    fn test_update_only_writes_when_closure_returns_message() {
        let ledger = VoteLedger::new();
        assert!(ledger.update(0, |current| {
            assert!(current.is_none());
            Some(message(2, 0xa))
        }));
        assert!(!ledger.update(0, |current| {
            assert_eq!(current, Some(&message(2, 0xa)));
            None
        }));
        assert_eq!(ledger.get(0), Some(message(2, 0xa)));
    }

    #[test]
    fn test_concurrent_writers_keep_one_entry_per_validator() {
        let ledger = Arc::new(VoteLedger::new());

        thread::scope(|scope| {
            for worker in 0..4u8 {
                let ledger = ledger.clone();
                scope.spawn(move || {
                    for validator_index in 0..256 {
                        ledger.set_vote(validator_index, message(u64::from(worker), worker));
                    }
                });
            }
        });

        let votes = ledger.all_votes();
        assert_eq!(votes.len(), 256);
        assert!(
            votes
                .iter()
                .enumerate()
                .all(|(index, vote)| vote.validator_index == index as u64)
        );
    }
}
