use std::{num::NonZeroUsize, sync::Arc};

use cairn_consensus_beacon::{checkpoint::Checkpoint, state::BeaconState};
use lru::LruCache;
use parking_lot::Mutex;

/// Number of checkpoint states kept in memory by default.
pub const DEFAULT_CHECKPOINT_STATE_CACHE_SIZE: usize = 16;

/// In-memory map from a checkpoint to the state that is effective at it.
///
/// States are shared behind an [Arc] and never mutated once cached. The least recently
/// used entry is evicted once the cache is full; finalized checkpoints only move
/// forward, so old entries can be recomputed from the database if ever needed again.
#[derive(Debug)]
pub struct CheckpointStateCache {
    states: Mutex<LruCache<Checkpoint, Arc<BeaconState>>>,
}

impl Default for CheckpointStateCache {
    fn default() -> Self {
        Self::new(DEFAULT_CHECKPOINT_STATE_CACHE_SIZE)
    }
}

impl CheckpointStateCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            states: Mutex::new(LruCache::new(
                NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN),
            )),
        }
    }

    /// Insert or overwrite the state for `checkpoint`.
    pub fn put(&self, checkpoint: Checkpoint, state: Arc<BeaconState>) {
        self.states.lock().put(checkpoint, state);
    }

    /// Cached state for `checkpoint`. On a miss the caller falls back to the state
    /// stored under `checkpoint.root`.
    pub fn get(&self, checkpoint: &Checkpoint) -> Option<Arc<BeaconState>> {
        self.states.lock().get(checkpoint).cloned()
    }

    pub fn contains(&self, checkpoint: &Checkpoint) -> bool {
        self.states.lock().contains(checkpoint)
    }

    pub fn len(&self) -> usize {
        self.states.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::B256;
    use cairn_consensus_beacon::validator::Validator;

    use super::*;

    fn checkpoint(epoch: u64) -> Checkpoint {
        Checkpoint {
            epoch,
            root: B256::repeat_byte(epoch as u8),
        }
    }

    #[test]
    fn test_put_overwrites_existing_entry() {
        let cache = CheckpointStateCache::default();
        cache.put(checkpoint(1), Arc::new(BeaconState::new(0, vec![])));
        cache.put(
            checkpoint(1),
            Arc::new(BeaconState::new(0, vec![Validator::new(32)])),
        );

        assert_eq!(cache.len(), 1);
        let state = cache.get(&checkpoint(1)).expect("state should be cached");
        assert_eq!(state.validators.len(), 1);
    }

    #[test]
    fn test_checkpoint_requires_matching_epoch() {
        let cache = CheckpointStateCache::default();
        cache.put(checkpoint(1), Arc::new(BeaconState::new(0, vec![])));

        let other_epoch = Checkpoint {
            epoch: 2,
            root: checkpoint(1).root,
        };
        assert!(cache.get(&other_epoch).is_none());
    }

    #[test]
    fn test_evicts_least_recently_used() {
        let cache = CheckpointStateCache::new(2);
        cache.put(checkpoint(1), Arc::new(BeaconState::new(0, vec![])));
        cache.put(checkpoint(2), Arc::new(BeaconState::new(0, vec![])));
        assert!(cache.get(&checkpoint(1)).is_some());

        cache.put(checkpoint(3), Arc::new(BeaconState::new(0, vec![])));
        assert!(cache.contains(&checkpoint(1)));
        assert!(!cache.contains(&checkpoint(2)));
        assert!(cache.contains(&checkpoint(3)));
    }
}
