use alloy_primitives::B256;
use cairn_consensus_beacon::checkpoint::Checkpoint;
use cairn_storage::errors::StoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ForkChoiceError {
    #[error("justified block {0} is not in the store")]
    MissingJustifiedBlock(B256),
    #[error("no cached or stored state for justified checkpoint {0:?}")]
    MissingJustifiedState(Checkpoint),
    #[error("checkpoint {0:?} references a block that is not in the store")]
    UnknownCheckpointBlock(Checkpoint),
    #[error("parent {parent_root} of block {block_root} is not in the store")]
    UnknownParent { block_root: B256, parent_root: B256 },
    #[error("anchor block state root {block_state_root} does not match anchor state {state_root}")]
    AnchorStateMismatch {
        block_state_root: B256,
        state_root: B256,
    },
    #[error("{kind} checkpoint epoch cannot go back from {current} to {new}")]
    CheckpointRegression {
        kind: &'static str,
        current: u64,
        new: u64,
    },
    #[error("block tree revisits {0} while descending")]
    CyclicBlockTree(B256),
    #[error(transparent)]
    Store(#[from] StoreError),
}
