use alloy_primitives::B256;
use cairn_consensus_beacon::{
    block::{BeaconBlock, BeaconBlockBody},
    constants::GENESIS_SLOT,
    state::BeaconState,
    validator::Validator,
};
use tree_hash::TreeHash;

/// Genesis block committing to `state_root`. Its zero parent root marks it as genesis.
pub fn genesis_block(state_root: B256) -> BeaconBlock {
    BeaconBlock {
        slot: GENESIS_SLOT,
        proposer_index: 0,
        parent_root: B256::ZERO,
        state_root,
        body: BeaconBlockBody::default(),
    }
}

pub fn genesis_state(validators: Vec<Validator>) -> BeaconState {
    BeaconState::new(GENESIS_SLOT, validators)
}

/// Genesis state for `validators` and the block that commits to it.
pub fn setup_genesis(validators: Vec<Validator>) -> (BeaconBlock, BeaconState) {
    let state = genesis_state(validators);
    let block = genesis_block(state.tree_hash_root());
    (block, state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_genesis_block_commits_to_state() {
        let (block, state) = setup_genesis(vec![Validator::new(32); 2]);

        assert!(block.is_genesis());
        assert_eq!(block.slot, GENESIS_SLOT);
        assert_eq!(block.state_root, state.tree_hash_root());
        assert_eq!(state.validators.len(), 2);
    }
}
