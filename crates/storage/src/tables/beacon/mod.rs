pub mod attestation;
pub mod beacon_block;
pub mod beacon_state;
pub mod finalized_checkpoint;
pub mod justified_checkpoint;
pub mod parent_root_index;
