use alloy_primitives::B256;
use serde::{Deserialize, Serialize};
use ssz_derive::{Decode, Encode};
use ssz_types::BitList;
use tree_hash_derive::TreeHash;

use crate::{checkpoint::Checkpoint, constants::MaxValidatorsPerCommittee};

/// Shard crosslink an attestation votes for. These fields route attestations in storage.
#[derive(Debug, Default, PartialEq, Eq, Clone, Serialize, Deserialize, Encode, Decode, TreeHash)]
pub struct Crosslink {
    #[serde(with = "serde_utils::quoted_u64")]
    pub shard: u64,
    pub parent_root: B256,
    #[serde(with = "serde_utils::quoted_u64")]
    pub start_epoch: u64,
    #[serde(with = "serde_utils::quoted_u64")]
    pub end_epoch: u64,
    pub data_root: B256,
}

#[derive(Debug, Default, PartialEq, Eq, Clone, Serialize, Deserialize, Encode, Decode, TreeHash)]
pub struct AttestationData {
    // LMD GHOST vote
    pub beacon_block_root: B256,

    // FFG vote
    pub source: Checkpoint,
    pub target: Checkpoint,

    pub crosslink: Crosslink,
}

#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize, Encode, Decode, TreeHash)]
pub struct Attestation {
    pub aggregation_bits: BitList<MaxValidatorsPerCommittee>,
    pub data: AttestationData,
    pub custody_bits: BitList<MaxValidatorsPerCommittee>,
}

impl Attestation {
    pub fn crosslink(&self) -> &Crosslink {
        &self.data.crosslink
    }
}
