use alloy_primitives::B256;
use serde::{Deserialize, Serialize};
use ssz_derive::{Decode, Encode};

/// The most recent vote recorded for a validator.
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy, Serialize, Deserialize, Encode, Decode)]
pub struct LatestMessage {
    #[serde(with = "serde_utils::quoted_u64")]
    pub epoch: u64,
    pub root: B256,
}

/// A [LatestMessage] paired with the index of the validator that cast it.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub struct LatestVote {
    #[serde(with = "serde_utils::quoted_u64")]
    pub validator_index: u64,
    pub message: LatestMessage,
}
