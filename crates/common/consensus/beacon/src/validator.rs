use serde::{Deserialize, Serialize};
use ssz_derive::{Decode, Encode};
use tree_hash_derive::TreeHash;

use crate::constants::FAR_FUTURE_EPOCH;

/// The slice of a validator record that fork choice weighs votes with.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize, Encode, Decode, TreeHash)]
pub struct Validator {
    #[serde(with = "serde_utils::quoted_u64")]
    pub activation_epoch: u64,
    #[serde(with = "serde_utils::quoted_u64")]
    pub exit_epoch: u64,
    #[serde(with = "serde_utils::quoted_u64")]
    pub effective_balance: u64,
}

impl Validator {
    pub fn new(effective_balance: u64) -> Self {
        Self {
            activation_epoch: 0,
            exit_epoch: FAR_FUTURE_EPOCH,
            effective_balance,
        }
    }

    /// Check if ``validator`` is active.
    pub fn is_active_validator(&self, epoch: u64) -> bool {
        self.activation_epoch <= epoch && epoch < self.exit_epoch
    }
}
