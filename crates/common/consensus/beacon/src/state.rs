use alloy_primitives::B256;
use serde::{Deserialize, Serialize};
use ssz_derive::{Decode, Encode};
use ssz_types::{FixedVector, VariableList};
use tree_hash_derive::TreeHash;

use crate::{
    constants::{EpochsPerHistoricalVector, ValidatorRegistryLimit},
    misc::compute_epoch_at_slot,
    validator::Validator,
};

/// Snapshot of the beacon state that fork choice reads balances from.
///
/// A state is immutable once it has been stored under a block root; the index of a
/// validator in [BeaconState::validators] is the validator index votes refer to.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize, Encode, Decode, TreeHash)]
pub struct BeaconState {
    #[serde(with = "serde_utils::quoted_u64")]
    pub slot: u64,
    pub validators: VariableList<Validator, ValidatorRegistryLimit>,
    pub randao_mixes: FixedVector<B256, EpochsPerHistoricalVector>,
}

impl BeaconState {
    pub fn new(slot: u64, mut validators: Vec<Validator>) -> Self {
        validators.truncate(<ValidatorRegistryLimit as ssz_types::typenum::Unsigned>::to_usize());
        Self {
            slot,
            validators: VariableList::new(validators)
                .expect("validators were truncated to the registry limit"),
            randao_mixes: FixedVector::default(),
        }
    }

    /// Return the current epoch.
    pub fn get_current_epoch(&self) -> u64 {
        compute_epoch_at_slot(self.slot)
    }

    /// Effective balance of ``validator_index`` if the validator is active at ``epoch``.
    pub fn active_balance(&self, validator_index: u64, epoch: u64) -> Option<u64> {
        self.validators
            .get(usize::try_from(validator_index).ok()?)
            .filter(|validator| validator.is_active_validator(epoch))
            .map(|validator| validator.effective_balance)
    }
}

#[cfg(test)]
mod tests {
    use ssz::{Decode, Encode};

    use super::*;

    #[test]
    fn test_active_balance_skips_exited_and_unknown_validators() {
        let state = BeaconState::new(
            0,
            vec![
                Validator::new(32),
                Validator {
                    activation_epoch: 0,
                    exit_epoch: 0,
                    effective_balance: 32,
                },
            ],
        );

        assert_eq!(state.active_balance(0, 0), Some(32));
        assert_eq!(state.active_balance(1, 0), None);
        assert_eq!(state.active_balance(2, 0), None);
    }

    #[test]
    fn test_state_ssz_roundtrip() {
        let mut state = BeaconState::new(130, vec![Validator::new(1_000_000_000); 4]);
        state.randao_mixes[3] = B256::repeat_byte(0xab);

        let decoded = BeaconState::from_ssz_bytes(&state.as_ssz_bytes());
        assert_eq!(decoded, Ok(state));
    }
}
