use ssz_types::typenum::{U128, U2048, U65536, U1099511627776, Unsigned};

pub const SLOTS_PER_EPOCH: u64 = 64;
pub const GENESIS_SLOT: u64 = 0;
pub const GENESIS_EPOCH: u64 = 0;
pub const FAR_FUTURE_EPOCH: u64 = u64::MAX;

pub type EpochsPerHistoricalVector = U65536;
pub type MaxValidatorsPerCommittee = U2048;
pub type MaxAttestations = U128;
pub type ValidatorRegistryLimit = U1099511627776;

/// Validator indices must be strictly below this.
pub const VALIDATOR_REGISTRY_LIMIT: u64 = ValidatorRegistryLimit::U64;
