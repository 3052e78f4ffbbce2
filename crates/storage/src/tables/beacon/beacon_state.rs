use std::sync::Arc;

use alloy_primitives::B256;
use cairn_consensus_beacon::state::BeaconState;
use redb::{Database, TableDefinition};

use crate::tables::{
    ssz_encoder::{SSZEncoding, SnappySSZCodec},
    table::REDBTable,
};

pub struct BeaconStateTable {
    pub db: Arc<Database>,
}

/// Table definition for the Beacon State table
///
/// Key: block_root
/// Value: snappy compressed SSZ BeaconState
impl REDBTable for BeaconStateTable {
    const TABLE_DEFINITION: TableDefinition<'static, SSZEncoding<B256>, &'static [u8]> =
        TableDefinition::new("beacon_state");

    type Key = B256;

    type KeyTableDefinition = SSZEncoding<B256>;

    type Value = BeaconState;

    type Codec = SnappySSZCodec;

    fn database(&self) -> Arc<Database> {
        self.db.clone()
    }
}
