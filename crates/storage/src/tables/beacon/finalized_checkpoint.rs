use std::sync::Arc;

use cairn_consensus_beacon::checkpoint::Checkpoint;
use redb::{Database, TableDefinition};

use crate::tables::{field::REDBField, ssz_encoder::SSZCodec};

pub struct FinalizedCheckpointField {
    pub db: Arc<Database>,
}

/// Table definition for the Finalized_Checkpoint table
///
/// Value: Checkpoint
impl REDBField for FinalizedCheckpointField {
    const FIELD_DEFINITION: TableDefinition<'static, &'static str, &'static [u8]> =
        TableDefinition::new("beacon_finalized_checkpoint");

    const KEY: &str = "finalized_checkpoint_key";

    type Value = Checkpoint;

    type Codec = SSZCodec;

    fn database(&self) -> Arc<Database> {
        self.db.clone()
    }
}
