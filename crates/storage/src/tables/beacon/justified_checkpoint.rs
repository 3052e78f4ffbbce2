use std::sync::Arc;

use cairn_consensus_beacon::checkpoint::Checkpoint;
use redb::{Database, TableDefinition};

use crate::tables::{field::REDBField, ssz_encoder::SSZCodec};

pub struct JustifiedCheckpointField {
    pub db: Arc<Database>,
}

/// Table definition for the Justified_Checkpoint table
///
/// Value: Checkpoint
impl REDBField for JustifiedCheckpointField {
    const FIELD_DEFINITION: TableDefinition<'static, &'static str, &'static [u8]> =
        TableDefinition::new("beacon_justified_checkpoint");

    const KEY: &str = "justified_checkpoint_key";

    type Value = Checkpoint;

    type Codec = SSZCodec;

    fn database(&self) -> Arc<Database> {
        self.db.clone()
    }
}
