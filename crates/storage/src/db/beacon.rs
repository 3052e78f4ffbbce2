use std::sync::Arc;

use redb::Database;

use crate::tables::beacon::{
    attestation::AttestationTable, beacon_block::BeaconBlockTable,
    beacon_state::BeaconStateTable, finalized_checkpoint::FinalizedCheckpointField,
    justified_checkpoint::JustifiedCheckpointField,
    parent_root_index::ParentRootIndexMultimapTable,
};

#[derive(Clone, Debug)]
pub struct BeaconDB {
    pub db: Arc<Database>,
}

impl BeaconDB {
    pub fn block_provider(&self) -> BeaconBlockTable {
        BeaconBlockTable {
            db: self.db.clone(),
        }
    }

    pub fn state_provider(&self) -> BeaconStateTable {
        BeaconStateTable {
            db: self.db.clone(),
        }
    }

    pub fn attestation_provider(&self) -> AttestationTable {
        AttestationTable {
            db: self.db.clone(),
        }
    }

    pub fn parent_root_index_provider(&self) -> ParentRootIndexMultimapTable {
        ParentRootIndexMultimapTable {
            db: self.db.clone(),
        }
    }

    pub fn justified_checkpoint_provider(&self) -> JustifiedCheckpointField {
        JustifiedCheckpointField {
            db: self.db.clone(),
        }
    }

    pub fn finalized_checkpoint_provider(&self) -> FinalizedCheckpointField {
        FinalizedCheckpointField {
            db: self.db.clone(),
        }
    }
}
