pub mod beacon;

use std::{path::PathBuf, sync::Arc};

use beacon::BeaconDB;
use redb::{Builder, Database};
use tracing::info;

use crate::{
    errors::StoreError,
    tables::{
        beacon::{
            attestation::{ATTESTATION_ROOT_INDEX_TABLE, ATTESTATION_TABLE},
            beacon_block::BeaconBlockTable,
            beacon_state::BeaconStateTable,
            finalized_checkpoint::FinalizedCheckpointField,
            justified_checkpoint::JustifiedCheckpointField,
            parent_root_index::PARENT_ROOT_INDEX_MULTIMAP_TABLE,
        },
        field::REDBField,
        table::REDBTable,
    },
};

pub const REDB_FILE: &str = "cairn.redb";

/// The size of the cache for the database
///
/// 1 GiB
pub const REDB_CACHE_SIZE: usize = 1_024 * 1_024 * 1_024;

#[derive(Clone, Debug)]
pub struct CairnDB {
    db: Arc<Database>,
    data_dir: PathBuf,
}

impl CairnDB {
    pub fn new(data_dir: PathBuf) -> Result<Self, StoreError> {
        let db = Builder::new()
            .set_cache_size(REDB_CACHE_SIZE)
            .create(data_dir.join(REDB_FILE))?;

        Ok(CairnDB {
            db: Arc::new(db),
            data_dir,
        })
    }

    pub fn data_dir(&self) -> &PathBuf {
        &self.data_dir
    }

    /// Create every beacon table up front. Reading a table that was never created is
    /// an error, not an empty result.
    pub fn init_beacon_db(&self) -> Result<BeaconDB, StoreError> {
        let write_txn = self.db.begin_write()?;

        write_txn.open_table(ATTESTATION_TABLE)?;
        write_txn.open_table(ATTESTATION_ROOT_INDEX_TABLE)?;
        write_txn.open_table(BeaconBlockTable::TABLE_DEFINITION)?;
        write_txn.open_table(BeaconStateTable::TABLE_DEFINITION)?;
        write_txn.open_table(FinalizedCheckpointField::FIELD_DEFINITION)?;
        write_txn.open_table(JustifiedCheckpointField::FIELD_DEFINITION)?;
        write_txn.open_multimap_table(PARENT_ROOT_INDEX_MULTIMAP_TABLE)?;
        write_txn.commit()?;

        info!(data_dir = %self.data_dir.display(), "Initialized beacon database");

        Ok(BeaconDB {
            db: self.db.clone(),
        })
    }
}
