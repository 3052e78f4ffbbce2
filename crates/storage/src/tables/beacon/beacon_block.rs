use std::sync::Arc;

use alloy_primitives::B256;
use cairn_consensus_beacon::block::BeaconBlock;
use redb::{Database, Durability, TableDefinition};

use super::parent_root_index::PARENT_ROOT_INDEX_MULTIMAP_TABLE;
use crate::{
    errors::StoreError,
    tables::{
        ssz_encoder::{SSZCodec, SSZEncoding, ValueCodec},
        table::REDBTable,
    },
};

pub struct BeaconBlockTable {
    pub db: Arc<Database>,
}

/// Table definition for the Beacon Block table
///
/// Key: block_root
/// Value: SSZ BeaconBlock
///
/// Every insert also links the block under its parent in the parent root index, in the
/// same write transaction.
impl REDBTable for BeaconBlockTable {
    const TABLE_DEFINITION: TableDefinition<'static, SSZEncoding<B256>, &'static [u8]> =
        TableDefinition::new("beacon_block");

    type Key = B256;

    type KeyTableDefinition = SSZEncoding<B256>;

    type Value = BeaconBlock;

    type Codec = SSZCodec;

    fn database(&self) -> Arc<Database> {
        self.db.clone()
    }

    fn insert<'a>(
        &self,
        key: <Self::KeyTableDefinition as redb::Value>::SelfType<'a>,
        value: Self::Value,
    ) -> Result<(), StoreError> {
        self.batch_insert([(key, value)])
    }

    fn remove<'a>(
        &self,
        key: <Self::KeyTableDefinition as redb::Value>::SelfType<'a>,
    ) -> Result<Option<Self::Value>, StoreError> {
        let mut write_txn = self.db.begin_write()?;
        write_txn.set_durability(Durability::Immediate)?;
        let value = {
            let mut table = write_txn.open_table(Self::TABLE_DEFINITION)?;
            let removed = table.remove(key)?;
            let value = removed
                .map(|value| <Self::Codec as ValueCodec<Self::Value>>::decode(value.value()))
                .transpose()?;
            if let Some(block) = &value {
                let mut parent_root_index =
                    write_txn.open_multimap_table(PARENT_ROOT_INDEX_MULTIMAP_TABLE)?;
                parent_root_index.remove(block.parent_root, key)?;
            }
            value
        };
        write_txn.commit()?;
        Ok(value)
    }
}

impl BeaconBlockTable {
    /// Insert multiple blocks with their roots in a single transaction.
    pub fn batch_insert(
        &self,
        values: impl IntoIterator<Item = (B256, BeaconBlock)>,
    ) -> Result<(), StoreError> {
        let encoded = values
            .into_iter()
            .map(|(block_root, block)| {
                Ok((block_root, block.parent_root, <<Self as REDBTable>::Codec as ValueCodec<BeaconBlock>>::encode(&block)?))
            })
            .collect::<Result<Vec<_>, StoreError>>()?;

        let mut write_txn = self.db.begin_write()?;
        write_txn.set_durability(Durability::Immediate)?;
        {
            let mut parent_root_index =
                write_txn.open_multimap_table(PARENT_ROOT_INDEX_MULTIMAP_TABLE)?;
            let mut table = write_txn.open_table(Self::TABLE_DEFINITION)?;
            for (block_root, parent_root, bytes) in &encoded {
                parent_root_index.insert(*parent_root, *block_root)?;
                table.insert(*block_root, bytes.as_slice())?;
            }
        }
        write_txn.commit()?;
        Ok(())
    }
}
