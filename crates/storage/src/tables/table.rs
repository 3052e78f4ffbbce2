use std::sync::Arc;

use redb::{Database, Durability, ReadableDatabase, TableDefinition};

use crate::{errors::StoreError, tables::ssz_encoder::ValueCodec};

/// A table of records keyed by a redb key type. Values are stored as bytes produced by
/// [REDBTable::Codec], so a record that fails to decode is reported, not unwrapped.
pub trait REDBTable
where
    Self::Key: 'static,
    Self::KeyTableDefinition: redb::Key + 'static,
{
    const TABLE_DEFINITION: TableDefinition<'static, Self::KeyTableDefinition, &'static [u8]>;

    type Key;
    type Value;
    type KeyTableDefinition;
    type Codec: ValueCodec<Self::Value>;

    fn database(&self) -> Arc<Database>;

    fn get<'a>(
        &self,
        key: <Self::KeyTableDefinition as redb::Value>::SelfType<'a>,
    ) -> Result<Option<Self::Value>, StoreError> {
        let read_txn = self.database().begin_read()?;
        let table = read_txn.open_table(Self::TABLE_DEFINITION)?;
        table
            .get(key)?
            .map(|value| Self::Codec::decode(value.value()))
            .transpose()
    }

    fn contains_key<'a>(
        &self,
        key: <Self::KeyTableDefinition as redb::Value>::SelfType<'a>,
    ) -> Result<bool, StoreError> {
        let read_txn = self.database().begin_read()?;
        let table = read_txn.open_table(Self::TABLE_DEFINITION)?;
        Ok(table.get(key)?.is_some())
    }

    fn insert<'a>(
        &self,
        key: <Self::KeyTableDefinition as redb::Value>::SelfType<'a>,
        value: Self::Value,
    ) -> Result<(), StoreError> {
        let bytes = Self::Codec::encode(&value)?;
        let mut write_txn = self.database().begin_write()?;
        write_txn.set_durability(Durability::Immediate)?;
        {
            let mut table = write_txn.open_table(Self::TABLE_DEFINITION)?;
            table.insert(key, bytes.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    fn remove<'a>(
        &self,
        key: <Self::KeyTableDefinition as redb::Value>::SelfType<'a>,
    ) -> Result<Option<Self::Value>, StoreError> {
        let mut write_txn = self.database().begin_write()?;
        write_txn.set_durability(Durability::Immediate)?;
        let bytes = {
            let mut table = write_txn.open_table(Self::TABLE_DEFINITION)?;
            let removed = table.remove(key)?;
            removed.map(|value| value.value().to_vec())
        };
        write_txn.commit()?;
        bytes.as_deref().map(Self::Codec::decode).transpose()
    }
}
