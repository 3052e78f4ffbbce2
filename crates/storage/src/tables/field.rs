use std::sync::Arc;

use redb::{Database, Durability, ReadableDatabase, TableDefinition};

use crate::{errors::StoreError, tables::ssz_encoder::ValueCodec};

/// A single value stored under a fixed key in its own table.
pub trait REDBField {
    const FIELD_DEFINITION: TableDefinition<'static, &'static str, &'static [u8]>;
    const KEY: &'static str;

    type Value;
    type Codec: ValueCodec<Self::Value>;

    fn database(&self) -> Arc<Database>;

    fn get(&self) -> Result<Self::Value, StoreError> {
        let read_txn = self.database().begin_read()?;
        let table = read_txn.open_table(Self::FIELD_DEFINITION)?;
        let result = table
            .get(Self::KEY)?
            .ok_or(StoreError::FieldNotInitialized)?;
        Self::Codec::decode(result.value())
    }

    fn insert(&self, value: Self::Value) -> Result<(), StoreError> {
        let bytes = Self::Codec::encode(&value)?;
        let mut write_txn = self.database().begin_write()?;
        write_txn.set_durability(Durability::Immediate)?;
        {
            let mut table = write_txn.open_table(Self::FIELD_DEFINITION)?;
            table.insert(Self::KEY, bytes.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }
}
