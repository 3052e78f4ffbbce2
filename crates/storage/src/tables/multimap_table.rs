use std::{fmt::Debug, sync::Arc};

use redb::{Database, MultimapTableDefinition, ReadableDatabase, ReadableMultimapTable};

use crate::errors::StoreError;

/// Read side of a table mapping one key to a sorted set of values. Writers open the
/// multimap inside their own transaction, next to the records it indexes.
pub trait REDBMultimapTable
where
    Self::Value: Debug + 'static,
    Self::KeyTableDefinition: redb::Key + 'static,
    Self::ValueTableDefinition: redb::Key + 'static,
    for<'a> Self::Value: From<<Self::ValueTableDefinition as redb::Value>::SelfType<'a>>,
{
    const TABLE_DEFINITION: MultimapTableDefinition<
        'static,
        Self::KeyTableDefinition,
        Self::ValueTableDefinition,
    >;

    type Key;
    type Value;
    type KeyTableDefinition;
    type ValueTableDefinition;

    fn database(&self) -> Arc<Database>;

    /// All values stored under `key`, in the value type's key order.
    fn get<'a>(
        &self,
        key: <Self::KeyTableDefinition as redb::Value>::SelfType<'a>,
    ) -> Result<Vec<Self::Value>, StoreError> {
        let read_txn = self.database().begin_read()?;
        let table = read_txn.open_multimap_table(Self::TABLE_DEFINITION)?;
        table
            .get(key)?
            .map(|value| {
                value
                    .map(|value| Self::Value::from(value.value()))
                    .map_err(StoreError::from)
            })
            .collect()
    }
}
