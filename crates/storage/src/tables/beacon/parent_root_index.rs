use std::sync::Arc;

use alloy_primitives::B256;
use redb::{Database, MultimapTableDefinition};

use crate::tables::{multimap_table::REDBMultimapTable, ssz_encoder::SSZEncoding};

/// Table definition for the Parent Root Index multimap table
///
/// Key: parent_root
/// Value: block_root of every stored child
pub(crate) const PARENT_ROOT_INDEX_MULTIMAP_TABLE: MultimapTableDefinition<
    SSZEncoding<B256>,
    SSZEncoding<B256>,
> = MultimapTableDefinition::new("beacon_parent_root_index");

pub struct ParentRootIndexMultimapTable {
    pub db: Arc<Database>,
}

impl REDBMultimapTable for ParentRootIndexMultimapTable {
    const TABLE_DEFINITION: MultimapTableDefinition<
        'static,
        SSZEncoding<B256>,
        SSZEncoding<B256>,
    > = PARENT_ROOT_INDEX_MULTIMAP_TABLE;

    type Key = B256;

    type KeyTableDefinition = SSZEncoding<B256>;

    type Value = B256;

    type ValueTableDefinition = SSZEncoding<B256>;

    fn database(&self) -> Arc<Database> {
        self.db.clone()
    }
}
