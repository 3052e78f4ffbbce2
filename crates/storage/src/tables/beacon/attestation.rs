use std::sync::Arc;

use alloy_primitives::B256;
use cairn_consensus_beacon::attestation::Attestation;
use redb::{
    Database, Durability, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition,
};
use ssz::{Decode, Encode};
use tree_hash::TreeHash;

use crate::{errors::StoreError, filters::AttestationFilter, tables::ssz_encoder::SSZEncoding};

/// Table definition for the Attestation table
///
/// Key: composite key built by [attestation_key]
/// Value: SSZ encoded [Attestation]
pub(crate) const ATTESTATION_TABLE: TableDefinition<&[u8], &[u8]> =
    TableDefinition::new("beacon_attestation");

/// Table definition for the Attestation Root Index table
///
/// Key: attestation root
/// Value: composite key in [ATTESTATION_TABLE]
pub(crate) const ATTESTATION_ROOT_INDEX_TABLE: TableDefinition<SSZEncoding<B256>, &[u8]> =
    TableDefinition::new("beacon_attestation_root_index");

pub const SHARD_KEY_PREFIX: &[u8] = b"shard";
pub const PARENT_ROOT_KEY_PREFIX: &[u8] = b"parent-root";
pub const START_EPOCH_KEY_PREFIX: &[u8] = b"start-epoch";
pub const END_EPOCH_KEY_PREFIX: &[u8] = b"end-epoch";
pub const ROOT_KEY_PREFIX: &[u8] = b"root";

/// Build the storage key of an attestation.
///
/// The crosslink routing fields come first so attestations of a shard sit next to each
/// other in key order, and the attestation root comes last so that identical content
/// under the same crosslink collapses into a single record.
pub fn attestation_key(attestation: &Attestation) -> (B256, Vec<u8>) {
    let crosslink = attestation.crosslink();
    let attestation_root = attestation.tree_hash_root();

    let mut key = Vec::with_capacity(
        SHARD_KEY_PREFIX.len()
            + PARENT_ROOT_KEY_PREFIX.len()
            + START_EPOCH_KEY_PREFIX.len()
            + END_EPOCH_KEY_PREFIX.len()
            + ROOT_KEY_PREFIX.len()
            + 3 * 8
            + 2 * 32,
    );
    key.extend_from_slice(SHARD_KEY_PREFIX);
    key.extend_from_slice(&crosslink.shard.to_be_bytes());
    key.extend_from_slice(PARENT_ROOT_KEY_PREFIX);
    key.extend_from_slice(crosslink.parent_root.as_slice());
    key.extend_from_slice(START_EPOCH_KEY_PREFIX);
    key.extend_from_slice(&crosslink.start_epoch.to_be_bytes());
    key.extend_from_slice(END_EPOCH_KEY_PREFIX);
    key.extend_from_slice(&crosslink.end_epoch.to_be_bytes());
    key.extend_from_slice(ROOT_KEY_PREFIX);
    key.extend_from_slice(attestation_root.as_slice());

    (attestation_root, key)
}

fn decode_attestation(bytes: &[u8]) -> Result<Attestation, StoreError> {
    Attestation::from_ssz_bytes(bytes).map_err(|err| StoreError::malformed("attestation", err))
}

pub struct AttestationTable {
    pub db: Arc<Database>,
}

impl AttestationTable {
    /// Save an attestation and return its root.
    pub fn insert(&self, attestation: &Attestation) -> Result<B256, StoreError> {
        let (attestation_root, key) = attestation_key(attestation);
        self.write(vec![(attestation_root, key, attestation.as_ssz_bytes())])?;
        Ok(attestation_root)
    }

    /// Save multiple attestations in a single write transaction.
    ///
    /// Every key and value is encoded before the transaction is opened. If any write
    /// fails, the transaction is dropped without committing, so nothing from the batch
    /// lands and previously stored records stay untouched.
    pub fn batch_insert(&self, attestations: &[Attestation]) -> Result<Vec<B256>, StoreError> {
        let encoded = attestations
            .iter()
            .map(|attestation| {
                let (attestation_root, key) = attestation_key(attestation);
                (attestation_root, key, attestation.as_ssz_bytes())
            })
            .collect::<Vec<_>>();
        let roots = encoded
            .iter()
            .map(|(attestation_root, _, _)| *attestation_root)
            .collect();

        self.write(encoded)?;
        Ok(roots)
    }

    fn write(&self, encoded: Vec<(B256, Vec<u8>, Vec<u8>)>) -> Result<(), StoreError> {
        let mut write_txn = self.db.begin_write()?;
        write_txn.set_durability(Durability::Immediate)?;
        {
            let mut table = write_txn.open_table(ATTESTATION_TABLE)?;
            let mut root_index = write_txn.open_table(ATTESTATION_ROOT_INDEX_TABLE)?;
            for (attestation_root, key, value) in &encoded {
                table.insert(key.as_slice(), value.as_slice())?;
                root_index.insert(*attestation_root, key.as_slice())?;
            }
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Attestation retrieval by root.
    pub fn get(&self, attestation_root: B256) -> Result<Option<Attestation>, StoreError> {
        let read_txn = self.db.begin_read()?;
        let root_index = read_txn.open_table(ATTESTATION_ROOT_INDEX_TABLE)?;
        let Some(key) = root_index.get(attestation_root)? else {
            return Ok(None);
        };

        let table = read_txn.open_table(ATTESTATION_TABLE)?;
        table
            .get(key.value())?
            .map(|value| decode_attestation(value.value()))
            .transpose()
    }

    /// Checks if an attestation by root exists in the db.
    pub fn contains_key(&self, attestation_root: B256) -> Result<bool, StoreError> {
        let read_txn = self.db.begin_read()?;
        let root_index = read_txn.open_table(ATTESTATION_ROOT_INDEX_TABLE)?;
        Ok(root_index.get(attestation_root)?.is_some())
    }

    /// Delete an attestation by root. Deleting an unknown root is a no-op.
    pub fn remove(&self, attestation_root: B256) -> Result<Option<Attestation>, StoreError> {
        let mut write_txn = self.db.begin_write()?;
        write_txn.set_durability(Durability::Immediate)?;
        let value = {
            let mut root_index = write_txn.open_table(ATTESTATION_ROOT_INDEX_TABLE)?;
            let key = root_index
                .remove(attestation_root)?
                .map(|key| key.value().to_vec());
            match key {
                Some(key) => {
                    let mut table = write_txn.open_table(ATTESTATION_TABLE)?;
                    let removed = table.remove(key.as_slice())?;
                    removed.map(|value| value.value().to_vec())
                }
                None => None,
            }
        };
        write_txn.commit()?;

        value.as_deref().map(decode_attestation).transpose()
    }

    /// Retrieve every attestation matching `filter`, in key order. An empty filter
    /// returns the whole table.
    pub fn list(&self, filter: &AttestationFilter) -> Result<Vec<Attestation>, StoreError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ATTESTATION_TABLE)?;
        let prefix = filter.key_prefix();

        let mut attestations = vec![];
        for entry in table.range::<&[u8]>(prefix.as_slice()..)? {
            let (key, value) = entry?;
            if !key.value().starts_with(&prefix) {
                break;
            }
            let attestation = decode_attestation(value.value())?;
            if filter.matches(attestation.crosslink()) {
                attestations.push(attestation);
            }
        }
        Ok(attestations)
    }

    pub fn len(&self) -> Result<u64, StoreError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ATTESTATION_TABLE)?;
        Ok(table.len()?)
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }
}

#[cfg(test)]
mod tests {
    use cairn_consensus_beacon::{
        attestation::{AttestationData, Crosslink},
        checkpoint::Checkpoint,
    };
    use ssz_types::BitList;
    use tempdir::TempDir;

    use super::*;
    use crate::db::{CairnDB, beacon::BeaconDB};

    fn setup_db() -> anyhow::Result<(TempDir, BeaconDB)> {
        let temp_dir = TempDir::new("cairn_attestation_table")?;
        let db = CairnDB::new(temp_dir.path().to_path_buf())?.init_beacon_db()?;
        Ok((temp_dir, db))
    }

    fn attestation(shard: u64, block_byte: u8) -> Attestation {
        let mut aggregation_bits = BitList::with_capacity(4).expect("valid bitlist length");
        aggregation_bits
            .set(usize::from(block_byte % 4), true)
            .expect("index within bitlist");

        Attestation {
            aggregation_bits,
            data: AttestationData {
                beacon_block_root: B256::repeat_byte(block_byte),
                source: Checkpoint::default(),
                target: Checkpoint {
                    epoch: 1,
                    root: B256::repeat_byte(block_byte),
                },
                crosslink: Crosslink {
                    shard,
                    parent_root: B256::repeat_byte(0xaa),
                    start_epoch: 0,
                    end_epoch: 1,
                    data_root: B256::ZERO,
                },
            },
            custody_bits: BitList::with_capacity(4).expect("valid bitlist length"),
        }
    }

    #[test]
    fn test_key_ends_with_attestation_root() {
        let attestation = attestation(3, 1);
        let (attestation_root, key) = attestation_key(&attestation);

        assert_eq!(attestation_root, attestation.tree_hash_root());
        assert!(key.starts_with(SHARD_KEY_PREFIX));
        assert!(key.ends_with(attestation_root.as_slice()));
    }

    #[test]
    fn test_saving_same_attestation_twice_stores_it_once() -> anyhow::Result<()> {
        let (_temp_dir, db) = setup_db()?;
        let provider = db.attestation_provider();
        let attestation = attestation(1, 1);

        let first_root = provider.insert(&attestation)?;
        let second_root = provider.insert(&attestation)?;

        assert_eq!(first_root, second_root);
        assert_eq!(provider.len()?, 1);
        assert_eq!(provider.get(first_root)?, Some(attestation));
        Ok(())
    }

    #[test]
    fn test_different_content_under_same_crosslink_does_not_overwrite() -> anyhow::Result<()> {
        let (_temp_dir, db) = setup_db()?;
        let provider = db.attestation_provider();
        let first = attestation(1, 1);
        let second = attestation(1, 2);
        assert_eq!(first.crosslink(), second.crosslink());

        let first_root = provider.insert(&first)?;
        let second_root = provider.insert(&second)?;

        assert_eq!(provider.len()?, 2);
        assert_eq!(provider.get(first_root)?, Some(first));
        assert_eq!(provider.get(second_root)?, Some(second));
        Ok(())
    }

    #[test]
    fn test_contains_key() -> anyhow::Result<()> {
        let (_temp_dir, db) = setup_db()?;
        let provider = db.attestation_provider();
        let attestation_root = provider.insert(&attestation(1, 1))?;

        assert!(provider.contains_key(attestation_root)?);
        assert!(!provider.contains_key(B256::repeat_byte(0x42))?);
        Ok(())
    }

    #[test]
    fn test_reads_without_created_tables_are_errors() -> anyhow::Result<()> {
        let temp_dir = TempDir::new("cairn_attestation_uninitialized")?;
        let provider = AttestationTable {
            db: Arc::new(Database::create(temp_dir.path().join("uninitialized.redb"))?),
        };

        assert!(matches!(
            provider.contains_key(B256::repeat_byte(0x42)),
            Err(StoreError::Table(_))
        ));
        assert!(matches!(
            provider.get(B256::repeat_byte(0x42)),
            Err(StoreError::Table(_))
        ));
        Ok(())
    }

    #[test]
    fn test_remove_is_idempotent() -> anyhow::Result<()> {
        let (_temp_dir, db) = setup_db()?;
        let provider = db.attestation_provider();
        let kept_root = provider.insert(&attestation(1, 1))?;
        let attestation_root = provider.insert(&attestation(1, 2))?;

        assert!(provider.remove(B256::repeat_byte(0x42))?.is_none());
        assert_eq!(provider.len()?, 2);

        assert!(provider.remove(attestation_root)?.is_some());
        assert!(provider.remove(attestation_root)?.is_none());
        assert!(!provider.contains_key(attestation_root)?);
        assert!(provider.contains_key(kept_root)?);
        assert_eq!(provider.len()?, 1);
        Ok(())
    }

    #[test]
    fn test_batch_insert_and_list_by_shard() -> anyhow::Result<()> {
        let (_temp_dir, db) = setup_db()?;
        let provider = db.attestation_provider();
        let attestations = vec![
            attestation(2, 1),
            attestation(1, 2),
            attestation(1, 3),
            attestation(300, 4),
        ];

        let roots = provider.batch_insert(&attestations)?;
        assert_eq!(roots.len(), 4);
        assert_eq!(provider.list(&AttestationFilter::new())?.len(), 4);

        let shard_one = provider.list(&AttestationFilter::new().with_shard(1))?;
        assert_eq!(shard_one.len(), 2);
        assert!(
            shard_one
                .iter()
                .all(|attestation| attestation.crosslink().shard == 1)
        );

        // Big endian keys keep shards in numeric order
        let shards = provider
            .list(&AttestationFilter::new())?
            .iter()
            .map(|attestation| attestation.crosslink().shard)
            .collect::<Vec<_>>();
        assert_eq!(shards, vec![1, 1, 2, 300]);

        let by_end_epoch = provider.list(&AttestationFilter::new().with_end_epoch(2))?;
        assert!(by_end_epoch.is_empty());
        Ok(())
    }
}
