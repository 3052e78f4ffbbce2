use std::collections::HashMap;

use alloy_primitives::B256;
use cairn_storage::{
    db::beacon::BeaconDB,
    errors::StoreError,
    tables::{
        beacon::{beacon_block::BeaconBlockTable, parent_root_index::ParentRootIndexMultimapTable},
        multimap_table::REDBMultimapTable,
        table::REDBTable,
    },
};

/// The parts of a block the tree walk needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockNode {
    pub slot: u64,
    pub parent_root: B256,
}

/// Read-through view of the block tree for a single fork choice run.
///
/// Every block and child list is loaded from the database at most once and then served
/// from memory, so repeated ancestor walks over the same chain stay cheap.
pub struct BlockTree {
    block_provider: BeaconBlockTable,
    parent_root_index: ParentRootIndexMultimapTable,
    nodes: HashMap<B256, Option<BlockNode>>,
    children: HashMap<B256, Vec<B256>>,
}

impl BlockTree {
    pub fn new(db: &BeaconDB) -> Self {
        Self {
            block_provider: db.block_provider(),
            parent_root_index: db.parent_root_index_provider(),
            nodes: HashMap::new(),
            children: HashMap::new(),
        }
    }

    /// Slot and parent of `root`, or `None` when the block is not stored.
    pub fn node(&mut self, root: B256) -> Result<Option<BlockNode>, StoreError> {
        if let Some(node) = self.nodes.get(&root) {
            return Ok(*node);
        }
        let node = self
            .block_provider
            .get(root)?
            .map(|block| BlockNode {
                slot: block.slot,
                parent_root: block.parent_root,
            });
        self.nodes.insert(root, node);
        Ok(node)
    }

    /// Roots of the stored blocks whose parent is `root`, ascending by root bytes.
    pub fn children(&mut self, root: B256) -> Result<Vec<B256>, StoreError> {
        if let Some(children) = self.children.get(&root) {
            return Ok(children.clone());
        }
        let children = self.parent_root_index.get(root)?;
        self.children.insert(root, children.clone());
        Ok(children)
    }

    /// Walk parent links from `root` to the block at `slot`.
    ///
    /// Returns `root` itself when its slot equals `slot`, and `None` when `root` is
    /// unknown, when its slot is already below `slot`, or when the walk skips past
    /// `slot` or leaves the stored tree.
    pub fn ancestor_at_slot(&mut self, root: B256, slot: u64) -> Result<Option<B256>, StoreError> {
        let mut current = root;
        while let Some(node) = self.node(current)? {
            if node.slot == slot {
                return Ok(Some(current));
            }
            if node.slot < slot {
                return Ok(None);
            }
            match self.node(node.parent_root)? {
                // Parent links must strictly decrease the slot
                Some(parent) if parent.slot >= node.slot => return Ok(None),
                Some(_) => current = node.parent_root,
                None => return Ok(None),
            }
        }
        Ok(None)
    }

    /// Credit `balance` to `root` and every ancestor whose slot is above `floor_slot`.
    ///
    /// A block with slot `s` is credited exactly when walking up from `root` reaches it,
    /// which is the same block [BlockTree::ancestor_at_slot] returns for `s`.
    pub fn add_weight(
        &mut self,
        root: B256,
        balance: u64,
        floor_slot: u64,
        weights: &mut HashMap<B256, u64>,
    ) -> Result<(), StoreError> {
        let mut current = root;
        let mut previous_slot = u64::MAX;
        while let Some(node) = self.node(current)? {
            if node.slot <= floor_slot || node.slot >= previous_slot {
                break;
            }
            let weight = weights.entry(current).or_default();
            *weight = weight.saturating_add(balance);
            previous_slot = node.slot;
            current = node.parent_root;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use cairn_consensus_beacon::block::{BeaconBlock, BeaconBlockBody};
    use cairn_storage::db::CairnDB;
    use tempdir::TempDir;
    use tree_hash::TreeHash;

    use super::*;

    fn block(slot: u64, parent_root: B256) -> BeaconBlock {
        BeaconBlock {
            slot,
            proposer_index: 0,
            parent_root,
            state_root: B256::ZERO,
            body: BeaconBlockBody::default(),
        }
    }

    /// genesis(0) <- a(1) <- b(3) <- c(4)
    fn chain() -> anyhow::Result<(TempDir, BeaconDB, Vec<B256>)> {
        let temp_dir = TempDir::new("cairn_block_tree")?;
        let db = CairnDB::new(temp_dir.path().to_path_buf())?.init_beacon_db()?;

        let mut roots = vec![];
        let mut parent_root = B256::ZERO;
        for slot in [0, 1, 3, 4] {
            let block = block(slot, parent_root);
            parent_root = block.tree_hash_root();
            db.block_provider().insert(parent_root, block)?;
            roots.push(parent_root);
        }
        Ok((temp_dir, db, roots))
    }

    #[test]
    fn test_ancestor_at_slot() -> anyhow::Result<()> {
        let (_temp_dir, db, roots) = chain()?;
        let mut tree = BlockTree::new(&db);

        assert_eq!(tree.ancestor_at_slot(roots[3], 4)?, Some(roots[3]));
        assert_eq!(tree.ancestor_at_slot(roots[3], 3)?, Some(roots[2]));
        assert_eq!(tree.ancestor_at_slot(roots[3], 0)?, Some(roots[0]));
        // Slot 2 is skipped by the chain
        assert_eq!(tree.ancestor_at_slot(roots[3], 2)?, None);
        // Slot above the block itself
        assert_eq!(tree.ancestor_at_slot(roots[1], 3)?, None);
        assert_eq!(tree.ancestor_at_slot(B256::repeat_byte(9), 0)?, None);
        Ok(())
    }

    #[test]
    fn test_add_weight_stops_at_floor() -> anyhow::Result<()> {
        let (_temp_dir, db, roots) = chain()?;
        let mut tree = BlockTree::new(&db);
        let mut weights = HashMap::new();

        tree.add_weight(roots[3], 5, 1, &mut weights)?;
        tree.add_weight(roots[2], 2, 1, &mut weights)?;
        tree.add_weight(roots[1], 7, 1, &mut weights)?;

        assert_eq!(weights.get(&roots[3]), Some(&5));
        assert_eq!(weights.get(&roots[2]), Some(&7));
        assert_eq!(weights.get(&roots[1]), None);
        assert_eq!(weights.get(&roots[0]), None);
        Ok(())
    }

    #[test]
    fn test_children_are_sorted() -> anyhow::Result<()> {
        let (_temp_dir, db, roots) = chain()?;
        let sibling = block(5, roots[0]);
        let sibling_root = sibling.tree_hash_root();
        db.block_provider().insert(sibling_root, sibling)?;

        let mut tree = BlockTree::new(&db);
        let mut expected = vec![roots[1], sibling_root];
        expected.sort();
        assert_eq!(tree.children(roots[0])?, expected);
        assert!(tree.children(roots[3])?.is_empty());
        Ok(())
    }
}
