use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use alloy_primitives::B256;
use cairn_consensus_beacon::{
    attestation::Attestation,
    block::BeaconBlock,
    checkpoint::Checkpoint,
    latest_message::{LatestMessage, LatestVote},
    state::BeaconState,
};
use cairn_metrics::{
    ATTESTATIONS_SAVED_TOTAL, CHECKPOINT_STATE_CACHE_TOTAL, FINALIZED_EPOCH,
    FORK_CHOICE_HEAD_TIME, HEAD_SLOT, JUSTIFIED_EPOCH, VOTES_PROCESSED_TOTAL, inc_int_counter_vec,
    inc_int_counter_vec_by, set_int_gauge_vec, start_timer, stop_timer,
};
use cairn_storage::{
    cache::CheckpointStateCache,
    db::beacon::BeaconDB,
    errors::StoreError,
    tables::{field::REDBField, table::REDBTable},
};
use parking_lot::RwLock;
use tracing::{debug, info, warn};
use tree_hash::TreeHash;

use crate::{block_tree::BlockTree, errors::ForkChoiceError, vote_ledger::VoteLedger};

#[derive(Debug, Default, Clone, Copy)]
struct Checkpoints {
    justified: Checkpoint,
    finalized: Checkpoint,
}

/// [Store] runs LMD GHOST over the blocks, states and votes it shares with the rest of
/// the node.
///
/// Cloning a [Store] is cheap and every clone sees the same database, vote ledger,
/// checkpoint state cache and checkpoints. Votes may be written while [Store::head] runs;
/// a head computation works on the snapshot of votes taken when it starts.
#[derive(Debug, Clone)]
pub struct Store {
    pub db: BeaconDB,
    pub votes: Arc<VoteLedger>,
    pub checkpoint_states: Arc<CheckpointStateCache>,
    checkpoints: Arc<RwLock<Checkpoints>>,
    last_head: Arc<RwLock<Option<B256>>>,
}

impl Store {
    pub fn new(
        db: BeaconDB,
        votes: Arc<VoteLedger>,
        checkpoint_states: Arc<CheckpointStateCache>,
    ) -> Self {
        Self {
            db,
            votes,
            checkpoint_states,
            checkpoints: Arc::new(RwLock::new(Checkpoints::default())),
            last_head: Arc::new(RwLock::new(None)),
        }
    }

    /// Resume from the checkpoints persisted by an earlier [Store::genesis_store] or
    /// [Store::update_checkpoints].
    pub fn from_db(
        db: BeaconDB,
        votes: Arc<VoteLedger>,
        checkpoint_states: Arc<CheckpointStateCache>,
    ) -> Result<Self, ForkChoiceError> {
        let justified = db.justified_checkpoint_provider().get()?;
        let finalized = db.finalized_checkpoint_provider().get()?;
        let store = Self::new(db, votes, checkpoint_states);
        *store.checkpoints.write() = Checkpoints {
            justified,
            finalized,
        };
        info!(
            justified_epoch = justified.epoch,
            finalized_epoch = finalized.epoch,
            "Loaded fork choice checkpoints from database"
        );
        Ok(store)
    }

    /// Initialize forkchoice store from an anchor state and anchor block.
    ///
    /// The anchor becomes both the justified and the finalized checkpoint, at the epoch
    /// of the anchor state.
    pub fn get_forkchoice_store(
        anchor_block: BeaconBlock,
        anchor_state: BeaconState,
        db: BeaconDB,
    ) -> Result<Self, ForkChoiceError> {
        let state_root = anchor_state.tree_hash_root();
        if anchor_block.state_root != state_root {
            return Err(ForkChoiceError::AnchorStateMismatch {
                block_state_root: anchor_block.state_root,
                state_root,
            });
        }

        let anchor_root = anchor_block.tree_hash_root();
        let anchor_checkpoint = Checkpoint {
            epoch: anchor_state.get_current_epoch(),
            root: anchor_root,
        };
        db.block_provider().insert(anchor_root, anchor_block)?;
        db.state_provider().insert(anchor_root, anchor_state.clone())?;

        let store = Self::new(
            db,
            Arc::new(VoteLedger::new()),
            Arc::new(CheckpointStateCache::default()),
        );
        store
            .checkpoint_states
            .put(anchor_checkpoint, Arc::new(anchor_state));
        store.genesis_store(anchor_checkpoint, anchor_checkpoint)?;
        Ok(store)
    }

    /// Set the justified and finalized checkpoints fork choice starts from.
    ///
    /// Both checkpoint blocks must already be stored.
    pub fn genesis_store(
        &self,
        justified: Checkpoint,
        finalized: Checkpoint,
    ) -> Result<(), ForkChoiceError> {
        let mut checkpoints = self.checkpoints.write();
        self.ensure_checkpoint_blocks(&justified, &finalized)?;
        self.persist_checkpoints(&mut checkpoints, justified, finalized)?;
        drop(checkpoints);

        info!(
            justified_epoch = justified.epoch,
            justified_root = ?justified.root,
            finalized_epoch = finalized.epoch,
            "Initialized fork choice store"
        );
        Ok(())
    }

    /// Move the justified and finalized checkpoints forward, caching `justified_state`
    /// for the new justified checkpoint when given.
    ///
    /// An epoch lower than the current one is rejected and nothing is written.
    pub fn update_checkpoints(
        &self,
        justified: Checkpoint,
        finalized: Checkpoint,
        justified_state: Option<Arc<BeaconState>>,
    ) -> Result<(), ForkChoiceError> {
        // Held until the new checkpoints are persisted, so concurrent updates apply in
        // some total order and the database always matches memory.
        let mut checkpoints = self.checkpoints.write();
        let current = *checkpoints;
        for (kind, current, new) in [
            ("justified", current.justified, justified),
            ("finalized", current.finalized, finalized),
        ] {
            if new.epoch < current.epoch {
                return Err(ForkChoiceError::CheckpointRegression {
                    kind,
                    current: current.epoch,
                    new: new.epoch,
                });
            }
        }
        self.ensure_checkpoint_blocks(&justified, &finalized)?;
        self.persist_checkpoints(&mut checkpoints, justified, finalized)?;
        if let Some(state) = justified_state {
            self.checkpoint_states.put(justified, state);
        }
        drop(checkpoints);

        info!(
            justified_epoch = justified.epoch,
            finalized_epoch = finalized.epoch,
            "Updated fork choice checkpoints"
        );
        Ok(())
    }

    pub fn justified_checkpoint(&self) -> Checkpoint {
        self.checkpoints.read().justified
    }

    pub fn finalized_checkpoint(&self) -> Checkpoint {
        self.checkpoints.read().finalized
    }

    /// Store a block. Known blocks are accepted again without writing.
    pub fn on_block(&self, block: BeaconBlock) -> Result<B256, ForkChoiceError> {
        let block_root = block.tree_hash_root();
        let block_provider = self.db.block_provider();
        if block_provider.contains_key(block_root)? {
            return Ok(block_root);
        }
        if !block.is_genesis() && !block_provider.contains_key(block.parent_root)? {
            return Err(ForkChoiceError::UnknownParent {
                block_root,
                parent_root: block.parent_root,
            });
        }

        let slot = block.slot;
        block_provider.insert(block_root, block)?;
        debug!(slot, ?block_root, "Stored block");
        Ok(block_root)
    }

    /// Save an attestation and record it as the latest vote of `attesting_indices`.
    ///
    /// A validator's vote only moves to a strictly newer target epoch.
    pub fn on_attestation(
        &self,
        attestation: &Attestation,
        attesting_indices: &[u64],
    ) -> Result<B256, ForkChoiceError> {
        let attestation_root = self.db.attestation_provider().insert(attestation)?;
        inc_int_counter_vec(&ATTESTATIONS_SAVED_TOTAL, &[]);

        let message = LatestMessage {
            epoch: attestation.data.target.epoch,
            root: attestation.data.beacon_block_root,
        };
        let mut updated = 0;
        for validator_index in attesting_indices {
            let is_newer = self.votes.update(*validator_index, |current| {
                current
                    .is_none_or(|current| current.epoch < message.epoch)
                    .then_some(message)
            });
            if is_newer {
                updated += 1;
            }
        }
        inc_int_counter_vec_by(&VOTES_PROCESSED_TOTAL, updated, &[]);

        debug!(
            ?attestation_root,
            target_epoch = message.epoch,
            updated,
            "Processed attestation"
        );
        Ok(attestation_root)
    }

    /// Root of the ancestor of `root` at `slot`, if the chain has a block at that slot.
    pub fn get_ancestor(&self, root: B256, slot: u64) -> Result<Option<B256>, ForkChoiceError> {
        Ok(BlockTree::new(&self.db).ancestor_at_slot(root, slot)?)
    }

    /// Run LMD GHOST from the justified checkpoint and return the head block root.
    ///
    /// At every step the child with the most attesting balance wins, and equal balances
    /// go to the child with the greater root. Validators are weighed by their effective
    /// balance in the justified checkpoint state, counting only those active in that
    /// state's current epoch.
    pub async fn head(&self) -> Result<B256, ForkChoiceError> {
        let timer = start_timer(&FORK_CHOICE_HEAD_TIME, &[]);
        let justified = self.justified_checkpoint();
        let mut tree = BlockTree::new(&self.db);

        let justified_slot = tree
            .node(justified.root)?
            .ok_or(ForkChoiceError::MissingJustifiedBlock(justified.root))?
            .slot;
        let justified_state = self.checkpoint_state(&justified)?;
        let weights = Self::compute_weights(
            &mut tree,
            &justified_state,
            &self.votes.all_votes(),
            justified_slot,
        )?;

        let mut head = justified.root;
        let mut visited = HashSet::from([head]);
        loop {
            tokio::task::yield_now().await;

            let Some((weight, child)) = tree
                .children(head)?
                .into_iter()
                .map(|child| (weights.get(&child).copied().unwrap_or_default(), child))
                .max()
            else {
                break;
            };
            if !visited.insert(child) {
                return Err(ForkChoiceError::CyclicBlockTree(child));
            }
            debug!(parent = ?head, ?child, weight, "Descending to heaviest child");
            head = child;
        }

        let head_slot = tree.node(head)?.map(|node| node.slot);
        if let Some(slot) = head_slot {
            set_int_gauge_vec(&HEAD_SLOT, slot as i64, &[]);
        }
        let previous_head = self.last_head.write().replace(head);
        if previous_head != Some(head) {
            info!(?head, ?head_slot, ?previous_head, "New fork choice head");
        }
        stop_timer(timer);
        Ok(head)
    }

    /// Attesting balance behind every block above `justified_slot`.
    ///
    /// Each vote adds the voter's balance to its target and to each ancestor of the
    /// target down to, but not including, the justified slot. A child's weight is then
    /// the balance of every vote whose ancestor at the child's slot is that child.
    fn compute_weights(
        tree: &mut BlockTree,
        state: &BeaconState,
        votes: &[LatestVote],
        justified_slot: u64,
    ) -> Result<HashMap<B256, u64>, StoreError> {
        let epoch = state.get_current_epoch();
        let mut weights = HashMap::new();
        for vote in votes {
            if vote.validator_index >= state.validators.len() as u64 {
                warn!(
                    validator_index = vote.validator_index,
                    validator_count = state.validators.len(),
                    "Ignoring vote from unknown validator"
                );
                continue;
            }
            let Some(balance) = state.active_balance(vote.validator_index, epoch) else {
                continue;
            };
            if balance == 0 {
                continue;
            }
            tree.add_weight(vote.message.root, balance, justified_slot, &mut weights)?;
        }
        Ok(weights)
    }

    /// State the justified checkpoint weighs votes with. A cache miss falls back to the
    /// state stored under the checkpoint root and fills the cache.
    fn checkpoint_state(
        &self,
        checkpoint: &Checkpoint,
    ) -> Result<Arc<BeaconState>, ForkChoiceError> {
        if let Some(state) = self.checkpoint_states.get(checkpoint) {
            debug!(epoch = checkpoint.epoch, "Checkpoint state cache hit");
            inc_int_counter_vec(&CHECKPOINT_STATE_CACHE_TOTAL, &["hit"]);
            return Ok(state);
        }
        debug!(epoch = checkpoint.epoch, "Checkpoint state cache miss");
        inc_int_counter_vec(&CHECKPOINT_STATE_CACHE_TOTAL, &["miss"]);

        let Some(state) = self.db.state_provider().get(checkpoint.root)? else {
            warn!(epoch = checkpoint.epoch, root = ?checkpoint.root, "No state for justified checkpoint");
            return Err(ForkChoiceError::MissingJustifiedState(*checkpoint));
        };
        let state = Arc::new(state);
        self.checkpoint_states.put(*checkpoint, state.clone());
        Ok(state)
    }

    fn ensure_checkpoint_blocks(
        &self,
        justified: &Checkpoint,
        finalized: &Checkpoint,
    ) -> Result<(), ForkChoiceError> {
        let block_provider = self.db.block_provider();
        for checkpoint in [justified, finalized] {
            if !block_provider.contains_key(checkpoint.root)? {
                return Err(ForkChoiceError::UnknownCheckpointBlock(*checkpoint));
            }
        }
        Ok(())
    }

    /// Write both checkpoints to the database, then to `checkpoints`. Callers hold the
    /// checkpoint write lock.
    fn persist_checkpoints(
        &self,
        checkpoints: &mut Checkpoints,
        justified: Checkpoint,
        finalized: Checkpoint,
    ) -> Result<(), ForkChoiceError> {
        self.db.justified_checkpoint_provider().insert(justified)?;
        self.db.finalized_checkpoint_provider().insert(finalized)?;
        *checkpoints = Checkpoints {
            justified,
            finalized,
        };
        set_int_gauge_vec(&JUSTIFIED_EPOCH, justified.epoch as i64, &[]);
        set_int_gauge_vec(&FINALIZED_EPOCH, finalized.epoch as i64, &[]);
        Ok(())
    }
}
