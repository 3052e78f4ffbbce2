use std::{collections::HashMap, path::Path, sync::Arc};

use alloy_primitives::B256;
use anyhow::{anyhow, ensure};
use cairn_consensus_beacon::{
    block::{BeaconBlock, BeaconBlockBody},
    checkpoint::Checkpoint,
    constants::GENESIS_EPOCH,
    latest_message::LatestMessage,
    state::BeaconState,
    validator::Validator,
};
use cairn_fork_choice_beacon::{store::Store, vote_ledger::VoteLedger};
use cairn_storage::{
    cache::CheckpointStateCache,
    db::CairnDB,
    dir::setup_data_dir,
    tables::table::REDBTable,
};
use tempdir::TempDir;
use tracing::{debug, info};

use crate::types::{LmdGhostFixture, LmdGhostTest, slot_from_id};

/// Epoch at which every fixture validator exits.
pub const FIXTURE_EXIT_EPOCH: u64 = 2;

/// Effective balance of every fixture validator.
pub const FIXTURE_EFFECTIVE_BALANCE: u64 = 1_000_000_000;

/// Load an LMD GHOST test fixture from a YAML file
pub fn load_lmd_ghost_test(path: impl AsRef<Path>) -> anyhow::Result<LmdGhostFixture> {
    let content = std::fs::read_to_string(path.as_ref()).map_err(|err| {
        anyhow!(
            "Failed to read test file {:?}: {err}",
            path.as_ref().display()
        )
    })?;

    serde_yaml::from_str(&content).map_err(|err| {
        anyhow!(
            "Failed to parse test file {:?}: {err}",
            path.as_ref().display()
        )
    })
}

/// Run a single LMD GHOST test case against a fresh database
pub async fn run_lmd_ghost_test(test_name: &str, test: LmdGhostTest) -> anyhow::Result<()> {
    info!("Running LMD GHOST test: {test_name}");

    // Removed when the case finishes, pass or fail
    let temp_dir = TempDir::new("fork_choice_tests")?;
    let test_dir = setup_data_dir("fork_choice_tests", Some(temp_dir.path().to_path_buf()), false)
        .map_err(|err| anyhow!("Failed to setup test directory: {err}"))?;
    let db = CairnDB::new(test_dir)
        .map_err(|err| anyhow!("Failed to create CairnDB: {err}"))?
        .init_beacon_db()
        .map_err(|err| anyhow!("Failed to initialize BeaconDB: {err}"))?;
    let store = Store::new(
        db,
        Arc::new(VoteLedger::new()),
        Arc::new(CheckpointStateCache::default()),
    );

    // Blocks are listed parents first
    let mut roots_by_id: HashMap<&str, B256> = HashMap::new();
    let mut genesis_root = None;
    for block in &test.blocks {
        let parent_root = if block.is_genesis() {
            B256::ZERO
        } else {
            *roots_by_id
                .get(block.parent.as_str())
                .ok_or_else(|| anyhow!("Block {} is listed before its parent", block.id))?
        };
        let root = store.on_block(BeaconBlock {
            slot: slot_from_id(&block.id)?,
            proposer_index: 0,
            parent_root,
            state_root: B256::ZERO,
            body: BeaconBlockBody::default(),
        })?;
        if block.is_genesis() {
            genesis_root = Some(root);
        }
        debug!("Stored block {} with root {root}", block.id);
        roots_by_id.insert(&block.id, root);
    }
    let genesis_root = genesis_root.ok_or_else(|| anyhow!("Test case has no genesis block"))?;

    // One validator per vote, assigned in block id order
    let mut validator_count = 0;
    for (id, votes) in &test.weights {
        let root = *roots_by_id
            .get(id.as_str())
            .ok_or_else(|| anyhow!("Weights reference unknown block {id}"))?;
        for _ in 0..*votes {
            ensure!(
                store.votes.set_vote(
                    validator_count,
                    LatestMessage {
                        epoch: GENESIS_EPOCH,
                        root,
                    },
                ),
                "Vote for validator {validator_count} was rejected"
            );
            validator_count += 1;
        }
    }

    let validator = Validator {
        activation_epoch: GENESIS_EPOCH,
        exit_epoch: FIXTURE_EXIT_EPOCH,
        effective_balance: FIXTURE_EFFECTIVE_BALANCE,
    };
    let state = BeaconState::new(0, vec![validator; validator_count as usize]);
    store.db.state_provider().insert(genesis_root, state.clone())?;

    let checkpoint = Checkpoint {
        epoch: GENESIS_EPOCH,
        root: genesis_root,
    };
    store.genesis_store(checkpoint, checkpoint)?;
    store.checkpoint_states.put(checkpoint, Arc::new(state));

    let head = store.head().await?;
    let wanted_head = *roots_by_id
        .get(test.head.as_str())
        .ok_or_else(|| anyhow!("Expected head {} is not a block of the test", test.head))?;
    ensure!(
        head == wanted_head,
        "Wanted head {} ({wanted_head}), got {head}",
        test.head
    );

    drop(store);
    temp_dir.close()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leftover_test_dirs() -> anyhow::Result<usize> {
        Ok(std::fs::read_dir(std::env::temp_dir())?
            .flatten()
            .filter(|entry| {
                entry
                    .file_name()
                    .to_string_lossy()
                    .starts_with("fork_choice_tests")
            })
            .count())
    }

    #[tokio::test]
    async fn test_case_directories_are_removed() -> anyhow::Result<()> {
        let passing: LmdGhostTest = serde_yaml::from_str(
            "blocks: [{id: 'b0', parent: 'b0'}, {id: 'b1', parent: 'b0'}]\nweights: {b1: 1}\nhead: 'b1'",
        )?;
        let failing: LmdGhostTest = serde_yaml::from_str(
            "blocks: [{id: 'b0', parent: 'b0'}, {id: 'b1', parent: 'b0'}]\nweights: {b1: 1}\nhead: 'b0'",
        )?;
        let before = leftover_test_dirs()?;

        run_lmd_ghost_test("passing", passing).await?;
        assert!(run_lmd_ghost_test("failing", failing).await.is_err());

        assert_eq!(leftover_test_dirs()?, before);
        Ok(())
    }
}
