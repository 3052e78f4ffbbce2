use std::collections::BTreeMap;

use anyhow::anyhow;
use serde::Deserialize;

/// A fixture file holds a list of independent block trees.
#[derive(Debug, Deserialize)]
pub struct LmdGhostFixture {
    pub test_cases: Vec<LmdGhostTest>,
}

/// One block tree, the votes cast on it and the head it must resolve to.
///
/// Block ids are `b<slot>`, so every block in a case sits at a distinct slot. The genesis
/// block is the one listed as its own parent.
#[derive(Debug, Deserialize)]
pub struct LmdGhostTest {
    pub blocks: Vec<FixtureBlock>,
    /// Number of votes per block id, one validator per vote
    #[serde(default)]
    pub weights: BTreeMap<String, u64>,
    pub head: String,
}

#[derive(Debug, Deserialize)]
pub struct FixtureBlock {
    pub id: String,
    pub parent: String,
}

impl FixtureBlock {
    pub fn is_genesis(&self) -> bool {
        self.id == self.parent
    }
}

/// Slot encoded in a block id such as `b7`.
pub fn slot_from_id(id: &str) -> anyhow::Result<u64> {
    id.get(1..)
        .ok_or_else(|| anyhow!("Block id {id:?} is too short"))?
        .parse()
        .map_err(|err| anyhow!("Block id {id:?} does not end in a slot: {err}"))
}
