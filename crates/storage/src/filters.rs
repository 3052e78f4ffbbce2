use alloy_primitives::B256;
use cairn_consensus_beacon::attestation::Crosslink;

use crate::tables::beacon::attestation::{PARENT_ROOT_KEY_PREFIX, SHARD_KEY_PREFIX};

/// Criteria for listing attestations by their crosslink routing fields.
///
/// Fields left as `None` match anything. The default filter matches every attestation.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AttestationFilter {
    pub shard: Option<u64>,
    pub parent_root: Option<B256>,
    pub start_epoch: Option<u64>,
    pub end_epoch: Option<u64>,
}

impl AttestationFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_shard(mut self, shard: u64) -> Self {
        self.shard = Some(shard);
        self
    }

    pub fn with_parent_root(mut self, parent_root: B256) -> Self {
        self.parent_root = Some(parent_root);
        self
    }

    pub fn with_start_epoch(mut self, start_epoch: u64) -> Self {
        self.start_epoch = Some(start_epoch);
        self
    }

    pub fn with_end_epoch(mut self, end_epoch: u64) -> Self {
        self.end_epoch = Some(end_epoch);
        self
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    pub fn matches(&self, crosslink: &Crosslink) -> bool {
        self.shard.is_none_or(|shard| shard == crosslink.shard)
            && self
                .parent_root
                .is_none_or(|parent_root| parent_root == crosslink.parent_root)
            && self
                .start_epoch
                .is_none_or(|start_epoch| start_epoch == crosslink.start_epoch)
            && self
                .end_epoch
                .is_none_or(|end_epoch| end_epoch == crosslink.end_epoch)
    }

    /// Longest key prefix shared by every matching attestation key.
    ///
    /// Routing fields are laid out in key order, so the prefix only extends while the
    /// leading fields are set.
    pub fn key_prefix(&self) -> Vec<u8> {
        let mut prefix = vec![];
        let Some(shard) = self.shard else {
            return prefix;
        };
        prefix.extend_from_slice(SHARD_KEY_PREFIX);
        prefix.extend_from_slice(&shard.to_be_bytes());

        if let Some(parent_root) = self.parent_root {
            prefix.extend_from_slice(PARENT_ROOT_KEY_PREFIX);
            prefix.extend_from_slice(parent_root.as_slice());
        }
        prefix
    }
}
