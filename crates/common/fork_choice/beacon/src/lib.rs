pub mod block_tree;
pub mod errors;
pub mod genesis;
pub mod store;
pub mod vote_ledger;
