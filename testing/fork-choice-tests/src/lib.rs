pub mod lmd_ghost;
pub mod types;
