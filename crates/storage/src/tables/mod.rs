pub mod beacon;
pub mod field;
pub mod multimap_table;
pub mod ssz_encoder;
pub mod table;
