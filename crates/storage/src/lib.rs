pub mod cache;
pub mod db;
pub mod dir;
pub mod errors;
pub mod filters;
pub mod tables;
