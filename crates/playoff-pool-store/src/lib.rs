// Library root: configuration, SQLite persistence, and the snapshot store
// the pool engine reads from.

pub mod config;
pub mod db;
pub mod store;

pub use store::{PoolStore, StoreError, Submission};
