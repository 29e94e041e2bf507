//! Persistence collaborator
//!
//! The engine state is stored as one flat key-value record. Stores only need
//! to get a set of keys and set (merge) a record.

pub mod file;
pub mod memory;
pub mod record;

use serde_json::{Map, Value};

use crate::error::StoreError;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use record::{decode_state, encode_state, STATE_KEYS};

/// Flat key-value record as exchanged with a store
pub type Record = Map<String, Value>;

/// Key-value storage for timer snapshots.
///
/// Calls may block; async hosts run them on the blocking pool.
pub trait Store: Send + Sync {
    /// Fetch the requested keys. Absent keys are simply missing from the result.
    fn get(&self, keys: &[&str]) -> Result<Record, StoreError>;

    /// Merge `record` into the stored keys
    fn set(&self, record: Record) -> Result<(), StoreError>;
}
