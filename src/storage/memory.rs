//! In-process store, used by tests and by hosts that opt out of persistence

use std::sync::Mutex;

use super::{Record, Store};
use crate::error::StoreError;

#[derive(Debug, Default)]
pub struct MemoryStore {
    record: Mutex<Record>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing record, e.g. a snapshot left by a previous session
    pub fn with_record(record: Record) -> Self {
        Self {
            record: Mutex::new(record),
        }
    }

    /// Copy of everything currently stored
    pub fn snapshot(&self) -> Result<Record, StoreError> {
        self.record
            .lock()
            .map(|record| record.clone())
            .map_err(|e| StoreError::Unavailable(format!("Failed to lock memory store: {}", e)))
    }
}

impl Store for MemoryStore {
    fn get(&self, keys: &[&str]) -> Result<Record, StoreError> {
        let record = self
            .record
            .lock()
            .map_err(|e| StoreError::Unavailable(format!("Failed to lock memory store: {}", e)))?;
        Ok(keys
            .iter()
            .filter_map(|&key| record.get(key).map(|value| (key.to_string(), value.clone())))
            .collect())
    }

    fn set(&self, update: Record) -> Result<(), StoreError> {
        let mut record = self
            .record
            .lock()
            .map_err(|e| StoreError::Unavailable(format!("Failed to lock memory store: {}", e)))?;
        record.extend(update);
        Ok(())
    }
}
