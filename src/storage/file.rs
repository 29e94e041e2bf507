//! JSON file store
//!
//! The whole record lives in one JSON object. Writes go to a sibling temp
//! file that is renamed over the original, so a crash mid-write leaves the
//! previous snapshot intact.

use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Mutex,
};

use serde_json::Value;
use tracing::{debug, warn};

use super::{Record, Store};
use crate::error::StoreError;

#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    /// Serialises read-modify-write cycles within this process
    write_lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<Record, StoreError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No state file at {}, starting empty", self.path.display());
                return Ok(Record::new());
            }
            Err(e) => return Err(e.into()),
        };
        if text.trim().is_empty() {
            return Ok(Record::new());
        }
        match serde_json::from_str::<Value>(&text)? {
            Value::Object(record) => Ok(record),
            other => Err(StoreError::Unavailable(format!(
                "{} does not hold a JSON object (found {})",
                self.path.display(),
                json_kind(&other)
            ))),
        }
    }

    fn write_all(&self, record: &Record) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(record)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl Store for FileStore {
    fn get(&self, keys: &[&str]) -> Result<Record, StoreError> {
        let record = self.read_all()?;
        Ok(keys
            .iter()
            .filter_map(|&key| record.get(key).map(|value| (key.to_string(), value.clone())))
            .collect())
    }

    fn set(&self, update: Record) -> Result<(), StoreError> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|e| StoreError::Unavailable(format!("Failed to lock file store: {}", e)))?;
        let mut record = match self.read_all() {
            Ok(record) => record,
            Err(e) => {
                warn!("Replacing unreadable state file {}: {}", self.path.display(), e);
                Record::new()
            }
        };
        record.extend(update);
        self.write_all(&record)?;
        debug!("Wrote {} keys to {}", record.len(), self.path.display());
        Ok(())
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
