//! The record-store seam.
//!
//! Persistence backends expose flat entity collections of plain JSON records
//! with string ids and ISO-8601 timestamp fields. The engine never talks to a
//! backend directly; it goes through [`RecordStore`].

use std::collections::HashMap;

use parking_lot::RwLock;
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found: {entity}/{id}")]
    NotFound { entity: String, id: String },
    #[error("malformed record: {0}")]
    Malformed(String),
}

/// Backend-agnostic CRUD over one entity type at a time.
pub trait RecordStore: Send + Sync {
    /// All records of one entity type, in insertion order.
    fn list(&self, entity: &str) -> Result<Vec<Value>, StoreError>;
    /// Stores a record, assigning an id and creation timestamp when absent,
    /// and returns the stored form.
    fn create(&self, entity: &str, record: Value) -> Result<Value, StoreError>;
    /// Merges `patch`'s fields into an existing record.
    fn update(&self, entity: &str, id: &str, patch: Value) -> Result<Value, StoreError>;
    fn delete(&self, entity: &str, id: &str) -> Result<(), StoreError>;
}

/// In-memory [`RecordStore`], the test and local-mode backend.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<String, Vec<Value>>>,
    next_id: RwLock<u64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn assign_id(&self) -> String {
        let mut next = self.next_id.write();
        *next += 1;
        format!("rec-{}", *next)
    }

    fn as_object(record: Value) -> Result<Map<String, Value>, StoreError> {
        match record {
            Value::Object(map) => Ok(map),
            other => Err(StoreError::Malformed(format!(
                "expected a JSON object, got {other}"
            ))),
        }
    }

    fn record_id(record: &Map<String, Value>) -> Option<&str> {
        record.get("id").and_then(Value::as_str)
    }
}

impl RecordStore for MemoryStore {
    fn list(&self, entity: &str) -> Result<Vec<Value>, StoreError> {
        Ok(self
            .records
            .read()
            .get(entity)
            .cloned()
            .unwrap_or_default())
    }

    fn create(&self, entity: &str, record: Value) -> Result<Value, StoreError> {
        let mut map = Self::as_object(record)?;
        if Self::record_id(&map).is_none() {
            map.insert("id".into(), Value::String(self.assign_id()));
        }
        map.entry("created_date".to_string())
            .or_insert_with(|| Value::String(chrono::Utc::now().to_rfc3339()));
        let stored = Value::Object(map);
        self.records
            .write()
            .entry(entity.to_string())
            .or_default()
            .push(stored.clone());
        Ok(stored)
    }

    fn update(&self, entity: &str, id: &str, patch: Value) -> Result<Value, StoreError> {
        let patch = Self::as_object(patch)?;
        let mut records = self.records.write();
        let list = records
            .get_mut(entity)
            .ok_or_else(|| StoreError::NotFound {
                entity: entity.into(),
                id: id.into(),
            })?;
        for stored in list.iter_mut() {
            let matches = stored
                .as_object()
                .and_then(Self::record_id)
                .map_or(false, |stored_id| stored_id == id);
            if matches {
                if let Value::Object(map) = stored {
                    for (key, value) in patch {
                        map.insert(key, value);
                    }
                }
                return Ok(stored.clone());
            }
        }
        Err(StoreError::NotFound {
            entity: entity.into(),
            id: id.into(),
        })
    }

    fn delete(&self, entity: &str, id: &str) -> Result<(), StoreError> {
        let mut records = self.records.write();
        let list = records
            .get_mut(entity)
            .ok_or_else(|| StoreError::NotFound {
                entity: entity.into(),
                id: id.into(),
            })?;
        let before = list.len();
        list.retain(|stored| {
            stored
                .as_object()
                .and_then(Self::record_id)
                .map_or(true, |stored_id| stored_id != id)
        });
        if list.len() == before {
            return Err(StoreError::NotFound {
                entity: entity.into(),
                id: id.into(),
            });
        }
        Ok(())
    }
}
