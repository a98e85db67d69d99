//! Record persistence seam
//!
//! Fitted image spaces and melody fingerprints are handed to a
//! [`RecordStore`] and fetched back by [`RecordId`]. Real blob or database
//! backends live outside this crate and implement the trait; the caller
//! creates the store and passes it by reference. [`MemoryStore`] keeps
//! records in-process as JSON text.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::analysis::records::{ImageSpaceRecord, MelodyRecord};
use crate::error::RetrievalError;

/// Identifier assigned by a store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordId(Uuid);

impl RecordId {
    /// Fresh random (v4) identifier
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Underlying UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for RecordId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RecordId {
    type Err = RetrievalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| RetrievalError::InvalidInput(format!("Invalid record id '{}': {}", s, e)))
    }
}

/// Anything a store can hold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Record {
    /// A fitted image space
    ImageSpace(ImageSpaceRecord),
    /// A named melody fingerprint
    Melody(MelodyRecord),
}

/// Storage backend for records
pub trait RecordStore {
    /// Persist a record and return its new id
    fn store(&mut self, record: Record) -> Result<RecordId, RetrievalError>;

    /// Load a record
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown id
    fn fetch(&self, id: &RecordId) -> Result<Record, RetrievalError>;

    /// Check whether an id is known
    fn contains(&self, id: &RecordId) -> bool {
        self.fetch(id).is_ok()
    }
}

/// In-process store holding records as JSON text
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: HashMap<RecordId, String>,
}

impl MemoryStore {
    /// Empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True if nothing is stored
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Delete a record, returning whether it existed
    pub fn remove(&mut self, id: &RecordId) -> bool {
        self.records.remove(id).is_some()
    }
}

impl RecordStore for MemoryStore {
    fn store(&mut self, record: Record) -> Result<RecordId, RetrievalError> {
        let text = serde_json::to_string(&record)
            .map_err(|e| RetrievalError::SerializationError(e.to_string()))?;
        let id = RecordId::new();
        log::debug!("Storing record {} ({} bytes)", id, text.len());
        self.records.insert(id, text);
        Ok(id)
    }

    fn fetch(&self, id: &RecordId) -> Result<Record, RetrievalError> {
        let text = self
            .records
            .get(id)
            .ok_or_else(|| RetrievalError::NotFound(format!("No record with id {}", id)))?;
        serde_json::from_str(text).map_err(|e| RetrievalError::SerializationError(e.to_string()))
    }

    fn contains(&self, id: &RecordId) -> bool {
        self.records.contains_key(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn melody() -> Record {
        Record::Melody(MelodyRecord {
            name: "theme".to_string(),
            feature_set: vec![vec![vec![0.25, 0.75], vec![1.0], vec![0.5, 0.5]]],
        })
    }

    #[test]
    fn test_store_and_fetch() {
        let mut store = MemoryStore::new();
        let id = store.store(melody()).unwrap();
        assert!(store.contains(&id));
        assert_eq!(store.fetch(&id).unwrap(), melody());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_ids_are_unique() {
        let mut store = MemoryStore::new();
        let a = store.store(melody()).unwrap();
        let b = store.store(melody()).unwrap();
        assert_ne!(a, b);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_unknown_id() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.fetch(&RecordId::new()),
            Err(RetrievalError::NotFound(_))
        ));
    }

    #[test]
    fn test_remove() {
        let mut store = MemoryStore::new();
        let id = store.store(melody()).unwrap();
        assert!(store.remove(&id));
        assert!(!store.remove(&id));
        assert!(store.is_empty());
    }

    #[test]
    fn test_record_id_parse() {
        let id = RecordId::new();
        let parsed: RecordId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
        assert!("not-a-uuid".parse::<RecordId>().is_err());
    }

    #[test]
    fn test_record_is_tagged() {
        let json = serde_json::to_value(melody()).unwrap();
        assert_eq!(json["kind"], "melody");
        assert_eq!(json["name"], "theme");
    }
}
