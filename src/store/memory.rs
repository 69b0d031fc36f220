//! In-process hash store.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use indexmap::IndexMap;

use super::HashStore;
use crate::types::{CacheError, CacheResult};

type Hashes = HashMap<String, IndexMap<String, Vec<u8>>>;

/// A hash store held in process memory.
///
/// Fields keep insertion order, so `get_all` returns them in the order
/// they were first written.
#[derive(Default)]
pub struct MemoryHashStore {
    hashes: Mutex<Hashes>,
}

impl MemoryHashStore {
    /// Create a new, empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently holding at least one field.
    pub fn key_count(&self) -> usize {
        self.lock().map(|h| h.len()).unwrap_or(0)
    }

    fn lock(&self) -> CacheResult<MutexGuard<'_, Hashes>> {
        self.hashes.lock().map_err(|_| CacheError::LockPoisoned)
    }
}

impl HashStore for MemoryHashStore {
    fn set_field(&self, key: &str, field: &str, value: &[u8]) -> CacheResult<()> {
        self.lock()?
            .entry(key.to_string())
            .or_default()
            .insert(field.to_string(), value.to_vec());
        Ok(())
    }

    fn get_field(&self, key: &str, field: &str) -> CacheResult<Option<Vec<u8>>> {
        Ok(self
            .lock()?
            .get(key)
            .and_then(|fields| fields.get(field))
            .cloned())
    }

    fn get_fields(&self, key: &str, fields: &[String]) -> CacheResult<Vec<Option<Vec<u8>>>> {
        let hashes = self.lock()?;
        let stored = hashes.get(key);
        Ok(fields
            .iter()
            .map(|f| stored.and_then(|s| s.get(f)).cloned())
            .collect())
    }

    fn get_all(&self, key: &str) -> CacheResult<Vec<(String, Vec<u8>)>> {
        Ok(self
            .lock()?
            .get(key)
            .map(|fields| {
                fields
                    .iter()
                    .map(|(f, v)| (f.clone(), v.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }

    fn field_count(&self, key: &str) -> CacheResult<usize> {
        Ok(self.lock()?.get(key).map(|f| f.len()).unwrap_or(0))
    }

    fn delete_key(&self, key: &str) -> CacheResult<usize> {
        Ok(self.lock()?.remove(key).map(|f| f.len()).unwrap_or(0))
    }

    fn label(&self) -> &'static str {
        "memory"
    }
}
