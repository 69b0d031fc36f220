//! In-process bucket storage.

use super::StorageBackend;
use crate::types::{Buckets, CacheResult, IndexEntry};

/// Buckets held directly in process memory. No I/O.
#[derive(Default)]
pub struct ArrayStorage {
    buckets: Buckets,
}

impl ArrayStorage {
    /// Create a new, empty storage.
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageBackend for ArrayStorage {
    fn hydrate(&mut self, buckets: Buckets) -> CacheResult<()> {
        self.buckets = buckets;
        Ok(())
    }

    fn fetch(&self, identifier: &str) -> CacheResult<Option<Vec<IndexEntry>>> {
        Ok(self.buckets.get(identifier).cloned())
    }

    fn fetch_many(&self, identifiers: &[String]) -> CacheResult<Buckets> {
        Ok(identifiers
            .iter()
            .filter_map(|id| self.buckets.get(id).map(|b| (id.clone(), b.clone())))
            .collect())
    }

    fn all(&self) -> CacheResult<Buckets> {
        Ok(self.buckets.clone())
    }

    fn clear(&mut self) -> CacheResult<()> {
        self.buckets.clear();
        Ok(())
    }

    fn count(&self) -> CacheResult<usize> {
        Ok(self.buckets.len())
    }

    fn label(&self) -> &'static str {
        "in-process"
    }
}
