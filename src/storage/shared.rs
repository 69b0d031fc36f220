//! Bucket storage in a shared hash store.

use std::sync::Arc;

use crate::store::{Codec, HashStore, JsonCodec};
use crate::types::{Buckets, CacheResult, IndexEntry};

use super::StorageBackend;

/// Buckets stored as the fields of one remote hash, one field per identifier.
pub struct SharedStorage {
    store: Arc<dyn HashStore>,
    key: String,
    codec: Arc<dyn Codec>,
}

impl SharedStorage {
    /// Store buckets under `key` using the default JSON codec.
    pub fn new(store: Arc<dyn HashStore>, key: impl Into<String>) -> Self {
        Self::with_codec(store, key, Arc::new(JsonCodec))
    }

    /// Store buckets under `key` using a custom codec.
    pub fn with_codec(
        store: Arc<dyn HashStore>,
        key: impl Into<String>,
        codec: Arc<dyn Codec>,
    ) -> Self {
        Self {
            store,
            key: key.into(),
            codec,
        }
    }

    /// The hash key buckets are stored under.
    pub fn key(&self) -> &str {
        &self.key
    }

    fn encode(&self, entries: &[IndexEntry]) -> CacheResult<Vec<u8>> {
        self.codec.encode(&serde_json::to_value(entries)?)
    }

    fn decode(&self, data: &[u8]) -> CacheResult<Vec<IndexEntry>> {
        Ok(serde_json::from_value(self.codec.decode(data)?)?)
    }
}

impl StorageBackend for SharedStorage {
    fn hydrate(&mut self, buckets: Buckets) -> CacheResult<()> {
        self.store.delete_key(&self.key)?;
        for (identifier, entries) in &buckets {
            let data = self.encode(entries)?;
            self.store.set_field(&self.key, identifier, &data)?;
        }
        log::debug!(
            "Hydrated {} buckets into {} hash '{}'",
            buckets.len(),
            self.store.label(),
            self.key
        );
        Ok(())
    }

    fn fetch(&self, identifier: &str) -> CacheResult<Option<Vec<IndexEntry>>> {
        match self.store.get_field(&self.key, identifier)? {
            Some(data) => Ok(Some(self.decode(&data)?)),
            None => Ok(None),
        }
    }

    fn fetch_many(&self, identifiers: &[String]) -> CacheResult<Buckets> {
        let values = self.store.get_fields(&self.key, identifiers)?;
        let mut found = Buckets::with_capacity(values.len());
        for (identifier, value) in identifiers.iter().zip(values) {
            if let Some(data) = value {
                found.insert(identifier.clone(), self.decode(&data)?);
            }
        }
        Ok(found)
    }

    fn all(&self) -> CacheResult<Buckets> {
        self.store
            .get_all(&self.key)?
            .into_iter()
            .map(|(identifier, data)| Ok((identifier, self.decode(&data)?)))
            .collect()
    }

    fn clear(&mut self) -> CacheResult<()> {
        self.store.delete_key(&self.key)?;
        Ok(())
    }

    fn count(&self) -> CacheResult<usize> {
        self.store.field_count(&self.key)
    }

    fn label(&self) -> &'static str {
        "shared"
    }
}
