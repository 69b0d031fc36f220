//! Append-only, order-preserving buffer of payloads in a hash store.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::store::{Codec, HashStore, JsonCodec, MemoryHashStore};
use crate::types::{CacheResult, ORDINAL_WIDTH};

/// Payloads stored as the fields of one hash, keyed by zero-padded ordinals.
///
/// The ordinal of a new entry is the current field count, so lexical
/// order of field names is append order. Appends from several writers to
/// the same key are not coordinated.
pub struct ItemBuffer {
    store: Arc<dyn HashStore>,
    key: String,
    codec: Arc<dyn Codec>,
}

impl ItemBuffer {
    /// A buffer under `key` in `store`, using the JSON codec.
    pub fn new(store: Arc<dyn HashStore>, key: impl Into<String>) -> Self {
        Self::with_codec(store, key, Arc::new(JsonCodec))
    }

    /// A buffer under `key` in `store`, using `codec`.
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

    /// A buffer held in a private in-process store.
    pub fn in_process(channel: impl Into<String>) -> Self {
        Self::new(Arc::new(MemoryHashStore::new()), channel)
    }

    /// The hash key entries are stored under.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Append a payload; returns its ordinal.
    pub fn append<T: Serialize + ?Sized>(&self, payload: &T) -> CacheResult<usize> {
        let ordinal = self.store.field_count(&self.key)?;
        let data = self.codec.encode(&serde_json::to_value(payload)?)?;
        self.store.set_field(&self.key, &ordinal_field(ordinal), &data)?;
        Ok(ordinal)
    }

    /// Iterate stored payloads in append order.
    ///
    /// Each call re-reads the store; reading never removes entries.
    pub fn iter(&self) -> CacheResult<Items> {
        let mut entries = self.store.get_all(&self.key)?;
        entries.sort_by(|(a, _), (b, _)| a.cmp(b));
        Ok(Items {
            entries: entries.into_iter(),
            codec: Arc::clone(&self.codec),
        })
    }

    /// All stored payloads in append order.
    pub fn to_vec(&self) -> CacheResult<Vec<Value>> {
        self.iter()?.collect()
    }

    /// All stored payloads, deserialized into `T`.
    pub fn read_as<T: DeserializeOwned>(&self) -> CacheResult<Vec<T>> {
        self.iter()?
            .map(|item| Ok(serde_json::from_value(item?)?))
            .collect()
    }

    /// Number of stored payloads.
    pub fn count(&self) -> CacheResult<usize> {
        self.store.field_count(&self.key)
    }

    /// Whether the buffer holds nothing.
    pub fn is_empty(&self) -> CacheResult<bool> {
        Ok(self.count()? == 0)
    }

    /// Delete the whole key; returns how many payloads were dropped.
    pub fn clear(&self) -> CacheResult<usize> {
        let dropped = self.store.delete_key(&self.key)?;
        log::info!("Cleared {dropped} items from buffer '{}'", self.key);
        Ok(dropped)
    }
}

/// Lazily decoded buffer payloads, in append order.
pub struct Items {
    entries: std::vec::IntoIter<(String, Vec<u8>)>,
    codec: Arc<dyn Codec>,
}

impl Iterator for Items {
    type Item = CacheResult<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        self.entries.next().map(|(_, data)| self.codec.decode(&data))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.entries.size_hint()
    }
}

/// Field name for the entry at `ordinal`.
pub fn ordinal_field(ordinal: usize) -> String {
    format!("{ordinal:0width$}", width = ORDINAL_WIDTH)
}
