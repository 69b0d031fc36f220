//! Bucket storage backends for the identifier index.

pub mod array;
pub mod shared;

pub use array::ArrayStorage;
pub use shared::SharedStorage;

use std::sync::Arc;

use crate::store::{Codec, HashStore, JsonCodec};
use crate::types::{Buckets, CacheResult, IndexEntry};

/// A keyed bucket store holding one index's identifier buckets.
pub trait StorageBackend {
    /// Replace everything stored with `buckets`. There is no merge.
    fn hydrate(&mut self, buckets: Buckets) -> CacheResult<()>;

    /// The bucket for one identifier, or `None` when it was never stored.
    fn fetch(&self, identifier: &str) -> CacheResult<Option<Vec<IndexEntry>>>;

    /// Buckets for the identifiers that are present; missing ones are left out.
    fn fetch_many(&self, identifiers: &[String]) -> CacheResult<Buckets>;

    /// Every stored bucket, in the backend's iteration order.
    fn all(&self) -> CacheResult<Buckets>;

    /// Drop every stored bucket.
    fn clear(&mut self) -> CacheResult<()>;

    /// Number of stored buckets.
    fn count(&self) -> CacheResult<usize>;

    /// Human label of the storage kind, for logs only.
    fn label(&self) -> &'static str;
}

/// Which storage an index is built on. Chosen once, at construction.
pub enum BackendKind {
    /// Buckets live in this process.
    InProcess,
    /// Buckets live in a shared hash store under `key`.
    Shared {
        store: Arc<dyn HashStore>,
        key: String,
        codec: Arc<dyn Codec>,
    },
}

impl BackendKind {
    /// Shared storage under `key` with the default codec.
    pub fn shared(store: Arc<dyn HashStore>, key: impl Into<String>) -> Self {
        BackendKind::Shared {
            store,
            key: key.into(),
            codec: Arc::new(JsonCodec),
        }
    }
}

/// Open the storage backend for `kind`.
pub fn open_backend(kind: BackendKind) -> Box<dyn StorageBackend> {
    match kind {
        BackendKind::InProcess => Box::new(ArrayStorage::new()),
        BackendKind::Shared { store, key, codec } => {
            Box::new(SharedStorage::with_codec(store, key, codec))
        }
    }
}
