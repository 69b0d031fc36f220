//! rowcache: indexed, cache-backed row lookup for large tabular sources.
//!
//! Builds an identifier index over a sequential row cursor once, keeps it
//! behind a pluggable storage backend (process memory or a shared hash
//! store), groups positions into zones for range re-reads, and buffers
//! output items in the shared store under run-scoped keys.

pub mod buffer;
pub mod cli;
pub mod config;
pub mod index;
pub mod run;
pub mod storage;
pub mod store;
pub mod types;

// Re-export commonly used types at the crate root
pub use buffer::{ItemBuffer, ItemBufferFactory};
pub use config::CacheConfig;
pub use index::{
    natural_cmp, IdentifierIndex, Normalizer, PrimeStats, RowCursor, VecCursor, ZoneIndexer,
    ZoneKeyMode,
};
pub use run::{generate_run_key, RunContext, RunKeyResolver};
pub use storage::{open_backend, ArrayStorage, BackendKind, SharedStorage, StorageBackend};
pub use store::{
    connect, Codec, Dsn, HashStore, JsonCodec, Lz4JsonCodec, MemoryHashStore, RedisHashStore,
};
pub use types::{
    identifier_of, row_from, shared_key, Buckets, CacheError, CacheResult, IndexEntry, Position,
    Row, DEFAULT_NAMESPACE, ORDINAL_WIDTH, ZONE_SIZE_MEDIUM, ZONE_SIZE_SMALL,
};
