//! Hash stores: the keyed field/value primitives shared backends build on.

pub mod codec;
pub mod dsn;
pub mod memory;
pub mod redis_store;

pub use codec::{codec_by_name, Codec, JsonCodec, Lz4JsonCodec};
pub use dsn::{Dsn, DEFAULT_PORT, DEFAULT_TIMEOUT_SECS};
pub use memory::MemoryHashStore;
pub use redis_store::RedisHashStore;

use crate::types::CacheResult;

/// A store of hashes: each key holds a set of named fields.
///
/// Every shared backend is expressed through these primitives, so any
/// hash-capable store can stand in for Redis.
pub trait HashStore: Send + Sync {
    /// Write one field of the hash at `key`.
    fn set_field(&self, key: &str, field: &str, value: &[u8]) -> CacheResult<()>;

    /// Read one field; `None` when the key or field is absent.
    fn get_field(&self, key: &str, field: &str) -> CacheResult<Option<Vec<u8>>>;

    /// Read several fields, one slot per requested field, in request order.
    fn get_fields(&self, key: &str, fields: &[String]) -> CacheResult<Vec<Option<Vec<u8>>>>;

    /// Read every field of the hash at `key`.
    fn get_all(&self, key: &str) -> CacheResult<Vec<(String, Vec<u8>)>>;

    /// Number of fields in the hash at `key`.
    fn field_count(&self, key: &str) -> CacheResult<usize>;

    /// Remove the whole hash, returning how many fields it held.
    fn delete_key(&self, key: &str) -> CacheResult<usize>;

    /// Short name of the store kind.
    fn label(&self) -> &'static str;
}

/// Connect to the shared store named by a connection string.
///
/// A missing or blank string means no backend is configured and yields
/// `Ok(None)`. A configured backend that cannot be parsed or reached is
/// an error.
pub fn connect(dsn: Option<&str>) -> CacheResult<Option<RedisHashStore>> {
    let raw = match dsn.map(str::trim) {
        Some(raw) if !raw.is_empty() => raw,
        _ => return Ok(None),
    };
    let parsed = Dsn::parse(raw)?;
    RedisHashStore::connect(&parsed).map(Some)
}
