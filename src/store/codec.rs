//! Value codecs for entries written to a hash store.

use serde_json::Value;

use crate::types::{CacheError, CacheResult};

/// Encodes structured values to bytes and back.
///
/// The codec is an implementation default, not a wire contract: anything
/// that round-trips a [`Value`] can be injected.
pub trait Codec: Send + Sync {
    /// Encode a value for storage.
    fn encode(&self, value: &Value) -> CacheResult<Vec<u8>>;

    /// Decode a stored value.
    fn decode(&self, data: &[u8]) -> CacheResult<Value>;

    /// Short name used in logs and CLI output.
    fn name(&self) -> &'static str;
}

/// Plain JSON. The default codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode(&self, value: &Value) -> CacheResult<Vec<u8>> {
        Ok(serde_json::to_vec(value)?)
    }

    fn decode(&self, data: &[u8]) -> CacheResult<Value> {
        Ok(serde_json::from_slice(data)?)
    }

    fn name(&self) -> &'static str {
        "json"
    }
}

/// JSON compressed with LZ4 (size prepended for decompression).
#[derive(Debug, Clone, Copy, Default)]
pub struct Lz4JsonCodec;

impl Codec for Lz4JsonCodec {
    fn encode(&self, value: &Value) -> CacheResult<Vec<u8>> {
        let json = serde_json::to_vec(value)?;
        Ok(lz4_flex::compress_prepend_size(&json))
    }

    fn decode(&self, data: &[u8]) -> CacheResult<Value> {
        let bytes = lz4_flex::decompress_size_prepended(data)
            .map_err(|e| CacheError::Codec(e.to_string()))?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    fn name(&self) -> &'static str {
        "lz4-json"
    }
}

/// Look up a codec by its CLI/config name.
pub fn codec_by_name(name: &str) -> Option<std::sync::Arc<dyn Codec>> {
    match name.to_lowercase().as_str() {
        "json" => Some(std::sync::Arc::new(JsonCodec)),
        "lz4" | "lz4-json" => Some(std::sync::Arc::new(Lz4JsonCodec)),
        _ => None,
    }
}
