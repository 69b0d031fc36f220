//! Core data types for the rowcache library.

pub mod entry;
pub mod error;

pub use entry::{identifier_of, row_from, Buckets, IndexEntry, Position, Row};
pub use error::{CacheError, CacheResult};

/// Default namespace prefix for shared-backend keys.
pub const DEFAULT_NAMESPACE: &str = "rowcache";

/// Separator between the parts of a shared-backend key.
pub const KEY_SEPARATOR: char = ':';

/// Environment variable carrying a run-key override.
pub const RUN_KEY_ENV: &str = "ROWCACHE_RUN_KEY";

/// Environment variable carrying the shared-backend connection string.
pub const REDIS_DSN_ENV: &str = "ROWCACHE_REDIS_DSN";

/// Width of zero-padded item buffer ordinals.
pub const ORDINAL_WIDTH: usize = 10;

/// Default zone size: contiguous positions grouped per zone.
pub const ZONE_SIZE_MEDIUM: u64 = 5_000;

/// Zone size for sources with very wide rows.
pub const ZONE_SIZE_SMALL: u64 = 500;

/// Build a shared-backend key `{namespace}:{run_key}:{name}`.
///
/// Trailing separators on the namespace are trimmed; an empty namespace
/// falls back to [`DEFAULT_NAMESPACE`].
pub fn shared_key(namespace: &str, run_key: &str, name: &str) -> String {
    let trimmed = namespace.trim_end_matches(KEY_SEPARATOR);
    let namespace = if trimmed.is_empty() {
        DEFAULT_NAMESPACE
    } else {
        trimmed
    };
    format!("{namespace}{KEY_SEPARATOR}{run_key}{KEY_SEPARATOR}{name}")
}
