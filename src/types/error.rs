//! Error types for the rowcache library.

use thiserror::Error;

/// All errors that can occur in the rowcache library.
///
/// Absence of an identifier is never an error: lookups return an empty
/// list or `None` instead.
#[derive(Error, Debug)]
pub enum CacheError {
    /// An index was constructed without an identifier field.
    #[error("Identifier field name must not be empty")]
    EmptyIdentifierField,

    /// An item buffer was requested without a channel name.
    #[error("Item buffer channel name must not be empty")]
    MissingChannel,

    /// A shared backend was required but no connection string or client was supplied.
    #[error("No shared backend available: {0}")]
    BackendUnavailable(String),

    /// The connection string could not be parsed.
    #[error("Invalid connection string: {0}")]
    InvalidDsn(String),

    /// The remote hash store reported an error (connection, auth, protocol).
    #[error("Backend error: {0}")]
    Backend(#[from] redis::RedisError),

    /// A stored value could not be encoded or decoded.
    #[error("Codec error: {0}")]
    Codec(String),

    /// Configuration file could not be parsed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A shared in-process store was poisoned by a panicking writer.
    #[error("In-process store lock poisoned")]
    LockPoisoned,
}

impl From<serde_json::Error> for CacheError {
    fn from(e: serde_json::Error) -> Self {
        CacheError::Codec(e.to_string())
    }
}

impl From<toml::de::Error> for CacheError {
    fn from(e: toml::de::Error) -> Self {
        CacheError::Config(e.to_string())
    }
}

/// Convenience result type for rowcache operations.
pub type CacheResult<T> = Result<T, CacheError>;
