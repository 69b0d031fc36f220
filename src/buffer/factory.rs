//! Builds item buffers on the shared backend under run-scoped keys.

use std::sync::Arc;

use super::item_buffer::ItemBuffer;
use crate::run::{RunContext, RunKeyResolver};
use crate::store::{connect, Codec, HashStore, JsonCodec};
use crate::types::{CacheError, CacheResult, DEFAULT_NAMESPACE, REDIS_DSN_ENV};

/// Builder for an [`ItemBuffer`] keyed `{namespace}:{run_key}:{channel}`.
///
/// The backend is taken from, in order: a pre-built store, an explicit
/// connection string, the `ROWCACHE_REDIS_DSN` environment variable.
/// Without any of them, or when the backend cannot be reached, building
/// fails.
pub struct ItemBufferFactory {
    channel: String,
    namespace: String,
    dsn: Option<String>,
    store: Option<Arc<dyn HashStore>>,
    codec: Arc<dyn Codec>,
    clear_before_use: bool,
    run: Option<RunContext>,
}

impl ItemBufferFactory {
    /// Start building a buffer for `channel`.
    pub fn new(channel: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            namespace: DEFAULT_NAMESPACE.to_string(),
            dsn: None,
            store: None,
            codec: Arc::new(JsonCodec),
            clear_before_use: false,
            run: None,
        }
    }

    /// Key prefix; trailing separators are trimmed.
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Connection string of the shared backend.
    pub fn dsn(mut self, dsn: impl Into<String>) -> Self {
        self.dsn = Some(dsn.into());
        self
    }

    /// Use an already-connected store instead of connecting.
    pub fn store(mut self, store: Arc<dyn HashStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Payload codec.
    pub fn codec(mut self, codec: Arc<dyn Codec>) -> Self {
        self.codec = codec;
        self
    }

    /// Empty the buffer right after construction.
    pub fn clear_before_use(mut self, clear: bool) -> Self {
        self.clear_before_use = clear;
        self
    }

    /// Run context supplying the run key. Without one, the key is
    /// resolved from the environment (or generated and published there).
    pub fn run(mut self, run: RunContext) -> Self {
        self.run = Some(run);
        self
    }

    /// The shared key the buffer will use.
    ///
    /// Without a [`run`](Self::run) context this resolves the run key from
    /// `ROWCACHE_RUN_KEY`, generating and publishing one there if it is
    /// unset. Set a context first to keep the call free of side effects.
    pub fn key(&self) -> CacheResult<String> {
        let channel = self.channel.trim();
        if channel.is_empty() {
            return Err(CacheError::MissingChannel);
        }
        let key = match &self.run {
            Some(run) => run.key_for(&self.namespace, channel),
            None => RunKeyResolver::new()
                .context(None)
                .key_for(&self.namespace, channel),
        };
        Ok(key)
    }

    /// Connect (if needed) and create the buffer.
    ///
    /// The run key is resolved once here, before any connection is made.
    pub fn build(mut self) -> CacheResult<ItemBuffer> {
        if self.channel.trim().is_empty() {
            return Err(CacheError::MissingChannel);
        }
        if self.run.is_none() {
            self.run = Some(RunKeyResolver::new().context(None));
        }
        let key = self.key()?;
        let store = match self.store {
            Some(store) => store,
            None => {
                let dsn = self.dsn.or_else(|| std::env::var(REDIS_DSN_ENV).ok());
                match connect(dsn.as_deref())? {
                    Some(redis) => Arc::new(redis) as Arc<dyn HashStore>,
                    None => {
                        return Err(CacheError::BackendUnavailable(format!(
                            "item buffer '{key}' needs a connection string or client"
                        )))
                    }
                }
            }
        };

        let buffer = ItemBuffer::with_codec(store, key, self.codec);
        if self.clear_before_use {
            buffer.clear()?;
        }
        Ok(buffer)
    }
}
