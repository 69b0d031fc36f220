//! Configuration loading from file and environment.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::buffer::ItemBufferFactory;
use crate::index::{IdentifierIndex, ZoneIndexer};
use crate::run::{RunContext, RunKeyResolver};
use crate::storage::BackendKind;
use crate::store::{codec_by_name, connect, Codec, HashStore, RedisHashStore};
use crate::types::{CacheError, CacheResult, DEFAULT_NAMESPACE, REDIS_DSN_ENV, ZONE_SIZE_MEDIUM};

/// Settings shared by the indexes and buffers of one process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Prefix of every shared-backend key.
    #[serde(default = "default_namespace")]
    pub namespace: String,
    /// Shared-backend connection string.
    #[serde(default)]
    pub redis_dsn: Option<String>,
    /// Fixed run key; resolved from the environment when unset.
    #[serde(default)]
    pub run_key: Option<String>,
    /// Positions per zone.
    #[serde(default = "default_zone_size")]
    pub zone_size: u64,
    /// Keep every row per identifier, not just the first.
    #[serde(default = "default_allow_multiple_matches")]
    pub allow_multiple_matches: bool,
    /// Persist identifier buckets in natural order.
    #[serde(default)]
    pub sort_before_index: bool,
    /// Codec for stored values: "json" or "lz4".
    #[serde(default = "default_codec")]
    pub codec: String,
}

fn default_namespace() -> String {
    DEFAULT_NAMESPACE.to_string()
}

fn default_zone_size() -> u64 {
    ZONE_SIZE_MEDIUM
}

fn default_allow_multiple_matches() -> bool {
    true
}

fn default_codec() -> String {
    "json".to_string()
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            redis_dsn: None,
            run_key: None,
            zone_size: default_zone_size(),
            allow_multiple_matches: default_allow_multiple_matches(),
            sort_before_index: false,
            codec: default_codec(),
        }
    }
}

impl CacheConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> CacheResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CacheError::Io(std::io::Error::other(format!(
                "Failed to read config file {}: {e}",
                path.display()
            )))
        })?;
        Ok(toml::from_str(&content)?)
    }

    /// Resolve the connection string using priority order:
    /// 1. Explicit value (CLI arg, caller)
    /// 2. `redis_dsn` from this configuration
    /// 3. `ROWCACHE_REDIS_DSN` environment variable
    ///
    /// Blank values count as unset.
    pub fn resolve_dsn(&self, explicit: Option<&str>) -> Option<String> {
        let candidates = [
            explicit.map(str::to_string),
            self.redis_dsn.clone(),
            std::env::var(REDIS_DSN_ENV).ok(),
        ];
        candidates
            .into_iter()
            .flatten()
            .map(|dsn| dsn.trim().to_string())
            .find(|dsn| !dsn.is_empty())
    }

    /// Resolve the run context; an explicit key beats the configured one.
    pub fn run_context(
        &self,
        resolver: &mut RunKeyResolver,
        explicit: Option<&str>,
    ) -> RunContext {
        let explicit = explicit.filter(|key| !key.trim().is_empty());
        resolver.context(explicit.or(self.run_key.as_deref()))
    }

    /// The configured codec; unknown names are a configuration error.
    pub fn codec(&self) -> CacheResult<Arc<dyn Codec>> {
        codec_by_name(&self.codec)
            .ok_or_else(|| CacheError::Config(format!("unknown codec '{}'", self.codec)))
    }

    /// Connect to the configured shared backend, if any.
    pub fn connect(&self, explicit: Option<&str>) -> CacheResult<Option<RedisHashStore>> {
        connect(self.resolve_dsn(explicit).as_deref())
    }

    /// An identifier index on `field` with this configuration's options.
    pub fn identifier_index(
        &self,
        field: &str,
        backend: BackendKind,
    ) -> CacheResult<IdentifierIndex> {
        let backend = match backend {
            BackendKind::Shared { store, key, .. } => BackendKind::Shared {
                store,
                key,
                codec: self.codec()?,
            },
            other => other,
        };
        Ok(IdentifierIndex::with_backend(field, backend)?
            .allow_multiple_matches(self.allow_multiple_matches)
            .sort_before_index(self.sort_before_index))
    }

    /// Backend kind for an index named `name` in `store`, keyed by run.
    pub fn shared_index_backend(
        &self,
        store: Arc<dyn HashStore>,
        run: &RunContext,
        name: &str,
    ) -> CacheResult<BackendKind> {
        Ok(BackendKind::Shared {
            store,
            key: run.key_for(&self.namespace, name),
            codec: self.codec()?,
        })
    }

    /// A zone indexer with the configured zone size.
    pub fn zone_indexer(&self) -> ZoneIndexer {
        ZoneIndexer::new(self.zone_size)
    }

    /// A buffer factory for `channel` with this configuration's namespace,
    /// codec, and connection string.
    pub fn buffer_factory(
        &self,
        channel: &str,
        run: RunContext,
    ) -> CacheResult<ItemBufferFactory> {
        let mut factory = ItemBufferFactory::new(channel)
            .namespace(self.namespace.clone())
            .codec(self.codec()?)
            .run(run);
        if let Some(dsn) = self.resolve_dsn(None) {
            factory = factory.dsn(dsn);
        }
        Ok(factory)
    }
}
