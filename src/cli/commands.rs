//! CLI command implementations.

use crate::buffer::ItemBuffer;
use crate::config::CacheConfig;
use crate::run::RunKeyResolver;
use crate::store::{Dsn, RedisHashStore};
use crate::types::{CacheError, CacheResult, RUN_KEY_ENV};

/// Options shared by the buffer subcommands.
pub struct BufferArgs<'a> {
    /// Buffer channel name; blank is rejected when the buffer is opened.
    pub channel: &'a str,
    /// Key namespace; the configured one when `None`.
    pub namespace: Option<&'a str>,
    /// Run key the buffer was written under.
    pub run_key: Option<&'a str>,
    /// Connection string; falls back to config, then the environment.
    pub dsn: Option<&'a str>,
}

/// Resolve and print the run key.
pub fn cmd_run_key(
    config: &CacheConfig,
    override_key: Option<&str>,
    json: bool,
) -> CacheResult<()> {
    let mut resolver = RunKeyResolver::new();
    let run = config.run_context(&mut resolver, override_key);
    if json {
        let info = serde_json::json!({
            "run_key": run.run_key(),
            "env_var": resolver.env_var(),
        });
        println!("{}", serde_json::to_string_pretty(&info).unwrap_or_default());
    } else {
        println!("{}", run.run_key());
    }
    Ok(())
}

/// Connect to the shared backend and round-trip a PING.
pub fn cmd_ping(config: &CacheConfig, dsn: Option<&str>, json: bool) -> CacheResult<()> {
    let raw = config
        .resolve_dsn(dsn)
        .ok_or_else(|| CacheError::BackendUnavailable("no connection string given".to_string()))?;
    let parsed = Dsn::parse(&raw)?;
    let store = RedisHashStore::connect(&parsed)?;
    store.ping()?;
    if json {
        let info = serde_json::json!({
            "endpoint": store.endpoint(),
            "tls": parsed.tls,
            "database": parsed.database,
            "status": "ok",
        });
        println!("{}", serde_json::to_string_pretty(&info).unwrap_or_default());
    } else {
        println!("PONG from {}", store.endpoint());
    }
    Ok(())
}

/// Print the number of items in a buffer.
pub fn cmd_buffer_count(
    config: &CacheConfig,
    args: &BufferArgs<'_>,
    json: bool,
) -> CacheResult<()> {
    let buffer = open_buffer(config, args)?;
    let count = buffer.count()?;
    if json {
        let info = serde_json::json!({ "key": buffer.key(), "count": count });
        println!("{}", serde_json::to_string_pretty(&info).unwrap_or_default());
    } else {
        println!("{}: {} items", buffer.key(), count);
    }
    Ok(())
}

/// Print every item in a buffer, in append order.
pub fn cmd_buffer_dump(
    config: &CacheConfig,
    args: &BufferArgs<'_>,
    json: bool,
) -> CacheResult<()> {
    let buffer = open_buffer(config, args)?;
    let items = buffer.to_vec()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&items).unwrap_or_default());
    } else {
        for (ordinal, item) in items.iter().enumerate() {
            println!("{ordinal:>6}  {item}");
        }
        println!("{} items in {}", items.len(), buffer.key());
    }
    Ok(())
}

/// Delete a buffer's key.
pub fn cmd_buffer_clear(
    config: &CacheConfig,
    args: &BufferArgs<'_>,
    json: bool,
) -> CacheResult<()> {
    let buffer = open_buffer(config, args)?;
    let dropped = buffer.clear()?;
    if json {
        let info = serde_json::json!({ "key": buffer.key(), "cleared": dropped });
        println!("{}", serde_json::to_string_pretty(&info).unwrap_or_default());
    } else {
        println!("Cleared {} items from {}", dropped, buffer.key());
    }
    Ok(())
}

fn open_buffer(config: &CacheConfig, args: &BufferArgs<'_>) -> CacheResult<ItemBuffer> {
    // A generated key would always point at an empty buffer.
    let has_key = args.run_key.is_some()
        || config.run_key.is_some()
        || std::env::var(RUN_KEY_ENV).is_ok_and(|k| !k.trim().is_empty());
    if !has_key {
        return Err(CacheError::Config(format!(
            "a run key is required: pass --run-key or set {RUN_KEY_ENV}"
        )));
    }

    let mut resolver = RunKeyResolver::new();
    let run = config.run_context(&mut resolver, args.run_key);
    let mut factory = config.buffer_factory(args.channel, run)?;
    if let Some(namespace) = args.namespace {
        factory = factory.namespace(namespace);
    }
    if let Some(dsn) = config.resolve_dsn(args.dsn) {
        factory = factory.dsn(dsn);
    }
    let buffer = factory.build()?;
    log::debug!("Opened buffer '{}'", buffer.key());
    Ok(buffer)
}

