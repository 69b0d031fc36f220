//! Redis-backed hash store.

use std::sync::{Mutex, MutexGuard};

use redis::Connection;

use super::dsn::Dsn;
use super::HashStore;
use crate::types::{CacheError, CacheResult};

/// A hash store backed by one Redis connection.
///
/// The connection is opened at construction, so an unreachable server
/// fails here rather than on first use.
pub struct RedisHashStore {
    conn: Mutex<Connection>,
    endpoint: String,
}

impl RedisHashStore {
    /// Connect to the server described by `dsn`.
    pub fn connect(dsn: &Dsn) -> CacheResult<Self> {
        let client = redis::Client::open(dsn.connection_url()?.as_str())?;
        let conn = if dsn.timeout.is_zero() {
            client.get_connection()?
        } else {
            client.get_connection_with_timeout(dsn.timeout)?
        };
        log::debug!("Connected to shared hash store at {dsn}");
        Ok(Self {
            conn: Mutex::new(conn),
            endpoint: dsn.to_string(),
        })
    }

    /// Wrap an already-open connection.
    pub fn from_connection(conn: Connection, endpoint: impl Into<String>) -> Self {
        Self {
            conn: Mutex::new(conn),
            endpoint: endpoint.into(),
        }
    }

    /// Redacted endpoint this store is connected to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Round-trip a PING to check the connection.
    pub fn ping(&self) -> CacheResult<()> {
        let _: String = redis::cmd("PING").query(&mut *self.lock()?)?;
        Ok(())
    }

    fn lock(&self) -> CacheResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| CacheError::LockPoisoned)
    }
}

impl HashStore for RedisHashStore {
    fn set_field(&self, key: &str, field: &str, value: &[u8]) -> CacheResult<()> {
        let _: i64 = redis::cmd("HSET")
            .arg(key)
            .arg(field)
            .arg(value)
            .query(&mut *self.lock()?)?;
        Ok(())
    }

    fn get_field(&self, key: &str, field: &str) -> CacheResult<Option<Vec<u8>>> {
        Ok(redis::cmd("HGET")
            .arg(key)
            .arg(field)
            .query(&mut *self.lock()?)?)
    }

    fn get_fields(&self, key: &str, fields: &[String]) -> CacheResult<Vec<Option<Vec<u8>>>> {
        if fields.is_empty() {
            return Ok(Vec::new());
        }
        let mut cmd = redis::cmd("HMGET");
        cmd.arg(key);
        for field in fields {
            cmd.arg(field);
        }
        Ok(cmd.query(&mut *self.lock()?)?)
    }

    fn get_all(&self, key: &str) -> CacheResult<Vec<(String, Vec<u8>)>> {
        // HGETALL replies with a flat field/value list.
        let flat: Vec<Vec<u8>> = redis::cmd("HGETALL").arg(key).query(&mut *self.lock()?)?;
        let mut pairs = Vec::with_capacity(flat.len() / 2);
        let mut items = flat.into_iter();
        while let (Some(field), Some(value)) = (items.next(), items.next()) {
            let field = String::from_utf8(field)
                .map_err(|e| CacheError::Codec(format!("non-UTF-8 field name: {e}")))?;
            pairs.push((field, value));
        }
        Ok(pairs)
    }

    fn field_count(&self, key: &str) -> CacheResult<usize> {
        Ok(redis::cmd("HLEN").arg(key).query(&mut *self.lock()?)?)
    }

    fn delete_key(&self, key: &str) -> CacheResult<usize> {
        // DEL counts keys; report the fields the hash held.
        let mut conn = self.lock()?;
        let fields: usize = redis::cmd("HLEN").arg(key).query(&mut *conn)?;
        let _: usize = redis::cmd("DEL").arg(key).query(&mut *conn)?;
        Ok(fields)
    }

    fn label(&self) -> &'static str {
        "redis"
    }
}
