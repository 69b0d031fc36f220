//! Connection strings for the shared hash store.
//!
//! Format: `scheme://[username[:password]@]host[:port][/database][?query]`.
//! `redis`/`tcp` select plaintext, `rediss`/`tls` select TLS. Recognized
//! query parameters: `timeout` (seconds, float), `db`, `verify_peer`,
//! `verify_peer_name`.

use std::fmt;
use std::time::Duration;

use url::Url;

use crate::types::{CacheError, CacheResult};

/// Default port of the shared hash store.
pub const DEFAULT_PORT: u16 = 6379;

/// Default connection timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: f64 = 2.0;

/// A parsed connection string.
///
/// Username and password are kept percent-encoded, exactly as written.
#[derive(Clone, PartialEq)]
pub struct Dsn {
    /// Whether the connection uses TLS.
    pub tls: bool,
    /// Host name or address.
    pub host: String,
    /// TCP port.
    pub port: u16,
    /// ACL username, if any.
    pub username: Option<String>,
    /// Password, if any.
    pub password: Option<String>,
    /// Database selector; `None` leaves the server default.
    pub database: Option<i64>,
    /// Connection timeout; zero disables it.
    pub timeout: Duration,
    /// Verify the server certificate (TLS only).
    pub verify_peer: bool,
    /// Verify the server name against the certificate (TLS only).
    pub verify_peer_name: bool,
}

impl Dsn {
    /// Parse a connection string.
    pub fn parse(raw: &str) -> CacheResult<Self> {
        let url = Url::parse(raw.trim()).map_err(|e| invalid(raw, &e.to_string()))?;

        let tls = match url.scheme() {
            "redis" | "tcp" => false,
            "rediss" | "tls" => true,
            other => return Err(invalid(raw, &format!("unsupported scheme '{other}'"))),
        };

        let host = match url.host_str() {
            Some(h) if !h.is_empty() => h.to_string(),
            _ => return Err(invalid(raw, "missing host")),
        };

        // A lone userinfo component is a password, not a username.
        let (username, password) = match (url.username(), url.password()) {
            ("", None) => (None, None),
            ("", Some(p)) => (None, Some(p.to_string())),
            (u, None) => (None, Some(u.to_string())),
            (u, Some(p)) => (Some(u.to_string()), Some(p.to_string())),
        };

        let mut database = match url.path().trim_matches('/') {
            "" => None,
            db => Some(parse_database(raw, db)?),
        };

        let mut timeout = Duration::from_secs_f64(DEFAULT_TIMEOUT_SECS);
        let mut verify_peer = true;
        let mut verify_peer_name = true;

        for (name, value) in url.query_pairs() {
            match name.as_ref() {
                "timeout" => {
                    let secs: f64 = value
                        .parse()
                        .map_err(|_| invalid(raw, &format!("bad timeout '{value}'")))?;
                    if !secs.is_finite() || secs < 0.0 {
                        return Err(invalid(raw, &format!("bad timeout '{value}'")));
                    }
                    timeout = Duration::from_secs_f64(secs);
                }
                "db" => database = Some(parse_database(raw, &value)?),
                "verify_peer" => verify_peer = parse_flag(raw, &name, &value)?,
                "verify_peer_name" => verify_peer_name = parse_flag(raw, &name, &value)?,
                other => log::debug!("Ignoring unknown connection parameter '{other}'"),
            }
        }

        Ok(Self {
            tls,
            host,
            port: url.port().unwrap_or(DEFAULT_PORT),
            username,
            password,
            database,
            timeout,
            verify_peer,
            verify_peer_name,
        })
    }

    /// Render the URL handed to the redis client.
    ///
    /// Disabling either peer check on a TLS connection maps to the client's
    /// `#insecure` mode, which skips both.
    pub fn connection_url(&self) -> CacheResult<String> {
        let scheme = if self.tls { "rediss" } else { "redis" };
        let mut url = Url::parse(&format!("{scheme}://{}:{}/", self.host, self.port))
            .map_err(|e| CacheError::InvalidDsn(e.to_string()))?;

        if let Some(db) = self.database {
            url.set_path(&format!("/{db}"));
        }
        if let Some(user) = &self.username {
            url.set_username(user)
                .map_err(|_| CacheError::InvalidDsn("cannot set username".to_string()))?;
        }
        if let Some(pass) = &self.password {
            url.set_password(Some(pass))
                .map_err(|_| CacheError::InvalidDsn("cannot set password".to_string()))?;
        }
        if self.tls && !(self.verify_peer && self.verify_peer_name) {
            url.set_fragment(Some("insecure"));
        }
        Ok(url.to_string())
    }
}

/// Redacts the password.
impl fmt::Display for Dsn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scheme = if self.tls { "rediss" } else { "redis" };
        write!(f, "{scheme}://")?;
        match (&self.username, &self.password) {
            (Some(u), Some(_)) => write!(f, "{u}:***@")?,
            (Some(u), None) => write!(f, "{u}@")?,
            (None, Some(_)) => write!(f, ":***@")?,
            (None, None) => {}
        }
        write!(f, "{}:{}", self.host, self.port)?;
        if let Some(db) = self.database {
            write!(f, "/{db}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Dsn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dsn")
            .field("endpoint", &self.to_string())
            .field("timeout", &self.timeout)
            .field("verify_peer", &self.verify_peer)
            .field("verify_peer_name", &self.verify_peer_name)
            .finish()
    }
}

fn invalid(raw: &str, reason: &str) -> CacheError {
    // Never echo credentials back.
    let shown = match Url::parse(raw.trim()) {
        Ok(mut url) => {
            if url.password().is_some() {
                let _ = url.set_password(Some("***"));
            }
            url.to_string()
        }
        Err(_) => "<unparseable>".to_string(),
    };
    CacheError::InvalidDsn(format!("{reason} in {shown}"))
}

fn parse_database(raw: &str, value: &str) -> CacheResult<i64> {
    value
        .parse::<i64>()
        .ok()
        .filter(|db| *db >= 0)
        .ok_or_else(|| invalid(raw, &format!("bad database '{value}'")))
}

fn parse_flag(raw: &str, name: &str, value: &str) -> CacheResult<bool> {
    match value.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(invalid(raw, &format!("bad {name} '{value}'"))),
    }
}
