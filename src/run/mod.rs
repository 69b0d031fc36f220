//! Run keys: the namespace token isolating one run's shared-backend state.
//!
//! A [`RunKeyResolver`] is created once at process start and hands out a
//! [`RunContext`], which is threaded into every component that writes to a
//! shared backend. The resolved key is mirrored into the environment so
//! child processes and independently constructed resolvers agree on it.

use std::fmt;

use uuid::Uuid;

use crate::types::{shared_key, RUN_KEY_ENV};

/// The resolved run key, passed explicitly to components that namespace keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RunContext {
    run_key: String,
}

impl RunContext {
    /// A context with a fixed key, bypassing resolution. For tests and tools.
    pub fn fixed(run_key: impl Into<String>) -> Self {
        Self {
            run_key: run_key.into(),
        }
    }

    /// The run key.
    pub fn run_key(&self) -> &str {
        &self.run_key
    }

    /// Shared-backend key `{namespace}:{run_key}:{name}`.
    pub fn key_for(&self, namespace: &str, name: &str) -> String {
        shared_key(namespace, &self.run_key, name)
    }
}

impl fmt::Display for RunContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.run_key)
    }
}

/// Resolves the run key once and caches it.
///
/// Precedence: explicit override, then the cached value, then the
/// environment variable, then a freshly generated random token.
#[derive(Debug)]
pub struct RunKeyResolver {
    env_var: String,
    resolved: Option<String>,
}

impl RunKeyResolver {
    /// A resolver reading and publishing `ROWCACHE_RUN_KEY`.
    pub fn new() -> Self {
        Self::with_env_var(RUN_KEY_ENV)
    }

    /// A resolver using a different environment variable.
    pub fn with_env_var(env_var: impl Into<String>) -> Self {
        Self {
            env_var: env_var.into(),
            resolved: None,
        }
    }

    /// Name of the environment variable consulted and published.
    pub fn env_var(&self) -> &str {
        &self.env_var
    }

    /// Resolve the run key.
    ///
    /// A non-blank `override_key` always wins and replaces any cached key.
    pub fn resolve(&mut self, override_key: Option<&str>) -> String {
        if let Some(key) = override_key.filter(|k| !k.trim().is_empty()) {
            return self.publish(key.to_string());
        }
        if let Some(key) = &self.resolved {
            return key.clone();
        }
        match std::env::var(&self.env_var) {
            Ok(key) if !key.trim().is_empty() => {
                log::debug!("Run key taken from {}", self.env_var);
                self.publish(key)
            }
            _ => {
                let key = generate_run_key();
                log::info!("Generated run key {key}");
                self.publish(key)
            }
        }
    }

    /// Resolve and wrap the key in a [`RunContext`].
    pub fn context(&mut self, override_key: Option<&str>) -> RunContext {
        RunContext::fixed(self.resolve(override_key))
    }

    /// Forget the cached key and withdraw its environment mirror.
    ///
    /// Isolation hook for tests; never call it in the middle of a run.
    pub fn reset(&mut self) {
        if let Some(key) = self.resolved.take() {
            if std::env::var(&self.env_var).ok().as_deref() == Some(key.as_str()) {
                std::env::remove_var(&self.env_var);
            }
        }
    }

    fn publish(&mut self, key: String) -> String {
        std::env::set_var(&self.env_var, &key);
        self.resolved = Some(key.clone());
        key
    }
}

impl Default for RunKeyResolver {
    fn default() -> Self {
        Self::new()
    }
}

/// A fresh random run key: 32 lowercase hex characters.
pub fn generate_run_key() -> String {
    Uuid::new_v4().simple().to_string()
}
