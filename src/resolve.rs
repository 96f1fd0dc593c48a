//! Source resolution: find the override value for one option.
//!
//! Precedence, highest first:
//!
//! 1. persistent flags already set on the command line (the store's overlay)
//! 2. environment variables, `{PREFIX}_{NAME}`
//! 3. the config file
//!
//! Explicit command-line flags for the option itself are not consulted here.
//! They are applied after parsing and beat everything the resolver returns.

use toml::Value;
use tracing::debug;

use crate::env::{self, EnvSource};
use crate::store::ConfigStore;

/// Which source an override came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Flag,
    Env,
    ConfigFile,
}

/// An untyped value found for an option, with its origin.
#[derive(Debug, Clone, PartialEq)]
pub struct Override {
    pub value: Value,
    pub source: Source,
}

/// Looks up option overrides in the environment and config store.
///
/// The store must already hold the config file's contents; the resolver never
/// loads anything itself.
pub struct Resolver {
    prefix: String,
    env: Box<dyn EnvSource>,
    store: ConfigStore,
}

impl Resolver {
    pub fn new(prefix: &str, env: impl EnvSource + 'static, store: ConfigStore) -> Self {
        Self {
            prefix: prefix.to_uppercase(),
            env: Box::new(env),
            store,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn store(&self) -> &ConfigStore {
        &self.store
    }

    /// The environment variable consulted for `name`.
    pub fn env_key(&self, name: &str) -> String {
        env::env_key(&self.prefix, name)
    }

    /// The highest-precedence override for `name`, if any source has one.
    pub fn lookup(&self, name: &str) -> Option<Override> {
        if let Some(value) = self.store.flag(name) {
            debug!(option = name, "override from persistent flag");
            return Some(Override {
                value: value.clone(),
                source: Source::Flag,
            });
        }
        if let Some(raw) = env::lookup(self.env.as_ref(), &self.prefix, name) {
            debug!(option = name, var = %self.env_key(name), "override from environment");
            return Some(Override {
                value: Value::String(raw),
                source: Source::Env,
            });
        }
        if let Some(value) = self.store.get(name) {
            debug!(option = name, "override from config file");
            return Some(Override {
                value: value.clone(),
                source: Source::ConfigFile,
            });
        }
        None
    }

    /// Record a persistent flag's command-line value so later lookups see it.
    pub fn bind_flag(&mut self, name: &str, value: Value) {
        self.store.set_flag(name, value);
    }
}
