use std::collections::HashMap;

/// Read access to environment variables.
///
/// Abstracted so tests can pass synthetic data instead of touching the process
/// environment.
pub trait EnvSource {
    fn get(&self, name: &str) -> Option<String>;
}

/// The real process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdEnv;

impl EnvSource for StdEnv {
    fn get(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

/// An environment backed by a map.
#[derive(Debug, Clone, Default)]
pub struct MapEnv {
    vars: HashMap<String, String>,
}

impl MapEnv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(name.into(), value.into());
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MapEnv {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl EnvSource for MapEnv {
    fn get(&self, name: &str) -> Option<String> {
        self.vars.get(name).cloned()
    }
}

/// Map an option name to its environment variable: `{PREFIX}_{NAME}`.
///
/// The name is upper-cased and hyphens become underscores, so with prefix `ABC`
/// the option `log-level` is read from `ABC_LOG_LEVEL`. An empty prefix yields
/// just `NAME`.
pub fn env_key(prefix: &str, name: &str) -> String {
    let name = name.replace('-', "_").to_uppercase();
    if prefix.is_empty() {
        name
    } else {
        format!("{}_{name}", prefix.to_uppercase())
    }
}

/// Look up `name` under `prefix`. Empty values count as unset.
pub fn lookup(env: &dyn EnvSource, prefix: &str, name: &str) -> Option<String> {
    env.get(&env_key(prefix, name)).filter(|v| !v.is_empty())
}
