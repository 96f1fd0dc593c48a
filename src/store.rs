//! The config store: values read from the config file, plus an overlay of
//! persistent flags set on the command line.
//!
//! Keys are case-insensitive. Everything is lower-cased on the way in, and
//! lookups lower-case the requested name before navigating dotted paths.

use std::path::{Path, PathBuf};

use toml::{Table, Value};

use crate::error::BindError;
use crate::file::{self, ConfigLocation};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigStore {
    path: Option<PathBuf>,
    values: Table,
    flags: Table,
}

impl ConfigStore {
    /// A store with no config file behind it.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Wrap already-parsed file contents. `path` is kept for diagnostics.
    pub fn from_table(path: Option<PathBuf>, values: Table) -> Self {
        Self {
            path,
            values: lowercase_keys(values),
            flags: Table::new(),
        }
    }

    /// Find and parse the config file for `location`. See [`file::load`].
    pub fn load(location: &ConfigLocation, app_name: &str) -> Result<Self, BindError> {
        file::load(location, app_name)
    }

    /// The file the values came from, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty() && self.flags.is_empty()
    }

    /// Config-file value for `name`. Dotted names navigate nested tables.
    pub fn get(&self, name: &str) -> Option<&Value> {
        let key = name.to_lowercase();
        self.values
            .get(&key)
            .or_else(|| table_get(&self.values, &key))
    }

    /// Value recorded for a persistent flag set on the command line.
    pub fn flag(&self, name: &str) -> Option<&Value> {
        self.flags.get(&name.to_lowercase())
    }

    pub fn set_flag(&mut self, name: &str, value: Value) {
        self.flags.insert(name.to_lowercase(), value);
    }
}

fn lowercase_keys(table: Table) -> Table {
    table
        .into_iter()
        .map(|(k, v)| {
            let v = match v {
                Value::Table(t) => Value::Table(lowercase_keys(t)),
                other => other,
            };
            (k.to_lowercase(), v)
        })
        .collect()
}

/// Navigate a `toml::Table` by dotted key path (e.g. `"database.url"`).
fn table_get<'a>(table: &'a Table, dotted_key: &str) -> Option<&'a Value> {
    let (path, leaf) = dotted_key.rsplit_once('.')?;
    let mut current = table;
    for segment in path.split('.') {
        current = current.get(segment)?.as_table()?;
    }
    current.get(leaf)
}
