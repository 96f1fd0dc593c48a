//! Config file discovery and loading.
//!
//! # Discovery
//!
//! A [`ConfigLocation`] is either an explicit file or a list of [`SearchPath`]s.
//! Each search path resolves to one directory, which is checked for
//! `config.json`, `config.toml`, `config.yaml` and `config.yml` in that order.
//! The first file found in the first directory that has one wins.
//!
//! # Loading
//!
//! The file's extension selects the parser. A missing file (explicit or
//! searched) produces an empty [`ConfigStore`]; a file that exists but cannot be
//! read or parsed is an error.

use std::path::{Path, PathBuf};

use toml::{Table, Value};
use tracing::{debug, info};

use crate::error::BindError;
use crate::store::ConfigStore;
use crate::types::SearchPath;

pub const CONFIG_BASENAME: &str = "config";
pub const EXTENSIONS: [&str; 4] = ["json", "toml", "yaml", "yml"];

/// Where the config file comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigLocation {
    /// Exactly this file.
    File(PathBuf),
    /// The first `config.{json,toml,yaml,yml}` found in these directories.
    Search(Vec<SearchPath>),
}

impl ConfigLocation {
    /// Interpret a user-supplied config path: a supported extension names a file,
    /// no extension names a directory to search.
    pub fn from_config_path(path: &str) -> Result<Self, BindError> {
        let path = PathBuf::from(path);
        match path.extension().and_then(|e| e.to_str()) {
            None => Ok(ConfigLocation::Search(vec![SearchPath::Path(path)])),
            Some(ext) if EXTENSIONS.contains(&ext.to_lowercase().as_str()) => {
                Ok(ConfigLocation::File(path))
            }
            Some(_) => Err(BindError::UnsupportedFormat { path }),
        }
    }
}

impl Default for ConfigLocation {
    fn default() -> Self {
        ConfigLocation::Search(vec![SearchPath::Cwd])
    }
}

/// Resolve a [`SearchPath`] to a concrete directory.
///
/// `app_name` is used by `SearchPath::Platform` to construct the platform-specific
/// config directory (e.g. `~/.config/{app_name}/` on Linux).
///
/// Returns `None` if the path cannot be resolved (e.g. no home directory found).
pub fn resolve_search_path(sp: &SearchPath, app_name: &str) -> Option<PathBuf> {
    match sp {
        SearchPath::Platform => {
            let proj = directories::ProjectDirs::from("", "", app_name)?;
            Some(proj.config_dir().to_path_buf())
        }
        SearchPath::Home(subdir) => {
            let user = directories::UserDirs::new()?;
            Some(user.home_dir().join(subdir))
        }
        SearchPath::Cwd => std::env::current_dir().ok(),
        SearchPath::Path(p) => Some(p.clone()),
    }
}

/// Find the first config file across `dirs`, trying each extension in order.
pub fn find_config_file(dirs: &[PathBuf]) -> Option<PathBuf> {
    dirs.iter().find_map(|dir| {
        EXTENSIONS
            .iter()
            .map(|ext| dir.join(format!("{CONFIG_BASENAME}.{ext}")))
            .find(|candidate| candidate.is_file())
    })
}

/// Load the config store for `location`.
pub fn load(location: &ConfigLocation, app_name: &str) -> Result<ConfigStore, BindError> {
    let path = match location {
        ConfigLocation::File(path) => path.clone(),
        ConfigLocation::Search(search_paths) => {
            let dirs: Vec<PathBuf> = search_paths
                .iter()
                .filter_map(|sp| resolve_search_path(sp, app_name))
                .collect();
            match find_config_file(&dirs) {
                Some(path) => path,
                None => {
                    debug!(searched = ?dirs, "no config file found");
                    return Ok(ConfigStore::empty());
                }
            }
        }
    };

    let content = match std::fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "config file does not exist");
            return Ok(ConfigStore::empty());
        }
        Err(e) => return Err(BindError::Io { path, source: e }),
    };

    let table = parse(&path, &content)?;
    info!(path = %path.display(), keys = table.len(), "loaded config file");
    Ok(ConfigStore::from_table(Some(path), table))
}

/// Parse config file contents according to the file's extension.
///
/// JSON and YAML nulls mean "no value" and are dropped, so a key set to null
/// is treated as absent.
pub fn parse(path: &Path, content: &str) -> Result<Table, BindError> {
    let parse_err = |reason: String| BindError::Parse {
        path: path.to_path_buf(),
        reason,
    };
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    let value = match ext.as_str() {
        "toml" => return toml::from_str(content).map_err(|e| parse_err(e.to_string())),
        "json" => {
            let json: serde_json::Value =
                serde_json::from_str(content).map_err(|e| parse_err(e.to_string()))?;
            from_json(json)
        }
        "yaml" | "yml" => {
            let yaml: serde_yaml::Value =
                serde_yaml::from_str(content).map_err(|e| parse_err(e.to_string()))?;
            from_yaml(yaml).map_err(&parse_err)?
        }
        _ => {
            return Err(BindError::UnsupportedFormat {
                path: path.to_path_buf(),
            });
        }
    };

    match value {
        // An empty YAML document is a null, not a mapping.
        None => Ok(Table::new()),
        Some(Value::Table(table)) => Ok(table),
        Some(other) => Err(parse_err(format!(
            "top level must be a table, found {}",
            other.type_str()
        ))),
    }
}

fn from_json(value: serde_json::Value) -> Option<Value> {
    use serde_json::Value as Json;

    match value {
        Json::Null => None,
        Json::Bool(b) => Some(Value::Boolean(b)),
        Json::Number(n) => match n.as_i64() {
            Some(i) => Some(Value::Integer(i)),
            None => n.as_f64().map(Value::Float),
        },
        Json::String(s) => Some(Value::String(s)),
        Json::Array(items) => Some(Value::Array(
            items.into_iter().filter_map(from_json).collect(),
        )),
        Json::Object(map) => Some(Value::Table(
            map.into_iter()
                .filter_map(|(k, v)| from_json(v).map(|v| (k, v)))
                .collect(),
        )),
    }
}

fn from_yaml(value: serde_yaml::Value) -> Result<Option<Value>, String> {
    use serde_yaml::Value as Yaml;

    Ok(match value {
        Yaml::Null => None,
        Yaml::Bool(b) => Some(Value::Boolean(b)),
        Yaml::Number(n) => match n.as_i64() {
            Some(i) => Some(Value::Integer(i)),
            None => n.as_f64().map(Value::Float),
        },
        Yaml::String(s) => Some(Value::String(s)),
        Yaml::Sequence(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                out.extend(from_yaml(item)?);
            }
            Some(Value::Array(out))
        }
        Yaml::Mapping(map) => {
            let mut out = Table::new();
            for (k, v) in map {
                let key = match k {
                    Yaml::String(s) => s,
                    Yaml::Bool(b) => b.to_string(),
                    Yaml::Number(n) => n.to_string(),
                    _ => return Err("mapping keys must be scalars".to_string()),
                };
                if let Some(v) = from_yaml(v)? {
                    out.insert(key, v);
                }
            }
            Some(Value::Table(out))
        }
        Yaml::Tagged(tagged) => from_yaml(tagged.value)?,
    })
}
