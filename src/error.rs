use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BindError {
    #[error("Default for option '{flag}' is a {found} but the destination expects a {expected}")]
    UnsupportedDefault {
        flag: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("Default {value} for option '{flag}' does not fit in {target}")]
    DefaultOutOfRange {
        flag: String,
        value: i128,
        target: &'static str,
    },

    #[error("Invalid default {value:?} for option '{flag}': {reason}")]
    InvalidDefault {
        flag: String,
        value: String,
        reason: String,
    },

    #[error("Invalid {kind} value {value:?} for option '{flag}': {reason}")]
    Coercion {
        flag: String,
        value: String,
        kind: &'static str,
        reason: String,
    },

    #[error("Cannot register option '{flag}': {reason}")]
    Registration { flag: String, reason: String },

    #[error("Unsupported config file format: {path} (expected .json, .toml, .yaml or .yml)")]
    UnsupportedFormat { path: PathBuf },

    #[error("Failed to parse {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Cli(#[from] clap::Error),
}

impl BindError {
    /// The option name the error is about, if it concerns a single option.
    pub fn flag(&self) -> Option<&str> {
        match self {
            BindError::UnsupportedDefault { flag, .. }
            | BindError::DefaultOutOfRange { flag, .. }
            | BindError::InvalidDefault { flag, .. }
            | BindError::Coercion { flag, .. }
            | BindError::Registration { flag, .. } => Some(flag),
            _ => None,
        }
    }
}
