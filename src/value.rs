//! Custom settable option types.
//!
//! Any type that can parse itself from text can be bound by implementing
//! [`FlagValue`] and passing it as [`Dest::Custom`](crate::Dest::Custom). The
//! binder hands it the textual form of whatever the winning source supplied.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A value that knows how to set itself from a string.
///
/// `set` must leave `self` untouched when it returns an error.
pub trait FlagValue: fmt::Display {
    fn set(&mut self, raw: &str) -> Result<(), String>;

    /// Placeholder shown in help output, e.g. `--org-id <ID>`.
    fn value_name(&self) -> &'static str {
        "VALUE"
    }
}

/// A non-zero 64-bit identifier, written as exactly 16 lowercase hex digits.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct Id(u64);

impl Id {
    pub const ENCODED_LEN: usize = 16;

    pub fn new(raw: u64) -> Self {
        Id(raw)
    }

    pub fn get(self) -> u64 {
        self.0
    }

    pub fn is_valid(self) -> bool {
        self.0 != 0
    }
}

impl FromStr for Id {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != Self::ENCODED_LEN {
            return Err(format!(
                "id must be {} hex characters, got {}",
                Self::ENCODED_LEN,
                s.len()
            ));
        }
        if !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(format!("id {s:?} is not hex"));
        }
        let raw = u64::from_str_radix(s, 16).map_err(|e| e.to_string())?;
        if raw == 0 {
            return Err("id must not be zero".to_string());
        }
        Ok(Id(raw))
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

impl FlagValue for Id {
    fn set(&mut self, raw: &str) -> Result<(), String> {
        *self = raw.parse()?;
        Ok(())
    }

    fn value_name(&self) -> &'static str {
        "ID"
    }
}

impl TryFrom<String> for Id {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Id> for String {
    fn from(id: Id) -> Self {
        id.to_string()
    }
}

/// Log severity, backed by [`tracing::Level`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogLevel(pub tracing::Level);

impl Default for LogLevel {
    fn default() -> Self {
        LogLevel(tracing::Level::INFO)
    }
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        level.0
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let level = match s.trim().to_ascii_lowercase().as_str() {
            "trace" => tracing::Level::TRACE,
            "debug" => tracing::Level::DEBUG,
            "info" => tracing::Level::INFO,
            "warn" | "warning" => tracing::Level::WARN,
            "error" => tracing::Level::ERROR,
            other => return Err(format!("unrecognized level: {other:?}")),
        };
        Ok(LogLevel(level))
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // tracing renders levels in upper case; flags are typed in lower case.
        write!(f, "{}", self.0.as_str().to_ascii_lowercase())
    }
}

impl FlagValue for LogLevel {
    fn set(&mut self, raw: &str) -> Result<(), String> {
        *self = raw.parse()?;
        Ok(())
    }

    fn value_name(&self) -> &'static str {
        "LEVEL"
    }
}
