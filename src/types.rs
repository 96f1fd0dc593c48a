use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::value::FlagValue;

/// Where to search for config files.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchPath {
    /// Platform config directory (XDG on Linux, ~/Library/Application Support on macOS).
    Platform,
    /// A subdirectory under the user's home directory, e.g. `Home(".myapp")`.
    Home(&'static str),
    /// Current working directory.
    Cwd,
    /// An explicit directory.
    Path(PathBuf),
}

/// The slot an option writes its resolved value into.
///
/// One variant per supported semantic type. Each holds an exclusive borrow of the
/// caller's variable for as long as the binding lives.
pub enum Dest<'a> {
    Str(&'a mut String),
    I32(&'a mut i32),
    I64(&'a mut i64),
    U16(&'a mut u16),
    U32(&'a mut u32),
    U64(&'a mut u64),
    Bool(&'a mut bool),
    Duration(&'a mut Duration),
    StrList(&'a mut Vec<String>),
    StrMap(&'a mut BTreeMap<String, String>),
    Custom(&'a mut dyn FlagValue),
}

impl Dest<'_> {
    /// Human-readable type family, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Dest::Str(_) => "string",
            Dest::I32(_) => "i32",
            Dest::I64(_) => "i64",
            Dest::U16(_) => "u16",
            Dest::U32(_) => "u32",
            Dest::U64(_) => "u64",
            Dest::Bool(_) => "bool",
            Dest::Duration(_) => "duration",
            Dest::StrList(_) => "string-list",
            Dest::StrMap(_) => "string-map",
            Dest::Custom(_) => "value",
        }
    }
}

impl std::fmt::Debug for Dest<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Dest::{}", self.kind())
    }
}

/// A default value for an option, before it is checked against the destination.
///
/// Every integer width converts into [`DefaultValue::Int`]; the binder narrows it
/// to the destination's width and rejects values that do not fit.
#[derive(Debug, Clone, PartialEq)]
pub enum DefaultValue {
    Str(String),
    Int(i128),
    Bool(bool),
    Duration(Duration),
    StrList(Vec<String>),
    StrMap(BTreeMap<String, String>),
}

impl DefaultValue {
    pub fn kind(&self) -> &'static str {
        match self {
            DefaultValue::Str(_) => "string",
            DefaultValue::Int(_) => "integer",
            DefaultValue::Bool(_) => "bool",
            DefaultValue::Duration(_) => "duration",
            DefaultValue::StrList(_) => "string-list",
            DefaultValue::StrMap(_) => "string-map",
        }
    }
}

macro_rules! int_default {
    ($($t:ty),*) => {
        $(impl From<$t> for DefaultValue {
            fn from(v: $t) -> Self {
                DefaultValue::Int(i128::from(v))
            }
        })*
    };
}

int_default!(i8, i16, i32, i64, u8, u16, u32, u64);

impl From<&str> for DefaultValue {
    fn from(v: &str) -> Self {
        DefaultValue::Str(v.to_string())
    }
}

impl From<String> for DefaultValue {
    fn from(v: String) -> Self {
        DefaultValue::Str(v)
    }
}

impl From<bool> for DefaultValue {
    fn from(v: bool) -> Self {
        DefaultValue::Bool(v)
    }
}

impl From<Duration> for DefaultValue {
    fn from(v: Duration) -> Self {
        DefaultValue::Duration(v)
    }
}

impl From<Vec<String>> for DefaultValue {
    fn from(v: Vec<String>) -> Self {
        DefaultValue::StrList(v)
    }
}

impl From<Vec<&str>> for DefaultValue {
    fn from(v: Vec<&str>) -> Self {
        DefaultValue::StrList(v.into_iter().map(String::from).collect())
    }
}

impl From<BTreeMap<String, String>> for DefaultValue {
    fn from(v: BTreeMap<String, String>) -> Self {
        DefaultValue::StrMap(v)
    }
}

/// A single command-line option: where it is written, what it is called in
/// each source, and how it is presented.
#[derive(Debug)]
pub struct Opt<'a> {
    pub dest: Dest<'a>,
    pub flag: String,
    pub env_var: Option<String>,
    pub short: Option<char>,
    pub default: Option<DefaultValue>,
    pub desc: String,
    pub required: bool,
    pub hidden: bool,
    pub persistent: bool,
}

impl<'a> Opt<'a> {
    pub fn new(flag: &str, dest: Dest<'a>) -> Self {
        Self {
            dest,
            flag: flag.to_string(),
            env_var: None,
            short: None,
            default: None,
            desc: String::new(),
            required: false,
            hidden: false,
            persistent: false,
        }
    }

    /// Look the option up under a different name in the environment and config
    /// file (default: the flag name).
    pub fn env_var(mut self, name: &str) -> Self {
        self.env_var = Some(name.to_string());
        self
    }

    pub fn short(mut self, c: char) -> Self {
        self.short = Some(c);
        self
    }

    pub fn default<V: Into<DefaultValue>>(mut self, value: V) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn desc(mut self, desc: &str) -> Self {
        self.desc = desc.to_string();
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// Make the option visible to subcommands and record explicit command-line
    /// values in the resolver's flag overlay.
    pub fn persistent(mut self) -> Self {
        self.persistent = true;
        self
    }

    /// The name used for environment and config lookups.
    pub fn lookup_name(&self) -> &str {
        self.env_var.as_deref().unwrap_or(&self.flag)
    }
}
