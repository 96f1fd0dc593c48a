//! The flag layer: a registry of typed flags that turns into `clap::Arg`s.
//!
//! Registration and the required/hidden markings happen here, before any argv
//! is seen. Marking an unregistered name is an error, mirroring how the binder
//! must register a flag before it can decorate it.

use clap::{Arg, ArgAction};

use crate::error::BindError;
use crate::types::Dest;

/// The shape of a flag's value on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagKind {
    Str,
    Int,
    Bool,
    Duration,
    List,
    Map,
    Custom(&'static str),
}

impl FlagKind {
    pub fn of(dest: &Dest<'_>) -> Self {
        match dest {
            Dest::Str(_) => FlagKind::Str,
            Dest::I32(_) | Dest::I64(_) | Dest::U16(_) | Dest::U32(_) | Dest::U64(_) => {
                FlagKind::Int
            }
            Dest::Bool(_) => FlagKind::Bool,
            Dest::Duration(_) => FlagKind::Duration,
            Dest::StrList(_) => FlagKind::List,
            Dest::StrMap(_) => FlagKind::Map,
            Dest::Custom(v) => FlagKind::Custom(v.value_name()),
        }
    }

    fn value_name(self) -> &'static str {
        match self {
            FlagKind::Str => "STRING",
            FlagKind::Int => "INT",
            FlagKind::Bool => "BOOL",
            FlagKind::Duration => "DURATION",
            FlagKind::List => "STRINGS",
            FlagKind::Map => "KEY=VALUE",
            FlagKind::Custom(name) => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Flag {
    pub name: String,
    pub short: Option<char>,
    pub kind: FlagKind,
    pub help: String,
    /// Default as shown in help output.
    pub default: Option<String>,
    pub required: bool,
    pub hidden: bool,
    pub persistent: bool,
}

impl Flag {
    pub fn new(name: &str, kind: FlagKind) -> Self {
        Self {
            name: name.to_string(),
            short: None,
            kind,
            help: String::new(),
            default: None,
            required: false,
            hidden: false,
            persistent: false,
        }
    }

    pub fn to_arg(&self) -> Arg {
        let help = match &self.default {
            Some(d) if self.help.is_empty() => format!("[default: {d}]"),
            Some(d) => format!("{} [default: {d}]", self.help),
            None => self.help.clone(),
        };

        let mut arg = Arg::new(self.name.clone())
            .long(self.name.clone())
            .help(help)
            .value_name(self.kind.value_name())
            .required(self.required && !self.persistent)
            .hide(self.hidden)
            .global(self.persistent);
        if let Some(c) = self.short {
            arg = arg.short(c);
        }

        match self.kind {
            // `--flag` alone means true; an explicit value must be attached
            // with `=` so a following argument is never swallowed.
            FlagKind::Bool => arg
                .action(ArgAction::Set)
                .num_args(0..=1)
                .require_equals(true)
                .default_missing_value("true"),
            FlagKind::List | FlagKind::Map => arg.action(ArgAction::Append).value_delimiter(','),
            _ => arg.action(ArgAction::Set),
        }
    }
}

/// Names clap claims for its generated help flag.
const RESERVED_LONG: &str = "help";
const RESERVED_SHORT: char = 'h';

#[derive(Debug, Default)]
pub struct FlagSet {
    flags: Vec<Flag>,
}

impl FlagSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, flag: Flag) -> Result<(), BindError> {
        let reject = |reason: String| BindError::Registration {
            flag: flag.name.clone(),
            reason,
        };

        if flag.name.is_empty()
            || flag.name.starts_with('-')
            || flag.name.contains(char::is_whitespace)
        {
            return Err(reject(format!("invalid flag name {:?}", flag.name)));
        }
        if flag.name == RESERVED_LONG {
            return Err(reject("--help is reserved".to_string()));
        }
        if self.lookup(&flag.name).is_some() {
            return Err(reject("flag is already registered".to_string()));
        }
        if let Some(c) = flag.short {
            if c == '-' || c.is_whitespace() || c == RESERVED_SHORT {
                return Err(reject(format!("invalid short alias {c:?}")));
            }
            if let Some(other) = self.flags.iter().find(|f| f.short == Some(c)) {
                return Err(reject(format!("short alias -{c} is taken by --{}", other.name)));
            }
        }

        self.flags.push(flag);
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Option<&Flag> {
        self.flags.iter().find(|f| f.name == name)
    }

    fn lookup_mut(&mut self, name: &str) -> Result<&mut Flag, BindError> {
        self.flags
            .iter_mut()
            .find(|f| f.name == name)
            .ok_or_else(|| BindError::Registration {
                flag: name.to_string(),
                reason: "no such flag".to_string(),
            })
    }

    pub fn mark_required(&mut self, name: &str) -> Result<(), BindError> {
        self.lookup_mut(name)?.required = true;
        Ok(())
    }

    /// Required flags that clap cannot enforce: clap rejects global arguments
    /// marked required, so persistent ones are checked after parsing instead.
    pub fn required_persistent(&self) -> impl Iterator<Item = &str> {
        self.flags
            .iter()
            .filter(|f| f.required && f.persistent)
            .map(|f| f.name.as_str())
    }

    pub fn mark_hidden(&mut self, name: &str) -> Result<(), BindError> {
        self.lookup_mut(name)?.hidden = true;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Flag> {
        self.flags.iter()
    }

    pub fn into_args(self) -> Vec<Arg> {
        self.flags.iter().map(Flag::to_arg).collect()
    }
}
